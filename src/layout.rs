use clap::ValueEnum;

/// Horizontal bleed on each side for the round presentation; the mask clips more of the wave.
pub const CIRCLE_EXTENSION: f64 = 0.6;
pub const DEFAULT_EXTENSION: f64 = 0.3;
/// Vertical room for wave peaks, as a multiple of the reference dimension.
pub const HEIGHT_FACTOR: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ImageStyle {
    Default,
    Circle,
}

impl ImageStyle {
    pub fn name(self) -> &'static str {
        match self {
            Self::Default => "default",
            Self::Circle => "circle",
        }
    }

    pub fn is_circle(self) -> bool {
        self == Self::Circle
    }

    pub fn extension(self) -> f64 {
        match self {
            Self::Circle => CIRCLE_EXTENSION,
            Self::Default => DEFAULT_EXTENSION,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub container_width: f64,
    pub container_max_height: f64,
    pub wave_width: f64,
    pub left_offset: f64,
}

/// Derive the wave surface geometry from the image's rendered size.
pub fn calculate(image_width: f64, image_height: f64, style: ImageStyle) -> Geometry {
    let reference = if style.is_circle() {
        image_width.min(image_height)
    } else {
        image_height
    };
    let extension = style.extension();
    Geometry {
        container_width: image_width,
        container_max_height: reference * HEIGHT_FACTOR,
        wave_width: image_width * (1.0 + extension * 2.0),
        left_offset: -image_width * extension,
    }
}
