//! Hex colour parsing and the colour strings handed to the wave renderer.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgb {
    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

/// Parses `#rrggbb` or `rrggbb` (any case). Shorthand and named colours are not accepted.
pub fn hex_to_rgb(hex: &str) -> Option<Rgb> {
    let digits = hex.strip_prefix('#').unwrap_or(hex);
    if digits.len() != 6 || !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(Rgb {
        r: channel(0)?,
        g: channel(2)?,
        b: channel(4)?,
    })
}

/// `"r, g, b"` for opaque layers, `"rgba(r, g, b, opacity)"` otherwise.
pub fn color_string(hex: &str, opacity: f64) -> Option<String> {
    let Rgb { r, g, b } = hex_to_rgb(hex)?;
    if opacity < 1.0 {
        Some(format!("rgba({r}, {g}, {b}, {opacity})"))
    } else {
        Some(format!("{r}, {g}, {b}"))
    }
}

/// Reads back either form produced by [`color_string`].
pub fn parse_color_string(s: &str) -> Option<Rgba> {
    let s = s.trim();
    let (body, with_alpha) = match s.strip_prefix("rgba(") {
        Some(rest) => (rest.strip_suffix(')')?, true),
        None => (s, false),
    };

    let parts = body.split(',').map(str::trim).collect::<Vec<_>>();
    let expected = if with_alpha { 4 } else { 3 };
    if parts.len() != expected {
        return None;
    }

    let r = parts[0].parse::<u8>().ok()?;
    let g = parts[1].parse::<u8>().ok()?;
    let b = parts[2].parse::<u8>().ok()?;
    let a = if with_alpha {
        let a = parts[3].parse::<f32>().ok()?;
        if !(0.0..=1.0).contains(&a) {
            return None;
        }
        a
    } else {
        1.0
    };
    Some(Rgba { r, g, b, a })
}
