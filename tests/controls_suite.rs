use wave_overlay::blend::{BlendMode, CompositeOp};
use wave_overlay::controls::{
    opacity_label, route, snap_opacity, ControlEvent, ControlId, Controls, Trigger, SWATCHES,
};
use wave_overlay::layout::ImageStyle;

fn controls() -> Controls {
    Controls::new(
        [
            "#ff3b6b".to_string(),
            "not-a-colour".to_string(),
            "#FFFFFF".to_string(),
        ],
        [1.0, 0.8, 0.6],
        CompositeOp::Lighter,
        BlendMode::Screen,
        ImageStyle::Default,
    )
}

#[test]
fn layout_events_relayout_and_control_events_update() {
    assert_eq!(route(ControlEvent::ImageLoaded), Trigger::Relayout);
    assert_eq!(route(ControlEvent::Resized), Trigger::Relayout);
    for id in ControlId::ORDER {
        assert_eq!(route(ControlEvent::Change(id)), Trigger::Update);
        assert_eq!(route(ControlEvent::Input(id)), Trigger::Update);
    }
}

#[test]
fn curve_definition_leads_with_the_support_line() {
    let defs = controls().curve_definition();
    assert_eq!(defs.len(), 4);
    assert!(defs[0].support_line);
    assert_eq!(defs[0].color.as_deref(), Some("255,255,255"));
    assert_eq!(defs[0].opacity, 0.0);

    assert_eq!(defs[1].color.as_deref(), Some("255, 59, 107"));
    assert_eq!(defs[1].opacity, 1.0);
    // Malformed picker values produce a layer without a colour.
    assert_eq!(defs[2].color, None);
    assert_eq!(defs[2].opacity, 0.8);
    assert_eq!(defs[3].color.as_deref(), Some("255, 255, 255"));
    assert!(defs[1..].iter().all(|d| !d.support_line));
}

#[test]
fn opacity_snaps_to_tenths() {
    assert_eq!(snap_opacity(0.0), 0.0);
    assert_eq!(snap_opacity(0.44), 0.4);
    assert_eq!(snap_opacity(0.46), 0.5);
    assert_eq!(snap_opacity(1.7), 1.0);
    assert_eq!(snap_opacity(-0.2), 0.0);
    assert_eq!(snap_opacity(f64::NAN), 1.0);
    assert_eq!(opacity_label(0.5), "0.5");
    assert_eq!(opacity_label(1.0), "1.0");
}

#[test]
fn opacity_steps_stay_in_range() {
    let mut c = controls();
    for _ in 0..15 {
        c.step(ControlId::Opacity(2), false);
    }
    assert_eq!(c.layers[2].opacity, 0.0);
    for _ in 0..15 {
        c.step(ControlId::Opacity(2), true);
    }
    assert_eq!(c.layers[2].opacity, 1.0);
}

#[test]
fn labels_only_change_when_synced() {
    let mut c = controls();
    assert_eq!(c.opacity_labels[0], "1.0");
    let ev = c.set_opacity(0, 0.3).expect("valid layer");
    assert_eq!(ev, ControlEvent::Input(ControlId::Opacity(0)));
    assert_eq!(c.opacity_labels[0], "1.0");
    c.sync_label(0);
    assert_eq!(c.opacity_labels[0], "0.3");
    assert_eq!(c.describe(ControlId::Opacity(0)), "0.3");
}

#[test]
fn out_of_range_layers_are_ignored() {
    let mut c = controls();
    assert!(c.set_opacity(3, 0.5).is_none());
    assert!(c.set_color(7, "#000000").is_none());
    assert!(c.step(ControlId::Color(3), true).is_none());
    c.sync_label(9);
    assert_eq!(c, controls());
}

#[test]
fn selects_cycle_with_wraparound() {
    let mut c = controls();
    assert_eq!(
        c.step(ControlId::CanvasBlend, false),
        Some(ControlEvent::Change(ControlId::CanvasBlend))
    );
    assert_eq!(c.canvas_blend, CompositeOp::SourceOver);
    c.step(ControlId::CanvasBlend, false);
    assert_eq!(c.canvas_blend, CompositeOp::Luminosity);

    c.step(ControlId::BgBlend, true);
    assert_eq!(c.bg_blend, BlendMode::Overlay);
    assert_eq!(c.describe(ControlId::BgBlend), "overlay");

    c.step(ControlId::ImageStyle, true);
    assert_eq!(c.image_style, ImageStyle::Circle);
    c.step(ControlId::ImageStyle, true);
    assert_eq!(c.image_style, ImageStyle::Default);
}

#[test]
fn colour_steps_walk_the_swatches() {
    let mut c = controls();
    assert_eq!(
        c.step(ControlId::Color(0), true),
        Some(ControlEvent::Change(ControlId::Color(0)))
    );
    assert_eq!(c.layers[0].color, SWATCHES[1]);

    // Unknown values jump to the first swatch.
    c.step(ControlId::Color(1), false);
    assert_eq!(c.layers[1].color, SWATCHES[0]);

    // Upper-case hex still matches its swatch.
    c.step(ControlId::Color(2), true);
    assert_eq!(c.layers[2].color, SWATCHES[11]);
    c.step(ControlId::Color(2), true);
    assert_eq!(c.layers[2].color, SWATCHES[0]);
}

#[test]
fn focus_order_labels() {
    let labels = ControlId::ORDER.map(ControlId::label);
    assert_eq!(labels[0], "canvas blend");
    assert_eq!(labels[3], "color1");
    assert_eq!(labels[8], "opacity3");
}
