//! Integration tests for value interpretation through the public API.

use quire_css::values::{parse_length, resolve_length};
use quire_css::{BorderConfig, BorderSide, BorderStyle, BoxMetrics, ColorCode, ColorValue, CssValue, Point, Rect, Size};

#[test]
fn test_length_units_against_base() {
    assert_eq!(resolve_length("2em", 10.0), 20.0);
    assert_eq!(resolve_length("150%", 10.0), 15.0);
    assert_eq!(resolve_length("+50%10em", 10.0), 105.0);
    assert_eq!(resolve_length("14px", 10.0), 14.0);
}

#[test]
fn test_unparseable_length_falls_back_to_base() {
    assert_eq!(parse_length("wide", 10.0), None);
    assert_eq!(resolve_length("wide", 10.0), 10.0);
    assert_eq!(resolve_length("10%0", 10.0), 10.0);
}

#[test]
fn test_hex_round_trip() {
    let code = ColorValue::new(255.0, 0.0, 0.0, 1.0).to_colorcode();
    assert_eq!(code.as_str(), "#ff0000");
    assert_eq!(ColorCode::new("#ff0000").to_rgba().unwrap().red, 255.0);
    let back = code.to_rgba().unwrap();
    assert_eq!(back, ColorValue::new(255.0, 0.0, 0.0, 1.0));
}

#[test]
fn test_value_fragments() {
    let value = CssValue::new("3px dotted #00ff00");
    let fragments = value.fragments();
    assert_eq!(fragments[0].as_px(), Some(3.0));
    assert_eq!(fragments[1].as_token(), "dotted");
    assert_eq!(fragments[2].as_color(), Some(ColorValue::new(0.0, 255.0, 0.0, 1.0)));
}

#[test]
fn test_content_rect_with_margins_and_borders() {
    let side = BorderSide::new(2.0, BorderStyle::Solid, ColorValue::BLACK);
    let mut metrics = BoxMetrics::new(BorderConfig {
        default: side,
        bottom: Some(BorderSide::NONE),
        ..BorderConfig::default()
    });
    metrics.margin.left = 5.0;
    metrics.margin.top = 1.0;

    let rect = metrics.content_rect(Point::new(0.0, 0.0), Size::new(50.0, 20.0));
    assert_eq!(rect, Rect::new(7.0, 3.0, 41.0, 17.0));
}
