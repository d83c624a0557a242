//! Integration tests for cascade resolution and computed element styles.

use quire_css::cascade::candidates;
use quire_css::{
    BorderStyle, ColorValue, FontDescriptor, FontFamily, FontStyle, RuleId, StyleDump, Stylesheet,
    compute_styles, resolve,
};
use quire_markup::Document;

#[test]
fn test_value_reached_through_a_chain_of_shared_classes() {
    // A shares `.one` with B, B shares `.two` with C; only C declares the key.
    let sheet = Stylesheet::parse(
        ".one p {\n}\n\
         .one .two p {\n}\n\
         .two .three p {\n  color: green;\n}\n",
    )
    .unwrap();
    let a = RuleId(0);
    assert!(sheet.rule(a).unwrap().declaration("color").is_none());
    assert_eq!(resolve(&sheet, a, "color").unwrap().value.as_str(), "green");
}

#[test]
fn test_unrelated_rule_is_not_reached() {
    let sheet = Stylesheet::parse(".one p {\n}\n.two p {\n  color: green;\n}\n").unwrap();
    assert!(resolve(&sheet, RuleId(0), "color").is_none());
    assert!(candidates(&sheet, RuleId(0), "color").is_empty());
}

#[test]
fn test_compute_styles_matches_classes_and_tags() {
    let doc = Document::parse(
        "<div class=\"card\">\n  <p class=\"card note\">hello</p>\n  <span class=\"note\">x</span>\n</div>\n",
    )
    .unwrap();
    let sheet = Stylesheet::parse(".card div {\n  margin: 2px;\n}\n.note p {\n  color: red;\n}\n").unwrap();

    let styled = compute_styles(&doc, &sheet);
    let tags: Vec<&str> = styled.iter().map(|s| s.element.tag_name()).collect();
    assert_eq!(tags, vec!["div", "p", "span"]);

    assert_eq!(styled[0].rules, vec![RuleId(0)]);
    assert_eq!(styled[1].rules, vec![RuleId(1)]);
    assert!(styled[2].rules.is_empty());

    let p = styled[1].style(&sheet);
    assert_eq!(p.color("color"), Some(ColorValue::new(255.0, 0.0, 0.0, 1.0)));
    // `.card div` and `.note p` share no class, so the margin does not leak.
    assert!(p.value("margin").is_none());
}

#[test]
fn test_font_assembled_from_parts() {
    let doc = Document::parse("<h1 class=\"title\">Head</h1>\n").unwrap();
    let sheet = Stylesheet::parse(
        ".title h1 {\n  font-family: sans-serif, DejaVu Sans;\n  font-size: 150%;\n  font-style: bold;\n  color: #0000ff;\n}\n",
    )
    .unwrap();
    let styled = compute_styles(&doc, &sheet);
    let style = styled[0].style(&sheet);

    let declaration = style.font_declaration().unwrap();
    assert_eq!(declaration.value.as_str(), "bold 150% sans-serif, DejaVu Sans");

    let parent = FontDescriptor {
        size: 10.0,
        ..FontDescriptor::default()
    };
    let font = style.font(&parent);
    assert_eq!(font.size, 15.0);
    assert_eq!(font.family, FontFamily::SansSerif);
    assert_eq!(font.name, "DejaVu Sans");
    assert_eq!(font.style, FontStyle::Bold);
    assert_eq!(font.color, ColorValue::new(0.0, 0.0, 255.0, 1.0));
}

#[test]
fn test_font_without_declarations_is_inherited() {
    let doc = Document::parse("<p>x</p>\n").unwrap();
    let sheet = Stylesheet::new();
    let styled = compute_styles(&doc, &sheet);
    let style = styled[0].style(&sheet);
    assert!(style.font_declaration().is_none());
    assert_eq!(style.font(&FontDescriptor::default()), FontDescriptor::default());
}

#[test]
fn test_box_metrics_from_declarations() {
    let doc = Document::parse("<div class=\"box\">x</div>\n").unwrap();
    let sheet = Stylesheet::parse(
        ".box div {\n  border: 2px solid red;\n  border-left: 5px dashed;\n  margin: 1em 4px;\n  margin-bottom: 0;\n}\n",
    )
    .unwrap();
    let styled = compute_styles(&doc, &sheet);
    let metrics = styled[0].style(&sheet).box_metrics(10.0);

    assert_eq!(metrics.top.width, 2.0);
    assert_eq!(metrics.top.style, BorderStyle::Solid);
    assert_eq!(metrics.left.width, 5.0);
    assert_eq!(metrics.left.style, BorderStyle::Dashed);
    assert_eq!(metrics.left.color, ColorValue::new(255.0, 0.0, 0.0, 1.0));
    assert_eq!(metrics.margin.top, 10.0);
    assert_eq!(metrics.margin.right, 4.0);
    assert_eq!(metrics.margin.bottom, 0.0);
}

#[test]
fn test_style_dump() {
    let doc = Document::parse("<p class=\"a\">x</p>\n").unwrap();
    let sheet = Stylesheet::parse(".a p {\n  color: red;\n}\n.a {\n  margin: 1px;\n}\n").unwrap();
    let styled = compute_styles(&doc, &sheet);
    let dump = StyleDump::new(&styled[0], &sheet);
    assert_eq!(dump.tag, "p");
    assert_eq!(dump.selectors, vec![".a p", ".a"]);
    assert_eq!(
        dump.declarations,
        vec![
            ("color".to_string(), "red".to_string()),
            ("margin".to_string(), "1px".to_string()),
        ]
    );
    let json = serde_json::to_string(&dump).unwrap();
    assert!(json.contains("\"tag\":\"p\""));
}
