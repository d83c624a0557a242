//! Integration tests for stylesheet parsing and rule registration.

use std::fs;

use quire_css::{RuleId, Stylesheet, StylesheetError, parse_rules};

const SHEET: &str = "\
/* page styles */
.page body {
  margin: 4px;
  color: #333333;
}

.page .card div
{
  border: 1px solid black;
}
.card p { font-size: 2em; }
";

#[test]
fn test_parse_blocks_in_order() {
    let rules = parse_rules(SHEET).unwrap();
    assert_eq!(rules.len(), 3);

    assert_eq!(rules[0].selector.classes, vec!["page"]);
    assert_eq!(rules[0].selector.tag.as_deref(), Some("body"));
    assert_eq!(rules[0].line, 2);
    assert_eq!(rules[0].declarations.len(), 2);
    assert_eq!(rules[0].declaration("margin").unwrap().value.as_str(), "4px");

    assert_eq!(rules[1].selector.classes, vec!["page", "card"]);
    assert_eq!(rules[1].declaration("border").unwrap().value.as_str(), "1px solid black");

    assert_eq!(rules[2].selector.tag.as_deref(), Some("p"));
    assert_eq!(rules[2].declaration("font-size").unwrap().value.as_str(), "2em");
}

#[test]
fn test_first_declaration_of_a_key_wins_within_a_rule() {
    let rules = parse_rules(".a {\n  color: red;\n  color: blue;\n}\n").unwrap();
    assert_eq!(rules[0].declaration("color").unwrap().value.as_str(), "red");
}

#[test]
fn test_line_without_pair_is_skipped() {
    let rules = parse_rules(".a {\n  color red\n  margin: 1px;\n}\n").unwrap();
    assert_eq!(rules[0].declarations.len(), 1);
    assert_eq!(rules[0].declarations[0].key, "margin");
}

#[test]
fn test_multiline_comment() {
    let rules = parse_rules("/* one\n.not-a-rule {\n*/\n.a {\n}\n").unwrap();
    assert_eq!(rules.len(), 1);
    assert_eq!(rules[0].line, 4);
}

#[test]
fn test_selector_inside_open_block_is_unterminated() {
    let err = parse_rules(".a {\n  color: red;\n.b {\n}\n").unwrap_err();
    assert!(matches!(err, StylesheetError::UnterminatedBlock { line: 1, .. }));
}

#[test]
fn test_block_open_at_end_is_unterminated() {
    let err = parse_rules(".a {\n  color: red;\n").unwrap_err();
    match err {
        StylesheetError::UnterminatedBlock { line, selector } => {
            assert_eq!(line, 1);
            assert_eq!(selector, ".a");
        }
        other => panic!("unexpected error {other}"),
    }
}

#[test]
fn test_malformed_selector() {
    let err = parse_rules(".a p span {\n}\n").unwrap_err();
    assert!(matches!(err, StylesheetError::MalformedSelector { line: 1, .. }));
}

#[test]
fn test_merge_links_shared_classes() {
    let mut sheet = Stylesheet::parse(".a {\n}\n.a .b {\n}\n").unwrap();
    assert_eq!(sheet.rule(RuleId(0)).unwrap().inheriting(), &[RuleId(1)]);
    assert_eq!(sheet.rule(RuleId(1)).unwrap().inherits(), &[RuleId(0)]);

    let links = sheet.merge_source(".b {\n}\n.c {\n}\n", None).unwrap();
    assert_eq!(links, 1);
    assert_eq!(sheet.len(), 4);
    assert_eq!(sheet.rule(RuleId(1)).unwrap().inheriting(), &[RuleId(2)]);
    assert!(sheet.rule(RuleId(3)).unwrap().inherits().is_empty());
}

#[test]
fn test_merge_links_rules_within_one_batch() {
    let sheet = Stylesheet::parse(".x {\n}\n.x {\n}\n.x {\n}\n").unwrap();
    assert_eq!(sheet.rule(RuleId(0)).unwrap().inheriting(), &[RuleId(1), RuleId(2)]);
    assert_eq!(sheet.rule(RuleId(2)).unwrap().inherits(), &[RuleId(0), RuleId(1)]);
}

#[test]
fn test_failed_merge_leaves_sheet_untouched() {
    let mut sheet = Stylesheet::parse(".a {\n}\n").unwrap();
    assert!(sheet.merge_source(".b {\n", None).is_err());
    assert_eq!(sheet.len(), 1);
}

#[test]
fn test_load_records_source() {
    let dir = std::env::temp_dir().join(format!("quire-css-test-{}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join("site.qss");
    fs::write(&path, ".a p {\n  color: red;\n}\n").unwrap();

    let mut sheet = Stylesheet::new();
    assert_eq!(sheet.load(&path).unwrap(), 0);
    assert_eq!(sheet.sources(), &[path.clone()]);
    assert_eq!(sheet.len(), 1);

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn test_load_missing_file() {
    let mut sheet = Stylesheet::new();
    let err = sheet.load("/no/such/sheet.qss").unwrap_err();
    assert!(matches!(err, StylesheetError::Io { .. }));
    assert!(sheet.sources().is_empty());
}
