//! Integration tests for selector evaluation over parsed markup.

use std::rc::Rc;

use quire_css::selector::structural::{
    empty, first_child, first_of_type, last_child, last_of_type, lang, not, nth_child,
    nth_last_child, nth_last_of_type, nth_of_type, only_child, only_of_type, root,
};
use quire_css::selector::{AttrOperator, Selector, evaluate_attribute};
use quire_markup::{Document, Element};

fn parse(source: &str) -> Document {
    Document::parse(source).unwrap()
}

fn first(doc: &Document) -> Rc<Element> {
    Rc::clone(&doc.elements()[0])
}

fn contents<'a>(elements: impl IntoIterator<Item = &'a Rc<Element>>) -> Vec<&'a str> {
    elements.into_iter().map(|e| e.content()).collect()
}

const LIST: &str = "\
<ul>
  <li>a</li>
  <li>b</li>
  <li>c</li>
</ul>
";

#[test]
fn test_nth_child_from_both_ends() {
    let doc = parse(LIST);
    let ul = first(&doc);
    assert_eq!(nth_child(&ul, 1).unwrap().content(), "a");
    assert_eq!(nth_child(&ul, 2).unwrap().content(), "b");
    assert_eq!(nth_last_child(&ul, 1).unwrap().content(), "c");
    assert_eq!(first_child(&ul).unwrap().content(), "a");
    assert_eq!(last_child(&ul).unwrap().content(), "c");
}

#[test]
fn test_nth_child_out_of_range() {
    let doc = parse(LIST);
    let ul = first(&doc);
    assert!(nth_child(&ul, 0).is_none());
    assert!(nth_child(&ul, 4).is_none());
    assert!(nth_last_child(&ul, 4).is_none());
}

#[test]
fn test_text_runs_are_not_counted() {
    let doc = parse("<div>\n  intro\n  <p>one</p>\n  <p>two</p>\n</div>\n");
    let div = first(&doc);
    assert_eq!(nth_child(&div, 1).unwrap().content(), "one");
}

#[test]
fn test_of_type_positions() {
    let doc = parse("<div>\n  <h1>t</h1>\n  <p>a</p>\n  <span>s</span>\n  <p>b</p>\n</div>\n");
    let div = first(&doc);
    assert_eq!(nth_of_type(&div, "p", 2).unwrap().content(), "b");
    assert_eq!(nth_last_of_type(&div, "p", 2).unwrap().content(), "a");
    assert_eq!(first_of_type(&div, "p").unwrap().content(), "a");
    assert_eq!(last_of_type(&div, "p").unwrap().content(), "b");
    assert!(nth_of_type(&div, "p", 3).is_none());
    assert_eq!(first_of_type(&div, "h1").unwrap().content(), "t");
}

#[test]
fn test_dash_match_attribute() {
    let doc = parse("<div>\n  <p lang=\"en-US\">x</p>\n  <p lang=\"english\">y</p>\n  <p lang=\"en\">z</p>\n</div>\n");
    let div = first(&doc);
    let found = evaluate_attribute(AttrOperator::DashMatch, "p", "lang", "en", &div);
    assert_eq!(contents(&found), vec!["x", "z"]);
}

#[test]
fn test_includes_attribute() {
    let doc = parse("<div>\n  <p class=\"a b c\">hit</p>\n  <p class=\"a bc\">miss</p>\n</div>\n");
    let div = first(&doc);
    let found = evaluate_attribute(AttrOperator::Includes, "*", "class", "b", &div);
    assert_eq!(contents(&found), vec!["hit"]);
}

#[test]
fn test_includes_needs_a_whole_token() {
    let doc = parse("<div>\n  <p class=\"a b c\">abc</p>\n</div>\n");
    let div = first(&doc);
    let found = evaluate_attribute(AttrOperator::Includes, "p", "class", "bc", &div);
    assert!(found.is_empty());
    let found = evaluate_attribute(AttrOperator::Includes, "p", "class", "b", &div);
    assert_eq!(contents(&found), vec!["abc"]);
}

#[test]
fn test_attribute_tag_filter_alternatives() {
    let doc = parse("<div title=\"t\">\n  <p title=\"t\">p</p>\n  <span title=\"t\">s</span>\n</div>\n");
    let div = first(&doc);
    let all = evaluate_attribute(AttrOperator::Any, "", "title", "", &div);
    assert_eq!(all.len(), 3);
    let some = evaluate_attribute(AttrOperator::Exact, "p span", "title", "t", &div);
    assert_eq!(contents(&some), vec!["p", "s"]);
}

#[test]
fn test_first_attribute_occurrence_is_compared() {
    let doc = parse("<div>\n  <p data-k=\"one\" data-k=\"two\">x</p>\n</div>\n");
    let div = first(&doc);
    assert_eq!(evaluate_attribute(AttrOperator::Exact, "p", "data-k", "one", &div).len(), 1);
    assert!(evaluate_attribute(AttrOperator::Exact, "p", "data-k", "two", &div).is_empty());
}

#[test]
fn test_only_of_type_collects_whole_subtree() {
    let doc = parse("<div>\n  <p>a</p>\n  <section>\n    <p>b</p>\n  </section>\n</div>\n");
    let div = first(&doc);
    let found = only_of_type(&div, "p");
    assert_eq!(contents(&found), vec!["a", "b"]);
    assert_eq!(only_of_type(&div, "div").len(), 1);
}

#[test]
fn test_only_child() {
    let doc = parse("<div>\n  <p>alone</p>\n</div>\n<ul>\n  <li>a</li>\n  <li>b</li>\n</ul>\n");
    let div = Rc::clone(&doc.elements()[0]);
    let ul = Rc::clone(&doc.elements()[1]);
    assert!(only_child(&div.children()[0]));
    assert!(!only_child(&ul.children()[0]));
    assert!(!only_child(&div));
}

#[test]
fn test_empty() {
    let doc = parse("<div>\n  <p></p>\n  <p><!-- note --></p>\n  <br>\n  <p>x</p>\n</div>\n");
    let div = first(&doc);
    let kids = div.element_children();
    assert!(empty(&kids[0], "p"));
    assert!(empty(&kids[1], "p"));
    assert!(empty(&kids[2], "p"));
    assert!(!empty(&kids[3], "p"));
    assert!(!empty(&kids[0], "span"));
}

#[test]
fn test_lang_and_not() {
    let doc = parse("<div>\n  <p lang=\"fr\">a</p>\n  <p lang=\"de\">b</p>\n  <p>c</p>\n</div>\n");
    let div = first(&doc);
    assert_eq!(contents(&lang(&div, "p", "fr")), vec!["a"]);

    let not_fr = not(&div, "p", "[lang=fr]").unwrap();
    assert_eq!(contents(&not_fr), vec!["b", "c"]);

    let not_p = not(&div, "", "p").unwrap();
    assert_eq!(not_p.len(), 1);
    assert!(Element::same(not_p.first().unwrap(), &div));

    assert!(not(&div, "p", "[=x]").is_err());
}

#[test]
fn test_root() {
    let doc = parse(LIST);
    let ul = first(&doc);
    let li = Rc::clone(&ul.children()[2]);
    assert!(Element::same(&root(&li), &ul));
}

#[test]
fn test_rule_selector_with_predicates() {
    let doc = parse("<ul class=\"menu\">\n  <li class=\"item\">a</li>\n  <li class=\"item\" lang=\"en-GB\">b</li>\n  <li class=\"item\">c</li>\n</ul>\n");

    let second = Selector::parse(".item li:nth-child(2)").unwrap();
    assert_eq!(contents(&second.select(&doc)), vec!["b"]);

    let english = Selector::parse(".item li[lang|=en]").unwrap();
    assert_eq!(contents(&english.select(&doc)), vec!["b"]);

    let last = Selector::parse(".item li:last-of-type:not([lang])").unwrap();
    assert_eq!(contents(&last.select(&doc)), vec!["c"]);

    let root_menu = Selector::parse(".menu ul:root").unwrap();
    assert_eq!(root_menu.select(&doc).len(), 1);
}

#[test]
fn test_top_level_siblings_for_parentless_elements() {
    let doc = parse("<p>a</p>\n<p>b</p>\n");
    let second = Selector::parse(".x p:nth-child(2)").unwrap();
    assert!(second.select(&doc).is_empty());

    let bare = Selector::parse("p:nth-child(2)");
    assert!(bare.is_ok());
    assert_eq!(contents(&bare.unwrap().select(&doc)), vec!["b"]);
}
