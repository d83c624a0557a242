//! Cascade resolution and per-element styles.
//!
//! A property is looked up on a rule's own declarations first. If the rule
//! does not declare it, the rules that inherit from it (later rules sharing
//! a class) are searched breadth-first, and the first declaration found
//! wins. There is no specificity: registration order is the only
//! tie-break.

use std::collections::{HashSet, VecDeque};
use std::rc::Rc;

use serde::Serialize;

use quire_markup::{Document, Element};

use crate::layout::BoxMetrics;
use crate::parser::{Declaration, RuleId, Stylesheet};
use crate::values::{ColorValue, CssValue, FontDescriptor};

/// Every declaration of `key` reachable from `rule`, in search order: the
/// rule itself, then its inheriting rules breadth-first. Each rule is
/// visited once.
#[must_use]
pub fn candidates<'a>(sheet: &'a Stylesheet, rule: RuleId, key: &str) -> Vec<(RuleId, &'a Declaration)> {
    let mut found = Vec::new();
    let mut visited = HashSet::from([rule]);
    let mut queue = VecDeque::from([rule]);

    while let Some(id) = queue.pop_front() {
        let Some(current) = sheet.rule(id) else {
            continue;
        };
        if let Some(declaration) = current.declaration(key) {
            found.push((id, declaration));
        }
        for next in current.inheriting() {
            if visited.insert(*next) {
                queue.push_back(*next);
            }
        }
    }
    found
}

/// The declaration of `key` that applies for `rule`: its own if present,
/// otherwise the first found among the rules inheriting from it.
#[must_use]
pub fn resolve<'a>(sheet: &'a Stylesheet, rule: RuleId, key: &str) -> Option<&'a Declaration> {
    let (from, declaration) = candidates(sheet, rule, key).into_iter().next()?;
    #[cfg(feature = "cascade-trace")]
    if from != rule {
        eprintln!("[cascade] {key}: rule {} takes '{}' from rule {}", rule.0, declaration.value, from.0);
    }
    #[cfg(not(feature = "cascade-trace"))]
    let _ = from;
    Some(declaration)
}

/// Rules whose selector matches `element`, in registration order.
#[must_use]
pub fn matching_rules(sheet: &Stylesheet, element: &Rc<Element>, top_level: &[Rc<Element>]) -> Vec<RuleId> {
    sheet
        .ids()
        .filter(|id| {
            sheet
                .rule(*id)
                .is_some_and(|rule| rule.selector.matches(element, top_level))
        })
        .collect()
}

/// An element with the rules that match it.
#[derive(Debug, Clone)]
pub struct StyledElement {
    /// The element.
    pub element: Rc<Element>,
    /// Matching rules in registration order.
    pub rules: Vec<RuleId>,
}

impl StyledElement {
    /// Style lookups for this element against `sheet`.
    #[must_use]
    pub fn style<'a>(&self, sheet: &'a Stylesheet) -> ElementStyle<'a> {
        ElementStyle::new(sheet, self.rules.clone())
    }
}

/// Match every tagged element of `document` against `sheet`, in document
/// order.
#[must_use]
pub fn compute_styles(document: &Document, sheet: &Stylesheet) -> Vec<StyledElement> {
    document
        .tagged_elements()
        .into_iter()
        .map(|element| StyledElement {
            rules: matching_rules(sheet, &element, document.elements()),
            element,
        })
        .collect()
}

/// Property lookups for one element: each matching rule is resolved in
/// order and the first that yields a declaration wins.
#[derive(Debug, Clone)]
pub struct ElementStyle<'a> {
    sheet: &'a Stylesheet,
    rules: Vec<RuleId>,
}

impl<'a> ElementStyle<'a> {
    /// Lookups over `rules` of `sheet`.
    #[must_use]
    pub const fn new(sheet: &'a Stylesheet, rules: Vec<RuleId>) -> Self {
        Self { sheet, rules }
    }

    /// Matching rules.
    #[must_use]
    pub fn rules(&self) -> &[RuleId] {
        &self.rules
    }

    /// The declaration of `key` that applies.
    #[must_use]
    pub fn declaration(&self, key: &str) -> Option<&'a Declaration> {
        self.rules
            .iter()
            .find_map(|rule| resolve(self.sheet, *rule, key))
    }

    /// The raw value of `key`.
    #[must_use]
    pub fn value(&self, key: &str) -> Option<&'a CssValue> {
        self.declaration(key).map(|d| &d.value)
    }

    /// `key` as a length against `base`.
    #[must_use]
    pub fn length(&self, key: &str, base: f64) -> Option<f64> {
        self.value(key).and_then(|v| v.as_length(base))
    }

    /// `key` as a color.
    #[must_use]
    pub fn color(&self, key: &str) -> Option<ColorValue> {
        self.value(key).and_then(CssValue::as_color)
    }

    /// `font-style`, `font-size`, and `font-family`, in that order, joined
    /// into one `font` declaration. `None` if none of them applies.
    #[must_use]
    pub fn font_declaration(&self) -> Option<Declaration> {
        let parts: Vec<&str> = ["font-style", "font-size", "font-family"]
            .iter()
            .filter_map(|key| self.value(key).map(CssValue::as_str))
            .collect();
        (!parts.is_empty()).then(|| Declaration::new("font", &parts.join(" ")))
    }

    /// The font for this element, starting from its parent's.
    #[must_use]
    pub fn font(&self, inherited: &FontDescriptor) -> FontDescriptor {
        let mut font = self
            .font_declaration()
            .map_or_else(|| inherited.clone(), |d| FontDescriptor::parse(d.value.as_str(), inherited));
        if let Some(color) = self.color("color") {
            font.color = color;
        }
        font
    }

    /// Borders and margins, lengths resolved against `base`.
    #[must_use]
    pub fn box_metrics(&self, base: f64) -> BoxMetrics {
        BoxMetrics::from_declarations(|key| self.value(key), base)
    }
}

/// Serializable summary of the styles applied to one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StyleDump {
    /// Tag name.
    pub tag: String,
    /// Source line.
    pub line: usize,
    /// Selectors of the matching rules.
    pub selectors: Vec<String>,
    /// Resolved `(key, value)` pairs for every key any matching or
    /// inheriting rule declares, sorted by key.
    pub declarations: Vec<(String, String)>,
}

impl StyleDump {
    /// Summarize `styled` against `sheet`.
    #[must_use]
    pub fn new(styled: &StyledElement, sheet: &Stylesheet) -> Self {
        let style = styled.style(sheet);
        let mut keys: Vec<&str> = styled
            .rules
            .iter()
            .flat_map(|id| reachable_keys(sheet, *id))
            .collect();
        keys.sort_unstable();
        keys.dedup();

        Self {
            tag: styled.element.tag_name().to_string(),
            line: styled.element.line(),
            selectors: styled
                .rules
                .iter()
                .filter_map(|id| sheet.rule(*id))
                .map(|rule| rule.selector.text.clone())
                .collect(),
            declarations: keys
                .into_iter()
                .filter_map(|key| style.value(key).map(|v| (key.to_string(), v.to_string())))
                .collect(),
        }
    }
}

/// Keys declared by `rule` or any rule inheriting from it.
fn reachable_keys(sheet: &Stylesheet, rule: RuleId) -> Vec<&str> {
    let mut keys = Vec::new();
    let mut visited = HashSet::from([rule]);
    let mut queue = VecDeque::from([rule]);
    while let Some(id) = queue.pop_front() {
        let Some(current) = sheet.rule(id) else {
            continue;
        };
        keys.extend(current.declarations.iter().map(|d| d.key.as_str()));
        queue.extend(current.inheriting().iter().copied().filter(|next| visited.insert(*next)));
    }
    keys
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_own_declaration_wins() {
        let sheet = Stylesheet::parse(".a {\n  color: red;\n}\n.a .b {\n  color: blue;\n}\n").unwrap();
        let found = resolve(&sheet, RuleId(0), "color").unwrap();
        assert_eq!(found.value.as_str(), "red");
    }

    #[test]
    fn test_breadth_first_order() {
        // 0 -> 1, 0 -> 2, 1 -> 3; both 2 and 3 declare the key.
        let sheet = Stylesheet::parse(
            ".a .x {\n}\n.a .y {\n}\n.a {\n  k: from-2;\n}\n.y {\n  k: from-3;\n}\n",
        )
        .unwrap();
        let found = candidates(&sheet, RuleId(0), "k");
        let ids: Vec<RuleId> = found.iter().map(|(id, _)| *id).collect();
        assert_eq!(ids, vec![RuleId(2), RuleId(3)]);
        assert_eq!(resolve(&sheet, RuleId(0), "k").unwrap().value.as_str(), "from-2");
    }

    #[test]
    fn test_diamond_visits_each_rule_once() {
        let sheet = Stylesheet::parse(".a .b {\n}\n.a {\n}\n.b {\n}\n.a .b {\n  k: v;\n}\n").unwrap();
        assert_eq!(candidates(&sheet, RuleId(0), "k").len(), 1);
    }

    #[test]
    fn test_missing_key() {
        let sheet = Stylesheet::parse(".a {\n  color: red;\n}\n").unwrap();
        assert!(resolve(&sheet, RuleId(0), "margin").is_none());
        assert!(resolve(&sheet, RuleId(9), "color").is_none());
    }
}
