//! Stylesheet parser module.

/// Line-based stylesheet parsing and rule registration.
pub mod stylesheet;

pub use stylesheet::{Declaration, RuleId, StyleRule, Stylesheet, StylesheetError, parse_rules};
