//! Length resolution against a base size.
//!
//! Lengths are plain numbers, `px`, `em`, or percentages. Percentages may be
//! combined with one arithmetic operand, either trailing the sign
//! (`+50%10em`: 50% of the base plus ten ems) or leading the percentage
//! (`2*50%`: two times 50% of the base).

use quire_common::warning::warn_once;

/// Resolve `text` to pixels against `base`, falling back to `base` when the
/// text is not a length or the arithmetic is undefined.
#[must_use]
pub fn resolve_length(text: &str, base: f64) -> f64 {
    parse_length(text, base).unwrap_or_else(|| {
        warn_once("CSS", &format!("'{}' is not a length, using {base}px", text.trim()));
        base
    })
}

/// Resolve `text` to pixels against `base`; `None` if it is not a length.
#[must_use]
pub fn parse_length(text: &str, base: f64) -> Option<f64> {
    let text = text.trim();
    if let Some(scale) = text.strip_suffix("em") {
        if let Some(n) = parse_number(scale) {
            return Some(n * base);
        }
        return if scale.contains('%') {
            percentage(scale, base)
        } else {
            None
        };
    }
    if text.contains('%') {
        return percentage(text, base);
    }
    if let Some(number) = text.strip_suffix("px") {
        return parse_number(number);
    }
    parse_number(text)
}

/// A finite decimal number, optionally signed.
#[must_use]
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn is_operator(c: char) -> bool {
    matches!(c, '+' | '-' | '*' | '/')
}

fn apply(lhs: f64, op: char, rhs: f64) -> Option<f64> {
    match op {
        '+' => Some(lhs + rhs),
        '-' => Some(lhs - rhs),
        '*' => Some(lhs * rhs),
        '/' if rhs != 0.0 => Some(lhs / rhs),
        _ => None,
    }
}

/// An arithmetic operand: `px` is absolute, `em` and bare numbers scale the
/// base.
fn operand(text: &str, base: f64) -> Option<f64> {
    let text = text.trim();
    if let Some(px) = text.strip_suffix("px") {
        return parse_number(px);
    }
    let scale = text.strip_suffix("em").unwrap_or(text);
    parse_number(scale).map(|n| n * base)
}

fn percentage(text: &str, base: f64) -> Option<f64> {
    let (head, tail) = text.split_once('%')?;
    let head = head.trim();
    let tail = tail.trim();

    if !tail.is_empty() {
        // "[op]pct%operand"
        let mut chars = head.chars();
        let op = chars.next().filter(|c| is_operator(*c))?;
        let scaled = parse_number(chars.as_str())? / 100.0 * base;
        return apply(scaled, op, operand(tail, base)?);
    }

    // Read right to left: percentage digits, then an optional operator and
    // its left operand.
    let digits_start = head
        .char_indices()
        .rev()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map_or(0, |(i, c)| i + c.len_utf8());
    let scaled = parse_number(&head[digits_start..])? / 100.0 * base;
    let rest = &head[..digits_start];
    let Some(op) = rest.chars().last() else {
        return Some(scaled);
    };
    if !is_operator(op) {
        return None;
    }
    let lhs = &rest[..rest.len() - op.len_utf8()];
    if lhs.trim().is_empty() {
        // A lone sign.
        return match op {
            '+' => Some(scaled),
            '-' => Some(-scaled),
            _ => None,
        };
    }
    apply(operand(lhs, base)?, op, scaled)
}
