//! Best-effort component labels from authoring-tool comments.
//!
//! Each matcher inspects free text and returns a label only when its tool's
//! pattern is present and well-formed. Matchers never fail: a comment they do
//! not understand simply yields `None`.

/// A single comment-pattern matcher.
pub type LabelMatcher = fn(&str) -> Option<String>;

/// Property-comment matchers, tried in order; the first match wins.
pub const PROPERTY_LABEL_MATCHERS: [LabelMatcher; 3] = [femap_label, hypermesh_label, patran_label];

/// `$ Femap Property 1 : SKIN` → `SKIN` (last word of the comment).
pub fn femap_label(comment: &str) -> Option<String> {
    if !comment.contains("$ Femap Property") {
        return None;
    }
    comment.split_whitespace().last().map(str::to_string)
}

/// `$HMNAME PROP 1 "rib_3" 4` → `rib_3` (text between the first quotes).
pub fn hypermesh_label(comment: &str) -> Option<String> {
    if !comment.contains("$HMNAME PROP") {
        return None;
    }
    let start = comment.find("HMNAME PROP")?;
    let name = comment[start..].split('"').nth(1)?;
    non_empty(name)
}

/// `$ Elements and Element Properties for region : spar_web` → `spar_web`.
pub fn patran_label(comment: &str) -> Option<String> {
    if !comment.contains("$ Elements and Element Properties for region") {
        return None;
    }
    comment.split(':').nth(1).and_then(non_empty)
}

/// ICEM writes the family name on each element card instead of the property.
pub fn icem_element_label(comment: &str) -> Option<String> {
    if !comment.contains("Shell element data for family") {
        return None;
    }
    comment.split_whitespace().last().map(str::to_string)
}

/// Label derived from the property comment alone.
pub fn property_label(comment: &str) -> Option<String> {
    PROPERTY_LABEL_MATCHERS
        .iter()
        .find_map(|matcher| matcher(comment))
}

/// Fallback label for a property with no recognizable comment.
pub fn default_label(property_id: i64) -> String {
    format!("Property group {property_id}")
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
