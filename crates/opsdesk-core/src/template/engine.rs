//! Template variable substitution.
//!
//! Resolution is exact-token text replacement, not a template language:
//! unknown `{{...}}` tokens pass through verbatim so the agent sees them in
//! the composer. This also keeps `resolve` idempotent, which matters
//! because it runs on every keystroke.

use once_cell::sync::Lazy;
use regex::Regex;

use super::model::TemplateContext;

/// Matches any `{{...}}` token, known or not.
static PLACEHOLDER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\{\{([a-zA-Z0-9_]+)\}\}").expect("placeholder pattern is valid"));

/// The placeholders `resolve` knows how to fill.
pub const KNOWN_PLACEHOLDERS: [&str; 3] = ["order_id", "customer_name", "ticket_id"];

/// Resolves recognized placeholders in `template` against `ctx`.
///
/// Every occurrence of a resolved placeholder is replaced; replacement is
/// order-independent. Placeholders whose context field is absent, and any
/// unrecognized `{{...}}` token, are left verbatim.
///
/// Idempotence holds as long as ctx values contain no `{{...}}` substrings
/// of their own; that precondition is documented, not enforced.
pub fn resolve(template: &str, ctx: &TemplateContext) -> String {
    let mut out = template.to_string();
    for (token, value) in [
        ("{{order_id}}", ctx.order_id.as_deref()),
        ("{{customer_name}}", ctx.customer_name.as_deref()),
        ("{{ticket_id}}", ctx.ticket_id.as_deref()),
    ] {
        if let Some(value) = value {
            out = out.replace(token, value);
        }
    }
    out
}

/// Lists every `{{...}}` token in a template, in order of first
/// appearance, without duplicates. Used by the template editor.
pub fn placeholders(template: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for capture in PLACEHOLDER.captures_iter(template) {
        let name = capture[1].to_string();
        if !seen.contains(&name) {
            seen.push(name);
        }
    }
    seen
}

/// Lists the placeholders `resolve` would leave in place for the given
/// context: unknown tokens plus known tokens whose field is absent.
pub fn unresolved(template: &str, ctx: &TemplateContext) -> Vec<String> {
    placeholders(&resolve(template, ctx))
}
