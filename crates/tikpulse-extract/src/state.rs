//! Embedded page-state location.
//!
//! TikTok pages ship their render-time data model as a JSON blob inside a
//! named `<script>` element. The container has been renamed over time, and
//! older pages assign it inline (`window['SIGI_STATE'] = {...};`), so the
//! locator tries each known id in priority order and tolerates sloppy
//! boundaries around the JSON text.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

/// Known state-container ids, highest priority first.
pub const STATE_CONTAINER_IDS: &[&str] = &["SIGI_STATE", "__UNIVERSAL_DATA_FOR_REHYDRATION__"];

static SCRIPT_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)</script\s*>").expect("valid regex"));

static MARKUP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!--|-->|<!\[CDATA\[|\]\]>").expect("valid regex"));

static TAG_FRAGMENT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"</?[a-zA-Z][^>]*>").expect("valid regex"));

/// Find and parse the first embedded state object named by `candidate_ids`.
///
/// Ids are tried in order; for each id the `<script id="...">` form is tried
/// before the inline `window['...'] =` form. A container that is present but
/// cannot be parsed (even after stripping tag fragments) is skipped and the
/// next candidate is tried. Only JSON objects count as state.
#[must_use]
pub fn locate_embedded_state(html: &str, candidate_ids: &[&str]) -> Option<Value> {
    for id in candidate_ids {
        let escaped = regex::escape(id);
        let openers = [
            // The id must end at a quote, whitespace or the tag's `>`.
            format!(r#"(?is)<script\b[^>]*\bid\s*=\s*["']?{escaped}(?:["'][^>]*|\s[^>]*)?>"#),
            format!(r#"(?s)window\s*(?:\[\s*["']{escaped}["']\s*\]|\.{escaped})\s*=\s*"#),
        ];

        for opener in &openers {
            let Ok(re) = Regex::new(opener) else {
                continue;
            };
            let Some(m) = re.find(html) else {
                continue;
            };

            let rest = &html[m.end()..];
            let span = match SCRIPT_END_RE.find(rest) {
                Some(end) => &rest[..end.start()],
                None => rest,
            };

            if let Some(state) = parse_span(span) {
                tracing::debug!(container = %id, "located embedded state");
                return Some(state);
            }
            tracing::debug!(container = %id, "embedded state present but unparseable");
        }
    }
    None
}

/// Parse a located text span, retrying once with tag fragments removed.
fn parse_span(span: &str) -> Option<Value> {
    let cleaned = MARKUP_RE.replace_all(span, "");
    if let Some(value) = parse_object(&cleaned) {
        return Some(value);
    }
    let stripped = TAG_FRAGMENT_RE.replace_all(&cleaned, "");
    parse_object(&stripped)
}

fn parse_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let candidate = extract_balanced(&text[start..])
        .unwrap_or_else(|| text[start..].trim_end().trim_end_matches(';'));
    match serde_json::from_str::<Value>(candidate) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Return the shortest prefix of `s` that forms a balanced `{...}` or
/// `[...]` value, or `None` if it never closes.
///
/// String literals and escapes are respected. Only the bracket kind that
/// opened the value can close it at depth 0, so `{42]` is never accepted.
pub(crate) fn extract_balanced(s: &str) -> Option<&str> {
    let close = match s.chars().next()? {
        '{' => '}',
        '[' => ']',
        _ => return None,
    };
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escape = false;
    for (i, c) in s.char_indices() {
        if escape {
            escape = false;
            continue;
        }
        if in_string {
            match c {
                '\\' => escape = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '[' | '{' => depth += 1,
            '}' | ']' => {
                depth -= 1;
                if depth == 0 {
                    return (c == close).then(|| &s[..=i]);
                }
            }
            _ => {}
        }
    }
    None
}
