//! Structured advice reports returned by the chat model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AdviceError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdviceItem {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub details: String,
}

impl AdviceItem {
    pub fn new(title: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            details: details.into(),
        }
    }
}

/// A model-written report. `analysis` and `predictions` are free-form
/// objects whose keys depend on the prompt.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdviceReport {
    #[serde(default)]
    pub analysis: Value,
    #[serde(default)]
    pub advice: Vec<AdviceItem>,
    #[serde(default)]
    pub predictions: Value,
}

/// Parse a model reply into an [`AdviceReport`].
///
/// Markdown code fences and any prose around the outermost JSON object are
/// ignored.
///
/// # Errors
///
/// Returns [`AdviceError::Parse`] when no JSON object can be decoded.
pub fn parse_report(content: &str) -> Result<AdviceReport, AdviceError> {
    let body = json_object_span(strip_code_fences(content))
        .ok_or_else(|| AdviceError::Parse("reply contains no JSON object".to_string()))?;
    serde_json::from_str(body).map_err(|e| AdviceError::Parse(e.to_string()))
}

fn strip_code_fences(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    // Drop an optional language tag on the opening fence line.
    let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}

fn json_object_span(content: &str) -> Option<&str> {
    let start = content.find('{')?;
    let end = content.rfind('}')?;
    (end > start).then(|| &content[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPLY: &str = r#"{"analysis":{"hook":"fort"},"advice":[{"title":"Hook","details":"3 secondes"}],"predictions":{"targetER":"7.8%"}}"#;

    #[test]
    fn parses_plain_json() {
        let report = parse_report(REPLY).unwrap();
        assert_eq!(report.analysis["hook"], "fort");
        assert_eq!(report.advice, vec![AdviceItem::new("Hook", "3 secondes")]);
        assert_eq!(report.predictions["targetER"], "7.8%");
    }

    #[test]
    fn tolerates_code_fences_and_prose() {
        let fenced = format!("```json\n{REPLY}\n```");
        assert_eq!(parse_report(&fenced).unwrap(), parse_report(REPLY).unwrap());

        let chatty = format!("Voici le rapport :\n{REPLY}\nBonne chance !");
        assert_eq!(parse_report(&chatty).unwrap().advice.len(), 1);
    }

    #[test]
    fn missing_sections_default() {
        let report = parse_report(r#"{"advice":[{"title":"Seul"}]}"#).unwrap();
        assert!(report.analysis.is_null());
        assert_eq!(report.advice[0].details, "");
    }

    #[test]
    fn rejects_non_json() {
        assert!(matches!(
            parse_report("désolé, je ne peux pas"),
            Err(AdviceError::Parse(_))
        ));
        assert!(matches!(parse_report("{not json}"), Err(AdviceError::Parse(_))));
    }
}
