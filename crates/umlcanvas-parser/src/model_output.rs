//! Recovering a JSON object from a language model's text reply.

use log::debug;
use serde_json::Value;
use umlcanvas_core::semantic::DraftDiagram;

use crate::{error::ModelOutputError, normalize};

/// Removes markdown code fences (```` ```json ```` and ```` ``` ````) and
/// surrounding whitespace.
///
/// ```
/// # use umlcanvas_parser::strip_code_fences;
/// assert_eq!(strip_code_fences("```json\n{\"a\": 1}\n```"), "{\"a\": 1}");
/// assert_eq!(strip_code_fences("  {}  "), "{}");
/// ```
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Returns the first balanced `{...}` block of `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not count
/// toward the nesting depth. Returns `None` when no `{` appears or the first
/// one is never closed.
///
/// ```
/// # use umlcanvas_parser::extract_balanced_object;
/// let reply = r#"Sure! Here it is: {"name": "a}b", "x": {"y": 1}} Hope it helps"#;
/// assert_eq!(
///     extract_balanced_object(reply),
///     Some(r#"{"name": "a}b", "x": {"y": 1}}"#)
/// );
/// assert_eq!(extract_balanced_object("no json here"), None);
/// ```
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    let end = start + offset + ch.len_utf8();
                    return Some(&text[start..end]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parses the JSON object contained in a model reply.
///
/// Fences are stripped first; if the remaining text is not JSON, the first
/// balanced `{...}` block is tried instead.
///
/// # Errors
///
/// [`ModelOutputError::InvalidJson`] carrying the original text when both
/// attempts fail.
pub fn parse_model_json(text: &str) -> Result<Value, ModelOutputError> {
    let cleaned = strip_code_fences(text);

    let value = match serde_json::from_str::<Value>(&cleaned) {
        Ok(value) => value,
        Err(direct_err) => {
            debug!(err:% = direct_err; "Model output is not plain JSON, extracting object");
            extract_balanced_object(&cleaned)
                .and_then(|candidate| serde_json::from_str::<Value>(candidate).ok())
                .ok_or_else(|| ModelOutputError::InvalidJson {
                    raw: text.to_string(),
                })?
        }
    };

    if value.is_object() {
        Ok(value)
    } else {
        Err(ModelOutputError::NotAnObject {
            raw: text.to_string(),
        })
    }
}

/// Parses and normalizes a model reply into a draft diagram.
///
/// # Errors
///
/// Any [`ModelOutputError`]: unparseable text, a non-object value, or a
/// payload without classes.
pub fn parse_model_output(text: &str) -> Result<DraftDiagram, ModelOutputError> {
    let value = parse_model_json(text)?;
    normalize(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fenced_reply() {
        let reply = "```json\n{\"classes\": [{\"name\": \"Persona\"}]}\n```";
        let draft = parse_model_output(reply).unwrap();
        assert_eq!(draft.classes[0].name, "Persona");
    }

    #[test]
    fn test_parse_reply_with_prose() {
        let reply = "Here is your diagram:\n{\"classes\": [{\"name\": \"A\"}]}\nLet me know!";
        let draft = parse_model_output(reply).unwrap();
        assert_eq!(draft.classes.len(), 1);
    }

    #[test]
    fn test_invalid_reply_keeps_raw_text() {
        let reply = "I cannot draw that";
        let err = parse_model_output(reply).unwrap_err();
        assert_eq!(
            err,
            ModelOutputError::InvalidJson {
                raw: reply.to_string()
            }
        );
        assert_eq!(err.raw(), Some(reply));
    }

    #[test]
    fn test_array_reply_is_rejected() {
        let err = parse_model_json("[1, 2, 3]").unwrap_err();
        assert!(matches!(err, ModelOutputError::NotAnObject { .. }));
    }

    #[test]
    fn test_unclosed_object() {
        assert_eq!(extract_balanced_object("{\"a\": {\"b\": 1}"), None);
    }

    #[test]
    fn test_escaped_quote_inside_string() {
        let text = r#"{"note": "say \"}\" twice"} trailing"#;
        assert_eq!(
            extract_balanced_object(text),
            Some(r#"{"note": "say \"}\" twice"}"#)
        );
    }
}

#[cfg(test)]
mod proptest_tests {
    use proptest::prelude::*;

    use super::*;

    proptest! {
        /// Any valid object survives arbitrary prose around it.
        #[test]
        fn object_found_inside_prose(
            prefix in "[a-zA-Z .,!:]{0,40}",
            suffix in "[a-zA-Z .,!:]{0,40}",
            name in "[a-zA-Z]{1,12}",
        ) {
            let object = format!("{{\"classes\": [{{\"name\": \"{name}\"}}]}}");
            let text = format!("{prefix}{object}{suffix}");
            prop_assert_eq!(extract_balanced_object(&text), Some(object.as_str()));
        }

        #[test]
        fn extraction_never_panics(text in ".{0,200}") {
            let _ = extract_balanced_object(&text);
            let _ = parse_model_json(&text);
        }
    }
}
