//! Event interpreter for the chat stream wire format.
//!
//! Each record is one line: the `data: ` marker followed by a JSON object
//! with optional fields `content`, `done`, `show_lead_form`, and `error`.
//! Lines without the marker (blank keep-alives, comments) are ignored.

use ac_protocol::StreamEvent;
use serde::Deserialize;

const DATA_PREFIX: &str = "data: ";

/// One decoded wire record. All fields are optional on the wire.
#[derive(Debug, Default, Deserialize)]
struct RawRecord {
    content: Option<String>,
    done: Option<bool>,
    show_lead_form: Option<bool>,
    error: Option<String>,
}

/// Interpret one decoded line.
///
/// Returns `None` for keep-alives, records with no recognized field, and
/// chunk-boundary fragments. A parse failure is indistinguishable from a
/// record severed mid-token by a chunk boundary, so the line is dropped
/// unless a complete `error` field value was already visible in the raw
/// text, in which case that error is surfaced.
pub fn interpret_line(line: &str) -> Option<StreamEvent> {
    let payload = line.strip_prefix(DATA_PREFIX)?;

    match serde_json::from_str::<RawRecord>(payload) {
        Ok(record) => interpret_record(record),
        Err(err) => {
            if let Some(message) = extract_complete_error(payload) {
                return Some(StreamEvent::Error(message));
            }
            tracing::debug!(%err, "ignoring unparseable stream line");
            None
        }
    }
}

/// Map a parsed record to at most one event.
///
/// Precedence is `error` over `done` over `content`: an error ends the turn
/// no matter what else the record carries, and the producer never coalesces
/// a delta into the terminal record.
fn interpret_record(record: RawRecord) -> Option<StreamEvent> {
    if let Some(message) = record.error {
        return Some(StreamEvent::Error(message));
    }
    if record.done == Some(true) {
        return Some(StreamEvent::Done {
            show_lead_form: record.show_lead_form.unwrap_or(false),
        });
    }
    record.content.map(StreamEvent::ContentDelta)
}

/// Extract the value of a fully-delivered `"error"` field from JSON text
/// that failed to parse. Only a closed string value counts; a value severed
/// before its closing quote yields `None`.
fn extract_complete_error(payload: &str) -> Option<String> {
    let key_end = payload.find("\"error\"")? + "\"error\"".len();
    let rest = payload[key_end..].trim_start().strip_prefix(':')?;
    let rest = rest.trim_start().strip_prefix('"')?;

    let mut value = String::new();
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        match c {
            '"' => return Some(value),
            '\\' => match chars.next()? {
                'n' => value.push('\n'),
                't' => value.push('\t'),
                '"' => value.push('"'),
                '\\' => value.push('\\'),
                other => {
                    value.push('\\');
                    value.push(other);
                }
            },
            other => value.push(other),
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_delta() {
        let event = interpret_line(r#"data: {"content":"Hi "}"#).unwrap();
        assert_eq!(event, StreamEvent::ContentDelta("Hi ".to_string()));
    }

    #[test]
    fn done_with_lead_flag() {
        let event = interpret_line(r#"data: {"done": true, "show_lead_form": true}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Done {
                show_lead_form: true
            }
        );
    }

    #[test]
    fn done_defaults_lead_flag_to_false() {
        let event = interpret_line(r#"data: {"done": true}"#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Done {
                show_lead_form: false
            }
        );
    }

    #[test]
    fn done_false_is_not_terminal() {
        assert_eq!(interpret_line(r#"data: {"done": false}"#), None);
    }

    #[test]
    fn explicit_error_field() {
        let event = interpret_line(r#"data: {"error": "upstream timeout"}"#).unwrap();
        assert_eq!(event, StreamEvent::Error("upstream timeout".to_string()));
    }

    #[test]
    fn error_takes_precedence_over_content_and_done() {
        let event =
            interpret_line(r#"data: {"content":"x","done":true,"error":"broken"}"#).unwrap();
        assert_eq!(event, StreamEvent::Error("broken".to_string()));
    }

    #[test]
    fn done_takes_precedence_over_content() {
        let event = interpret_line(r#"data: {"content":"x","done":true}"#).unwrap();
        assert!(matches!(event, StreamEvent::Done { .. }));
    }

    #[test]
    fn blank_keep_alive_is_ignored() {
        assert_eq!(interpret_line(""), None);
    }

    #[test]
    fn line_without_marker_is_ignored() {
        assert_eq!(interpret_line(r#"{"content":"orphan"}"#), None);
        assert_eq!(interpret_line(": comment"), None);
    }

    #[test]
    fn empty_record_yields_nothing() {
        assert_eq!(interpret_line("data: {}"), None);
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let event = interpret_line(r#"data: {"content":"ok","request_id":"abc"}"#).unwrap();
        assert_eq!(event, StreamEvent::ContentDelta("ok".to_string()));
    }

    #[test]
    fn severed_record_is_ignored() {
        // A chunk boundary cut this record mid-token
        assert_eq!(interpret_line(r#"data: {"content":"partial te"#), None);
    }

    #[test]
    fn severed_record_with_complete_error_is_surfaced() {
        // The error value closed before the record was cut off
        let event = interpret_line(r#"data: {"error": "quota exceeded", "detai"#).unwrap();
        assert_eq!(event, StreamEvent::Error("quota exceeded".to_string()));
    }

    #[test]
    fn severed_error_value_is_ignored() {
        // The cut fell inside the error string itself; not fully visible
        assert_eq!(interpret_line(r#"data: {"error": "quota exc"#), None);
    }

    #[test]
    fn error_value_with_escapes() {
        let event = interpret_line(r#"data: {"error": "line one\nsaid \"no\"", "x": "#).unwrap();
        assert_eq!(
            event,
            StreamEvent::Error("line one\nsaid \"no\"".to_string())
        );
    }
}
