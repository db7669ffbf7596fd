// src/events.rs
//
// Editor events posted by the Blockly webview.
// The frontend sends one serialized JSON object per user action; anything
// that does not decode into a known variant is dropped at this boundary.

use serde::Deserialize;

/// A decoded editor event.
///
/// The wire format is `{"type": "py_preview", "code": ...}` or
/// `{"type": "python_upload", "code": ..., "entry_function": ...}`.
/// A missing `code` field is treated as empty source rather than an error.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "type")]
pub enum EditorEvent {
    /// User asked to preview the generated code. Diagnostic only.
    #[serde(rename = "py_preview")]
    Preview {
        #[serde(default)]
        code: String,
    },
    /// User asked to upload the generated code to the board.
    #[serde(rename = "python_upload")]
    Upload {
        #[serde(default)]
        code: String,
        #[serde(default)]
        entry_function: Option<String>,
    },
}

/// Decode a raw event string from the webview.
/// Unrecognized `type` values and malformed JSON both land here as errors;
/// the bridge logs and drops them.
pub fn decode(raw: &str) -> Result<EditorEvent, String> {
    serde_json::from_str(raw).map_err(|e| format!("Unrecognized editor event: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_preview() {
        let event = decode(r#"{"type":"py_preview","code":"print(1)"}"#).unwrap();
        assert_eq!(
            event,
            EditorEvent::Preview {
                code: "print(1)".to_string()
            }
        );
    }

    #[test]
    fn test_decode_upload_with_entry() {
        let event =
            decode(r#"{"type":"python_upload","code":"print(1)","entry_function":"run"}"#).unwrap();
        assert_eq!(
            event,
            EditorEvent::Upload {
                code: "print(1)".to_string(),
                entry_function: Some("run".to_string()),
            }
        );
    }

    #[test]
    fn test_decode_upload_without_entry() {
        let event = decode(r#"{"type":"python_upload","code":"pass"}"#).unwrap();
        assert_eq!(
            event,
            EditorEvent::Upload {
                code: "pass".to_string(),
                entry_function: None,
            }
        );
    }

    #[test]
    fn test_missing_code_defaults_to_empty() {
        let event = decode(r#"{"type":"python_upload"}"#).unwrap();
        assert_eq!(
            event,
            EditorEvent::Upload {
                code: String::new(),
                entry_function: None,
            }
        );
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(decode(r#"{"type":"block_drag","code":"x"}"#).is_err());
    }

    #[test]
    fn test_malformed_json_is_rejected() {
        assert!(decode("not json").is_err());
        assert!(decode(r#"{"code":"no type field"}"#).is_err());
        assert!(decode("").is_err());
    }
}
