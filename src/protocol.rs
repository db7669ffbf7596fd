// src/protocol.rs
//
// PYCODE wire format for the STM32 MicroPython loader.
// One outgoing message per upload: fixed header lines, a blank separator,
// then the raw source text.

/// Entry function the board invokes when the upload omits one.
pub const DEFAULT_ENTRY: &str = "main";

/// Build a framed PYCODE message:
///
/// ```text
/// PYCODE
/// ENTRY:<entry>
/// SIZE:<byte length of code>
/// <blank line>
/// <code>
/// ```
///
/// `SIZE` is the payload length in bytes — the unit the serial transport
/// writes — not the character count. The two differ for non-ASCII source.
pub fn encode_pycode(code: &str, entry: &str) -> String {
    format!("PYCODE\nENTRY:{}\nSIZE:{}\n\n{}", entry, code.len(), code)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split an encoded message back into (entry, declared size, payload).
    fn split_message(msg: &str) -> (String, usize, String) {
        let (header, payload) = msg.split_once("\n\n").expect("missing blank separator");
        let mut lines = header.lines();
        assert_eq!(lines.next(), Some("PYCODE"));
        let entry = lines
            .next()
            .and_then(|l| l.strip_prefix("ENTRY:"))
            .expect("missing ENTRY line");
        let size = lines
            .next()
            .and_then(|l| l.strip_prefix("SIZE:"))
            .and_then(|s| s.parse().ok())
            .expect("missing SIZE line");
        assert_eq!(lines.next(), None);
        (entry.to_string(), size, payload.to_string())
    }

    #[test]
    fn test_exact_frame() {
        assert_eq!(
            encode_pycode("print(1)", "run"),
            "PYCODE\nENTRY:run\nSIZE:9\n\nprint(1)"
        );
    }

    #[test]
    fn test_empty_code() {
        assert_eq!(
            encode_pycode("", DEFAULT_ENTRY),
            "PYCODE\nENTRY:main\nSIZE:0\n\n"
        );
    }

    #[test]
    fn test_size_is_byte_length_not_chars() {
        // "é" is one char but two UTF-8 bytes
        let msg = encode_pycode("é", "main");
        let (_, size, payload) = split_message(&msg);
        assert_eq!(size, 2);
        assert_eq!(payload, "é");
        assert_eq!(size, payload.len());
    }

    #[test]
    fn test_round_trip_recovers_code_and_entry() {
        let code = "x = 1\n\nprint(x)\n"; // embedded blank line in the payload
        let msg = encode_pycode(code, "setup");
        let (entry, size, payload) = split_message(&msg);
        assert_eq!(entry, "setup");
        assert_eq!(payload, code);
        assert_eq!(size, code.len());
    }

    #[test]
    fn test_multiline_payload_size() {
        let code = "def main():\n    pass\n";
        let (_, size, payload) = split_message(&encode_pycode(code, DEFAULT_ENTRY));
        assert_eq!(size, code.len());
        assert_eq!(payload, code);
    }
}
