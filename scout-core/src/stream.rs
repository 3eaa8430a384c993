//! Incremental recovery of JSON objects from a streamed response body
//!
//! The research agent answers with a concatenation of JSON objects, with no
//! delimiter and no enclosing array, split across arbitrary chunk
//! boundaries. Each object should reach the caller as soon as its closing
//! brace arrives, well before the stream ends.
//!
//! ## Pipeline
//!
//! 1. [`Utf8Decoder`] turns byte chunks into text, holding back a multi-byte
//!    sequence cut in half by a chunk boundary.
//! 2. [`ObjectExtractor`] appends the text to its buffer and scans it for
//!    balanced top-level braces, ignoring braces inside string literals.
//! 3. Each balanced candidate is parsed with `serde_json`. Candidates that
//!    fail to parse are logged and dropped; the stream carries on.
//!
//! The scan cursor and brace/string state persist between chunks, so every
//! byte is classified once regardless of how the body is split.

use futures_util::{Stream, StreamExt};
use serde_json::Value;

/// Streaming UTF-8 decoder.
///
/// Invalid sequences become U+FFFD; an incomplete sequence at the end of a
/// chunk is kept until the next chunk completes it.
#[derive(Debug, Default)]
pub struct Utf8Decoder {
    pending: Vec<u8>,
}

impl Utf8Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one chunk, returning all text that is complete so far.
    pub fn decode(&mut self, bytes: &[u8]) -> String {
        let mut input = std::mem::take(&mut self.pending);
        input.extend_from_slice(bytes);

        let mut text = String::with_capacity(input.len());
        let mut rest: &[u8] = &input;
        loop {
            match std::str::from_utf8(rest) {
                Ok(valid) => {
                    text.push_str(valid);
                    break;
                }
                Err(e) => {
                    let (valid, after) = rest.split_at(e.valid_up_to());
                    text.push_str(&String::from_utf8_lossy(valid));
                    match e.error_len() {
                        Some(len) => {
                            text.push(char::REPLACEMENT_CHARACTER);
                            rest = &after[len..];
                        }
                        None => {
                            self.pending = after.to_vec();
                            break;
                        }
                    }
                }
            }
        }
        text
    }

    /// Flush the decoder at end of stream.
    ///
    /// A dangling incomplete sequence decodes to U+FFFD.
    pub fn finish(&mut self) -> String {
        let pending = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&pending).into_owned()
    }
}

/// Scanner state for the candidate object currently being read.
#[derive(Debug, Default, Clone, Copy)]
struct ScanState {
    depth: usize,
    start: Option<usize>,
    in_string: bool,
    escaped: bool,
}

/// Recovers complete top-level JSON objects from a growing text buffer.
#[derive(Debug, Default)]
pub struct ObjectExtractor {
    buffer: String,
    /// Offset of the first byte not yet classified
    cursor: usize,
    scan: ScanState,
}

impl ObjectExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append text and return every object it completes, in closing-brace order.
    pub fn push(&mut self, text: &str) -> Vec<Value> {
        self.buffer.push_str(text);

        let mut objects = Vec::new();
        while let Some((start, end)) = self.next_candidate() {
            let candidate = &self.buffer[start..=end];
            match serde_json::from_str::<Value>(candidate) {
                Ok(object) => objects.push(object),
                Err(e) => tracing::debug!(
                    error = %e,
                    len = candidate.len(),
                    "Skipping malformed object in stream"
                ),
            }

            // Consumed through the closing brace either way.
            self.buffer.drain(..=end);
            self.cursor = 0;
            self.scan = ScanState::default();
        }
        objects
    }

    /// Advance the cursor until a top-level object closes.
    ///
    /// Returns the byte range `(start, end)` of the candidate, inclusive.
    fn next_candidate(&mut self) -> Option<(usize, usize)> {
        let bytes = self.buffer.as_bytes();
        while self.cursor < bytes.len() {
            let i = self.cursor;
            self.cursor += 1;

            let scan = &mut self.scan;
            if scan.escaped {
                scan.escaped = false;
                continue;
            }

            match bytes[i] {
                b'\\' if scan.in_string => scan.escaped = true,
                b'"' => scan.in_string = !scan.in_string,
                _ if scan.in_string => {}
                b'{' => {
                    if scan.depth == 0 {
                        scan.start = Some(i);
                    }
                    scan.depth += 1;
                }
                // A `}` at depth 0 is stray text and never closes anything.
                b'}' if scan.depth > 0 => {
                    scan.depth -= 1;
                    if scan.depth == 0 {
                        if let Some(start) = scan.start.take() {
                            return Some((start, i));
                        }
                    }
                }
                _ => {}
            }
        }
        None
    }

    /// Text received but not yet consumed by an extraction.
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Final parse attempt at end of stream.
    ///
    /// If anything other than whitespace remains, the whole trimmed
    /// remainder is parsed once; failure means the tail was noise.
    pub fn finish(self) -> Option<Value> {
        let rest = self.buffer.trim();
        if rest.is_empty() {
            return None;
        }
        match serde_json::from_str(rest) {
            Ok(object) => Some(object),
            Err(e) => {
                tracing::debug!(error = %e, len = rest.len(), "Discarding unparsed stream tail");
                None
            }
        }
    }
}

/// Drive a byte stream through the decoder and extractor.
///
/// `emit` is called for each object the moment it is recovered. Returns the
/// number of objects emitted, or the first error the stream yields; objects
/// recovered before the error have already been emitted.
pub async fn read_objects<S, B, E, F>(chunks: S, mut emit: F) -> Result<usize, E>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    F: FnMut(Value),
{
    let mut chunks = std::pin::pin!(chunks);
    let mut decoder = Utf8Decoder::new();
    let mut extractor = ObjectExtractor::new();
    let mut emitted = 0;

    while let Some(chunk) = chunks.next().await {
        let chunk = chunk?;
        let text = decoder.decode(chunk.as_ref());
        tracing::trace!(bytes = chunk.as_ref().len(), "Received chunk");
        for object in extractor.push(&text) {
            emitted += 1;
            emit(object);
        }
    }

    let tail = decoder.finish();
    for object in extractor.push(&tail) {
        emitted += 1;
        emit(object);
    }
    if let Some(object) = extractor.finish() {
        emitted += 1;
        emit(object);
    }

    Ok(emitted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn extract_all(chunks: &[&[u8]]) -> Vec<Value> {
        let mut decoder = Utf8Decoder::new();
        let mut extractor = ObjectExtractor::new();
        let mut objects = Vec::new();
        for chunk in chunks {
            objects.extend(extractor.push(&decoder.decode(chunk)));
        }
        objects.extend(extractor.push(&decoder.finish()));
        objects.extend(extractor.finish());
        objects
    }

    const STREAM: &str = concat!(
        r#"{"companies":[{"name":"Acme","description":"A {great} company"}]}"#,
        "\n",
        r#"{"companies":[{"name":"Caf\u00e9 \"Ünïcode\" 🚀","description":"}}{{"}]}"#,
        r#"{"companies":[{"name":"Zeta","investors":["a\\","b"]}]}"#,
    );

    #[test]
    fn test_back_to_back_objects() {
        let objects = extract_all(&[br#"{"a":1}{"b":2}"#]);
        assert_eq!(objects, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let objects = extract_all(&[br#"{"description":"A {great} company","x":"}"}"#]);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["description"], "A {great} company");
    }

    #[test]
    fn test_escaped_quote_keeps_string_open() {
        let objects = extract_all(&[br#"{"name":"name: \"Acme\" {","ok":true}"#]);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0]["name"], "name: \"Acme\" {");
        assert_eq!(objects[0]["ok"], true);
    }

    #[test]
    fn test_trailing_backslash_in_string() {
        let objects = extract_all(&[br#"{"path":"C:\\"}{"next":"}"}"#]);
        assert_eq!(objects, vec![json!({"path": "C:\\"}), json!({"next": "}"})]);
    }

    #[test]
    fn test_chunk_boundary_independence() {
        let bytes = STREAM.as_bytes();
        let whole = extract_all(&[bytes]);
        assert_eq!(whole.len(), 3);

        for split in 0..=bytes.len() {
            let (a, b) = bytes.split_at(split);
            assert_eq!(extract_all(&[a, b]), whole, "split at {split}");
        }

        for first in (0..bytes.len()).step_by(7) {
            for second in (first..bytes.len()).step_by(11) {
                let parts = [&bytes[..first], &bytes[first..second], &bytes[second..]];
                assert_eq!(extract_all(&parts), whole, "splits at {first}/{second}");
            }
        }

        let single_bytes: Vec<&[u8]> = bytes.chunks(1).collect();
        assert_eq!(extract_all(&single_bytes), whole);
    }

    #[test]
    fn test_objects_emitted_before_stream_end() {
        let mut extractor = ObjectExtractor::new();
        assert!(extractor.push(r#"{"companies":[{"name":"Ac"#).is_empty());
        let objects = extractor.push(r#"me"}]}{"companies":"#);
        assert_eq!(objects.len(), 1);
        assert_eq!(extractor.buffered(), r#"{"companies":"#);
    }

    #[test]
    fn test_malformed_object_is_skipped() {
        let objects = extract_all(&[
            br#"{"first":1}"#,
            br#"{"broken": tru}"#,
            br#"{"last":3}"#,
        ]);
        assert_eq!(objects, vec![json!({"first": 1}), json!({"last": 3})]);
    }

    #[test]
    fn test_noise_between_objects() {
        let objects = extract_all(&[b"data: } {\"a\":1}\n\n,garbage {\"b\":2} trailing"]);
        assert_eq!(objects, vec![json!({"a": 1}), json!({"b": 2})]);
    }

    #[test]
    fn test_truncated_tail_is_dropped() {
        let objects = extract_all(&[br#"{"a":1}{"companies":[{"name":"Cut"#]);
        assert_eq!(objects, vec![json!({"a": 1})]);
    }

    #[test]
    fn test_finish_parses_non_object_tail() {
        let mut extractor = ObjectExtractor::new();
        assert!(extractor.push("  [1, 2]\n").is_empty());
        assert_eq!(extractor.finish(), Some(json!([1, 2])));

        let extractor = ObjectExtractor::new();
        assert_eq!(extractor.finish(), None);
    }

    #[test]
    fn test_decoder_holds_split_multibyte_sequence() {
        let rocket = "🚀".as_bytes();
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(&rocket[..1]), "");
        assert_eq!(decoder.decode(&rocket[1..3]), "");
        assert_eq!(decoder.decode(&rocket[3..]), "🚀");
        assert_eq!(decoder.finish(), "");
    }

    #[test]
    fn test_decoder_replaces_invalid_bytes() {
        let mut decoder = Utf8Decoder::new();
        assert_eq!(decoder.decode(b"a\xffb"), "a\u{FFFD}b");
        assert_eq!(decoder.decode(&"é".as_bytes()[..1]), "");
        assert_eq!(decoder.finish(), "\u{FFFD}");
    }

    #[tokio::test]
    async fn test_read_objects_emits_progressively() {
        let chunks = vec![
            Ok::<_, std::io::Error>(br#"{"companies":[{"name":"Acme""#.to_vec()),
            Ok(br#"}]}{"companies":[{"name":"Ac"#.to_vec()),
            Ok(br#"me"}]}{"companies":[{"name":"Zeta"}]}"#.to_vec()),
        ];

        let mut seen = Vec::new();
        let count = read_objects(futures_util::stream::iter(chunks), |object| {
            seen.push(object["companies"][0]["name"].as_str().unwrap().to_string())
        })
        .await
        .unwrap();

        assert_eq!(count, 3);
        assert_eq!(seen, vec!["Acme", "Acme", "Zeta"]);
    }

    #[tokio::test]
    async fn test_read_objects_keeps_objects_before_error() {
        let chunks = vec![
            Ok(br#"{"a":1}{"b""#.to_vec()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(br#":2}"#.to_vec()),
        ];

        let mut seen = Vec::new();
        let result = read_objects(futures_util::stream::iter(chunks), |object| seen.push(object)).await;

        assert!(result.is_err());
        assert_eq!(seen, vec![json!({"a": 1})]);
    }
}
