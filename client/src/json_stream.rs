//! Incremental decoding of a JSON array body.
//!
//! The reviews upstream answers with a JSON array. Rather than buffering the
//! whole body, [`JsonArrayDecoder`] splits the byte stream into the raw bytes
//! of each top-level element as soon as that element is complete, and
//! [`decode_json_array`] deserializes each one into `T`.
//!
//! Chunk boundaries may fall anywhere, including inside strings and escape
//! sequences.

use async_stream::stream;
use futures::{Stream, StreamExt};
use movies_core::{Upstream, UpstreamError};
use serde::de::DeserializeOwned;
use std::fmt;
use std::pin::Pin;
use thiserror::Error;

/// Lazily decoded sequence of upstream entities.
pub type UpstreamStream<T> = Pin<Box<dyn Stream<Item = Result<T, UpstreamError>> + Send>>;

/// Structural errors found while splitting a JSON array.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JsonStreamError {
    /// The body did not start with `[`.
    #[error("expected a JSON array, found '{found}' at byte {offset}")]
    NotAnArray {
        /// Offending character.
        found: char,
        /// Byte offset in the body.
        offset: usize,
    },

    /// A separator or terminator was expected.
    #[error("unexpected '{found}' at byte {offset}")]
    UnexpectedByte {
        /// Offending character.
        found: char,
        /// Byte offset in the body.
        offset: usize,
    },

    /// Non-whitespace after the closing `]`.
    #[error("trailing data after JSON array at byte {offset}")]
    TrailingData {
        /// Byte offset in the body.
        offset: usize,
    },

    /// The body ended before the array was closed.
    #[error("JSON array body ended unexpectedly")]
    Incomplete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    FirstElement,
    NextElement,
    InElement,
    AfterElement,
    Done,
}

/// Push-based splitter for a top-level JSON array.
#[derive(Debug)]
pub struct JsonArrayDecoder {
    state: State,
    current: Vec<u8>,
    depth: usize,
    in_string: bool,
    escaped: bool,
    scalar: bool,
    offset: usize,
}

impl Default for JsonArrayDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl JsonArrayDecoder {
    /// Create a decoder positioned before the opening `[`.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            state: State::Start,
            current: Vec::new(),
            depth: 0,
            in_string: false,
            escaped: false,
            scalar: false,
            offset: 0,
        }
    }

    /// Feed the next chunk; returns the raw bytes of every element it completed.
    ///
    /// # Errors
    ///
    /// Returns [`JsonStreamError`] on the first structural violation. The
    /// decoder should not be fed again afterwards.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Vec<Vec<u8>>, JsonStreamError> {
        let mut completed = Vec::new();
        for &byte in chunk {
            self.step(byte, &mut completed)?;
            self.offset += 1;
        }
        Ok(completed)
    }

    /// Check that the body ended on a closed array.
    ///
    /// An empty body counts as an empty array.
    ///
    /// # Errors
    ///
    /// Returns [`JsonStreamError::Incomplete`] if the array was left open.
    pub fn finish(&self) -> Result<(), JsonStreamError> {
        match self.state {
            State::Done => Ok(()),
            State::Start if self.offset == 0 => Ok(()),
            _ => Err(JsonStreamError::Incomplete),
        }
    }

    fn step(&mut self, byte: u8, completed: &mut Vec<Vec<u8>>) -> Result<(), JsonStreamError> {
        match self.state {
            State::Start => match byte {
                b'[' => self.state = State::FirstElement,
                b if b.is_ascii_whitespace() => {}
                b => {
                    return Err(JsonStreamError::NotAnArray {
                        found: char::from(b),
                        offset: self.offset,
                    });
                }
            },
            State::FirstElement if byte == b']' => self.state = State::Done,
            State::FirstElement | State::NextElement => match byte {
                b if b.is_ascii_whitespace() => {}
                b',' | b']' => return Err(self.unexpected(byte)),
                b => self.begin_element(b),
            },
            State::InElement => self.continue_element(byte, completed)?,
            State::AfterElement => self.after_element(byte)?,
            State::Done => {
                if !byte.is_ascii_whitespace() {
                    return Err(JsonStreamError::TrailingData { offset: self.offset });
                }
            }
        }
        Ok(())
    }

    fn begin_element(&mut self, byte: u8) {
        self.state = State::InElement;
        self.current.clear();
        self.current.push(byte);
        self.escaped = false;
        self.scalar = false;

        match byte {
            b'{' | b'[' => {
                self.depth = 1;
                self.in_string = false;
            }
            b'"' => {
                self.depth = 0;
                self.in_string = true;
            }
            _ => {
                self.depth = 0;
                self.in_string = false;
                self.scalar = true;
            }
        }
    }

    fn continue_element(
        &mut self,
        byte: u8,
        completed: &mut Vec<Vec<u8>>,
    ) -> Result<(), JsonStreamError> {
        if self.scalar {
            if byte == b',' || byte == b']' || byte.is_ascii_whitespace() {
                completed.push(std::mem::take(&mut self.current));
                self.state = State::AfterElement;
                return self.after_element(byte);
            }
            self.current.push(byte);
            return Ok(());
        }

        self.current.push(byte);

        if self.in_string {
            if self.escaped {
                self.escaped = false;
            } else if byte == b'\\' {
                self.escaped = true;
            } else if byte == b'"' {
                self.in_string = false;
                if self.depth == 0 {
                    self.complete(completed);
                }
            }
            return Ok(());
        }

        match byte {
            b'"' => self.in_string = true,
            b'{' | b'[' => self.depth += 1,
            b'}' | b']' => {
                self.depth = self.depth.saturating_sub(1);
                if self.depth == 0 {
                    self.complete(completed);
                }
            }
            _ => {}
        }
        Ok(())
    }

    fn after_element(&mut self, byte: u8) -> Result<(), JsonStreamError> {
        match byte {
            b',' => self.state = State::NextElement,
            b']' => self.state = State::Done,
            b if b.is_ascii_whitespace() => {}
            b => return Err(self.unexpected(b)),
        }
        Ok(())
    }

    fn complete(&mut self, completed: &mut Vec<Vec<u8>>) {
        completed.push(std::mem::take(&mut self.current));
        self.state = State::AfterElement;
    }

    fn unexpected(&self, byte: u8) -> JsonStreamError {
        JsonStreamError::UnexpectedByte {
            found: char::from(byte),
            offset: self.offset,
        }
    }
}

/// Decode a streamed JSON array body into a stream of `T`.
///
/// The stream ends after the first error.
pub fn decode_json_array<T, S, B, E>(upstream: Upstream, body: S) -> UpstreamStream<T>
where
    T: DeserializeOwned + Send + 'static,
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send,
    E: fmt::Display + Send,
{
    let decode_error = move |message: String| UpstreamError::Decode { upstream, message };

    Box::pin(stream! {
        let mut decoder = JsonArrayDecoder::new();
        let mut body = Box::pin(body);

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    yield Err(decode_error(format!("response body interrupted: {e}")));
                    return;
                }
            };

            let elements = match decoder.feed(chunk.as_ref()) {
                Ok(elements) => elements,
                Err(e) => {
                    yield Err(decode_error(e.to_string()));
                    return;
                }
            };

            for element in elements {
                match serde_json::from_slice::<T>(&element) {
                    Ok(item) => yield Ok(item),
                    Err(e) => {
                        yield Err(decode_error(e.to_string()));
                        return;
                    }
                }
            }
        }

        if let Err(e) = decoder.finish() {
            yield Err(decode_error(e.to_string()));
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use proptest::prelude::*;
    use serde_json::Value;

    fn split_all(body: &[u8]) -> Result<Vec<Value>, JsonStreamError> {
        let mut decoder = JsonArrayDecoder::new();
        let elements = decoder.feed(body)?;
        decoder.finish()?;
        Ok(elements
            .iter()
            .map(|raw| serde_json::from_slice(raw).unwrap())
            .collect())
    }

    #[test]
    fn splits_objects_scalars_and_nested_values() {
        let body = br#" [ {"a":[1,{"b":"]"}]}, 42 ,"x\"y", true, null, [1,2] ] "#;
        let values = split_all(body).unwrap();

        assert_eq!(
            values,
            vec![
                serde_json::json!({"a": [1, {"b": "]"}]}),
                serde_json::json!(42),
                serde_json::json!("x\"y"),
                serde_json::json!(true),
                Value::Null,
                serde_json::json!([1, 2]),
            ]
        );
    }

    #[test]
    fn empty_array_and_empty_body_yield_nothing() {
        assert!(split_all(b"[]").unwrap().is_empty());
        assert!(split_all(b"  [ \n ] ").unwrap().is_empty());
        assert!(split_all(b"").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_array_body() {
        let err = split_all(br#"{"reviewId":"1"}"#).unwrap_err();
        assert_eq!(err, JsonStreamError::NotAnArray { found: '{', offset: 0 });
    }

    #[test]
    fn rejects_unclosed_array() {
        assert_eq!(split_all(br#"[{"a":1}"#).unwrap_err(), JsonStreamError::Incomplete);
        assert_eq!(split_all(b"[1,").unwrap_err(), JsonStreamError::Incomplete);
    }

    #[test]
    fn rejects_missing_separator_and_trailing_data() {
        assert!(matches!(
            split_all(br#"[{"a":1} {"a":2}]"#).unwrap_err(),
            JsonStreamError::UnexpectedByte { found: '{', .. }
        ));
        assert!(matches!(
            split_all(b"[1,]").unwrap_err(),
            JsonStreamError::UnexpectedByte { found: ']', .. }
        ));
        assert!(matches!(
            split_all(b"[1] x").unwrap_err(),
            JsonStreamError::TrailingData { .. }
        ));
    }

    #[tokio::test]
    async fn decode_stops_after_first_bad_element() {
        let chunks: Vec<Result<&'static [u8], String>> =
            vec![Ok(&br#"[{"n":1},"#[..]), Ok(&br#"{"n":"oops"},{"n":3}]"#[..])];

        #[derive(serde::Deserialize, Debug)]
        struct Item {
            #[allow(dead_code)]
            n: u32,
        }

        let results: Vec<Result<Item, UpstreamError>> =
            decode_json_array(Upstream::Reviews, futures::stream::iter(chunks))
                .collect()
                .await;

        assert_eq!(results.len(), 2);
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(UpstreamError::Decode { upstream: Upstream::Reviews, .. })
        ));
    }

    #[tokio::test]
    async fn decode_reports_interrupted_body() {
        let chunks: Vec<Result<&'static [u8], String>> =
            vec![Ok(&b"[1,"[..]), Err("connection reset".to_string())];

        let body = futures::stream::iter(chunks);
        let err = decode_json_array::<u32, _, _, _>(Upstream::Reviews, body)
            .try_collect::<Vec<_>>()
            .await
            .unwrap_err();

        assert_eq!(
            err.to_string(),
            "Failed to decode response from ReviewService: response body interrupted: connection reset"
        );
    }

    proptest! {
        #[test]
        fn chunking_does_not_change_decoded_elements(
            values in prop::collection::vec(
                prop_oneof![
                    any::<i64>().prop_map(|n| serde_json::json!(n)),
                    "[a-z\"\\\\\\]\\[{},: ]{0,12}"
                        .prop_map(|s| serde_json::json!({ "comment": s })),
                    any::<bool>().prop_map(|b| serde_json::json!([b, null])),
                ],
                0..8,
            ),
            cuts in prop::collection::vec(any::<prop::sample::Index>(), 0..6),
        ) {
            let body = serde_json::to_vec_pretty(&values).unwrap();

            let mut positions: Vec<usize> =
                cuts.iter().map(|cut| cut.index(body.len() + 1)).collect();
            positions.sort_unstable();

            let mut decoder = JsonArrayDecoder::new();
            let mut elements = Vec::new();
            let mut start = 0;
            for end in positions.into_iter().chain(std::iter::once(body.len())) {
                elements.extend(decoder.feed(&body[start..end]).unwrap());
                start = end;
            }
            decoder.finish().unwrap();

            let decoded: Vec<Value> = elements
                .iter()
                .map(|raw| serde_json::from_slice(raw).unwrap())
                .collect();
            prop_assert_eq!(decoded, values);
        }
    }
}
