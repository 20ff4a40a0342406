// src/services/sse.rs
//! Server-sent events decoding for streamed model output.

use bytes::Bytes;
use futures::{Stream, StreamExt};

use crate::error::ProviderError;

/// Upper bound on bytes held for a single unfinished event.
const MAX_PENDING: usize = 1024 * 1024;

/// Incremental decoder: feed raw body bytes, get back the `data` of every
/// event completed so far.
#[derive(Debug, Default)]
pub struct SseDecoder {
    pending: Vec<u8>,
    /// Bytes of `pending` already known not to start an event separator.
    scanned: usize,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, bytes: &[u8]) -> Result<Vec<String>, ProviderError> {
        self.pending.extend_from_slice(bytes);

        let mut out = Vec::new();
        while let Some((end, sep_len)) = find_event_end(&self.pending, self.scanned) {
            let block: Vec<u8> = self.pending.drain(..end + sep_len).take(end).collect();
            self.scanned = 0;
            if let Some(data) = parse_event(&block)? {
                out.push(data);
            }
        }
        // A separator is at most three bytes, so only a newline in the last
        // two can still turn into one.
        self.scanned = self.pending.len().saturating_sub(2);

        if self.pending.len() > MAX_PENDING {
            self.pending.clear();
            self.scanned = 0;
            return Err(ProviderError::stream("SSE event exceeded 1 MiB without terminating"));
        }
        Ok(out)
    }

    /// Flush whatever is left once the body ends; the last event may lack
    /// its blank-line terminator.
    pub fn finish(&mut self) -> Result<Option<String>, ProviderError> {
        let rest = std::mem::take(&mut self.pending);
        self.scanned = 0;
        parse_event(&rest)
    }
}

/// Position of the newline that ends an event, plus the separator length.
fn find_event_end(buf: &[u8], mut from: usize) -> Option<(usize, usize)> {
    while let Some(offset) = buf[from..].iter().position(|&b| b == b'\n') {
        let i = from + offset;
        match &buf[i + 1..] {
            [b'\n', ..] => return Some((i, 2)),
            [b'\r', b'\n', ..] => return Some((i, 3)),
            _ => from = i + 1,
        }
    }
    None
}

fn parse_event(block: &[u8]) -> Result<Option<String>, ProviderError> {
    let text = std::str::from_utf8(block)
        .map_err(|e| ProviderError::stream(format!("invalid UTF-8 in SSE event: {e}")))?;

    let mut data: Vec<&str> = Vec::new();
    for line in text.split('\n') {
        let line = line.trim_end_matches('\r');
        if line.is_empty() || line.starts_with(':') {
            continue;
        }
        let (field, value) = line.split_once(':').unwrap_or((line, ""));
        if field == "data" {
            data.push(value.strip_prefix(' ').unwrap_or(value));
        }
    }

    if data.is_empty() {
        Ok(None)
    } else {
        Ok(Some(data.join("\n")))
    }
}

/// Adapt a response body into a stream of event payloads, in arrival order.
pub fn data_events<S, E>(body: S) -> impl Stream<Item = Result<String, ProviderError>> + Send + 'static
where
    S: Stream<Item = Result<Bytes, E>> + Send + 'static,
    E: Into<ProviderError> + Send + 'static,
{
    async_stream::stream! {
        let mut body = std::pin::pin!(body);
        let mut decoder = SseDecoder::new();

        while let Some(next) = body.next().await {
            let bytes = match next {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err: ProviderError = e.into();
                    yield Err(err);
                    return;
                }
            };
            match decoder.push(&bytes) {
                Ok(events) => {
                    for data in events {
                        yield Ok(data);
                    }
                }
                Err(e) => {
                    yield Err(e);
                    return;
                }
            }
        }

        match decoder.finish() {
            Ok(Some(data)) => {
                yield Ok(data);
            }
            Ok(None) => {}
            Err(e) => {
                yield Err(e);
            }
        }
    }
}
