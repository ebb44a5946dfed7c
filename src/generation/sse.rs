//! Minimal Server-Sent Events framing over a byte stream.

use futures::stream::{self, Stream, StreamExt};
use std::collections::VecDeque;
use std::pin::Pin;

use super::GenerationError;

struct EventReader<S> {
    inner: Pin<Box<S>>,
    buffer: Vec<u8>,
    data_lines: Vec<String>,
    ready: VecDeque<String>,
    finished: bool,
}

impl<S> EventReader<S> {
    fn drain_lines(&mut self) {
        while let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.buffer.drain(..=pos).collect();
            self.feed_line(&line[..line.len() - 1]);
        }
    }

    fn feed_line(&mut self, line: &[u8]) {
        let line = String::from_utf8_lossy(line);
        let line = line.strip_suffix('\r').unwrap_or(&line);

        if line.is_empty() {
            self.dispatch();
        } else if let Some(data) = line.strip_prefix("data:") {
            self.data_lines
                .push(data.strip_prefix(' ').unwrap_or(data).to_string());
        }
        // Comments and the event/id/retry fields carry nothing we use.
    }

    fn dispatch(&mut self) {
        if self.data_lines.is_empty() {
            return;
        }
        let data = self.data_lines.join("\n");
        self.data_lines.clear();
        if data != "[DONE]" {
            self.ready.push_back(data);
        }
    }

    fn flush(&mut self) {
        if !self.buffer.is_empty() {
            let rest = std::mem::take(&mut self.buffer);
            self.feed_line(&rest);
        }
        self.dispatch();
    }
}

/// Turns a chunked byte stream into the `data` payloads of its events.
///
/// Events may span chunk boundaries. A transport error ends the stream after
/// being yielded once.
pub fn events<S, B, E>(bytes: S) -> impl Stream<Item = Result<String, GenerationError>>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: Into<GenerationError>,
{
    let reader = EventReader {
        inner: Box::pin(bytes),
        buffer: Vec::new(),
        data_lines: Vec::new(),
        ready: VecDeque::new(),
        finished: false,
    };

    stream::unfold(reader, |mut reader| async move {
        loop {
            if let Some(data) = reader.ready.pop_front() {
                return Some((Ok(data), reader));
            }
            if reader.finished {
                return None;
            }
            match reader.inner.next().await {
                Some(Ok(chunk)) => {
                    reader.buffer.extend_from_slice(chunk.as_ref());
                    reader.drain_lines();
                }
                Some(Err(e)) => {
                    reader.finished = true;
                    reader.ready.clear();
                    return Some((Err(e.into()), reader));
                }
                None => {
                    reader.finished = true;
                    reader.flush();
                }
            }
        }
    })
}
