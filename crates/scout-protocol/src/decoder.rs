//! Incremental decoder for streaming generation responses
//!
//! [`StreamDecoder`] owns the response body for the length of one
//! generation cycle. Each call to [`StreamDecoder::next_event`] yields at
//! most one event; the sequence is finite and cannot be restarted. The
//! body is dropped as soon as the sequence ends, whichever way it ends.

use futures::StreamExt;
use tokio::io::AsyncRead;
use tokio_util::codec::FramedRead;
use tokio_util::sync::CancellationToken;

use crate::codec::{Record, RecordCodec};
use crate::error::ProtocolError;
use crate::event::{GenerationResult, StreamEvent};

/// How a decoding cycle ended
#[derive(Debug, Clone, PartialEq, Eq)]
enum Finish {
    Completed,
    Cancelled,
    Failed(String),
}

enum Step {
    Cancelled,
    Next(Option<Result<Record, ProtocolError>>),
}

/// Turns a newline-delimited response body into [`StreamEvent`]s
pub struct StreamDecoder<R> {
    /// Framed body; `None` once the sequence has ended
    frames: Option<FramedRead<R, RecordCodec>>,
    /// Cancellation signal, observed between records
    cancel: CancellationToken,
    /// Text assembled so far
    text: String,
    /// Set once the sequence has ended
    finish: Option<Finish>,
}

impl<R: AsyncRead + Unpin> StreamDecoder<R> {
    /// Create a decoder over a response body
    pub fn new(reader: R, cancel: CancellationToken) -> Self {
        Self {
            frames: Some(FramedRead::new(reader, RecordCodec::new())),
            cancel,
            text: String::new(),
            finish: None,
        }
    }

    /// Read the next event
    ///
    /// Malformed records are skipped. Returns `None` once the completion
    /// marker has been yielded, the cancellation signal has fired, the
    /// server reported an error, or the transport failed or closed.
    pub async fn next_event(&mut self) -> Option<StreamEvent> {
        loop {
            if self.finish.is_some() {
                return None;
            }
            if self.cancel.is_cancelled() {
                self.end(Finish::Cancelled);
                return None;
            }

            let step = {
                let frames = self.frames.as_mut()?;
                tokio::select! {
                    biased;
                    _ = self.cancel.cancelled() => Step::Cancelled,
                    record = frames.next() => Step::Next(record),
                }
            };

            match step {
                Step::Cancelled => {
                    tracing::debug!("Stream cancelled after {} bytes", self.text.len());
                    self.end(Finish::Cancelled);
                    return None;
                }
                Step::Next(None) => {
                    tracing::debug!("Stream closed before completion marker");
                    self.end(Finish::Failed(
                        "stream ended before completion".to_string(),
                    ));
                    return None;
                }
                Step::Next(Some(Err(e))) => {
                    tracing::warn!("Stream transport error: {}", e);
                    self.end(Finish::Failed(e.to_string()));
                    return None;
                }
                Step::Next(Some(Ok(Record::Malformed(reason)))) => {
                    tracing::debug!("Skipping malformed record: {}", reason);
                    continue;
                }
                Step::Next(Some(Ok(Record::ServerError(message)))) => {
                    tracing::warn!("Server reported error: {}", message);
                    self.end(Finish::Failed(message));
                    return None;
                }
                Step::Next(Some(Ok(Record::Event(event)))) => {
                    if let Some(fragment) = &event.text_fragment {
                        self.text.push_str(fragment);
                    }
                    if event.done {
                        self.end(Finish::Completed);
                    }
                    return Some(event);
                }
            }
        }
    }

    /// Drain the remaining events, passing each fragment to `on_fragment`
    pub async fn collect_with<F>(mut self, mut on_fragment: F) -> GenerationResult
    where
        F: FnMut(&str),
    {
        while let Some(event) = self.next_event().await {
            if let Some(fragment) = event.text_fragment.as_deref() {
                on_fragment(fragment);
            }
        }
        self.into_result()
    }

    /// Drain the remaining events
    pub async fn collect(self) -> GenerationResult {
        self.collect_with(|_| {}).await
    }
}

impl<R> StreamDecoder<R> {
    /// A decoder for a request cancelled before any body arrived
    ///
    /// Yields no events and finishes as cancelled with empty text.
    pub fn cancelled(cancel: CancellationToken) -> Self {
        Self {
            frames: None,
            cancel,
            text: String::new(),
            finish: Some(Finish::Cancelled),
        }
    }

    /// Text assembled so far
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Whether the sequence has ended
    pub fn is_finished(&self) -> bool {
        self.finish.is_some()
    }

    /// Stop decoding and return what has been assembled
    ///
    /// Nothing already received is discarded.
    pub fn into_result(mut self) -> GenerationResult {
        self.frames = None;
        let (completed, cancelled, error) = match self.finish {
            Some(Finish::Completed) => (true, false, None),
            Some(Finish::Cancelled) => (false, true, None),
            Some(Finish::Failed(message)) => (false, false, Some(message)),
            None => (false, false, None),
        };
        GenerationResult {
            full_text: self.text,
            completed,
            cancelled,
            error,
        }
    }

    fn end(&mut self, finish: Finish) {
        // Releases the connection
        self.frames = None;
        self.finish = Some(finish);
    }
}
