//! Event stream over a long-lived `GET /events` response

use crate::lines::LineBuffer;
use crate::wire;
use async_trait::async_trait;
use housekeep_domain::{Event, EventStream, TransportError};
use http_body_util::BodyExt;
use hyper::body::Incoming;
use tokio::task::JoinHandle;

/// Live subscription to the Docker event stream
///
/// Dropping the stream closes the connection.
pub struct DockerEventStream {
    body: Incoming,
    lines: LineBuffer,
    conn: JoinHandle<()>,
    ended: bool,
}

impl DockerEventStream {
    pub(crate) fn new(body: Incoming, conn: JoinHandle<()>) -> Self {
        Self {
            body,
            lines: LineBuffer::new(),
            conn,
            ended: false,
        }
    }
}

#[async_trait]
impl EventStream for DockerEventStream {
    async fn next_event(&mut self) -> Result<Option<Event>, TransportError> {
        loop {
            while let Some(line) = self.lines.next_line() {
                // keep-alive
                if line.trim().is_empty() {
                    continue;
                }
                return wire::decode_event(&line).map(Some);
            }

            if self.ended {
                return Ok(None);
            }

            match self.body.frame().await {
                Some(Ok(frame)) => {
                    if let Ok(data) = frame.into_data() {
                        self.lines.extend(&data);
                    }
                }
                Some(Err(e)) => {
                    return Err(TransportError::Http(format!("event stream dropped: {e}")));
                }
                None => {
                    self.ended = true;
                    tracing::debug!("engine closed the event stream");
                    if let Some(tail) = self.lines.finish() {
                        if !tail.trim().is_empty() {
                            return wire::decode_event(&tail).map(Some);
                        }
                    }
                }
            }
        }
    }
}

impl Drop for DockerEventStream {
    fn drop(&mut self) {
        self.conn.abort();
    }
}
