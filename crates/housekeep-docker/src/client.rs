//! Docker Engine API client over a Unix domain socket

use crate::stream::DockerEventStream;
use crate::wire;
use async_trait::async_trait;
use housekeep_domain::{
    ContainerInfo, DeletedItem, EngineClient, EventQuery, EventStream, ImageDeleteError,
    TransportError,
};
use http_body_util::{BodyExt, Full};
use hyper::body::{Bytes, Incoming};
use hyper::client::conn::http1::SendRequest;
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use std::path::{Path, PathBuf};
use tokio::net::UnixStream;
use tokio::task::JoinHandle;

/// Default Docker control socket
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// Client for the Docker Engine API
///
/// Each request opens its own connection; the event stream keeps its
/// connection for as long as the stream lives.
#[derive(Debug, Clone)]
pub struct DockerClient {
    socket_path: PathBuf,
}

impl DockerClient {
    /// Client for the default socket path
    pub fn new() -> Self {
        Self::with_socket(DEFAULT_SOCKET_PATH)
    }

    /// Client for a custom socket path
    pub fn with_socket(path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
        }
    }

    /// Client for the socket named by `DOCKER_HOST`, if it is a `unix://` URL
    ///
    /// Falls back to the default socket otherwise.
    pub fn from_env() -> Self {
        match std::env::var("DOCKER_HOST") {
            Ok(host) => match host.strip_prefix("unix://") {
                Some(path) => Self::with_socket(path),
                None => {
                    tracing::warn!(%host, "DOCKER_HOST is not a unix socket, using {DEFAULT_SOCKET_PATH}");
                    Self::new()
                }
            },
            Err(_) => Self::new(),
        }
    }

    /// Socket path this client dials
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    /// Check that the engine answers
    pub async fn ping(&self) -> Result<(), TransportError> {
        let (status, body) = self.request(Method::GET, "/_ping").await?;
        if status.is_success() {
            Ok(())
        } else {
            Err(status_error(status, &body))
        }
    }

    async fn connect(&self) -> Result<(SendRequest<Full<Bytes>>, JoinHandle<()>), TransportError> {
        let stream = UnixStream::connect(&self.socket_path)
            .await
            .map_err(|e| TransportError::Connect {
                path: self.socket_path.display().to_string(),
                reason: e.to_string(),
            })?;

        let (sender, conn) = hyper::client::conn::http1::handshake(TokioIo::new(stream))
            .await
            .map_err(|e| TransportError::Http(format!("HTTP handshake failed: {e}")))?;

        let handle = tokio::spawn(async move {
            if let Err(e) = conn.await {
                tracing::debug!("engine connection closed: {}", e);
            }
        });

        Ok((sender, handle))
    }

    /// Send a bodiless request and return the response head and streaming body
    async fn send(
        &self,
        method: Method,
        path: &str,
    ) -> Result<(StatusCode, Incoming, JoinHandle<()>), TransportError> {
        let (mut sender, conn) = self.connect().await?;

        let request = Request::builder()
            .method(method.clone())
            .uri(format!("http://localhost{path}"))
            .header("Host", "localhost")
            .body(Full::new(Bytes::new()))
            .map_err(|e| TransportError::Http(format!("failed to build request: {e}")))?;

        tracing::debug!(%method, path, "engine request");

        let response = sender
            .send_request(request)
            .await
            .map_err(|e| TransportError::Http(format!("failed to send request: {e}")))?;

        Ok((response.status(), response.into_body(), conn))
    }

    /// Send a bodiless request and collect the whole response body
    async fn request(&self, method: Method, path: &str) -> Result<(StatusCode, Bytes), TransportError> {
        let (status, body, _conn) = self.send(method, path).await?;
        let body = body
            .collect()
            .await
            .map_err(|e| TransportError::Http(format!("failed to read response: {e}")))?
            .to_bytes();
        Ok((status, body))
    }
}

impl Default for DockerClient {
    fn default() -> Self {
        Self::new()
    }
}

fn status_error(status: StatusCode, body: &[u8]) -> TransportError {
    TransportError::Status {
        status: status.as_u16(),
        message: wire::error_message(body),
    }
}

#[async_trait]
impl EngineClient for DockerClient {
    async fn stream_events(&self, query: EventQuery) -> Result<Box<dyn EventStream>, TransportError> {
        let path = wire::events_path(&query);
        let (status, body, conn) = self.send(Method::GET, &path).await?;

        if !status.is_success() {
            let body = body
                .collect()
                .await
                .map(|collected| collected.to_bytes())
                .unwrap_or_default();
            conn.abort();
            return Err(status_error(status, &body));
        }

        Ok(Box::new(DockerEventStream::new(body, conn)))
    }

    async fn inspect_container(&self, id: &str) -> Result<Option<ContainerInfo>, TransportError> {
        let (status, body) = self
            .request(Method::GET, &format!("/containers/{id}/json"))
            .await?;

        match status {
            StatusCode::NOT_FOUND => Ok(None),
            status if status.is_success() => wire::decode_container(&body).map(Some),
            status => Err(status_error(status, &body)),
        }
    }

    async fn delete_image(&self, id: &str) -> Result<Vec<DeletedItem>, ImageDeleteError> {
        let (status, body) = self.request(Method::DELETE, &format!("/images/{id}")).await?;

        if status.is_success() {
            Ok(wire::decode_delete(&body)?)
        } else {
            Err(ImageDeleteError::from_status(
                status.as_u16(),
                wire::error_message(&body),
            ))
        }
    }
}
