use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::timeout;

use bookfind_api::limits::{enforce_max_response_size, MAX_RESPONSE_BYTES};
use bookfind_api::params::{LANG_RESTRICT, MAX_RESULTS};
use bookfind_api::volume::{map_records, SearchPayload, VolumeResult};

pub mod connect;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// Unusable endpoint or a response head we cannot parse.
    #[error("invalid message")]
    InvalidMessage,
    #[error("connection failed")]
    Connection,
    #[error("request timed out")]
    Timeout,
    #[error("i/o error")]
    Io,
    /// Non-2xx response from the catalog.
    #[error("catalog returned status {0}")]
    Status(u16),
}

pub trait IoStream: AsyncRead + AsyncWrite + Unpin + Send {}
impl<T: AsyncRead + AsyncWrite + Unpin + Send> IoStream for T {}
pub type DynStream = Pin<Box<dyn IoStream>>;

pub type ConnectorFn = dyn Fn(
        &str,
        u16,
    ) -> Pin<Box<dyn std::future::Future<Output = Result<DynStream, FetchError>> + Send>>
    + Send
    + Sync;

/// Where the volumes endpoint lives. Defaults to the public catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoint {
    pub host: String,
    pub port: u16,
    pub base_path: String,
    pub tls: bool,
}

impl Default for CatalogEndpoint {
    fn default() -> Self {
        Self {
            host: "www.googleapis.com".to_string(),
            port: 443,
            base_path: "/books/v1/volumes".to_string(),
            tls: true,
        }
    }
}

impl CatalogEndpoint {
    /// Parse an `http(s)://host[:port]/path` override (e.g. from env config).
    pub fn parse(raw: &str) -> Result<Self, FetchError> {
        let parsed = url::Url::parse(raw).map_err(|_| FetchError::InvalidMessage)?;
        let tls = match parsed.scheme() {
            "https" => true,
            "http" => false,
            _ => return Err(FetchError::InvalidMessage),
        };
        let host = parsed
            .host_str()
            .ok_or(FetchError::InvalidMessage)?
            .to_string();
        let port = parsed.port().unwrap_or(if tls { 443 } else { 80 });
        Ok(Self {
            host,
            port,
            base_path: parsed.path().to_string(),
            tls,
        })
    }

    /// Request target for one search: fixed language restriction and batch
    /// size, URL-encoded free-text query.
    pub fn request_path(&self, query: &str) -> String {
        format!(
            "{}?langRestrict={}&maxResults={}&q={}",
            self.base_path,
            LANG_RESTRICT,
            MAX_RESULTS,
            utf8_percent_encode(query, NON_ALPHANUMERIC)
        )
    }
}

#[derive(Clone)]
pub struct CatalogClient {
    endpoint: CatalogEndpoint,
    connector: Arc<ConnectorFn>,
    pub req_timeout: Duration,
    pub header_read_chunk: usize,
}

impl CatalogClient {
    pub fn new_with_connector(endpoint: CatalogEndpoint, connector: Arc<ConnectorFn>) -> Self {
        Self {
            endpoint,
            connector,
            req_timeout: Duration::from_secs(10),
            header_read_chunk: 2048,
        }
    }

    /// Client for tests: default endpoint, connector expected to hand out
    /// in-memory streams (e.g. via tokio::io::duplex).
    pub fn new_test(connector: Arc<ConnectorFn>) -> Self {
        Self::new_with_connector(CatalogEndpoint::default(), connector)
    }

    pub fn endpoint(&self) -> &CatalogEndpoint {
        &self.endpoint
    }

    /// One GET against the volumes endpoint. No retries; the caller's
    /// in-flight guard ensures at most one of these is outstanding.
    pub async fn search(&self, query: &str) -> Result<Vec<VolumeResult>, FetchError> {
        let path = self.endpoint.request_path(query);

        let fut = (self.connector)(&self.endpoint.host, self.endpoint.port);
        let mut stream = timeout(self.req_timeout, fut)
            .await
            .map_err(|_| FetchError::Timeout)??;

        let req = format!(
            "GET {} HTTP/1.1\r\nhost: {}\r\naccept: application/json\r\nconnection: close\r\n\r\n",
            path, self.endpoint.host
        );
        timeout(self.req_timeout, stream.write_all(req.as_bytes()))
            .await
            .map_err(|_| FetchError::Timeout)?
            .map_err(|_| FetchError::Io)?;
        let _ = timeout(self.req_timeout, stream.flush())
            .await
            .map_err(|_| FetchError::Timeout);

        let resp = read_response(&mut stream, self.header_read_chunk).await?;
        if !(200..300).contains(&resp.code) {
            return Err(FetchError::Status(resp.code));
        }
        Ok(decode_volumes(&resp.body))
    }
}

/// Decode a response body into mapped results. A missing or unparsable body
/// is zero results, not an error.
pub fn decode_volumes(body: &[u8]) -> Vec<VolumeResult> {
    let payload: SearchPayload = match serde_json::from_slice(body) {
        Ok(p) => p,
        Err(err) => {
            tracing::debug!("[catalog] undecodable response body: {err}");
            return Vec::new();
        }
    };
    map_records(&payload.items.unwrap_or_default())
}

struct RawResponse {
    code: u16,
    body: Vec<u8>,
}

async fn read_response(stream: &mut DynStream, chunk: usize) -> Result<RawResponse, FetchError> {
    // Read head up to CRLFCRLF; enforce total cap.
    let mut buf: Vec<u8> = Vec::with_capacity(4096);
    let mut tmp = vec![0u8; chunk.max(1)];
    let header_end;
    loop {
        let n = stream.read(&mut tmp).await.map_err(|_| FetchError::Io)?;
        if n == 0 {
            return Err(FetchError::Connection);
        }
        buf.extend_from_slice(&tmp[..n]);
        if buf.len() > MAX_RESPONSE_BYTES {
            return Err(FetchError::Io);
        }
        if let Some(pos) = memchr::memmem::find(&buf, b"\r\n\r\n") {
            header_end = pos;
            break;
        }
    }
    let (head, rest) = buf.split_at(header_end + 4);
    let head_str = std::str::from_utf8(head).map_err(|_| FetchError::InvalidMessage)?;
    let mut lines = head_str.split("\r\n");
    let status = lines.next().unwrap_or("");
    let mut sp = status.split_whitespace();
    let _proto = sp.next().unwrap_or("");
    let code = sp
        .next()
        .and_then(|c| c.parse::<u16>().ok())
        .ok_or(FetchError::InvalidMessage)?;
    let mut content_length: Option<usize> = None;
    for line in lines {
        if line.is_empty() {
            continue;
        }
        if let Some((name, value)) = line.split_once(':') {
            if name.trim().eq_ignore_ascii_case("content-length") {
                if let Ok(n) = value.trim().parse::<usize>() {
                    content_length = Some(n);
                }
            }
        }
    }

    let mut body = rest.to_vec();
    match content_length {
        Some(len) => {
            enforce_max_response_size(header_end + 4 + len).map_err(|_| FetchError::Io)?;
            while body.len() < len {
                let mut chunk = [0u8; 4096];
                let n = stream.read(&mut chunk).await.map_err(|_| FetchError::Io)?;
                if n == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..n]);
                if header_end + 4 + body.len() > MAX_RESPONSE_BYTES {
                    return Err(FetchError::Io);
                }
            }
            body.truncate(len);
        }
        None => {
            // connection: close semantics, read until EOF
            loop {
                let mut chunk = [0u8; 4096];
                let n = stream.read(&mut chunk).await.map_err(|_| FetchError::Io)?;
                if n == 0 {
                    break;
                }
                body.extend_from_slice(&chunk[..n]);
                if header_end + 4 + body.len() > MAX_RESPONSE_BYTES {
                    return Err(FetchError::Io);
                }
            }
        }
    }
    Ok(RawResponse { code, body })
}
