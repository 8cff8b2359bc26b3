use std::{
    fmt,
    future::Future,
    pin::Pin,
    sync::Arc,
    time::{Duration, Instant},
};

use bytes::Bytes;
use log::debug;
use reqwest::Client as ReqwestClient;
use reqwest::header::HeaderValue;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sonic_rs::{Value, from_slice, to_vec};

pub type JsonBytes = Bytes;
pub type PostFuture<T> = Pin<Box<dyn Future<Output = T> + Send + 'static>>;
pub type PostResult<T> = Result<T, PostError>;

/// The two ways a submission can fail. HTTP status codes are not part of the
/// taxonomy: a 4xx/5xx reply with a JSON body resolves like any other reply.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PostErrorKind {
    /// The round trip did not complete (DNS, refused connection, reset
    /// while reading the body).
    Transport,
    /// The payload could not be serialized or the reply body was not valid
    /// JSON.
    Parse,
}

impl fmt::Display for PostErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Transport => f.write_str("transport"),
            Self::Parse => f.write_str("parse"),
        }
    }
}

#[derive(Clone, Debug, thiserror::Error)]
#[error("{kind} failure: {message}")]
pub struct PostError {
    kind: PostErrorKind,
    message: String,
}

impl PostError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            kind: PostErrorKind::Transport,
            message: message.into(),
        }
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self {
            kind: PostErrorKind::Parse,
            message: message.into(),
        }
    }

    pub fn kind(&self) -> PostErrorKind {
        self.kind
    }

    fn from_reqwest(err: reqwest::Error) -> Self {
        Self::transport(err.to_string())
    }

    pub fn from_json(err: sonic_rs::Error) -> Self {
        Self::parse(err.to_string())
    }
}

/// A pending POST. There is deliberately no method field and no timeout: the
/// endpoint takes exactly one verb and the caller waits as long as the
/// network does.
///
/// `Default` is the no-argument submission: empty target URL, empty JSON
/// object body.
#[derive(Clone, Debug)]
pub struct PostRequest {
    pub url: String,
    pub headers: Vec<(String, JsonBytes)>,
    pub body: JsonBytes,
}

impl PostRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: vec![(
                "content-type".to_string(),
                JsonBytes::from_static(b"application/json"),
            )],
            body: JsonBytes::from_static(b"{}"),
        }
    }

    /// Build a request whose body is `payload` serialized as JSON.
    pub fn json<T: Serialize>(url: impl Into<String>, payload: &T) -> PostResult<Self> {
        let body = to_vec(payload).map_err(PostError::from_json)?;
        Ok(Self::new(url).with_body(body))
    }

    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<JsonBytes>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn with_body(mut self, body: impl Into<JsonBytes>) -> Self {
        self.body = body.into();
        self
    }
}

impl Default for PostRequest {
    fn default() -> Self {
        Self::new("")
    }
}

#[derive(Clone, Debug)]
pub struct PostResponse {
    pub status: u16,
    pub headers: Vec<(String, JsonBytes)>,
    pub body: JsonBytes,
    pub elapsed: Duration,
}

impl PostResponse {
    pub fn status(&self) -> u16 {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> PostResult<T> {
        from_slice(&self.body).map_err(PostError::from_json)
    }
}

pub trait PostTransport: Send + Sync {
    fn execute(&self, request: PostRequest) -> PostFuture<PostResult<PostResponse>>;
}

pub type SharedPostTransport = dyn PostTransport + Send + Sync;

/// Submission client. Serialization and parsing live here; the wire lives
/// behind the [`PostTransport`] seam so tests can swap the network out.
#[derive(Clone)]
pub struct Client {
    transport: Arc<SharedPostTransport>,
}

impl Client {
    pub fn new() -> Self {
        Self::with_transport(HttpTransport::new())
    }

    pub fn with_transport<T>(transport: T) -> Self
    where
        T: PostTransport + 'static,
    {
        Self {
            transport: Arc::new(transport),
        }
    }

    pub async fn execute(&self, request: PostRequest) -> PostResult<PostResponse> {
        self.transport.execute(request).await
    }

    /// POST `data` as JSON to `url` and return the parsed JSON reply.
    ///
    /// The reply body is parsed whatever the HTTP status was; only a failed
    /// round trip or a non-JSON body is an error.
    pub async fn send<T: Serialize>(&self, url: impl Into<String>, data: &T) -> PostResult<Value> {
        self.send_as(url, data).await
    }

    /// Same as [`send`](Self::send) but parses the reply into a typed value.
    pub async fn send_as<T, R>(&self, url: impl Into<String>, data: &T) -> PostResult<R>
    where
        T: Serialize,
        R: DeserializeOwned,
    {
        let request = PostRequest::json(url, data)?;
        self.execute(request).await?.json::<R>()
    }
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

/// `reqwest`-backed transport. Redirects are followed automatically (the
/// client default); there is no request timeout, no cache and no cookie jar,
/// and no referrer is ever sent.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: ReqwestClient,
}

impl HttpTransport {
    pub fn new() -> Self {
        Self {
            client: ReqwestClient::new(),
        }
    }

    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

impl Default for HttpTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl PostTransport for HttpTransport {
    fn execute(&self, request: PostRequest) -> PostFuture<PostResult<PostResponse>> {
        let client = self.client.clone();
        Box::pin(async move {
            let start = Instant::now();
            let mut req = client.post(&request.url);

            for (key, value) in request.headers {
                let value = HeaderValue::from_bytes(value.as_ref())
                    .map_err(|err| PostError::transport(err.to_string()))?;
                req = req.header(key, value);
            }

            debug!("posting {} bytes to {}", request.body.len(), request.url);
            let resp = req
                .body(request.body)
                .send()
                .await
                .map_err(PostError::from_reqwest)?;

            let status = resp.status().as_u16();
            let headers = resp
                .headers()
                .iter()
                .map(|(name, value)| (name.to_string(), Bytes::copy_from_slice(value.as_ref())))
                .collect();
            let body = resp.bytes().await.map_err(PostError::from_reqwest)?;
            let elapsed = start.elapsed();
            debug!("reply status {} after {:?}", status, elapsed);

            Ok(PostResponse {
                status,
                headers,
                body,
                elapsed,
            })
        })
    }
}
