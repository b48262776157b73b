use std::env;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::stream::{Stream, StreamExt};
use reqwest::header::{self, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client as ReqwestClient, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use url::Url;

use crate::client_logger::ClientLogger;
use crate::error::{Error, Result};
use crate::gateway::{ByteStream, Gateway};
use crate::ndjson::process_ndjson;
use crate::observability::{CLIENT_REQUESTS, CLIENT_REQUEST_DURATION, CLIENT_REQUEST_ERRORS};
use crate::types::{
    Answer, AskRequest, ChatDetail, ChatSummary, CreateChatRequest, FileUpload, ModuleRecord,
    StreamEvent, UploadReceipt,
};

const DEFAULT_API_URL: &str = "http://localhost:8000/api/v1/";
const API_URL_ENV: &str = "KOVCHEG_API_URL";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
const NDJSON: &str = "application/x-ndjson";

/// Client for the Kovcheg chat service.
///
/// Cheap to clone; clones share the connection pool.
#[derive(Clone)]
pub struct Kovcheg {
    client: ReqwestClient,
    base_url: Url,
    timeout: Duration,
    logger: Option<Arc<dyn ClientLogger>>,
}

impl fmt::Debug for Kovcheg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Kovcheg")
            .field("base_url", &self.base_url.as_str())
            .field("timeout", &self.timeout)
            .field("logger", &self.logger.is_some())
            .finish()
    }
}

impl Kovcheg {
    /// Create a new Kovcheg client.
    ///
    /// The base URL can be provided directly or read from the KOVCHEG_API_URL
    /// environment variable; otherwise a local default is used.
    pub fn new(base_url: Option<String>) -> Result<Self> {
        Self::with_options(base_url, None)
    }

    /// Create a new client with custom settings.
    ///
    /// `timeout` bounds connection setup for every request and the whole
    /// exchange for requests that do not stream.
    pub fn with_options(base_url: Option<String>, timeout: Option<Duration>) -> Result<Self> {
        let base_url = match base_url {
            Some(url) => url,
            None => env::var(API_URL_ENV).unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
        };
        let base_url = parse_base_url(&base_url)?;

        let timeout = timeout.unwrap_or(DEFAULT_TIMEOUT);
        let client = ReqwestClient::builder()
            .connect_timeout(timeout)
            .build()
            .map_err(|e| {
                Error::http_client(
                    format!("Failed to build HTTP client: {e}"),
                    Some(Box::new(e)),
                )
            })?;

        Ok(Self {
            client,
            base_url,
            timeout,
            logger: None,
        })
    }

    /// Attaches a logger that sees every request and stream line.
    pub fn with_logger(mut self, logger: Arc<dyn ClientLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Returns the base URL all endpoints are resolved against.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Returns the configured timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Ask a question inside a chat and decode the streamed answer.
    ///
    /// Returns the answer as a stream of events. Blank and malformed lines
    /// never reach the caller; a transport failure is yielded once, as the
    /// last item.
    pub async fn stream_events(
        &self,
        chat_id: &str,
        request: &AskRequest,
    ) -> Result<impl Stream<Item = Result<StreamEvent>>> {
        let body = self.ask_stream(chat_id, request).await?;
        Ok(process_ndjson(body, self.logger.clone()))
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| Error::url(format!("Cannot use {} as a base URL", self.base_url), None))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn map_send_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::timeout(
                format!("request timed out: {e}"),
                Some(self.timeout.as_secs_f64()),
            )
        } else if e.is_connect() {
            Error::connection(e.to_string(), Some(Box::new(e)))
        } else {
            Error::http_client(format!("request failed: {e}"), Some(Box::new(e)))
        }
    }

    /// Sends a request and turns non-success statuses into errors.
    async fn execute(&self, method: &str, url: &Url, request: RequestBuilder) -> Result<Response> {
        if let Some(logger) = &self.logger {
            logger.log_request(method, url.as_str());
        }
        CLIENT_REQUESTS.click();
        let start = Instant::now();

        let outcome = match request.send().await {
            Ok(response) if response.status().is_success() => Ok(response),
            Ok(response) => Err(Self::process_error_response(response).await),
            Err(e) => Err(self.map_send_error(e)),
        };

        CLIENT_REQUEST_DURATION.add(start.elapsed().as_secs_f64());
        if outcome.is_err() {
            CLIENT_REQUEST_ERRORS.click();
        }
        outcome
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
        response.json::<T>().await.map_err(|e| {
            Error::serialization(
                format!("Failed to parse response: {e}"),
                Some(Box::new(e)),
            )
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T> {
        let url = self.endpoint(segments)?;
        let request = self
            .client
            .get(url.clone())
            .header(header::ACCEPT, HeaderValue::from_static("application/json"))
            .timeout(self.timeout);
        let response = self.execute("GET", &url, request).await?;
        Self::read_json(response).await
    }

    /// Process API response errors and convert to our Error type
    async fn process_error_response(response: Response) -> Error {
        let status = response.status().as_u16();
        match response.text().await {
            Ok(body) => error_for_status(status, &body),
            Err(e) => Error::http_client(
                format!("Failed to read error response: {e}"),
                Some(Box::new(e)),
            ),
        }
    }
}

/// Maps a non-success status and its body to an error.
///
/// The service reports failures as `{"detail": ...}`; anything else is
/// passed through as the message verbatim.
fn error_for_status(status: u16, body: &str) -> Error {
    let detail = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("detail").cloned());
    let message = match detail {
        Some(serde_json::Value::String(detail)) => detail,
        Some(detail) => detail.to_string(),
        None if body.trim().is_empty() => format!("HTTP status {status}"),
        None => body.to_string(),
    };

    match status {
        400 => Error::bad_request(message),
        404 => Error::not_found(message, None),
        408 => Error::timeout(message, None),
        500 => Error::internal_server(message),
        502..=504 => Error::service_unavailable(message),
        _ => Error::api(status, message),
    }
}

fn parse_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw)?;
    if url.cannot_be_a_base() {
        return Err(Error::url(format!("Cannot use {raw} as a base URL"), None));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

#[async_trait::async_trait]
impl Gateway for Kovcheg {
    async fn list_modules(&self) -> Result<Vec<ModuleRecord>> {
        self.get_json(&["modules"]).await
    }

    async fn create_chat(&self, title: &str) -> Result<ChatSummary> {
        let url = self.endpoint(&["chats"])?;
        let body = CreateChatRequest {
            title: title.to_string(),
        };
        let request = self
            .client
            .post(url.clone())
            .json(&body)
            .timeout(self.timeout);
        let response = self.execute("POST", &url, request).await?;
        Self::read_json(response).await
    }

    async fn list_chats(&self) -> Result<Vec<ChatSummary>> {
        self.get_json(&["chats"]).await
    }

    async fn get_chat(&self, chat_id: &str) -> Result<ChatDetail> {
        self.get_json(&["chats", chat_id]).await.map_err(|e| match e {
            Error::NotFound { message, .. } => Error::not_found(message, Some(chat_id.to_string())),
            other => other,
        })
    }

    async fn delete_chat(&self, chat_id: &str) -> Result<()> {
        let url = self.endpoint(&["chats", chat_id])?;
        let request = self.client.delete(url.clone()).timeout(self.timeout);
        self.execute("DELETE", &url, request).await?;
        Ok(())
    }

    async fn ask_stream(&self, chat_id: &str, request: &AskRequest) -> Result<ByteStream> {
        let url = self.endpoint(&["chats", chat_id, "ask_stream"])?;
        // No overall timeout: answers stream for as long as the model talks.
        let builder = self
            .client
            .post(url.clone())
            .header(header::ACCEPT, HeaderValue::from_static(NDJSON))
            .json(request);
        let response = self.execute("POST", &url, builder).await?;

        let body = response.bytes_stream().map(|result| {
            result.map_err(|e| {
                Error::streaming(format!("error in HTTP stream: {e}"), Some(Box::new(e)))
            })
        });
        Ok(Box::pin(body))
    }

    async fn upload(&self, chat_id: &str, upload: FileUpload) -> Result<UploadReceipt> {
        let url = self.endpoint(&["chats", chat_id, "upload"])?;
        let part = Part::bytes(upload.bytes).file_name(upload.filename);
        let form = Form::new().part("file", part);
        let request = self
            .client
            .post(url.clone())
            .multipart(form)
            .timeout(self.timeout);
        let response = self.execute("POST", &url, request).await?;
        Self::read_json(response).await
    }

    async fn ask(&self, request: &AskRequest) -> Result<Answer> {
        let url = self.endpoint(&["ask"])?;
        let builder = self
            .client
            .post(url.clone())
            .json(request)
            .timeout(self.timeout);
        let response = self.execute("POST", &url, builder).await?;
        Self::read_json(response).await
    }

    fn logger(&self) -> Option<Arc<dyn ClientLogger>> {
        self.logger.clone()
    }
}
