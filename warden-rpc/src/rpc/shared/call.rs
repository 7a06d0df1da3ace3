use std::time::Duration;

use reqwest::{Client, RequestBuilder, Response};

use rst_common::standard::serde::de::DeserializeOwned;
use rst_common::standard::serde_json;
use rst_common::with_errors::thiserror::{self, Error};

use prople_warden_core::agent::AgentError;
use prople_warden_core::identity::types::IdentityError;

use crate::common::types::CommonError;

#[derive(Debug, Error, PartialEq)]
pub enum CallError {
    #[error("request error: {0}")]
    RequestError(String),

    #[error("timeout: {0}")]
    Timeout(String),

    #[error("response error: status {status}: {message}")]
    ResponseError { status: u16, message: String },

    #[error("unserialize error: {0}")]
    UnserializeError(String),

    #[error("response body larger than {0} bytes")]
    BodyTooLarge(usize),
}

impl From<CallError> for AgentError {
    fn from(value: CallError) -> Self {
        match value {
            CallError::RequestError(msg) => AgentError::RequestError(msg),
            CallError::Timeout(msg) => AgentError::Timeout(msg),
            CallError::ResponseError { status, message } => {
                AgentError::ResponseError { status, message }
            }
            CallError::UnserializeError(msg) => AgentError::UnserializeError(msg),
            CallError::BodyTooLarge(limit) => {
                AgentError::RequestError(CallError::BodyTooLarge(limit).to_string())
            }
        }
    }
}

impl From<CallError> for IdentityError {
    fn from(value: CallError) -> Self {
        IdentityError::Upstream(value.to_string())
    }
}

impl From<reqwest::Error> for CallError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            return CallError::Timeout(value.to_string());
        }

        CallError::RequestError(value.to_string())
    }
}

/// `HttpClient` is a `reqwest` client bound to a base url with a request timeout
#[derive(Clone, Debug)]
pub struct HttpClient {
    client: Client,
    base_url: String,
}

impl HttpClient {
    pub fn new(base_url: String, timeout: Duration) -> Result<Self, CommonError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| CommonError::RpcError(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn get(&self, path: &str) -> RequestBuilder {
        self.client.get(self.url(path))
    }

    pub fn post(&self, path: &str) -> RequestBuilder {
        self.client.post(self.url(path))
    }

    /// a request to an absolute url, outside of the base url
    pub fn get_absolute(&self, url: &str) -> RequestBuilder {
        self.client.get(url)
    }

    pub fn post_absolute(&self, url: &str) -> RequestBuilder {
        self.client.post(url)
    }
}

async fn send(request: RequestBuilder) -> Result<String, CallError> {
    let response = request.send().await?;
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        return Err(CallError::ResponseError {
            status: status.as_u16(),
            message: body,
        });
    }

    Ok(body)
}

/// `read_limited` collects the body chunk by chunk and stops once it passes `max_bytes`
async fn read_limited(mut response: Response, max_bytes: usize) -> Result<Vec<u8>, CallError> {
    if let Some(len) = response.content_length() {
        if len > max_bytes as u64 {
            return Err(CallError::BodyTooLarge(max_bytes));
        }
    }

    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > max_bytes {
            return Err(CallError::BodyTooLarge(max_bytes));
        }

        body.extend_from_slice(&chunk);
    }

    Ok(body)
}

/// `call_limited` is [`call`] for untrusted servers, the body may not exceed `max_bytes`
pub async fn call_limited<T: DeserializeOwned>(
    request: RequestBuilder,
    max_bytes: usize,
) -> Result<T, CallError> {
    let response = request.send().await?;
    let status = response.status();
    let body = read_limited(response, max_bytes).await?;

    if !status.is_success() {
        return Err(CallError::ResponseError {
            status: status.as_u16(),
            message: String::from_utf8_lossy(&body).to_string(),
        });
    }

    serde_json::from_slice(&body).map_err(|err| CallError::UnserializeError(err.to_string()))
}

/// `call` sends the request and decodes a successful JSON answer
pub async fn call<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, CallError> {
    let body = send(request).await?;
    serde_json::from_str(&body).map_err(|err| CallError::UnserializeError(err.to_string()))
}

/// `call_empty` sends the request and only checks the answer status
pub async fn call_empty(request: RequestBuilder) -> Result<(), CallError> {
    send(request).await.map(|_| ())
}
