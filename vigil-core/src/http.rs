use std::rc::Rc;

use async_trait::async_trait;
use leptos::RwSignal;
use leptos::SignalGetUntracked;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ApiConfig;
use crate::error::{rejection_message, ApiError};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl Method {
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        }
    }
}

#[derive(Clone, Debug)]
pub struct HttpRequest {
    pub method: Method,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
}

#[derive(Clone, Debug)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The wire seam. The browser build talks through `FetchTransport`; tests
/// inject a scripted stub so every store runs natively in isolation.
#[async_trait(?Send)]
pub trait Transport {
    /// Returns `Err` only for transport-level failures where no response
    /// reached the client; any received response comes back `Ok`, whatever
    /// its status code.
    async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String>;
}

/// Issues JSON requests against the configured backend with bearer-token
/// injection.
///
/// The token signal is owned and written by the session store; everything
/// else, this gateway included, only ever reads it.
#[derive(Clone)]
pub struct Gateway {
    base_url: String,
    token: RwSignal<Option<String>>,
    transport: Rc<dyn Transport>,
}

impl Gateway {
    pub fn new(
        config: &ApiConfig,
        token: RwSignal<Option<String>>,
        transport: Rc<dyn Transport>,
    ) -> Self {
        Self {
            base_url: config.base_url.clone(),
            token,
            transport,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, ApiError> {
        let response = self.send(Method::Get, path, query, None).await?;
        decode_body(response)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = encode_body(body)?;
        let response = self.send(Method::Post, path, &[], Some(payload)).await?;
        decode_body(response)
    }

    pub async fn put_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let payload = encode_body(body)?;
        let response = self.send(Method::Put, path, &[], Some(payload)).await?;
        decode_body(response)
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::Delete, path, &[], None).await?;
        Ok(())
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<String>,
    ) -> Result<HttpResponse, ApiError> {
        let request = HttpRequest {
            method,
            url: self.url(path, query),
            headers: self.headers(body.is_some()),
            body,
        };
        log::debug!("{} {}", request.method.as_str(), request.url);

        let response = self
            .transport
            .execute(request)
            .await
            .map_err(ApiError::Transport)?;

        if !response.is_success() {
            return Err(ApiError::Rejected {
                status: response.status,
                message: rejection_message(response.status, &response.body),
            });
        }
        Ok(response)
    }

    fn url(&self, path: &str, query: &[(&str, String)]) -> String {
        let mut url = format!("{}{}", self.base_url, path);
        for (index, (key, value)) in query.iter().enumerate() {
            let separator = if index == 0 { '?' } else { '&' };
            url.push(separator);
            url.push_str(key);
            url.push('=');
            url.push_str(value);
        }
        url
    }

    fn headers(&self, has_body: bool) -> Vec<(String, String)> {
        let mut headers = Vec::new();
        if has_body {
            headers.push(("Content-Type".to_string(), "application/json".to_string()));
        }
        if let Some(token) = self.token.get_untracked() {
            headers.push(("Authorization".to_string(), format!("Bearer {token}")));
        }
        headers
    }
}

fn encode_body<B: Serialize>(body: &B) -> Result<String, ApiError> {
    serde_json::to_string(body).map_err(|e| ApiError::Decode(e.to_string()))
}

fn decode_body<T: DeserializeOwned>(response: HttpResponse) -> Result<T, ApiError> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(target_arch = "wasm32")]
pub use fetch::FetchTransport;

#[cfg(target_arch = "wasm32")]
mod fetch {
    use super::{HttpRequest, HttpResponse, Method, Transport};
    use async_trait::async_trait;
    use gloo_net::http::Request;

    /// Browser transport over the fetch API.
    pub struct FetchTransport;

    #[async_trait(?Send)]
    impl Transport for FetchTransport {
        async fn execute(&self, request: HttpRequest) -> Result<HttpResponse, String> {
            let mut builder = match request.method {
                Method::Get => Request::get(&request.url),
                Method::Post => Request::post(&request.url),
                Method::Put => Request::put(&request.url),
                Method::Delete => Request::delete(&request.url),
            };
            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = match request.body {
                Some(body) => builder
                    .body(body)
                    .map_err(|e| e.to_string())?
                    .send()
                    .await,
                None => builder.send().await,
            }
            .map_err(|e| e.to_string())?;

            let status = response.status();
            let body = response.text().await.map_err(|e| e.to_string())?;
            Ok(HttpResponse { status, body })
        }
    }
}
