pub mod models;

use std::fmt;
use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::Serialize;
use serde::de::{DeserializeOwned, IgnoredAny};

use crate::error::{ClientError, Result};
use crate::storage::LocalStorage;

const BODY_SNIPPET_LEN: usize = 2000;

/// Method, body, headers and query of a single request. Defaults to a bare GET.
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    pub method: Method,
    pub body: Option<serde_json::Value>,
    pub headers: Vec<(String, String)>,
    pub query: Vec<(String, String)>,
}

impl FetchOptions {
    pub fn new(method: Method) -> Self {
        FetchOptions {
            method,
            ..Default::default()
        }
    }

    pub fn json_body<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self> {
        self.body = Some(serde_json::to_value(body).map_err(ClientError::Encode)?);
        Ok(self)
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// Thin JSON client for the book backend. Reads the bearer token from storage on every call.
#[derive(Clone)]
pub struct ApiClient {
    base_url: String,
    storage: Arc<dyn LocalStorage>,
    client: reqwest::Client,
}

impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a new client with the given base URL (e.g. "http://localhost:3000/api").
    pub fn new(base_url: impl Into<String>, storage: Arc<dyn LocalStorage>) -> Result<Self> {
        let client = reqwest::Client::builder().build()?;
        let base_url_str = base_url.into();
        tracing::debug!(base_url = %base_url_str, "creating ApiClient");
        Ok(ApiClient {
            base_url: base_url_str.trim_end_matches('/').to_string(),
            storage,
            client,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn storage(&self) -> &Arc<dyn LocalStorage> {
        &self.storage
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    fn build_headers(&self, extra: &[(String, String)]) -> Result<HeaderMap> {
        let mut headers = HeaderMap::new();
        for (k, v) in extra {
            let name = HeaderName::from_bytes(k.as_bytes())
                .map_err(|_| ClientError::Validation(format!("invalid header name: {k}")))?;
            let value = HeaderValue::from_str(v)
                .map_err(|_| ClientError::Validation(format!("invalid value for header {k}")))?;
            headers.insert(name, value);
        }
        if let Some(token) = self.storage.token()? {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|_| ClientError::Validation("stored token is not a valid header".into()))?;
            headers.insert(AUTHORIZATION, value);
        }
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }

    /// Perform one request. Non-2xx fails with the body text, 204 or an empty body
    /// yields `None`, anything else must parse as `T`.
    #[tracing::instrument(level = "debug", skip(self, options), fields(method = %options.method))]
    pub async fn fetch<T: DeserializeOwned>(
        &self,
        path: &str,
        options: FetchOptions,
    ) -> Result<Option<T>> {
        let url = self.url(path);
        let headers = self.build_headers(&options.headers)?;
        tracing::debug!(%url, authenticated = headers.contains_key(AUTHORIZATION), "sending request");

        let mut req = self.client.request(options.method.clone(), &url).headers(headers);
        if !options.query.is_empty() {
            req = req.query(&options.query);
        }
        if let Some(body) = &options.body {
            req = req.body(serde_json::to_vec(body).map_err(ClientError::Encode)?);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            tracing::warn!(%url, %status, "request rejected");
            return Err(ClientError::Request { status, body });
        }
        if status == StatusCode::NO_CONTENT || body.is_empty() {
            return Ok(None);
        }
        match serde_json::from_str::<T>(&body) {
            Ok(parsed) => Ok(Some(parsed)),
            Err(e) => {
                let snippet: String = body.chars().take(BODY_SNIPPET_LEN).collect();
                tracing::error!(error = %e, %url, body_snippet = %snippet, "failed to parse response");
                Err(ClientError::Decode {
                    context: format!("{} {}", options.method, path),
                    source: e,
                })
            }
        }
    }

    /// GET a JSON document; an empty response is an error.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let mut options = FetchOptions::default();
        for (k, v) in query {
            options = options.query(*k, v);
        }
        self.fetch(path, options)
            .await?
            .ok_or_else(|| ClientError::EmptyResponse(format!("GET {path}")))
    }

    /// Send a JSON body and parse the JSON answer; an empty response is an error.
    pub async fn send_json<T, B>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let context = format!("{method} {path}");
        let options = FetchOptions::new(method).json_body(body)?;
        self.fetch(path, options)
            .await?
            .ok_or(ClientError::EmptyResponse(context))
    }

    /// Send a request whose answer carries no data worth keeping.
    pub async fn send_no_content(&self, method: Method, path: &str) -> Result<()> {
        self.fetch::<IgnoredAny>(path, FetchOptions::new(method))
            .await
            .map(|_| ())
    }
}

/// Internal serde helpers
pub mod de {
    use serde::{Deserialize, Deserializer};

    /// Accept an identifier given either as a JSON number or a string.
    pub fn string_from_str_or_num<'de, D>(deserializer: D) -> Result<String, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum NumOrStr {
            Int(i64),
            Uint(u64),
            Str(String),
        }

        Ok(match NumOrStr::deserialize(deserializer)? {
            NumOrStr::Int(n) => n.to_string(),
            NumOrStr::Uint(n) => n.to_string(),
            NumOrStr::Str(s) => s,
        })
    }
}
