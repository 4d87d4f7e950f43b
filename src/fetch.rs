use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::error::{FetchError, PokedexError};

/// Retrieves one JSON resource by URL. No retries happen at this layer.
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}

#[async_trait]
impl<'a, T: ResourceFetcher + ?Sized> ResourceFetcher for &'a T {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        (**self).fetch_json(url).await
    }
}

/// Fetches `url` and deserializes it into `T`.
pub async fn fetch_as<F, T>(fetcher: &F, url: &str) -> Result<T, PokedexError>
where
    F: ResourceFetcher + ?Sized,
    T: DeserializeOwned,
{
    let value = fetcher.fetch_json(url).await?;
    serde_json::from_value(value).map_err(|err| PokedexError::MalformedPayload {
        url: url.to_string(),
        message: err.to_string(),
    })
}

#[derive(Clone)]
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self, PokedexError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("pokedex-catalog/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| PokedexError::HttpClient(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|err| PokedexError::HttpClient(err.to_string()))?;
        Ok(Self { client })
    }

    fn handle_status(url: &str, response: Response) -> Result<Response, FetchError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status();
        Err(FetchError::Status {
            url: url.to_string(),
            status: status.as_u16(),
            message: status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
        })
    }
}

#[async_trait]
impl ResourceFetcher for HttpFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|err| transport_error(url, err))?;
        let response = Self::handle_status(url, response)?;
        let body = response
            .bytes()
            .await
            .map_err(|err| transport_error(url, err))?;
        serde_json::from_slice(&body).map_err(|err| FetchError::Decode {
            url: url.to_string(),
            message: err.to_string(),
        })
    }
}

fn transport_error(url: &str, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: err.to_string(),
        }
    }
}

/// URL builder for the PokéAPI resources the catalogue reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiEndpoints {
    base_url: String,
}

impl ApiEndpoints {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn pokemon_list(&self, limit: usize, offset: usize) -> String {
        format!("{}/pokemon?limit={limit}&offset={offset}", self.base_url)
    }

    pub fn habitat_list(&self) -> String {
        format!("{}/pokemon-habitat?limit=100", self.base_url)
    }

    pub fn type_list(&self) -> String {
        format!("{}/type?limit=100", self.base_url)
    }

    pub fn pokemon(&self, id_or_name: &str) -> String {
        format!("{}/pokemon/{}", self.base_url, id_or_name.trim())
    }

    pub fn species(&self, id_or_name: &str) -> String {
        format!("{}/pokemon-species/{}", self.base_url, id_or_name.trim())
    }
}
