use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};

use crate::domain::PhamId;
use crate::error::VerifyError;

pub const DEFAULT_BASE_URL: &str = "http://phages.wustl.edu/starterator/json/";

const LISTING_TIMEOUT: Duration = Duration::from_secs(20);
const DATASET_TIMEOUT: Duration = Duration::from_secs(15);

pub trait StarteratorClient: Send + Sync {
    /// Raw HTML of the directory listing that links every `<id>.json`.
    fn fetch_listing(&self) -> Result<String, VerifyError>;
    fn fetch_dataset(&self, id: PhamId) -> Result<Vec<u8>, VerifyError>;
}

#[derive(Clone)]
pub struct StarteratorHttpClient {
    client: Client,
    base_url: String,
}

impl StarteratorHttpClient {
    pub fn new(base_url: &str) -> Result<Self, VerifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&format!("starterator-verify/{}", env!("CARGO_PKG_VERSION")))
                .map_err(|err| VerifyError::ServerHttp(err.to_string()))?,
        );
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|err| VerifyError::ServerHttp(err.to_string()))?;
        Ok(Self {
            client,
            base_url: normalize_base_url(base_url),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn dataset_url(&self, id: PhamId) -> String {
        format!("{}{}", self.base_url, id.json_file_name())
    }

    fn get(
        &self,
        url: &str,
        timeout: Duration,
    ) -> Result<reqwest::blocking::Response, VerifyError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .map_err(|err| VerifyError::ServerHttp(format!("{url}: {err}")))?;
        Self::handle_status(response)
    }

    fn handle_status(
        response: reqwest::blocking::Response,
    ) -> Result<reqwest::blocking::Response, VerifyError> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let message = format!("{}", response.url());
        Err(VerifyError::ServerStatus { status, message })
    }
}

impl StarteratorClient for StarteratorHttpClient {
    fn fetch_listing(&self) -> Result<String, VerifyError> {
        tracing::info!(url = %self.base_url, "fetching pham listing");
        self.get(&self.base_url, LISTING_TIMEOUT)?
            .text()
            .map_err(|err| VerifyError::ServerHttp(err.to_string()))
    }

    fn fetch_dataset(&self, id: PhamId) -> Result<Vec<u8>, VerifyError> {
        let url = self.dataset_url(id);
        tracing::debug!(%url, "downloading pham dataset");
        let bytes = self
            .get(&url, DATASET_TIMEOUT)?
            .bytes()
            .map_err(|err| VerifyError::ServerHttp(format!("{url}: {err}")))?;
        Ok(bytes.to_vec())
    }
}

fn normalize_base_url(base_url: &str) -> String {
    let trimmed = base_url.trim();
    if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
