pub mod types;

use std::time::Duration;

use serde::de::DeserializeOwned;
use tracing::{debug, error};

use crate::config::AppConfig;
use crate::error::Error;
pub use types::{FileDetail, FileListPage, FileSummary};

/// Request timeout for list/detail calls. The remote service is slow under
/// load; retries live in the asset downloader, never here.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(90);

/// Read-only access to the remote inspection API.
///
/// The sync engine only depends on this trait; the reqwest-backed
/// [`ApiClient`] is the production implementation and tests substitute fakes.
pub trait RemoteApi {
    fn fetch_file_list(&self, page: u32, page_size: u32) -> Result<FileListPage, Error>;
    fn fetch_file_detail(&self, remote_id: i64) -> Result<FileDetail, Error>;
}

/// Blocking HTTP client for the remote API. Holds the base URL and the static
/// access token; attaches the token to every request as a query parameter.
pub struct ApiClient {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl ApiClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, Error> {
        Self::new(&config.api_base_url, &config.api_token)
    }

    fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T, Error> {
        debug!("GET {}", url);
        let response = self
            .client
            .get(url)
            .query(&[("token", self.token.as_str())])
            .query(query)
            .send()
            .map_err(|err| {
                error!("Request to {} failed: {}", url, err);
                err
            })?;

        let status = response.status();
        if !status.is_success() {
            error!("Request to {} returned HTTP {}", url, status);
            return Err(Error::RemoteStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        Ok(response.json()?)
    }
}

impl RemoteApi for ApiClient {
    fn fetch_file_list(&self, page: u32, page_size: u32) -> Result<FileListPage, Error> {
        let url = format!("{}/files", self.base_url);
        self.get_json(
            &url,
            &[("page", page.to_string()), ("limit", page_size.to_string())],
        )
    }

    fn fetch_file_detail(&self, remote_id: i64) -> Result<FileDetail, Error> {
        let url = format!("{}/files/{}", self.base_url, remote_id);
        self.get_json(&url, &[])
    }
}
