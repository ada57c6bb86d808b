//! Page transport

use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SearchError};

const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Fetches the body of one page request
///
/// The iterator only needs a blocking `GET`; tests substitute scripted
/// responses.
pub trait PageTransport {
    fn fetch(&mut self, url: &str) -> Result<String>;
}

impl<T: PageTransport + ?Sized> PageTransport for Box<T> {
    fn fetch(&mut self, url: &str) -> Result<String> {
        (**self).fetch(url)
    }
}

/// Blocking HTTP transport
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Create a transport with the default request timeout
    pub fn new() -> Result<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Create a transport with a custom request timeout
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl PageTransport for HttpTransport {
    fn fetch(&mut self, url: &str) -> Result<String> {
        debug!(url = url, "GET");
        let response = self.client.get(url).send()?;

        if !response.status().is_success() {
            return Err(SearchError::Transport(format!(
                "Request failed with status: {}",
                response.status()
            )));
        }

        Ok(response.text()?)
    }
}
