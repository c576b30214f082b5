// HTTP plumbing for talking to a switch admin console.
//
// Redirect following is disabled on purpose: the consoles use redirects as
// protocol signals (unauthenticated pages bounce to the login page, logins
// bounce to the dashboard), so the raw 30x responses must reach the caller.

use std::time::Duration;

use reqwest::redirect;
use tracing::debug;
use url::Url;

use crate::error::Error;

const USER_AGENT: &str = concat!("plusctl/", env!("CARGO_PKG_VERSION"));

/// Form data as ordered key/value pairs, urlencoded on the wire.
pub type Form = Vec<(String, String)>;

/// Transport settings for building the underlying HTTP client.
///
/// The timeout bounds each individual HTTP call, not a multi-step sequence
/// like the full login handshake.
#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub timeout: Duration,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(10),
        }
    }
}

impl TransportConfig {
    /// Build a `reqwest::Client` from this config.
    pub fn build_client(&self) -> Result<reqwest::Client, Error> {
        let client = reqwest::Client::builder()
            .timeout(self.timeout)
            .user_agent(USER_AGENT)
            .redirect(redirect::Policy::none())
            .build()?;
        Ok(client)
    }
}

/// Thin request/response wrapper bound to one device address.
#[derive(Debug, Clone)]
pub struct Transport {
    http: reqwest::Client,
    base_url: Url,
}

impl Transport {
    /// Create a transport for `address`, which may be a bare host/IP
    /// (`192.168.0.239`) or carry an explicit scheme. Bare addresses get
    /// `http://` -- the consoles don't serve TLS.
    pub fn new(address: &str, config: &TransportConfig) -> Result<Self, Error> {
        let with_scheme = if address.starts_with("http://") || address.starts_with("https://") {
            address.to_owned()
        } else {
            format!("http://{address}")
        };
        let base_url = Url::parse(&with_scheme)?;
        Ok(Self {
            http: config.build_client()?,
            base_url,
        })
    }

    /// The device base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    /// Send a GET request. `path` may already carry a query string.
    pub async fn get(
        &self,
        path: &str,
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("GET {}", url);

        let mut req = self.http.get(url);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        Ok(req.send().await?)
    }

    /// Send a POST request with an urlencoded form body.
    pub async fn post_form(
        &self,
        path: &str,
        form: &[(String, String)],
        headers: &[(&str, &str)],
    ) -> Result<reqwest::Response, Error> {
        let url = self.url(path)?;
        debug!("POST {}", url);

        let mut req = self.http.post(url).form(form);
        for (name, value) in headers {
            req = req.header(*name, *value);
        }
        Ok(req.send().await?)
    }

    /// Read a response body as text.
    pub async fn read_body(&self, resp: reqwest::Response) -> Result<String, Error> {
        Ok(resp.text().await?)
    }
}
