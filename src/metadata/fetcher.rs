use std::net::{IpAddr, SocketAddr, ToSocketAddrs};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client as ReqwestClient, Response};
use thiserror::Error;
use url::{Host, Url};

/// Desktop Chrome identity; some sites refuse obvious bot user agents.
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Largest body read from a page. Metadata lives in `<head>`, so anything
/// past this is dropped.
pub const MAX_PAGE_BYTES: usize = 2 * 1024 * 1024;

const MAX_REDIRECTS: usize = 10;

/// Why a page could not be retrieved. Always carries the URL that failed.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("invalid URL {url}")]
    InvalidUrl { url: String },

    #[error("could not resolve host for {url}: {source}")]
    Resolve {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{url} resolves to private address {addr}")]
    PrivateAddress { url: String, addr: IpAddr },

    #[error("timed out after {timeout:?} fetching {url}")]
    Timeout { url: String, timeout: Duration },

    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} responded with HTTP {status}")]
    Status { url: String, status: u16 },

    #[error("{url} is not an HTML page ({content_type})")]
    NotHtml { url: String, content_type: String },

    #[error("{url} declares {length} bytes, over the {limit} byte limit")]
    TooLarge { url: String, length: u64, limit: usize },

    #[error("failed to read body from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn url(&self) -> &str {
        match self {
            FetchError::InvalidUrl { url }
            | FetchError::Resolve { url, .. }
            | FetchError::PrivateAddress { url, .. }
            | FetchError::Timeout { url, .. }
            | FetchError::Request { url, .. }
            | FetchError::Status { url, .. }
            | FetchError::NotHtml { url, .. }
            | FetchError::TooLarge { url, .. }
            | FetchError::Body { url, .. } => url,
        }
    }
}

/// Returns `true` if `ip` is a private, loopback, link-local or unspecified
/// address. IPv4-mapped IPv6 addresses are checked as IPv4.
pub fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            let o = v4.octets();
            matches!(
                o,
                [127, ..]
                    | [10, ..]
                    | [169, 254, ..]
                    | [192, 168, ..]
                    | [0, ..]
                    | [255, 255, 255, 255]
            ) || (o[0] == 172 && (16..=31).contains(&o[1]))
                || (o[0] == 100 && (64..=127).contains(&o[1]))
        }
        IpAddr::V6(v6) => match v6.to_ipv4_mapped() {
            Some(v4) => is_private_ip(IpAddr::V4(v4)),
            None => {
                v6.is_loopback()
                    || v6.is_unspecified()
                    || (v6.segments()[0] & 0xfe00 == 0xfc00)
                    || (v6.segments()[0] & 0xffc0 == 0xfe80)
            }
        },
    }
}

fn first_private(addrs: impl IntoIterator<Item = SocketAddr>) -> Option<IpAddr> {
    addrs.into_iter().map(|a| a.ip()).find(|ip| is_private_ip(*ip))
}

/// Literal-IP hosts need no lookup; returns `None` for domain names.
fn literal_ip(url: &Url) -> Option<IpAddr> {
    match url.host()? {
        Host::Ipv4(v4) => Some(IpAddr::V4(v4)),
        Host::Ipv6(v6) => Some(IpAddr::V6(v6)),
        Host::Domain(_) => None,
    }
}

/// Redirect targets are checked with a blocking lookup; the policy
/// callback is synchronous.
fn redirect_target_is_private(url: &Url) -> Result<bool, String> {
    if let Some(ip) = literal_ip(url) {
        return Ok(is_private_ip(ip));
    }
    let host = url.host_str().ok_or("redirect without host")?;
    let port = url.port_or_known_default().unwrap_or(80);
    let addrs = (host, port)
        .to_socket_addrs()
        .map_err(|e| format!("DNS lookup failed during redirect: {e}"))?;
    Ok(first_private(addrs).is_some())
}

fn is_html_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime.is_empty() || mime.starts_with("text/") || mime.contains("html") || mime.contains("xml")
}

/// Appends as much of `chunk` as fits under `limit`. Returns `false` once the
/// buffer is full.
fn push_capped(buf: &mut Vec<u8>, chunk: &[u8], limit: usize) -> bool {
    let room = limit.saturating_sub(buf.len());
    buf.extend_from_slice(&chunk[..chunk.len().min(room)]);
    buf.len() < limit
}

/// Retrieves the raw HTML of a page.
///
/// A single attempt per call; implementations must give up once `timeout`
/// elapses rather than leave the caller waiting.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError>;
}

/// `PageFetcher` backed by a shared reqwest client.
///
/// Refuses hosts that resolve to private or loopback addresses, on the first
/// request and on every redirect, unless built with
/// [`HttpFetcher::allowing_private_networks`].
#[derive(Clone)]
pub struct HttpFetcher {
    client: ReqwestClient,
    allow_private_networks: bool,
}

impl HttpFetcher {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::build(false)
    }

    /// For trusted deployments and local test servers.
    pub fn allowing_private_networks() -> Result<Self, reqwest::Error> {
        Self::build(true)
    }

    fn build(allow_private_networks: bool) -> Result<Self, reqwest::Error> {
        let policy = redirect::Policy::custom(move |attempt| {
            if attempt.previous().len() >= MAX_REDIRECTS {
                return attempt.error("too many redirects");
            }
            if allow_private_networks {
                return attempt.follow();
            }
            match redirect_target_is_private(attempt.url()) {
                Ok(false) => attempt.follow(),
                Ok(true) => attempt.error("redirect to private address blocked"),
                Err(e) => attempt.error(e),
            }
        });

        let client = ReqwestClient::builder()
            .user_agent(USER_AGENT)
            .redirect(policy)
            .build()?;
        Ok(Self {
            client,
            allow_private_networks,
        })
    }

    async fn check_target(&self, url: &str) -> Result<(), FetchError> {
        let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl {
            url: url.to_string(),
        })?;
        if self.allow_private_networks {
            return Ok(());
        }

        let private = match literal_ip(&parsed) {
            Some(ip) => is_private_ip(ip).then_some(ip),
            None => {
                let host = parsed.host_str().ok_or_else(|| FetchError::InvalidUrl {
                    url: url.to_string(),
                })?;
                let port = parsed.port_or_known_default().unwrap_or(80);
                let addrs = tokio::net::lookup_host((host, port))
                    .await
                    .map_err(|source| FetchError::Resolve {
                        url: url.to_string(),
                        source,
                    })?;
                first_private(addrs)
            }
        };

        match private {
            Some(addr) => Err(FetchError::PrivateAddress {
                url: url.to_string(),
                addr,
            }),
            None => Ok(()),
        }
    }

    async fn read_capped(url: &str, mut response: Response) -> Result<String, FetchError> {
        let mut buf = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })? {
            if !push_capped(&mut buf, &chunk, MAX_PAGE_BYTES) {
                break;
            }
        }
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str, timeout: Duration) -> Result<String, FetchError> {
        let request = async {
            self.check_target(url).await?;

            let response =
                self.client
                    .get(url)
                    .send()
                    .await
                    .map_err(|source| FetchError::Request {
                        url: url.to_string(),
                        source,
                    })?;

            let status = response.status();
            if !status.is_success() {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                });
            }

            if let Some(content_type) = response
                .headers()
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
            {
                if !is_html_content_type(content_type) {
                    return Err(FetchError::NotHtml {
                        url: url.to_string(),
                        content_type: content_type.to_string(),
                    });
                }
            }

            if let Some(length) = response.content_length() {
                if length > MAX_PAGE_BYTES as u64 {
                    return Err(FetchError::TooLarge {
                        url: url.to_string(),
                        length,
                        limit: MAX_PAGE_BYTES,
                    });
                }
            }

            Self::read_capped(url, response).await
        };

        // Covers DNS, connect, headers and body; a server trickling bytes
        // still gets cut off.
        tokio::time::timeout(timeout, request)
            .await
            .map_err(|_| FetchError::Timeout {
                url: url.to_string(),
                timeout,
            })?
    }
}
