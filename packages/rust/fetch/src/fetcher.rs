//! HTTP retrieval of work pages.
//!
//! Every request carries `view_adult=true`, which pre-accepts the archive's
//! adult-content notice so classification only has to deal with the cases
//! where the archive still redirects.

use std::future::Future;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::COOKIE;
use tracing::{debug, instrument};
use url::Url;

use podfic_shared::{AppConfig, PodficError, Result};

/// User-Agent string for work requests.
const USER_AGENT: &str = concat!("podfic-import/", env!("CARGO_PKG_VERSION"));

/// Query parameter that pre-accepts the adult-content notice.
const ADULT_CONSENT_PARAM: (&str, &str) = ("view_adult", "true");

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Whether a request carries the logged-in session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialPolicy {
    /// Anonymous request.
    Omit,
    /// Attach the ambient session credentials.
    Include,
}

impl std::fmt::Display for CredentialPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Omit => f.write_str("omit"),
            Self::Include => f.write_str("include"),
        }
    }
}

/// A successfully fetched page.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// The URL the request was sent to (including the consent parameter).
    pub requested_url: Url,
    /// The URL the response came from after redirects.
    pub url: Url,
    /// Final HTTP status.
    pub status: u16,
    /// Response body.
    pub body: String,
}

impl FetchedPage {
    /// Whether the archive redirected the request somewhere else.
    pub fn redirected(&self) -> bool {
        self.url != self.requested_url
    }
}

/// Retrieves work pages.
pub trait Fetcher: Send + Sync {
    /// Fetch `url` (the consent parameter is added if missing).
    fn fetch(
        &self,
        url: &Url,
        policy: CredentialPolicy,
    ) -> impl Future<Output = Result<FetchedPage>> + Send;
}

// ---------------------------------------------------------------------------
// URL helpers
// ---------------------------------------------------------------------------

/// Parse user input into an http(s) URL.
pub fn parse_work_url(raw: &str) -> Result<Url> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed).map_err(|e| PodficError::invalid_url(trimmed, e))?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(PodficError::invalid_url(
            trimmed,
            format!("unsupported scheme '{other}'"),
        )),
    }
}

/// Add `view_adult=true` unless the URL already carries it.
pub fn with_adult_consent(url: &Url) -> Url {
    let (key, value) = ADULT_CONSENT_PARAM;
    if url.query_pairs().any(|(k, v)| k == key && v == value) {
        return url.clone();
    }
    let mut consented = url.clone();
    consented.query_pairs_mut().append_pair(key, value);
    consented
}

// ---------------------------------------------------------------------------
// HttpFetcher
// ---------------------------------------------------------------------------

/// [`Fetcher`] backed by `reqwest`.
pub struct HttpFetcher {
    client: Client,
    session_cookie: Option<String>,
}

impl HttpFetcher {
    /// Build a fetcher from the `[http]` config and an optional session cookie.
    pub fn new(config: &AppConfig, session_cookie: Option<String>) -> Result<Self> {
        let user_agent = config
            .http
            .user_agent
            .clone()
            .unwrap_or_else(|| USER_AGENT.to_string());

        let mut builder = Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::limited(config.http.max_redirects));

        if let Some(secs) = config.http.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        let client = builder
            .build()
            .map_err(|e| PodficError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            session_cookie,
        })
    }
}

impl Fetcher for HttpFetcher {
    #[instrument(skip_all, fields(url = %url, credentials = %policy))]
    async fn fetch(&self, url: &Url, policy: CredentialPolicy) -> Result<FetchedPage> {
        let requested_url = with_adult_consent(url);
        debug!(%requested_url, "fetching work page");

        let mut request = self.client.get(requested_url.as_str());
        if policy == CredentialPolicy::Include {
            match &self.session_cookie {
                Some(cookie) => request = request.header(COOKIE, cookie),
                None => debug!("no session cookie available, credentialed fetch is anonymous"),
            }
        }

        let response = request
            .send()
            .await
            .map_err(|e| PodficError::Network(format!("{requested_url}: {e}")))?;

        let status = response.status();
        let final_url = response.url().clone();

        if !status.is_success() {
            return Err(PodficError::HttpStatus {
                status: status.as_u16(),
                url: final_url.to_string(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| PodficError::Network(format!("{final_url}: body read failed: {e}")))?;

        debug!(
            status = status.as_u16(),
            final_url = %final_url,
            body_len = body.len(),
            "work page fetched"
        );

        Ok(FetchedPage {
            requested_url,
            url: final_url,
            status: status.as_u16(),
            body,
        })
    }
}
