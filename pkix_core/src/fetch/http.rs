use super::config::FetchConfig;
use super::retry::{execute_with_retry, transport_error};
use super::{
    ClientBuildSnafu, Conditional, FetchError, FetchResponse, Fetcher, HttpStatusSnafu,
    RuntimeSnafu, UnsupportedSchemeSnafu,
};
use once_cell::sync::OnceCell;
use reqwest::header::{
    CONTENT_TYPE, ETAG, HeaderName, IF_MODIFIED_SINCE, IF_NONE_MATCH, LAST_MODIFIED,
};
use reqwest::{Method, StatusCode};
use snafu::ResultExt;

/// Blocking `Fetcher` over reqwest. Requests run on a shared current-thread
/// runtime, so `get`/`post` must not be called from inside another tokio
/// runtime.
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    config: FetchConfig,
}

impl HttpFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .build()
            .context(ClientBuildSnafu)?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    async fn get_async(
        &self,
        uri: &str,
        conditional: &Conditional,
    ) -> Result<FetchResponse, FetchError> {
        let build = || {
            let mut request = self.client.get(uri);
            if let Some(etag) = &conditional.etag {
                request = request.header(IF_NONE_MATCH, etag);
            }
            if let Some(modified) = &conditional.last_modified {
                request = request.header(IF_MODIFIED_SINCE, modified);
            }
            request
        };
        let resp = execute_with_retry(uri, &Method::GET, build, &self.config.retry).await?;
        if resp.status() == StatusCode::NOT_MODIFIED && !conditional.is_empty() {
            return Ok(FetchResponse::NotModified);
        }
        if !resp.status().is_success() {
            return HttpStatusSnafu {
                uri,
                status: resp.status().as_u16(),
            }
            .fail();
        }
        let header = |name: HeaderName| {
            resp.headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };
        let etag = header(ETAG);
        let last_modified = header(LAST_MODIFIED);
        let bytes = resp.bytes().await.map_err(|e| transport_error(uri, e))?;
        Ok(FetchResponse::Body {
            bytes: bytes.to_vec(),
            etag,
            last_modified,
        })
    }

    async fn post_async(
        &self,
        uri: &str,
        content_type: &str,
        body: &[u8],
    ) -> Result<Vec<u8>, FetchError> {
        let build = || {
            self.client
                .post(uri)
                .header(CONTENT_TYPE, content_type)
                .body(body.to_vec())
        };
        let resp = execute_with_retry(uri, &Method::POST, build, &self.config.retry).await?;
        if !resp.status().is_success() {
            return HttpStatusSnafu {
                uri,
                status: resp.status().as_u16(),
            }
            .fail();
        }
        let bytes = resp.bytes().await.map_err(|e| transport_error(uri, e))?;
        Ok(bytes.to_vec())
    }
}

impl Fetcher for HttpFetcher {
    fn get(&self, uri: &str, conditional: &Conditional) -> Result<FetchResponse, FetchError> {
        check_scheme(uri)?;
        tracing::debug!(target: "pkix_core::fetch", "GET {uri}");
        shared_runtime()?.block_on(self.get_async(uri, conditional))
    }

    fn post(&self, uri: &str, content_type: &str, body: &[u8]) -> Result<Vec<u8>, FetchError> {
        check_scheme(uri)?;
        tracing::debug!(target: "pkix_core::fetch", "POST {uri} ({} bytes)", body.len());
        shared_runtime()?.block_on(self.post_async(uri, content_type, body))
    }
}

/// Only http(s) is fetched. LDAP distribution points are common in
/// enterprise PKIs and are reported distinctly.
fn check_scheme(uri: &str) -> Result<(), FetchError> {
    match url::Url::parse(uri) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => Ok(()),
        _ => UnsupportedSchemeSnafu { uri }.fail(),
    }
}

fn shared_runtime() -> Result<&'static tokio::runtime::Runtime, FetchError> {
    static SHARED_RUNTIME: OnceCell<tokio::runtime::Runtime> = OnceCell::new();
    SHARED_RUNTIME.get_or_try_init(|| {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context(RuntimeSnafu)
    })
}
