//! DID resolvers.
//!
//! `did:jwk` resolves locally. `did:web` documents are fetched from the
//! organization's host and every other method goes to the registrar's
//! resolve endpoint. Fetched documents are cached with a TTL.
//!
//! Failures map to `CheckError::DidResolution` with a snake-case reason:
//! - `did_document_not_found` - the endpoint answered 404
//! - `resolver_unavailable` - transport error or any other non-2xx status
//! - `invalid_did_document` - the body is not a DID document
//! - `unsupported_did_method` - no resolver handles the method

use super::{did_web_to_url_with_scheme, resolve_did_jwk, strip_fragment, DidDocument};
use crate::errors::CheckError;
use crate::observability::metrics;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::instrument;

/// Default cache TTL in seconds (5 minutes).
pub const DEFAULT_CACHE_TTL_SECONDS: u64 = 300;

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 10;

/// Default upper bound on cached DID documents per fetcher.
pub const DEFAULT_MAX_CACHE_ENTRIES: usize = 1024;

/// Registrar path prefix for DID resolution.
const RESOLVE_DID_PATH: &str = "api/v0.6/resolve-did";

/// Resolves a DID to its document.
#[async_trait]
pub trait DidResolver: Send + Sync {
    /// Resolve `did` (without fragment) to its DID document.
    async fn resolve(&self, did: &str) -> Result<DidDocument, CheckError>;
}

/// Resolver for self-describing `did:jwk` identifiers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JwkDidResolver;

#[async_trait]
impl DidResolver for JwkDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, CheckError> {
        let result = resolve_did_jwk(did);
        metrics::record_did_resolution(did, if result.is_ok() { "success" } else { "invalid" });
        result
    }
}

/// Cached DID document with expiry time.
struct CachedDocument {
    document: DidDocument,
    expires_at: Instant,
}

/// HTTP fetcher with a per-DID document cache.
///
/// Shared by the registrar and `did:web` resolvers.
pub struct HttpDocumentFetcher {
    http_client: reqwest::Client,
    cache: Arc<RwLock<HashMap<String, CachedDocument>>>,
    cache_ttl: Duration,
    max_entries: usize,
}

impl HttpDocumentFetcher {
    /// Create a fetcher with the default timeout and cache TTL.
    pub fn new() -> Self {
        Self::with_settings(
            Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECONDS),
            Duration::from_secs(DEFAULT_CACHE_TTL_SECONDS),
        )
    }

    /// Create a fetcher with a custom request timeout and cache TTL.
    pub fn with_settings(request_timeout: Duration, cache_ttl: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .unwrap_or_else(|e| {
                tracing::warn!(target: "vc.did.resolver", error = %e, "Failed to build HTTP client with custom config, using defaults");
                reqwest::Client::new()
            });

        Self {
            http_client,
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_ttl,
            max_entries: DEFAULT_MAX_CACHE_ENTRIES,
        }
    }

    /// Cap the number of cached documents. Zero disables caching.
    #[must_use]
    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    /// Fetch the document for `did` from `url`, serving from cache while fresh.
    ///
    /// # Errors
    ///
    /// Returns `CheckError::DidResolution` as described in the module docs.
    #[instrument(skip(self), fields(did = %did))]
    pub async fn fetch(&self, did: &str, url: &str) -> Result<DidDocument, CheckError> {
        {
            let cache = self.cache.read().await;
            if let Some(cached) = cache.get(did) {
                if cached.expires_at > Instant::now() {
                    tracing::debug!(target: "vc.did.resolver", did = %did, "DID document cache hit");
                    metrics::record_did_resolution(did, "hit");
                    return Ok(cached.document.clone());
                }
            }
        }

        let document = self.fetch_uncached(did, url).await.map_err(|e| {
            metrics::record_did_resolution(did, resolution_status(&e));
            e
        })?;
        metrics::record_did_resolution(did, "success");

        self.store(did, &document).await;
        Ok(document)
    }

    async fn fetch_uncached(&self, did: &str, url: &str) -> Result<DidDocument, CheckError> {
        tracing::debug!(target: "vc.did.resolver", url = %url, "Fetching DID document");

        let response = self.http_client.get(url).send().await.map_err(|e| {
            tracing::error!(target: "vc.did.resolver", did = %did, error = %e, "Failed to fetch DID document");
            CheckError::DidResolution("resolver_unavailable".to_string())
        })?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            tracing::debug!(target: "vc.did.resolver", did = %did, "DID document not found");
            return Err(CheckError::DidResolution(
                "did_document_not_found".to_string(),
            ));
        }
        if !status.is_success() {
            tracing::error!(
                target: "vc.did.resolver",
                did = %did,
                status = %status,
                "DID resolution endpoint returned error"
            );
            return Err(CheckError::DidResolution("resolver_unavailable".to_string()));
        }

        let document: DidDocument = response.json().await.map_err(|e| {
            tracing::error!(target: "vc.did.resolver", did = %did, error = %e, "Failed to parse DID document");
            CheckError::DidResolution("invalid_did_document".to_string())
        })?;

        tracing::info!(target: "vc.did.resolver", did = %did, "DID document resolved");
        Ok(document)
    }

    /// Insert `document`, dropping expired entries first and then the entry
    /// closest to expiry while the cache is full.
    async fn store(&self, did: &str, document: &DidDocument) {
        if self.max_entries == 0 || self.cache_ttl.is_zero() {
            return;
        }

        let now = Instant::now();
        let mut cache = self.cache.write().await;
        cache.retain(|_, cached| cached.expires_at > now);

        while cache.len() >= self.max_entries && !cache.contains_key(did) {
            let oldest = cache
                .iter()
                .min_by_key(|(_, cached)| cached.expires_at)
                .map(|(key, _)| key.clone());
            match oldest {
                Some(key) => {
                    cache.remove(&key);
                }
                None => break,
            }
        }

        cache.insert(
            did.to_string(),
            CachedDocument {
                document: document.clone(),
                expires_at: now + self.cache_ttl,
            },
        );
    }

    /// Number of documents currently held, fresh or not.
    pub async fn cached_entries(&self) -> usize {
        self.cache.read().await.len()
    }

    /// Drop every cached document.
    pub async fn clear_cache(&self) {
        self.cache.write().await.clear();
    }
}

impl Default for HttpDocumentFetcher {
    fn default() -> Self {
        Self::new()
    }
}

fn resolution_status(err: &CheckError) -> &'static str {
    match err {
        CheckError::DidResolution(reason) => match reason.as_str() {
            "did_document_not_found" => "did_document_not_found",
            "invalid_did_document" => "invalid_did_document",
            _ => "resolver_unavailable",
        },
        _ => "error",
    }
}

/// Resolver backed by the registrar's `resolve-did` endpoint.
pub struct RegistrarDidResolver {
    base_url: String,
    fetcher: HttpDocumentFetcher,
}

impl RegistrarDidResolver {
    /// Create a resolver for the registrar at `base_url`.
    pub fn new(base_url: impl Into<String>, fetcher: HttpDocumentFetcher) -> Self {
        Self {
            base_url: base_url.into(),
            fetcher,
        }
    }

    /// `<base>/api/v0.6/resolve-did/<url-encoded did>`.
    pub fn resolve_url(&self, did: &str) -> String {
        let encoded: String = url::form_urlencoded::byte_serialize(did.as_bytes()).collect();
        format!(
            "{}/{RESOLVE_DID_PATH}/{encoded}",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Drop cached documents.
    pub async fn clear_cache(&self) {
        self.fetcher.clear_cache().await;
    }
}

#[async_trait]
impl DidResolver for RegistrarDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, CheckError> {
        let did = strip_fragment(did);
        self.fetcher.fetch(did, &self.resolve_url(did)).await
    }
}

/// Resolver fetching `did:web` documents from their host.
pub struct WebDidResolver {
    fetcher: HttpDocumentFetcher,
    scheme: &'static str,
}

impl WebDidResolver {
    /// Create a resolver fetching over HTTPS.
    pub fn new(fetcher: HttpDocumentFetcher) -> Self {
        Self {
            fetcher,
            scheme: "https",
        }
    }

    /// Fetch over plain HTTP. For local registrars and tests only.
    #[must_use]
    pub fn with_insecure_http(mut self) -> Self {
        self.scheme = "http";
        self
    }
}

#[async_trait]
impl DidResolver for WebDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, CheckError> {
        let did = strip_fragment(did);
        let url = did_web_to_url_with_scheme(did, self.scheme)?;
        self.fetcher.fetch(did, &url).await
    }
}

/// Dispatches to a resolver by DID method.
///
/// Methods without a registered resolver go to the fallback, if any.
#[derive(Default)]
pub struct CompositeDidResolver {
    resolvers: HashMap<String, Arc<dyn DidResolver>>,
    fallback: Option<Arc<dyn DidResolver>>,
}

impl CompositeDidResolver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Route `method` (e.g. `web`) to `resolver`.
    #[must_use]
    pub fn with_method(mut self, method: &str, resolver: Arc<dyn DidResolver>) -> Self {
        self.resolvers.insert(method.to_string(), resolver);
        self
    }

    /// Route every unregistered method to `resolver`.
    #[must_use]
    pub fn with_fallback(mut self, resolver: Arc<dyn DidResolver>) -> Self {
        self.fallback = Some(resolver);
        self
    }

    /// The standard setup: `did:jwk` locally, `did:web` from the host,
    /// everything else from the registrar.
    pub fn standard(registrar_url: &str, request_timeout: Duration, cache_ttl: Duration) -> Self {
        Self::new()
            .with_method("jwk", Arc::new(JwkDidResolver))
            .with_method(
                "web",
                Arc::new(WebDidResolver::new(HttpDocumentFetcher::with_settings(
                    request_timeout,
                    cache_ttl,
                ))),
            )
            .with_fallback(Arc::new(RegistrarDidResolver::new(
                registrar_url,
                HttpDocumentFetcher::with_settings(request_timeout, cache_ttl),
            )))
    }
}

#[async_trait]
impl DidResolver for CompositeDidResolver {
    async fn resolve(&self, did: &str) -> Result<DidDocument, CheckError> {
        let method = did
            .strip_prefix("did:")
            .and_then(|rest| rest.split(':').next())
            .filter(|method| !method.is_empty())
            .ok_or_else(|| CheckError::DidResolution("invalid_did_url".to_string()))?;

        match self.resolvers.get(method).or(self.fallback.as_ref()) {
            Some(resolver) => resolver.resolve(did).await,
            None => {
                tracing::debug!(target: "vc.did.resolver", method = %method, "No resolver for DID method");
                Err(CheckError::DidResolution(
                    "unsupported_did_method".to_string(),
                ))
            }
        }
    }
}
