//! DID resolver tests against mock registrar and did:web hosts

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vc_checks::did::{
    did_web_to_url, get_jwk_from_did_uri, CompositeDidResolver, DidResolver, HttpDocumentFetcher,
    RegistrarDidResolver, WebDidResolver,
};
use vc_checks::errors::CheckError;
use vc_test_utils::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const ACME_RESOLVE_PATH: &str = "/api/v0.6/resolve-did/did%3Aion%3Aacme-test-org";

fn acme_document() -> serde_json::Value {
    let key = test_secp256k1_key(20).expect("Failed to create org key");
    json!({
        "id": TEST_ORG_ACME_DID,
        "verificationMethod": [{
            "id": "#vc-signing-key-1",
            "type": "JsonWebKey2020",
            "controller": TEST_ORG_ACME_DID,
            "publicKeyJwk": key.to_public(),
        }],
        "service": [{
            "id": "#credential-agent-1",
            "type": "VlcCareerIssuer_v1",
            "serviceEndpoint": "https://agent.example.com",
        }],
    })
}

fn registrar(mock_server: &MockServer) -> RegistrarDidResolver {
    RegistrarDidResolver::new(
        mock_server.uri(),
        HttpDocumentFetcher::with_settings(Duration::from_secs(5), Duration::from_secs(300)),
    )
}

fn resolution_error(result: Result<vc_checks::did::DidDocument, CheckError>) -> String {
    match result {
        Err(CheckError::DidResolution(reason)) => reason,
        other => format!("unexpected result: {other:?}"),
    }
}

// ============================================================================
// Registrar resolver
// ============================================================================

#[tokio::test]
async fn test_registrar_resolves_document() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .mount(&mock_server)
        .await;

    let document = registrar(&mock_server).resolve(TEST_ORG_ACME_DID).await?;

    assert_eq!(document.id, TEST_ORG_ACME_DID);
    assert_eq!(document.verification_method.len(), 1);
    assert_eq!(document.service.len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_registrar_strips_fragment_before_resolving() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let document = registrar(&mock_server)
        .resolve(&format!("{TEST_ORG_ACME_DID}#vc-signing-key-1"))
        .await?;

    assert_eq!(document.id, TEST_ORG_ACME_DID);
    Ok(())
}

#[tokio::test]
async fn test_registrar_caches_documents() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = registrar(&mock_server);
    let first = resolver.resolve(TEST_ORG_ACME_DID).await?;
    let second = resolver.resolve(TEST_ORG_ACME_DID).await?;

    assert_eq!(first, second);
    Ok(())
}

#[tokio::test]
async fn test_registrar_refetches_after_cache_clear() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let resolver = registrar(&mock_server);
    resolver.resolve(TEST_ORG_ACME_DID).await?;
    resolver.clear_cache().await;
    resolver.resolve(TEST_ORG_ACME_DID).await?;
    Ok(())
}

#[tokio::test]
async fn test_zero_ttl_disables_caching() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .expect(2)
        .mount(&mock_server)
        .await;

    let resolver = RegistrarDidResolver::new(
        mock_server.uri(),
        HttpDocumentFetcher::with_settings(Duration::from_secs(5), Duration::ZERO),
    );
    resolver.resolve(TEST_ORG_ACME_DID).await?;
    resolver.resolve(TEST_ORG_ACME_DID).await?;
    Ok(())
}

#[tokio::test]
async fn test_registrar_not_found() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&mock_server)
        .await;

    let result = registrar(&mock_server).resolve(TEST_ORG_ACME_DID).await;

    assert_eq!(resolution_error(result), "did_document_not_found");
}

#[tokio::test]
async fn test_registrar_server_error_is_unavailable() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let result = registrar(&mock_server).resolve(TEST_ORG_ACME_DID).await;

    assert_eq!(resolution_error(result), "resolver_unavailable");
}

#[tokio::test]
async fn test_registrar_invalid_json_is_invalid_document() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let result = registrar(&mock_server).resolve(TEST_ORG_ACME_DID).await;

    assert_eq!(resolution_error(result), "invalid_did_document");
}

#[tokio::test]
async fn test_registrar_failures_are_not_cached() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(500))
        .up_to_n_times(1)
        .expect(1)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = registrar(&mock_server);
    assert!(resolver.resolve(TEST_ORG_ACME_DID).await.is_err());
    let document = resolver.resolve(TEST_ORG_ACME_DID).await?;

    assert_eq!(document.id, TEST_ORG_ACME_DID);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_registrar_is_unavailable() -> Result<(), anyhow::Error> {
    // Reserve a port, then release it so nothing is listening.
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let resolver = RegistrarDidResolver::new(
        format!("http://127.0.0.1:{port}"),
        HttpDocumentFetcher::with_settings(Duration::from_secs(1), Duration::from_secs(300)),
    );

    let result = resolver.resolve(TEST_ORG_ACME_DID).await;

    assert_eq!(resolution_error(result), "resolver_unavailable");
    Ok(())
}

#[tokio::test]
async fn test_expired_documents_are_evicted_on_write() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .mount(&mock_server)
        .await;

    let fetcher =
        HttpDocumentFetcher::with_settings(Duration::from_secs(5), Duration::from_millis(50));
    for i in 0..20 {
        let did = format!("did:ion:org-{i}");
        fetcher
            .fetch(&did, &format!("{}/{did}", mock_server.uri()))
            .await?;
    }
    assert_eq!(fetcher.cached_entries().await, 20);

    tokio::time::sleep(Duration::from_millis(100)).await;
    fetcher
        .fetch("did:ion:late", &format!("{}/late", mock_server.uri()))
        .await?;

    assert_eq!(fetcher.cached_entries().await, 1);
    Ok(())
}

#[tokio::test]
async fn test_cache_size_is_bounded() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .mount(&mock_server)
        .await;

    let fetcher =
        HttpDocumentFetcher::with_settings(Duration::from_secs(5), Duration::from_secs(300))
            .with_max_entries(3);
    for i in 0..10 {
        let did = format!("did:ion:org-{i}");
        fetcher
            .fetch(&did, &format!("{}/{did}", mock_server.uri()))
            .await?;
    }

    assert_eq!(fetcher.cached_entries().await, 3);
    Ok(())
}

// ============================================================================
// did:web resolver
// ============================================================================

#[test]
fn test_org_did_web_maps_to_well_known_url() -> Result<(), anyhow::Error> {
    assert_eq!(
        did_web_to_url(TEST_ORG_WEB_DID)?,
        "https://acme.example.com/.well-known/did.json"
    );
    assert_eq!(
        did_web_to_url(&format!("{TEST_ORG_WEB_DID}#key-1"))?,
        "https://acme.example.com/.well-known/did.json"
    );
    Ok(())
}

#[tokio::test]
async fn test_web_resolver_fetches_well_known_document() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    let host = mock_server
        .uri()
        .trim_start_matches("http://")
        .replace(':', "%3A");
    let did = format!("did:web:{host}");

    let mut document = acme_document();
    document["id"] = json!(did);
    Mock::given(method("GET"))
        .and(path("/.well-known/did.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&document))
        .expect(1)
        .mount(&mock_server)
        .await;

    let resolver = WebDidResolver::new(HttpDocumentFetcher::new()).with_insecure_http();
    let resolved = resolver.resolve(&did).await?;

    assert_eq!(resolved.id, did);
    Ok(())
}

#[tokio::test]
async fn test_web_resolver_fetches_path_document() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    let host = mock_server
        .uri()
        .trim_start_matches("http://")
        .replace(':', "%3A");
    let did = format!("did:web:{host}:orgs:acme");

    let mut document = acme_document();
    document["id"] = json!(did);
    Mock::given(method("GET"))
        .and(path("/orgs/acme/did.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(&document))
        .mount(&mock_server)
        .await;

    let resolver = WebDidResolver::new(HttpDocumentFetcher::new()).with_insecure_http();
    let resolved = resolver.resolve(&did).await?;

    assert_eq!(resolved.id, did);
    Ok(())
}

// ============================================================================
// Composite resolver and key lookup
// ============================================================================

#[tokio::test]
async fn test_key_lookup_through_composite_resolver() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(ACME_RESOLVE_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(acme_document()))
        .mount(&mock_server)
        .await;

    let resolver = CompositeDidResolver::standard(
        &mock_server.uri(),
        Duration::from_secs(5),
        Duration::from_secs(300),
    );

    let jwk = get_jwk_from_did_uri(
        &format!("{TEST_ORG_ACME_DID}#vc-signing-key-1"),
        &resolver,
    )
    .await?;

    assert_eq!(jwk, test_secp256k1_key(20)?.to_public());
    Ok(())
}

#[tokio::test]
async fn test_composite_without_fallback_rejects_unknown_method() {
    let resolver: Arc<dyn DidResolver> = Arc::new(CompositeDidResolver::new());

    let result = resolver.resolve(TEST_ORG_ACME_DID).await;

    assert_eq!(resolution_error(result), "unsupported_did_method");
}
