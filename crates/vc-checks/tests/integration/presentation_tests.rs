//! Presentation verification tests
//!
//! Version 2 presentations resolve their `kid` through a mock registrar.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use vc_checks::did::{
    encode_did_jwk, CompositeDidResolver, DidResolver, HttpDocumentFetcher, JwkDidResolver,
    RegistrarDidResolver,
};
use vc_checks::errors::CheckError;
use vc_checks::keys::PrivateJwk;
use vc_checks::presentation::{PresentationVerifier, ProtocolVersion};
use vc_test_utils::*;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const HOLDER_RESOLVE_PATH: &str = "/api/v0.6/resolve-did/did%3Aion%3Aalice-test-holder";

// ============================================================================
// Test Registrar
// ============================================================================

/// Mock registrar serving the holder's DID document.
struct TestRegistrar {
    mock_server: MockServer,
    holder_key: PrivateJwk,
}

impl TestRegistrar {
    async fn start() -> Self {
        let mock_server = MockServer::start().await;
        let holder_key = test_secp256k1_key(10).expect("Failed to create holder key");

        let document = json!({
            "@context": ["https://www.w3.org/ns/did/v1"],
            "id": TEST_HOLDER_ALICE_DID,
            "verificationMethod": [{
                "id": "#key-1",
                "type": "JsonWebKey2020",
                "controller": TEST_HOLDER_ALICE_DID,
                "publicKeyJwk": holder_key.to_public(),
            }],
        });

        Mock::given(method("GET"))
            .and(path(HOLDER_RESOLVE_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_json(&document))
            .mount(&mock_server)
            .await;

        Self {
            mock_server,
            holder_key,
        }
    }

    fn verifier(&self) -> PresentationVerifier {
        let resolver = CompositeDidResolver::new()
            .with_method("jwk", Arc::new(JwkDidResolver))
            .with_fallback(Arc::new(RegistrarDidResolver::new(
                self.mock_server.uri(),
                HttpDocumentFetcher::new(),
            )));
        PresentationVerifier::new(Arc::new(resolver), Duration::from_secs(300))
    }
}

fn test_now() -> DateTime<Utc> {
    Utc.timestamp_opt(TEST_NOW_TIMESTAMP, 0).unwrap()
}

fn holder_presentation() -> TestPresentationBuilder {
    TestPresentationBuilder::new()
        .held_by(TEST_HOLDER_ALICE_DID)
        .with_credential("header.payload.signature")
}

fn rejection_message(result: Result<vc_checks::credential::Presentation, CheckError>) -> String {
    let err = result.expect_err("presentation should be rejected");
    assert_eq!(err.error_code(), "presentation_malformed");
    err.to_string()
}

// ============================================================================
// Version 1 (self-signed)
// ============================================================================

#[tokio::test]
async fn test_v1_self_signed_presentation_is_accepted() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation().sign_es256k(&registrar.holder_key)?;
    jwt.assert_embeds_jwk(true).assert_kid(None);

    let presentation = registrar
        .verifier()
        .verify_at(&jwt, ProtocolVersion::V1, test_now())
        .await?;

    assert_eq!(presentation.holder.as_deref(), Some(TEST_HOLDER_ALICE_DID));
    assert_eq!(
        presentation.credential_jwts().collect::<Vec<_>>(),
        vec!["header.payload.signature"]
    );
    Ok(())
}

#[tokio::test]
async fn test_v1_without_embedded_key_is_malformed() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-1"))
        .sign_es256k(&registrar.holder_key)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V1, test_now())
            .await,
    );

    assert_eq!(message, "Malformed jwt_vp property: missing jwk header");
    Ok(())
}

// ============================================================================
// Version 2 (kid resolved through the registrar)
// ============================================================================

#[tokio::test]
async fn test_v2_presentation_resolves_kid_via_registrar() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-1"))
        .sign_es256k(&registrar.holder_key)?;

    let presentation = registrar
        .verifier()
        .verify_at(&jwt, ProtocolVersion::V2, test_now())
        .await?;

    assert_eq!(presentation.holder.as_deref(), Some(TEST_HOLDER_ALICE_DID));
    Ok(())
}

#[tokio::test]
async fn test_v2_rejects_self_signed_presentation() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation().sign_es256k(&registrar.holder_key)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V2, test_now())
            .await,
    );

    assert_eq!(message, "jwt_vp must not be self signed");
    Ok(())
}

#[tokio::test]
async fn test_v2_unknown_holder_is_kid_error() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation()
        .with_kid("did:ion:unknown-holder#key-1")
        .sign_es256k(&registrar.holder_key)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V2, test_now())
            .await,
    );

    assert_eq!(message, "kid_did_document_not_found");
    Ok(())
}

#[tokio::test]
async fn test_v2_unknown_key_fragment_is_kid_error() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-9"))
        .sign_es256k(&registrar.holder_key)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V2, test_now())
            .await,
    );

    assert_eq!(message, "kid_verification_method_not_found");
    Ok(())
}

#[tokio::test]
async fn test_v2_signature_from_other_key_is_malformed() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let impostor = test_secp256k1_key(11)?;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-1"))
        .sign_es256k(&impostor)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V2, test_now())
            .await,
    );

    assert_eq!(
        message,
        "Malformed jwt_vp property: signature verification failed"
    );
    Ok(())
}

#[tokio::test]
async fn test_v2_did_jwk_kid_resolves_without_registrar() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let signer = test_secp256k1_key(12)?;
    let did = encode_did_jwk(&signer.to_public())?;

    let jwt = TestPresentationBuilder::new()
        .held_by(&did)
        .with_kid(&format!("{did}#0"))
        .sign_es256k(&signer)?;

    let presentation = registrar
        .verifier()
        .verify_at(&jwt, ProtocolVersion::V2, test_now())
        .await?;

    assert_eq!(presentation.holder.as_deref(), Some(did.as_str()));
    Ok(())
}

#[tokio::test]
async fn test_expired_presentation_is_malformed() -> Result<(), anyhow::Error> {
    let registrar = TestRegistrar::start().await;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-1"))
        .issued_at_offset(-7200)
        .expires_in(-3600)
        .sign_es256k(&registrar.holder_key)?;

    let message = rejection_message(
        registrar
            .verifier()
            .verify_at(&jwt, ProtocolVersion::V2, test_now())
            .await,
    );

    assert!(
        message.starts_with("Malformed jwt_vp property:"),
        "unexpected message: {message}"
    );
    Ok(())
}

#[tokio::test]
async fn test_registrar_outage_is_kid_error() -> Result<(), anyhow::Error> {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&mock_server)
        .await;

    let resolver: Arc<dyn DidResolver> = Arc::new(RegistrarDidResolver::new(
        mock_server.uri(),
        HttpDocumentFetcher::new(),
    ));
    let verifier = PresentationVerifier::new(resolver, Duration::from_secs(300));

    let holder_key = test_secp256k1_key(10)?;
    let jwt = holder_presentation()
        .with_kid(&format!("{TEST_HOLDER_ALICE_DID}#key-1"))
        .sign_es256k(&holder_key)?;

    let message =
        rejection_message(verifier.verify_at(&jwt, ProtocolVersion::V2, test_now()).await);

    assert_eq!(message, "kid_resolver_unavailable");
    Ok(())
}
