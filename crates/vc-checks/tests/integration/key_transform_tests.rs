//! Organization key record transforms and key/DID consistency helpers

use common::secret::{ExposeSecret, SecretString};
use serde_json::json;
use vc_checks::did::{
    encode_did_jwk, is_matching_private_key_kid, resolve_did_jwk, DidDocument,
    VerificationMethod,
};
use vc_checks::keys::{
    hex_to_jwk_key_transformer, jwk_to_hex_key_transformer, public_hex_from_private_hex,
    KeyAlgorithm, KeyEncoding, KeyPurpose, OrganizationKey, PrivateKeyMaterial,
    PublicKeyMaterial,
};
use vc_test_utils::*;

fn hex_key_record(seed: u8) -> Result<OrganizationKey, anyhow::Error> {
    let private_hex = test_secp256k1_private_hex(seed);
    let public_hex = public_hex_from_private_hex(&SecretString::from(private_hex.clone()))?;
    let record = serde_json::from_value(json!({
        "kidFragment": "#eth-account-key-1",
        "purposes": ["DLT_TRANSACTIONS", "ISSUING_METADATA"],
        "algorithm": "SECP256K1",
        "encoding": "hex",
        "publicKey": public_hex,
        "key": private_hex,
    }))?;
    Ok(record)
}

#[test]
fn test_hex_record_converts_to_jwk() -> Result<(), anyhow::Error> {
    let record = hex_to_jwk_key_transformer(hex_key_record(1)?)?;

    assert_eq!(record.encoding, KeyEncoding::Jwk);
    assert_eq!(record.algorithm, KeyAlgorithm::Secp256k1);
    assert_eq!(
        record.purposes,
        vec![KeyPurpose::DltTransactions, KeyPurpose::IssuingMetadata]
    );
    assert_eq!(record.kid_fragment, "#eth-account-key-1");

    let expected = test_secp256k1_key(1)?;
    match (&record.public_key, &record.key) {
        (PublicKeyMaterial::Jwk(public), Some(PrivateKeyMaterial::Jwk(private))) => {
            assert_eq!(public, &expected.to_public());
            assert_eq!(public.key_use.as_deref(), Some("sig"));
            assert_eq!(private.d.expose_secret(), expected.d.expose_secret());
        }
        other => anyhow::bail!("expected JWK material, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_jwk_record_converts_back_to_hex() -> Result<(), anyhow::Error> {
    let original = hex_key_record(2)?;
    let PublicKeyMaterial::Hex(original_public) = original.public_key.clone() else {
        anyhow::bail!("fixture should be hex encoded");
    };

    let record = jwk_to_hex_key_transformer(hex_to_jwk_key_transformer(original)?)?;

    assert_eq!(record.encoding, KeyEncoding::Hex);
    assert_eq!(record.public_key, PublicKeyMaterial::Hex(original_public));
    match &record.key {
        Some(PrivateKeyMaterial::Hex(private)) => {
            assert_eq!(private.expose_secret(), test_secp256k1_private_hex(2));
        }
        other => anyhow::bail!("expected hex private key, got {other:?}"),
    }
    Ok(())
}

#[test]
fn test_public_only_record_converts() -> Result<(), anyhow::Error> {
    let mut record = hex_key_record(3)?;
    record.key = None;

    let record = hex_to_jwk_key_transformer(record)?;

    assert!(matches!(record.public_key, PublicKeyMaterial::Jwk(_)));
    assert!(record.key.is_none());
    Ok(())
}

#[test]
fn test_invalid_hex_record_is_rejected() -> Result<(), anyhow::Error> {
    let mut record = hex_key_record(4)?;
    record.public_key = PublicKeyMaterial::Hex("zz".repeat(32));

    let result = hex_to_jwk_key_transformer(record);

    assert!(matches!(result, Err(vc_checks::CheckError::InvalidKey(_))));
    Ok(())
}

#[test]
fn test_matching_private_key_for_document_kid() -> Result<(), anyhow::Error> {
    let key = test_secp256k1_key(30)?;
    let other = test_secp256k1_key(31)?;
    let document = DidDocument {
        id: TEST_ORG_ACME_DID.to_string(),
        verification_method: vec![VerificationMethod {
            id: "#vc-signing-key-1".to_string(),
            public_key_jwk: Some(key.to_public()),
            ..VerificationMethod::default()
        }],
        ..DidDocument::default()
    };
    let kid = format!("{TEST_ORG_ACME_DID}#vc-signing-key-1");

    assert!(is_matching_private_key_kid(&document, &key, &kid));
    assert!(!is_matching_private_key_kid(&document, &other, &kid));
    assert!(!is_matching_private_key_kid(
        &document,
        &key,
        &format!("{TEST_ORG_ACME_DID}#missing")
    ));
    Ok(())
}

#[test]
fn test_did_jwk_document_carries_fixture_key() -> Result<(), anyhow::Error> {
    let key = test_secp256k1_key(32)?;
    let did = encode_did_jwk(&key.to_public())?;

    let document = resolve_did_jwk(&did)?;

    assert_eq!(document.id, did);
    assert!(is_matching_private_key_kid(
        &document,
        &key,
        &format!("{did}#0")
    ));
    Ok(())
}
