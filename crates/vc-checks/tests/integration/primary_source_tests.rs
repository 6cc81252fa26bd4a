//! Primary-source issuer rule over decoded credentials

use serde_json::json;
use vc_checks::checks::{verify_primary_source_issuer, CredentialTypeMetadata};
use vc_checks::credential::decode_credential_jwt;
use vc_checks::errors::CheckError;
use vc_test_utils::*;

fn employment_metadata() -> CredentialTypeMetadata {
    serde_json::from_value(json!({
        "credentialType": TYPE_EMPLOYMENT_PAST,
        "issuerCategory": "RegularIssuer",
        "primaryOrganizationClaimPaths": [
            ["credentialSubject", "legalEmployer", "identifier"],
            ["credentialSubject.recipient.employers", "0"],
        ],
    }))
    .expect("metadata fixture should deserialize")
}

fn employment_credential(employer: serde_json::Value) -> Result<String, anyhow::Error> {
    let issuer = test_secp256k1_key(40)?;
    let jwt = TestCredentialBuilder::new()
        .issued_by(TEST_ORG_ACME_DID)
        .with_type(TYPE_EMPLOYMENT_PAST)
        .with_subject_claim("legalEmployer", employer)
        .expires_in(3600)
        .sign_es256k(&issuer)?;
    Ok(jwt)
}

#[test]
fn test_employer_may_issue_its_own_credential() -> Result<(), anyhow::Error> {
    let jwt = employment_credential(json!({ "identifier": TEST_ORG_ACME_DID }))?;
    let credential = decode_credential_jwt(&jwt)?;

    verify_primary_source_issuer(&credential, TEST_ORG_ACME_DID, &employment_metadata())?;
    Ok(())
}

#[test]
fn test_other_organization_needs_notary_permission() -> Result<(), anyhow::Error> {
    let jwt = employment_credential(json!({ "identifier": TEST_ORG_GLOBEX_DID }))?;
    let credential = decode_credential_jwt(&jwt)?;

    let result =
        verify_primary_source_issuer(&credential, TEST_ORG_ACME_DID, &employment_metadata());

    assert_eq!(result, Err(CheckError::IssuerRequiresNotaryPermission));
    let err = result.unwrap_err();
    assert_eq!(err.status_code(), 400);
    assert_eq!(err.to_string(), "issuer_requires_notary_permission");
    Ok(())
}

#[test]
fn test_credential_without_employer_is_accepted() -> Result<(), anyhow::Error> {
    let jwt = employment_credential(json!({ "name": "Acme Corp" }))?;
    let credential = decode_credential_jwt(&jwt)?;

    verify_primary_source_issuer(&credential, TEST_ORG_GLOBEX_DID, &employment_metadata())?;
    Ok(())
}

#[test]
fn test_array_claim_path_is_followed() -> Result<(), anyhow::Error> {
    let issuer = test_secp256k1_key(40)?;
    let jwt = TestCredentialBuilder::new()
        .issued_by(TEST_ORG_ACME_DID)
        .with_type(TYPE_EMPLOYMENT_PAST)
        .with_subject_claim(
            "recipient",
            json!({ "employers": [TEST_ORG_GLOBEX_DID, TEST_ORG_ACME_DID] }),
        )
        .sign_es256k(&issuer)?;
    let credential = decode_credential_jwt(&jwt)?;

    let result =
        verify_primary_source_issuer(&credential, TEST_ORG_ACME_DID, &employment_metadata());
    assert_eq!(result, Err(CheckError::IssuerRequiresNotaryPermission));

    verify_primary_source_issuer(&credential, TEST_ORG_GLOBEX_DID, &employment_metadata())?;
    Ok(())
}

#[test]
fn test_type_without_claim_paths_is_unrestricted() -> Result<(), anyhow::Error> {
    let metadata: CredentialTypeMetadata = serde_json::from_value(json!({
        "credentialType": TYPE_ORGANIZATION_IDENTITY,
    }))?;
    let jwt = employment_credential(json!({ "identifier": TEST_ORG_GLOBEX_DID }))?;
    let credential = decode_credential_jwt(&jwt)?;

    verify_primary_source_issuer(&credential, TEST_ORG_ACME_DID, &metadata)?;
    Ok(())
}
