//! Fixed test identifiers for deterministic tests

// Root (platform) issuer
pub const TEST_ROOT_DID: &str = "did:ion:root-test-issuer";
pub const TEST_ROOT_KID: &str = "did:ion:root-test-issuer#key-1";

// Organizations
pub const TEST_ORG_ACME_DID: &str = "did:ion:acme-test-org";
pub const TEST_ORG_GLOBEX_DID: &str = "did:ion:globex-test-org";
pub const TEST_ORG_WEB_DID: &str = "did:web:acme.example.com";

// Holders
pub const TEST_HOLDER_ALICE_DID: &str = "did:ion:alice-test-holder";

// Credential IDs
pub const TEST_CREDENTIAL_ID_1: &str = "urn:uuid:00000000-0000-0000-0000-000000000001";
pub const TEST_CREDENTIAL_ID_2: &str = "urn:uuid:00000000-0000-0000-0000-000000000002";

// Credential types
pub const TYPE_VERIFIABLE_CREDENTIAL: &str = "VerifiableCredential";
pub const TYPE_ORGANIZATION_IDENTITY: &str = "OrganizationIdentity";
pub const TYPE_EMPLOYMENT_PAST: &str = "EmploymentPastV1.1";

// Fixed check time: 2025-01-01T00:00:00Z
pub const TEST_NOW_TIMESTAMP: i64 = 1_735_689_600;
