//! `vc-check`
//!
//! Reads one JSON request from stdin and prints the result as JSON:
//!
//! - `{"signedCredential": "<jwt>"}` - organization credential checks
//!   against the configured root DID and key
//! - `{"presentation": "<jwt_vp>", "protocolVersion": 2}` - presentation
//!   verification
//!
//! A rejected request prints `{"statusCode", "errorCode", "message"}` and
//! exits with status 1.

use serde::{Deserialize, Serialize};
use std::process::ExitCode;
use std::sync::Arc;
use tokio::io::AsyncReadExt;
use tracing::{error, info};
use vc_checks::checks::{run_all_org_checks, CheckContext, OrgCheckInput};
use vc_checks::config::CheckConfig;
use vc_checks::did::CompositeDidResolver;
use vc_checks::errors::CheckError;
use vc_checks::observability::init_tracing;
use vc_checks::presentation::{PresentationVerifier, ProtocolVersion};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Request {
    #[serde(rename_all = "camelCase")]
    Presentation {
        presentation: String,
        #[serde(default)]
        protocol_version: ProtocolVersion,
    },
    #[serde(rename_all = "camelCase")]
    OrgChecks { signed_credential: String },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    status_code: u16,
    error_code: &'static str,
    message: String,
}

impl From<&CheckError> for ErrorBody {
    fn from(err: &CheckError) -> Self {
        Self {
            status_code: err.status_code(),
            error_code: err.error_code(),
            message: err.to_string(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = CheckConfig::from_env().map_err(|e| {
        eprintln!("Failed to load configuration: {e}");
        e
    })?;

    init_tracing(&config.observability)?;

    info!(
        root_did = %config.root_did,
        registrar_url = %config.registrar_url,
        jwt_clock_skew_seconds = config.jwt_clock_skew_seconds,
        "Configuration loaded successfully"
    );

    let mut input = String::new();
    tokio::io::stdin().read_to_string(&mut input).await?;

    let request: Request = serde_json::from_str(&input).map_err(|e| {
        error!("Failed to parse request: {}", e);
        e
    })?;

    let outcome = match request {
        Request::OrgChecks { signed_credential } => run_all_org_checks(
            OrgCheckInput {
                signed_credential: &signed_credential,
                root_jwk: &config.root_public_key,
                root_did: &config.root_did,
            },
            &CheckContext::current(),
        )
        .and_then(|checks| to_json(&checks)),
        Request::Presentation {
            presentation,
            protocol_version,
        } => {
            let resolver = CompositeDidResolver::standard(
                &config.registrar_url,
                config.request_timeout(),
                config.did_cache_ttl(),
            );
            let verifier = PresentationVerifier::new(Arc::new(resolver), config.jwt_clock_skew());
            verifier
                .verify(&presentation, protocol_version)
                .await
                .and_then(|presentation| to_json(&presentation))
        }
    };

    match outcome {
        Ok(body) => {
            println!("{body}");
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            error!(error_code = e.error_code(), "Request rejected: {}", e);
            println!("{}", serde_json::to_string(&ErrorBody::from(&e))?);
            Ok(ExitCode::FAILURE)
        }
    }
}

fn to_json<T: Serialize>(value: &T) -> Result<String, CheckError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CheckError::Internal(format!("response serialization failed: {e}")))
}
