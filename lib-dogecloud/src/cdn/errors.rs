use openssl::error::ErrorStack;
use reqwest::Error as ReqwestError;
use serde_json::Error as SerdeError;
use std::path::PathBuf;
use thiserror::Error;

/// Represents all possible errors that can occur while talking to the DogeCloud API
/// or preparing certificate material for it.
///
/// # Variants
///
/// - `RequestFailed`: Transport-level failures reported by `reqwest`, including a response body that is not JSON.
/// - `SerdeError`: A payload could not be serialized, or a `data` field did not have the expected shape.
/// - `ApiError`: The provider answered, but with a `code` other than 200.
/// - `InvalidPayload`: A request payload did not serialize to a JSON object, so it has no fields to send.
/// - `MissingData`: A successful response carried no `data` payload where one is required.
/// - `MissingCertificateFiles`: `fullchain.pem` or `privkey.pem` could not be read from the configured directory.
/// - `InvalidCertificate`: The fullchain could not be parsed as a PEM encoded X.509 certificate.
#[derive(Debug, Error)]
pub enum CdnErrors {
    #[error("HTTP request failed: {0}")]
    RequestFailed(#[from] ReqwestError),

    #[error("Serialization or deserialization error using Serde: {0}")]
    SerdeError(#[from] SerdeError),

    #[error("API responded with code {code}: {msg}")]
    ApiError { code: i64, msg: String },

    #[error("Request payload must be a JSON object, got {0}")]
    InvalidPayload(String),

    #[error("Response is missing the `data` payload")]
    MissingData,

    #[error("Certificate files missing in {path}: {source}")]
    MissingCertificateFiles {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Certificate in {path} is not valid PEM: {source}")]
    InvalidCertificate {
        path: PathBuf,
        #[source]
        source: ErrorStack,
    },

    #[error("OpenSSL related error: {0}")]
    ErrorStack(#[from] ErrorStack),

    #[error("Error in parsing url")]
    ParseError(#[from] url::ParseError),
}
