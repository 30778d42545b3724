use super::errors::CdnErrors;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use serde_with::{serde_as, DisplayFromStr, PickFirst};
use std::collections::BTreeMap;
use std::fmt::{self, Debug, Display};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

pub const DEFAULT_API_BASE: &str = "https://api.dogecloud.com";
pub const SUCCESS_CODE: i64 = 200;

/// Envelope returned by every DogeCloud endpoint.
///
/// `code` is 200 on success. `data` carries the endpoint specific payload and is
/// left as a raw `Value` until the caller asks for a concrete shape.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiResponse {
    pub code: i64,
    #[serde(default)]
    pub msg: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.code == SUCCESS_CODE
    }
    /// Turns a non-200 response into `CdnErrors::ApiError`.
    pub fn into_success(self) -> Result<Self, CdnErrors> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CdnErrors::ApiError {
                code: self.code,
                msg: self.msg,
            })
        }
    }
    pub fn data<T: DeserializeOwned>(self) -> Result<T, CdnErrors> {
        let data = self.data.ok_or(CdnErrors::MissingData)?;
        Ok(serde_json::from_value(data)?)
    }
}

/// A domain as listed by the CDN. `cert_id == 0` means no certificate is bound.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DomainRecord {
    pub name: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub cert_id: u64,
}

impl DomainRecord {
    pub fn has_certificate(&self) -> bool {
        self.cert_id != 0
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct DomainList {
    pub(crate) domains: Vec<DomainRecord>,
}

#[serde_as]
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct UploadedCert {
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub(crate) id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct UploadCertRequest<'a> {
    pub(crate) note: String,
    pub(crate) cert: &'a str,
    pub(crate) private: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConfigureCertRequest {
    pub(crate) cert_id: u64,
}

#[derive(Debug, Serialize)]
pub(crate) struct DeleteCertRequest {
    pub(crate) id: u64,
}

/// How a request payload is serialized before it is signed and sent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum BodyMode {
    #[default]
    Json,
    Form,
}

impl BodyMode {
    pub fn content_type(&self) -> &'static str {
        match self {
            BodyMode::Json => "application/json",
            BodyMode::Form => "application/x-www-form-urlencoded",
        }
    }
}

impl Display for BodyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BodyMode::Json => write!(f, "json"),
            BodyMode::Form => write!(f, "form"),
        }
    }
}

#[derive(Clone)]
pub struct Credentials {
    pub access_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(access_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Credentials {
            access_key: access_key.into(),
            secret_key: secret_key.into(),
        }
    }
}

impl Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key", &self.access_key)
            .field("secret_key", &"<redacted>")
            .finish()
    }
}

/// Domain name to the directory holding its `fullchain.pem` and `privkey.pem`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainCertPaths(BTreeMap<String, PathBuf>);

impl DomainCertPaths {
    /// Builds the mapping from `domain:path` entries.
    ///
    /// Entries that do not split into exactly two non-empty parts are skipped.
    /// A domain listed twice keeps its last path.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut map = BTreeMap::new();
        for pair in pairs {
            let parts: Vec<&str> = pair.as_ref().split(':').map(str::trim).collect();
            match parts.as_slice() {
                [domain, path] if !domain.is_empty() && !path.is_empty() => {
                    map.insert(domain.to_string(), PathBuf::from(path));
                }
                _ => {
                    tracing::debug!("ignoring malformed domain/path pair {:?}", pair.as_ref());
                }
            }
        }
        DomainCertPaths(map)
    }
    /// Parses the comma separated `domain:path,domain:path` form.
    pub fn parse(raw: &str) -> Self {
        Self::from_pairs(raw.split(','))
    }
    pub fn get(&self, domain: &str) -> Option<&PathBuf> {
        self.0.get(domain)
    }
    pub fn contains(&self, domain: &str) -> bool {
        self.0.contains_key(domain)
    }
    pub fn len(&self) -> usize {
        self.0.len()
    }
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
    pub fn domains(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

/// Everything a sweep needs, built once at startup.
#[derive(Debug, Clone)]
pub struct RotatorConfig {
    pub credentials: Credentials,
    pub api_base: Url,
    pub timeout: Duration,
    pub domain_cert_paths: DomainCertPaths,
    pub dry_run: bool,
}

impl RotatorConfig {
    pub fn new(credentials: Credentials, domain_cert_paths: DomainCertPaths) -> Result<Self, CdnErrors> {
        Ok(RotatorConfig {
            credentials,
            api_base: Url::parse(DEFAULT_API_BASE)?,
            timeout: Duration::from_secs(30),
            domain_cert_paths,
            dry_run: false,
        })
    }
}

/// A domain whose new certificate was uploaded but not yet bound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReplacement {
    pub domain: DomainRecord,
    pub new_cert_id: u64,
}

/// What a sweep did, in the order it did it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub matched: Vec<String>,
    pub uploaded: Vec<PendingReplacement>,
    pub configured: Vec<String>,
    pub removal_queue: Vec<u64>,
    pub removed: Vec<u64>,
}

impl Display for SweepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} matched, {} uploaded, {} configured, {}/{} old certificates removed",
            self.matched.len(),
            self.uploaded.len(),
            self.configured.len(),
            self.removed.len(),
            self.removal_queue.len()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_domain_cert_paths_skips_malformed_pairs() {
        let paths = DomainCertPaths::parse("a.com:/certs/a,broken,c.com:/x:/y,:/nothing,b.com:/certs/b");
        assert_eq!(paths.len(), 2);
        assert_eq!(paths.get("a.com"), Some(&PathBuf::from("/certs/a")));
        assert_eq!(paths.get("b.com"), Some(&PathBuf::from("/certs/b")));
        assert!(!paths.contains("c.com"));
        assert!(!paths.contains("broken"));
    }

    #[test]
    fn test_domain_cert_paths_last_pair_wins() {
        let paths = DomainCertPaths::from_pairs(vec![" a.com : /old ", "a.com:/new"]);
        assert_eq!(paths.len(), 1);
        assert_eq!(paths.get("a.com"), Some(&PathBuf::from("/new")));
    }

    #[test]
    fn test_domain_record_accepts_numeric_string_cert_id() {
        let records: Vec<DomainRecord> = serde_json::from_value(json!([
            {"name": "a.com", "cert_id": 5},
            {"name": "b.com", "cert_id": "12"},
            {"name": "c.com"}
        ]))
        .unwrap();
        assert_eq!(records[0].cert_id, 5);
        assert_eq!(records[1].cert_id, 12);
        assert!(!records[2].has_certificate());
    }

    #[test]
    fn test_api_response_into_success() {
        let ok: ApiResponse =
            serde_json::from_value(json!({"code": 200, "msg": "", "data": {"id": 7}})).unwrap();
        let uploaded: UploadedCert = ok.into_success().unwrap().data().unwrap();
        assert_eq!(uploaded.id, 7);

        let failed: ApiResponse =
            serde_json::from_value(json!({"code": 401, "msg": "bad token"})).unwrap();
        match failed.into_success() {
            Err(CdnErrors::ApiError { code, msg }) => {
                assert_eq!(code, 401);
                assert_eq!(msg, "bad token");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let rendered = format!("{:?}", Credentials::new("ak", "super-secret"));
        assert!(rendered.contains("ak"));
        assert!(!rendered.contains("super-secret"));
    }
}
