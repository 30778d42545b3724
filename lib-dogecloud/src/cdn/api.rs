use serde_json::Map;
use std::path::{Path, PathBuf};
use url::form_urlencoded;

use super::crypto::inspect_certificate_pair;
use super::errors::CdnErrors;
use super::http_request::DogeCloudClient;
use super::types::{
    ConfigureCertRequest, DeleteCertRequest, DomainList, DomainRecord, UploadCertRequest,
    UploadedCert,
};

const DOMAIN_LIST: &str = "/cdn/domain/list.json";
const DOMAIN_CONFIG: &str = "/cdn/domain/config.json";
const CERT_UPLOAD: &str = "/cdn/cert/upload.json";
const CERT_DELETE: &str = "/cdn/cert/delete.json";

const FULLCHAIN: &str = "fullchain.pem";
const PRIVKEY: &str = "privkey.pem";

/// PEM material read from a certificate directory.
#[derive(Debug, Clone)]
pub struct CertificateFiles {
    pub fullchain: String,
    pub privkey: String,
    pub not_after: String,
}

/// Reads and sanity checks `fullchain.pem` and `privkey.pem` from `dir`.
pub fn read_cert_files(dir: &Path) -> Result<CertificateFiles, CdnErrors> {
    let read = |name: &str| -> Result<String, CdnErrors> {
        let file: PathBuf = dir.join(name);
        std::fs::read_to_string(&file)
            .map_err(|source| CdnErrors::MissingCertificateFiles { path: file, source })
    };
    let fullchain = read(FULLCHAIN)?;
    let privkey = read(PRIVKEY)?;
    let not_after = inspect_certificate_pair(&fullchain, &privkey).map_err(|source| {
        CdnErrors::InvalidCertificate {
            path: dir.to_path_buf(),
            source,
        }
    })?;
    Ok(CertificateFiles {
        fullchain,
        privkey,
        not_after,
    })
}

/// Fetches every domain on the account, in the provider's order.
pub async fn list_domains(client: &DogeCloudClient) -> Result<Vec<DomainRecord>, CdnErrors> {
    let list: DomainList = client
        .post(DOMAIN_LIST, &Map::new())
        .await?
        .into_success()?
        .data()?;
    Ok(list.domains)
}

pub(crate) async fn try_upload_cert(
    client: &DogeCloudClient,
    domain: &str,
    files: &CertificateFiles,
) -> Result<u64, CdnErrors> {
    let body = UploadCertRequest {
        note: format!("{domain} ssl cert"),
        cert: &files.fullchain,
        private: &files.privkey,
    };
    let uploaded: UploadedCert = client
        .post(CERT_UPLOAD, &body)
        .await?
        .into_success()?
        .data()?;
    Ok(uploaded.id)
}

/// Uploads the certificate pair stored in `dir` for `domain`.
///
/// Returns the new certificate id, or `None` when the files are unusable or the
/// upload failed. Failures are logged and never abort the caller.
pub async fn upload_cert(client: &DogeCloudClient, domain: &str, dir: &Path) -> Option<u64> {
    let files = match read_cert_files(dir) {
        Ok(files) => files,
        Err(e) => {
            tracing::warn!("skipping domain {}: {}", domain, e);
            return None;
        }
    };
    tracing::debug!("certificate for {} expires {}", domain, files.not_after);
    match try_upload_cert(client, domain, &files).await {
        Ok(id) => {
            tracing::info!("successfully uploaded cert for domain {} as cert_id {}", domain, id);
            Some(id)
        }
        Err(CdnErrors::ApiError { code, msg }) => {
            tracing::warn!(
                "failed to upload cert for domain {}, code {}, reason: {}",
                domain,
                code,
                msg
            );
            None
        }
        Err(e) => {
            tracing::warn!("failed to upload cert for domain {}: {}", domain, e);
            None
        }
    }
}

/// Binds `cert_id` to `domain`. Returns whether the provider accepted it.
pub async fn configure_cert(client: &DogeCloudClient, domain: &str, cert_id: u64) -> bool {
    let encoded: String = form_urlencoded::byte_serialize(domain.as_bytes()).collect();
    let api_path = format!("{DOMAIN_CONFIG}?domain={encoded}");
    let response = match client.post(&api_path, &ConfigureCertRequest { cert_id }).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("failed to set cert for domain {}: {}", domain, e);
            return false;
        }
    };
    if !response.is_success() {
        tracing::warn!(
            "failed to set cert for domain {}, code {}, reason: {}",
            domain,
            response.code,
            response.msg
        );
        return false;
    }
    tracing::info!("successfully set cert for domain {} to cert_id {}", domain, cert_id);
    true
}

/// Deletes each certificate independently and returns the ids that were removed.
pub async fn remove_certs(client: &DogeCloudClient, cert_ids: &[u64]) -> Vec<u64> {
    let mut removed = Vec::with_capacity(cert_ids.len());
    for &id in cert_ids {
        match client.post(CERT_DELETE, &DeleteCertRequest { id }).await {
            Ok(response) if response.is_success() => {
                tracing::info!("successfully removed cert id {}", id);
                removed.push(id);
            }
            Ok(response) => {
                tracing::warn!(
                    "failed to remove cert id {}, code {}, reason: {}",
                    id,
                    response.code,
                    response.msg
                );
            }
            Err(e) => {
                tracing::warn!("failed to remove cert id {}: {}", id, e);
            }
        }
    }
    removed
}
