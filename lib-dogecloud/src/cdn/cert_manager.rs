use super::api::{configure_cert, list_domains, read_cert_files, remove_certs, upload_cert};
use super::errors::CdnErrors;
use super::http_request::DogeCloudClient;
use super::types::{DomainCertPaths, DomainRecord, PendingReplacement, RotatorConfig, SweepReport};

/// Rotates CDN certificates for a fixed set of domains.
#[derive(Debug, Clone)]
pub struct CertificateRotator {
    client: DogeCloudClient,
    domain_cert_paths: DomainCertPaths,
    dry_run: bool,
}

impl CertificateRotator {
    /// Constructs a new `CertificateRotator`.
    ///
    /// # Parameters
    /// * `config` - Credentials, API endpoint and the domain to certificate directory mapping.
    pub fn new(config: RotatorConfig) -> Result<Self, CdnErrors> {
        let client = DogeCloudClient::new(config.credentials, config.api_base, config.timeout)?;
        Ok(CertificateRotator {
            client,
            domain_cert_paths: config.domain_cert_paths,
            dry_run: config.dry_run,
        })
    }

    /// Runs one sweep: upload every new certificate, bind the uploaded ones, then
    /// delete the certificates they replaced.
    ///
    /// Old certificates are only deleted after every bind has been attempted, and
    /// only for domains whose bind succeeded.
    ///
    /// # Returns
    /// A `SweepReport` describing what happened. A transport failure while
    /// listing domains is returned as an error; a rejected listing ends the sweep
    /// with an empty report.
    pub async fn sweep(&self) -> Result<SweepReport, CdnErrors> {
        let mut report = SweepReport::default();
        if self.domain_cert_paths.is_empty() {
            tracing::warn!("no valid domain/path pairs configured");
        }

        let online = match list_domains(&self.client).await {
            Ok(domains) => domains,
            Err(CdnErrors::ApiError { code, msg }) => {
                tracing::warn!("failed to retrieve domain list, code {}, reason {}", code, msg);
                return Ok(report);
            }
            Err(e) => return Err(e),
        };
        let to_replace: Vec<DomainRecord> = online
            .into_iter()
            .filter(|d| self.domain_cert_paths.contains(&d.name))
            .collect();
        report.matched = to_replace.iter().map(|d| d.name.clone()).collect();
        for requested in self.domain_cert_paths.domains() {
            if !report.matched.iter().any(|m| m == requested) {
                tracing::warn!("domain {} is not on the CDN, skipping", requested);
            }
        }

        if self.dry_run {
            self.dry_run_check(&to_replace);
            return Ok(report);
        }

        for domain in to_replace {
            tracing::info!("processing domain {}", domain.name);
            let Some(dir) = self.domain_cert_paths.get(&domain.name) else {
                continue;
            };
            if let Some(new_cert_id) = upload_cert(&self.client, &domain.name, dir).await {
                report.uploaded.push(PendingReplacement {
                    domain,
                    new_cert_id,
                });
            }
        }

        for pending in &report.uploaded {
            let configured =
                configure_cert(&self.client, &pending.domain.name, pending.new_cert_id).await;
            if !configured {
                continue;
            }
            report.configured.push(pending.domain.name.clone());
            if pending.domain.has_certificate() {
                report.removal_queue.push(pending.domain.cert_id);
            }
        }

        report.removed = remove_certs(&self.client, &report.removal_queue).await;
        Ok(report)
    }

    fn dry_run_check(&self, to_replace: &[DomainRecord]) {
        for domain in to_replace {
            let Some(dir) = self.domain_cert_paths.get(&domain.name) else {
                continue;
            };
            match read_cert_files(dir) {
                Ok(files) => tracing::info!(
                    "[dry run] would upload {} (expires {}) for {} and replace cert_id {}",
                    dir.display(),
                    files.not_after,
                    domain.name,
                    domain.cert_id
                ),
                Err(e) => tracing::warn!("[dry run] domain {} would be skipped: {}", domain.name, e),
            }
        }
    }
}
