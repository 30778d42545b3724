use clap::Parser;
use lib_dogecloud::cdn::errors::CdnErrors;
use lib_dogecloud::cdn::types::{Credentials, DomainCertPaths, RotatorConfig, DEFAULT_API_BASE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing_subscriber::EnvFilter;
use url::Url;

#[derive(Parser, Debug, Serialize, Deserialize)]
#[clap(author, version, about, long_about = None)]
pub struct CliInput {
    #[arg(short = 'a', long, env = "DOGECLOUD_ACCESSKEY")]
    pub access_key: String,
    #[arg(short = 's', long, env = "DOGECLOUD_SECRETKEY", hide_env_values = true)]
    pub secret_key: String,
    /// `domain:path` pairs, comma separated
    #[arg(short = 'p', long, env = "DOMAIN_CERT_PAIRS", required = true)]
    pub domain_cert_pairs: Vec<String>,
    #[arg(short = 'b', long, env = "DOGECLOUD_API_BASE", default_value = DEFAULT_API_BASE)]
    pub api_base: Url,
    #[arg(
        short = 't',
        long,
        env = "HTTP_TIMEOUT_SECS",
        default_value_t = 30,
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub timeout_secs: u64,
    /// Validate local certificates and report the plan without changing anything
    #[arg(short = 'n', long, env)]
    pub dry_run: bool,
}

impl CliInput {
    pub fn split_domain_cert_pairs(&self) -> Vec<String> {
        self.domain_cert_pairs
            .iter()
            .flat_map(|s| s.split(',').map(str::trim).map(String::from))
            .filter(|s| !s.is_empty())
            .collect()
    }
    pub fn new() -> Self {
        let tmp = CliInput::parse();
        let processed_pairs = tmp.split_domain_cert_pairs();
        CliInput {
            domain_cert_pairs: processed_pairs,
            ..tmp
        }
    }
    pub fn into_config(self) -> Result<RotatorConfig, CdnErrors> {
        let domain_cert_paths = DomainCertPaths::from_pairs(&self.domain_cert_pairs);
        let mut config = RotatorConfig::new(
            Credentials::new(self.access_key, self.secret_key),
            domain_cert_paths,
        )?;
        config.api_base = self.api_base;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.dry_run = self.dry_run;
        Ok(config)
    }
}

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::error::ErrorKind;

    const REQUIRED_ENV: [&str; 3] = ["DOGECLOUD_ACCESSKEY", "DOGECLOUD_SECRETKEY", "DOMAIN_CERT_PAIRS"];

    fn parse_without_env(args: &[&str]) -> Result<CliInput, clap::Error> {
        for name in REQUIRED_ENV {
            std::env::remove_var(name);
        }
        CliInput::try_parse_from(std::iter::once("cert-rotator").chain(args.iter().copied()))
    }

    fn assert_missing(args: &[&str]) {
        match parse_without_env(args) {
            Err(e) => assert_eq!(e.kind(), ErrorKind::MissingRequiredArgument),
            Ok(cli) => panic!("parsed without a required setting: {:?}", cli),
        }
    }

    #[test]
    fn test_missing_domain_cert_pairs_is_rejected() {
        assert_missing(&["--access-key", "ak", "--secret-key", "sk"]);
    }

    #[test]
    fn test_missing_access_key_is_rejected() {
        assert_missing(&["--secret-key", "sk", "--domain-cert-pairs", "a.com:/certs/a"]);
    }

    #[test]
    fn test_missing_secret_key_is_rejected() {
        assert_missing(&["--access-key", "ak", "--domain-cert-pairs", "a.com:/certs/a"]);
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let result = parse_without_env(&[
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--domain-cert-pairs",
            "a.com:/certs/a",
            "--timeout-secs",
            "0",
        ]);
        assert!(result.is_err());

        let cli = parse_without_env(&[
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--domain-cert-pairs",
            "a.com:/certs/a",
            "--timeout-secs",
            "1",
        ])
        .unwrap();
        assert_eq!(cli.timeout_secs, 1);
    }

    #[test]
    fn test_parse_flags_into_config() {
        let cli = CliInput::try_parse_from([
            "cert-rotator",
            "--access-key",
            "ak",
            "--secret-key",
            "sk",
            "--domain-cert-pairs",
            "a.com:/certs/a, b.com:/certs/b,broken",
            "--dry-run",
        ])
        .unwrap();
        let pairs = cli.split_domain_cert_pairs();
        assert_eq!(pairs, vec!["a.com:/certs/a", "b.com:/certs/b", "broken"]);

        let cli = CliInput {
            domain_cert_pairs: pairs,
            ..cli
        };
        let config = cli.into_config().unwrap();
        assert_eq!(config.credentials.access_key, "ak");
        assert_eq!(config.api_base.as_str(), "https://api.dogecloud.com/");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.domain_cert_paths.len(), 2);
        assert!(config.dry_run);
    }
}
