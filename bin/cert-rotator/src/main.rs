use cert_rotator::init_logging;
use cert_rotator::CliInput;
use lib_dogecloud::cdn::{cert_manager::CertificateRotator, errors::CdnErrors};

#[tokio::main]
async fn main() -> Result<(), CdnErrors> {
    init_logging();

    let args = CliInput::new();
    tracing::debug!("parsed domains to process: {:?}", args.domain_cert_pairs);

    let rotator = CertificateRotator::new(args.into_config()?)?;
    let report = rotator.sweep().await?;
    tracing::info!("sweep finished: {}", report);

    Ok(())
}
