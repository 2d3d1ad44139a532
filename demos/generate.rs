use certmint::cert::CertificateWithPrivateKey;
use certmint::cert::params::CertificateTemplate;
use certmint::config::MintConfig;
use certmint::csr::CertificateRequest;
use certmint::error::CertMintError;
use certmint::files;
use certmint::key::KeyPair;
use time::{Duration, OffsetDateTime};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), CertMintError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // An optional JSON config path as the first argument.
    let config = match std::env::args().nth(1) {
        Some(path) => MintConfig::load(path)?,
        None => MintConfig::default(),
    };
    let out_dir = std::env::temp_dir().join("certmint-demo");
    std::fs::create_dir_all(&out_dir).map_err(|e| CertMintError::IoError(e.to_string()))?;

    // Self-signed CA
    let ca_template = CertificateTemplate::builder()
        .organization("My Test CA")
        .host("ca.local")
        .not_after(OffsetDateTime::now_utc() + Duration::days(3650))
        .is_ca(true)
        .build()?;
    let ca = CertificateWithPrivateKey::self_signed(KeyPair::generate(config.key_bits)?, &ca_template)?;
    println!("CA Certificate PEM:\n{}", ca.cert.to_pem()?);

    // Server certificate for an IP literal, issued for the server's own key
    let server_key = KeyPair::generate(config.key_bits)?;
    let server_template = CertificateTemplate::builder()
        .organization("My Test CA")
        .host("127.0.0.1")
        .not_after(OffsetDateTime::now_utc() + Duration::days(825))
        .extra_sans(vec!["localhost".to_string()])
        .build()?;
    let server_cert = ca.issue(&server_template, &server_key.public_key())?;
    println!("Server Certificate PEM:\n{}", server_cert.to_pem()?);

    // Client certificate through a signing request
    let client_key = KeyPair::generate(config.key_bits)?;
    let csr = CertificateRequest::build(&client_key, "My Test CA", "client.local")?;
    let client_cert = ca.issue_for_csr(&csr, OffsetDateTime::now_utc() + Duration::days(90))?;
    println!("Client Certificate PEM:\n{}", client_cert.to_pem()?);

    files::write_certificate(out_dir.join("ca.crt"), &ca.cert)?;
    files::write_encrypted_private_key_with_config(
        out_dir.join("ca.key"),
        &ca.key,
        b"demo password",
        &config,
    )?;
    files::write_certificate(out_dir.join("server.crt"), &server_cert)?;
    files::write_private_key(out_dir.join("server.key"), &server_key)?;
    println!("Wrote PEM files to {}", out_dir.display());

    Ok(())
}
