use crate::error::{CertMintError, Result};

/// Convert DER‑encoded data into a PEM‑encoded string with the provided label.
pub fn der_to_pem(der: &[u8], label: &str) -> String {
    let pem = pem::Pem::new(label, der);
    pem::encode_config(&pem, pem::EncodeConfig::new())
}

/// Convert a PEM block with the expected label to DER‑encoded bytes.
pub fn pem_to_der(pem_bytes: &[u8], label: &str) -> Result<Vec<u8>> {
    let block = parse_block(pem_bytes)?;
    if block.tag() != label {
        return Err(CertMintError::DecodingError(format!(
            "expected PEM label {label}, found {}",
            block.tag()
        )));
    }
    Ok(block.into_contents())
}

/// Parse the first PEM block in `pem_bytes`.
pub(crate) fn parse_block(pem_bytes: &[u8]) -> Result<pem::Pem> {
    Ok(pem::parse(pem_bytes)?)
}
