#![allow(dead_code)]

use certmint::cert::CertificateWithPrivateKey;
use certmint::cert::params::CertificateTemplate;
use certmint::config::KdfParams;
use certmint::key::KeyPair;
use rand_core::{CryptoRng, RngCore};
use time::{Duration, OffsetDateTime};

/// Modulus size used throughout the tests to keep key generation fast.
pub const TEST_KEY_BITS: usize = 1024;

pub fn generate_key() -> KeyPair {
    KeyPair::generate(TEST_KEY_BITS).unwrap()
}

pub fn days_from_now(days: i64) -> OffsetDateTime {
    OffsetDateTime::now_utc() + Duration::days(days)
}

pub fn leaf_template(host: &str) -> CertificateTemplate {
    CertificateTemplate::builder()
        .organization("myorg")
        .host(host)
        .not_after(days_from_now(365))
        .build()
        .unwrap()
}

pub fn generate_ca_cert() -> CertificateWithPrivateKey {
    let template = CertificateTemplate::builder()
        .organization("myorg")
        .host("myca.local")
        .not_after(days_from_now(3650))
        .is_ca(true)
        .build()
        .unwrap();

    CertificateWithPrivateKey::self_signed(generate_key(), &template).unwrap()
}

/// Cheap Argon2id cost for encryption tests.
pub fn fast_kdf() -> KdfParams {
    KdfParams {
        memory_kib: 64,
        iterations: 1,
        parallelism: 1,
    }
}

/// Deterministic RNG yielding an incrementing byte sequence.
///
/// Only for tests that need reproducible serial numbers, never for keys.
pub struct CounterRng(pub u8);

impl RngCore for CounterRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.0;
            self.0 = self.0.wrapping_add(1);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for CounterRng {}
