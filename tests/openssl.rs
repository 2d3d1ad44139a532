mod util;

use certmint::cert::Certificate;
use certmint::csr::CertificateRequest;
use certmint::key::{KeyPair, PublicKey};
use der::Decode;
use openssl::asn1::Asn1Time;
use openssl::bn::BigNum;
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::extension::SubjectAlternativeName;
use openssl::x509::{X509, X509NameBuilder, X509Req};
use regex::Regex;
use std::process::Command;

fn entry(name: &openssl::x509::X509NameRef, nid: Nid) -> String {
    name.entries_by_nid(nid)
        .next()
        .unwrap()
        .data()
        .as_utf8()
        .unwrap()
        .to_string()
}

#[test]
fn test_openssl_cli_parses_cert() {
    let ca_cert_with_key = util::generate_ca_cert();
    let server_key = util::generate_key();
    let server_cert = ca_cert_with_key
        .issue(&util::leaf_template("127.0.0.1"), &server_key.public_key())
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let cert_path = dir.path().join("server_cert.pem");
    std::fs::write(&cert_path, server_cert.to_pem().unwrap())
        .expect("Failed to write server certificate");

    let output = Command::new("openssl")
        .arg("x509")
        .arg("-in")
        .arg(&cert_path)
        .arg("-noout")
        .arg("-text")
        .output()
        .expect("Failed to execute OpenSSL command");

    assert!(
        output.status.success(),
        "OpenSSL command failed: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let output_text = String::from_utf8_lossy(&output.stdout);

    assert!(
        output_text.contains("Version: 3 (0x2)"),
        "Version field is incorrect"
    );
    assert!(
        Regex::new(r"Issuer: O\s?=\s?myorg, CN\s?=\s?myca\.local")
            .unwrap()
            .is_match(&output_text),
        "Issuer field is incorrect"
    );
    assert!(
        Regex::new(r"Subject: O\s?=\s?myorg, CN\s?=\s?127\.0\.0\.1")
            .unwrap()
            .is_match(&output_text),
        "Subject field is incorrect"
    );
    assert!(
        output_text.contains("Signature Algorithm: sha256WithRSAEncryption"),
        "Signature Algorithm field is incorrect"
    );
    assert!(
        output_text.contains("IP Address:127.0.0.1"),
        "Missing IP SAN"
    );
    assert!(
        output_text.contains("TLS Web Server Authentication, TLS Web Client Authentication"),
        "Missing extended key usage"
    );
    assert!(
        Regex::new(r"Not After : .+").unwrap().is_match(&output_text),
        "Missing or incorrect Not After field"
    );
}

#[test]
fn test_openssl_crate_validate_cert() {
    let ca_cert_with_key = util::generate_ca_cert();
    let server_key = util::generate_key();
    let server_cert = ca_cert_with_key
        .issue(
            &util::leaf_template("server.myca.local"),
            &server_key.public_key(),
        )
        .unwrap();

    let x509 = X509::from_pem(server_cert.to_pem().unwrap().as_bytes()).expect("Failed to parse PEM");

    assert_eq!(
        entry(x509.subject_name(), Nid::COMMONNAME),
        "server.myca.local",
        "Subject CN mismatch"
    );
    assert_eq!(entry(x509.subject_name(), Nid::ORGANIZATIONNAME), "myorg");
    assert_eq!(
        entry(x509.issuer_name(), Nid::COMMONNAME),
        "myca.local",
        "Issuer CN mismatch"
    );
    assert_eq!(x509.version(), 2, "X509 version should be 3 (0-based index)");
    assert_eq!(
        x509.signature_algorithm().object().nid(),
        Nid::SHA256WITHRSAENCRYPTION
    );

    let serial = x509.serial_number().to_bn().unwrap().to_vec();
    assert_eq!(serial, server_cert.serial_number());

    let sans = x509.subject_alt_names().expect("Missing SAN extension");
    let dns: Vec<&str> = sans.iter().filter_map(|n| n.dnsname()).collect();
    assert_eq!(dns, vec!["server.myca.local"]);

    let ca_x509 = X509::from_der(ca_cert_with_key.cert.to_der()).unwrap();
    let ca_pkey = ca_x509.public_key().unwrap();
    assert!(x509.verify(&ca_pkey).unwrap(), "Signature did not verify under the CA key");
    assert!(ca_x509.verify(&ca_pkey).unwrap(), "CA certificate is not self-signed");

    let server_pkey = PKey::public_key_from_pem(server_key.public_key_pem().unwrap().as_bytes()).unwrap();
    assert!(x509.public_key().unwrap().public_eq(&server_pkey));
}

#[test]
fn test_openssl_reads_ip_san() {
    let key = util::generate_key();
    let cert = certmint::issuer::self_sign(&key, &util::leaf_template("127.0.0.1")).unwrap();

    let x509 = X509::from_der(cert.to_der()).unwrap();
    let sans = x509.subject_alt_names().expect("Missing SAN extension");
    assert_eq!(sans.len(), 1);
    assert_eq!(sans.get(0).unwrap().ipaddress(), Some(&[127u8, 0, 0, 1][..]));
    assert!(sans.get(0).unwrap().dnsname().is_none());
}

#[test]
fn test_openssl_verifies_csr() {
    let key = util::generate_key();
    let csr = CertificateRequest::build(&key, "Test Org", "test.org").unwrap();

    let req = X509Req::from_pem(csr.to_pem().as_bytes()).unwrap();
    let pkey = req.public_key().unwrap();
    assert!(req.verify(&pkey).unwrap(), "CSR signature did not verify");
    assert_eq!(entry(req.subject_name(), Nid::COMMONNAME), "test.org");
    assert_eq!(entry(req.subject_name(), Nid::ORGANIZATIONNAME), "Test Org");
}

#[test]
fn test_openssl_generated_keys_are_accepted() {
    let rsa = Rsa::generate(1024).unwrap();
    let pkcs1 = rsa.private_key_to_pem().unwrap();
    let pkey = PKey::from_rsa(rsa).unwrap();
    let pkcs8 = pkey.private_key_to_pem_pkcs8().unwrap();
    let public_pem = pkey.public_key_to_pem().unwrap();

    let from_pkcs1 = KeyPair::from_pem(&pkcs1).unwrap();
    let from_pkcs8 = KeyPair::from_pem(&pkcs8).unwrap();
    assert_eq!(from_pkcs1.public_key(), from_pkcs8.public_key());
    assert_eq!(
        PublicKey::from_pem(std::str::from_utf8(&public_pem).unwrap()).unwrap(),
        from_pkcs1.public_key()
    );
}

#[test]
fn test_openssl_reads_our_private_key() {
    let key = util::generate_key();
    let pem = key.to_pem().unwrap();

    let rsa = Rsa::private_key_from_pem(pem.as_bytes()).unwrap();
    assert!(rsa.check_key().unwrap());
    let ours = PKey::public_key_from_pem(key.public_key_pem().unwrap().as_bytes()).unwrap();
    assert!(PKey::from_rsa(rsa).unwrap().public_eq(&ours));
}

#[test]
fn test_certificate_from_openssl_peer() {
    let pkey = PKey::from_rsa(Rsa::generate(2048).unwrap()).unwrap();

    let mut name = X509NameBuilder::new().unwrap();
    name.append_entry_by_nid(Nid::ORGANIZATIONNAME, "Peer Org").unwrap();
    name.append_entry_by_nid(Nid::COMMONNAME, "peer.example").unwrap();
    let name = name.build();

    let mut builder = X509::builder().unwrap();
    builder.set_version(2).unwrap();
    let serial = BigNum::from_u32(4242).unwrap().to_asn1_integer().unwrap();
    builder.set_serial_number(&serial).unwrap();
    builder.set_subject_name(&name).unwrap();
    builder.set_issuer_name(&name).unwrap();
    builder.set_pubkey(&pkey).unwrap();
    builder.set_not_before(&Asn1Time::days_from_now(0).unwrap()).unwrap();
    builder.set_not_after(&Asn1Time::days_from_now(30).unwrap()).unwrap();
    let san = SubjectAlternativeName::new()
        .dns("peer.example")
        .ip("192.0.2.7")
        .build(&builder.x509v3_context(None, None))
        .unwrap();
    builder.append_extension(san).unwrap();
    builder.sign(&pkey, MessageDigest::sha256()).unwrap();
    let peer_der = builder.build().to_der().unwrap();

    let parsed = x509_cert::Certificate::from_der(&peer_der).unwrap();
    let cert = Certificate::from_parsed(parsed).unwrap();

    assert_eq!(cert.to_der(), peer_der.as_slice());
    assert_eq!(cert.common_name().unwrap(), "peer.example");
    assert_eq!(cert.organization().unwrap().as_deref(), Some("Peer Org"));
    assert_eq!(cert.serial_number(), &[0x10, 0x92]);
    assert!(cert.is_self_issued());
    assert!(!cert.is_ca().unwrap());

    let san = cert.subject_alt_name().unwrap();
    assert_eq!(san.dns_names, vec!["peer.example".to_string()]);
    assert_eq!(san.ip_addresses, vec!["192.0.2.7".parse::<std::net::IpAddr>().unwrap()]);

    let peer_public = PublicKey::from_pem(
        std::str::from_utf8(&pkey.public_key_to_pem().unwrap()).unwrap(),
    )
    .unwrap();
    assert_eq!(cert.public_key().unwrap(), peer_public);
    cert.verify_signed_by(&peer_public).unwrap();
}
