use anyhow::{Context, Result};
use openssl::asn1::Asn1Time;
use openssl::bn::{BigNum, MsbOption};
use openssl::hash::MessageDigest;
use openssl::nid::Nid;
use openssl::pkey::PKey;
use openssl::rsa::Rsa;
use openssl::x509::{X509Builder, X509NameBuilder};

/// Generates a 2048-bit RSA private key in PKCS#8 PEM format.
pub fn generate_rsa_key() -> Result<Vec<u8>> {
    let rsa = Rsa::generate(2048)?;
    let pkey = PKey::from_rsa(rsa)?;
    let private_key = pkey.private_key_to_pem_pkcs8()?;
    Ok(private_key)
}

/// Generates a self-signed certificate (PEM) for the given private key. The
/// registry verifies tokens with the public key carried by this certificate
/// (its `rootcertbundle`).
pub fn generate_certificate(private_key: &[u8], common_name: &str, days: u32) -> Result<Vec<u8>> {
    let key = PKey::private_key_from_pem(private_key).context("parse private key pem")?;

    let mut name = X509NameBuilder::new()?;
    name.append_entry_by_nid(Nid::COMMONNAME, common_name)
        .context("set certificate common name")?;
    let name = name.build();

    let serial = {
        let mut bn = BigNum::new()?;
        bn.rand(128, MsbOption::MAYBE_ZERO, false)?;
        bn.to_asn1_integer()?
    };

    let mut builder = X509Builder::new()?;
    builder.set_version(2)?;
    builder.set_serial_number(&serial)?;
    builder.set_subject_name(&name)?;
    builder.set_issuer_name(&name)?;
    builder.set_pubkey(&key)?;
    let not_before = Asn1Time::days_from_now(0)?;
    builder.set_not_before(&not_before)?;
    let not_after = Asn1Time::days_from_now(days)?;
    builder.set_not_after(&not_after)?;
    builder
        .sign(&key, MessageDigest::sha256())
        .context("sign certificate")?;

    let cert = builder.build();
    Ok(cert.to_pem()?)
}
