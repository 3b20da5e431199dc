use anyhow::{bail, Context, Result};
use base64::prelude::BASE64_URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::{Algorithm, EncodingKey};
use openssl::nid::Nid;
use openssl::pkey::{Id, PKey};
use sha2::{Digest, Sha256};

/// Produces the signature of an issued token.
///
/// The key id and algorithm are part of the token header, which is itself
/// covered by the signature, so both must be known before signing.
pub trait Signer: Send + Sync {
    /// JWS algorithm name, e.g. `RS256`.
    fn algorithm(&self) -> &str;

    /// Identifier of the verification key, sent as `kid`.
    fn key_id(&self) -> &str;

    /// Signs the provided data, the returned bytes are opaque to the caller.
    fn sign(&self, data: &[u8]) -> Result<Vec<u8>>;
}

/// Signs with a PEM private key: RSA keys sign with RS256, P-256 keys with ES256.
pub struct KeySigner {
    encoding_key: EncodingKey,
    algorithm: Algorithm,
    key_id: String,
}

impl KeySigner {
    pub fn from_pem(private_key: &[u8]) -> Result<Self> {
        let key = PKey::private_key_from_pem(private_key).context("parse private key pem")?;

        let id = key.id();
        let (encoding_key, algorithm) = if id == Id::RSA {
            let pem = key.rsa()?.private_key_to_pem()?;
            let encoding_key = EncodingKey::from_rsa_pem(&pem).context("load rsa key")?;
            (encoding_key, Algorithm::RS256)
        } else if id == Id::EC {
            let curve = key.ec_key()?.group().curve_name();
            if curve != Some(Nid::X9_62_PRIME256V1) {
                bail!("unsupported ec curve, only P-256 is supported");
            }
            // The ec loader only accepts pkcs8
            let pem = key.private_key_to_pem_pkcs8()?;
            let encoding_key = EncodingKey::from_ec_pem(&pem).context("load ec key")?;
            (encoding_key, Algorithm::ES256)
        } else {
            bail!("unsupported private key type {}", id.as_raw());
        };

        let public_der = key.public_key_to_der().context("encode public key der")?;
        let key_id = libtrust_key_id(&public_der);

        Ok(Self {
            encoding_key,
            algorithm,
            key_id,
        })
    }
}

impl Signer for KeySigner {
    fn algorithm(&self) -> &str {
        match self.algorithm {
            Algorithm::ES256 => "ES256",
            _ => "RS256",
        }
    }

    fn key_id(&self) -> &str {
        &self.key_id
    }

    fn sign(&self, data: &[u8]) -> Result<Vec<u8>> {
        let signature = jsonwebtoken::crypto::sign(data, &self.encoding_key, self.algorithm)
            .context("sign token")?;
        BASE64_URL_SAFE_NO_PAD
            .decode(signature)
            .context("decode signature")
    }
}

/// Key fingerprint as computed by libtrust, which registries use to look up the
/// verification key: the first 240 bits of the SHA-256 of the DER encoded
/// public key, base32 encoded, in groups of four separated by `:`.
pub fn libtrust_key_id(public_der: &[u8]) -> String {
    let hash = Sha256::digest(public_der);
    let encoded = base32_encode(&hash[..30]);

    let groups: Vec<&str> = encoded
        .as_bytes()
        .chunks(4)
        .filter_map(|c| std::str::from_utf8(c).ok())
        .collect();
    groups.join(":")
}

/// RFC 4648 base32, without padding.
fn base32_encode(data: &[u8]) -> String {
    const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ234567";

    let mut out = String::with_capacity((data.len() * 8 + 4) / 5);
    let mut buffer: u16 = 0;
    let mut bits = 0;
    for byte in data {
        buffer = (buffer << 8) | u16::from(*byte);
        bits += 8;
        while bits >= 5 {
            bits -= 5;
            out.push(ALPHABET[usize::from((buffer >> bits) & 0x1f)] as char);
        }
    }
    if bits > 0 {
        out.push(ALPHABET[usize::from((buffer << (5 - bits)) & 0x1f)] as char);
    }
    out
}
