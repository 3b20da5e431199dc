use base64::prelude::BASE64_URL_SAFE;
use base64::Engine;
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per token id (120 bits).
const JTI_BYTES: usize = 15;

/// Generates a fresh token id from the OS random source. Failure of the source
/// is returned as-is, callers must not retry with a weaker generator.
pub fn generate_jti() -> Result<String, rand::Error> {
    generate_jti_with(&mut OsRng)
}

pub fn generate_jti_with<R: RngCore>(rng: &mut R) -> Result<String, rand::Error> {
    let mut buf = [0u8; JTI_BYTES];
    rng.try_fill_bytes(&mut buf)?;
    Ok(BASE64_URL_SAFE.encode(buf))
}
