use openssl::error::ErrorStack;
use openssl::hash::MessageDigest;
use openssl::pkey::PKey;
use openssl::sign::Signer;
use openssl::x509::X509;

use super::errors::CdnErrors;

/// The string DogeCloud expects to be signed: the request path (query included),
/// a newline, then the exact request body.
pub(crate) fn sign_string(api_path: &str, body: &str) -> String {
    format!("{api_path}\n{body}")
}

pub(crate) fn hmac_sha1_hex(key: &[u8], data: &[u8]) -> Result<String, CdnErrors> {
    let key = PKey::hmac(key)?;
    let mut signer = Signer::new(MessageDigest::sha1(), &key)?;
    signer.update(data)?;
    Ok(hex::encode(signer.sign_to_vec()?))
}

/// Computes the hex encoded HMAC-SHA1 signature of a request.
pub fn sign_request(secret_key: &str, api_path: &str, body: &str) -> Result<String, CdnErrors> {
    hmac_sha1_hex(
        secret_key.as_bytes(),
        sign_string(api_path, body).as_bytes(),
    )
}

/// Value of the `Authorization` header for a signed request.
pub(crate) fn token_authorization(access_key: &str, signature: &str) -> String {
    format!("TOKEN {access_key}:{signature}")
}

/// Checks that the fullchain starts with a parseable certificate and the key is
/// a readable private key. Returns the leaf's `notAfter`.
pub(crate) fn inspect_certificate_pair(fullchain: &str, privkey: &str) -> Result<String, ErrorStack> {
    let leaf = X509::from_pem(fullchain.as_bytes())?;
    PKey::private_key_from_pem(privkey.as_bytes())?;
    Ok(leaf.not_after().to_string())
}
