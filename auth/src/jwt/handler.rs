use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::de::DeserializeOwned;
use serde::Serialize;

use super::claims::ExpiringClaims;
use super::errors::JwtError;

/// The only signing algorithm this handler issues or accepts.
const ALGORITHM: Algorithm = Algorithm::HS256;
const ALGORITHM_NAME: &str = "HS256";

/// JWT token handler for encoding and decoding tokens.
///
/// Generic over the claims type so callers can sign their own payloads.
/// Signs with HS256 and rejects any token whose header names another
/// algorithm, including `none`, before the signature is looked at.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtHandler {
    /// Create a handler from the shared signing secret.
    ///
    /// # Errors
    /// * `MissingSecret` - Secret is empty
    pub fn new(secret: &[u8]) -> Result<Self, JwtError> {
        if secret.iter().all(u8::is_ascii_whitespace) {
            return Err(JwtError::MissingSecret);
        }

        if secret.len() < 32 {
            tracing::warn!(
                length = secret.len(),
                "JWT secret is shorter than 32 bytes; HS256 should use at least 256 bits"
            );
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        })
    }

    /// Encode claims into a signed token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Serialization or signing failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        encode(&Header::new(ALGORITHM), claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and verify a token, rejecting it if `now` is past its expiry.
    ///
    /// # Arguments
    /// * `token` - Compact JWT
    /// * `now` - Current Unix timestamp
    ///
    /// # Errors
    /// * `Malformed` - Token cannot be decoded into `T`
    /// * `InvalidSignature` - Wrong algorithm or signature mismatch
    /// * `Expired` - `now` is after the `exp` claim
    pub fn decode<T>(&self, token: &str, now: i64) -> Result<T, JwtError>
    where
        T: DeserializeOwned + ExpiringClaims,
    {
        let claims: T = self.decode_ignoring_expiry(token)?;

        if now > claims.expires_at() {
            return Err(JwtError::Expired);
        }

        Ok(claims)
    }

    /// Decode and verify a token's signature without checking its expiry.
    ///
    /// Used where an expired token is still meaningful, e.g. to learn how
    /// long a revocation entry has to live.
    pub fn decode_ignoring_expiry<T: DeserializeOwned>(&self, token: &str) -> Result<T, JwtError> {
        check_algorithm(token)?;

        let mut validation = Validation::new(ALGORITHM);
        // Expiry is checked against the caller's clock, not the system time.
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims.clear();

        decode::<T>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidAlgorithm
                | ErrorKind::InvalidAlgorithmName
                | ErrorKind::InvalidKeyFormat => JwtError::InvalidSignature(e.to_string()),
                ErrorKind::ExpiredSignature => JwtError::Expired,
                _ => JwtError::Malformed(e.to_string()),
            })
    }
}

/// Read the `alg` header field and require HS256.
///
/// jsonwebtoken cannot represent `none`, so the header is parsed here
/// rather than trusting the library to surface it as a signature failure.
fn check_algorithm(token: &str) -> Result<(), JwtError> {
    let mut parts = token.split('.');
    let (Some(header), Some(_), Some(_), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        return Err(JwtError::Malformed("expected three segments".to_string()));
    };

    let header = URL_SAFE_NO_PAD
        .decode(header)
        .map_err(|e| JwtError::Malformed(format!("header is not base64url: {}", e)))?;
    let header: serde_json::Value = serde_json::from_slice(&header)
        .map_err(|e| JwtError::Malformed(format!("header is not JSON: {}", e)))?;

    match header.get("alg").and_then(|alg| alg.as_str()) {
        Some(ALGORITHM_NAME) => Ok(()),
        Some(other) => Err(JwtError::InvalidSignature(format!(
            "algorithm {} is not accepted",
            other
        ))),
        None => Err(JwtError::Malformed("header has no alg".to_string())),
    }
}
