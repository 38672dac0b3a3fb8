//! Pickup token issue and verification.
//!
//! Every order gets a random secret at creation time. The scannable payload
//! is `order_id|secret|hmac_sha256_hex`, signed with a server-held key, so a
//! scanned code can be checked without trusting the client that presented it.

use hmac::{Hmac, Mac};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::Sha256;
use uuid::Uuid;

use super::errors::DomainError;

type HmacSha256 = Hmac<Sha256>;

const DELIMITER: char = '|';
const SECRET_BYTES: usize = 32;

/// Generate the per-order pickup secret: 256 bits from the OS entropy
/// source, hex-encoded. Called exactly once per order, before the order row
/// is committed.
pub fn generate_secret() -> Result<String, DomainError> {
    let mut bytes = [0u8; SECRET_BYTES];
    OsRng
        .try_fill_bytes(&mut bytes)
        .map_err(|e| DomainError::Internal(format!("entropy source failure: {e}")))?;
    Ok(hex::encode(bytes))
}

/// Signs and verifies pickup payloads with the server-held HMAC key.
///
/// Pure given its inputs and the key. Key presence is enforced at startup by
/// configuration loading, not here.
#[derive(Clone)]
pub struct TokenSigner {
    key: Vec<u8>,
}

impl TokenSigner {
    pub fn new(key: impl AsRef<[u8]>) -> Self {
        Self {
            key: key.as_ref().to_vec(),
        }
    }

    fn mac(&self, order_id: &str, secret: &str) -> Result<HmacSha256, DomainError> {
        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|e| DomainError::Internal(format!("HMAC key error: {e}")))?;
        mac.update(order_id.as_bytes());
        mac.update(&[DELIMITER as u8]);
        mac.update(secret.as_bytes());
        Ok(mac)
    }

    /// HMAC-SHA256 over `order_id|secret`, hex-encoded.
    pub fn sign(&self, order_id: &str, secret: &str) -> Result<String, DomainError> {
        let mac = self.mac(order_id, secret)?;
        Ok(hex::encode(mac.finalize().into_bytes()))
    }

    /// The full three-field payload shown to the customer as a QR code.
    pub fn build_payload(&self, order_id: Uuid, secret: &str) -> Result<String, DomainError> {
        let order_id = order_id.to_string();
        let signature = self.sign(&order_id, secret)?;
        Ok(format!("{order_id}{DELIMITER}{secret}{DELIMITER}{signature}"))
    }

    /// Recompute the signature and compare in constant time.
    ///
    /// `order_id` must be the raw scanned text, not a re-serialized form, so
    /// that any altered character fails verification.
    pub fn verify(&self, order_id: &str, secret: &str, signature: &str) -> Result<(), DomainError> {
        let mac = self.mac(order_id, secret)?;
        let sig_bytes = hex::decode(signature).map_err(|_| DomainError::InvalidSignature)?;
        mac.verify_slice(&sig_bytes)
            .map_err(|_| DomainError::InvalidSignature)
    }
}

/// A scanned payload split into its three fields.
///
/// `order_id_text` preserves the exact scanned text for signature
/// verification; `order_id` is the parsed form used for lookups.
#[derive(Debug, Clone)]
pub struct ScannedPayload {
    pub order_id: Uuid,
    pub order_id_text: String,
    pub secret: String,
    pub signature: String,
}

/// Split a scanned payload into exactly three non-empty fields. Anything
/// else is rejected before any signature work happens.
pub fn parse_payload(raw: &str) -> Result<ScannedPayload, DomainError> {
    let parts: Vec<&str> = raw.split(DELIMITER).collect();
    if parts.len() != 3 || parts.iter().any(|p| p.is_empty()) {
        return Err(DomainError::MalformedPayload);
    }
    let order_id = Uuid::parse_str(parts[0]).map_err(|_| DomainError::MalformedPayload)?;
    Ok(ScannedPayload {
        order_id,
        order_id_text: parts[0].to_string(),
        secret: parts[1].to_string(),
        signature: parts[2].to_string(),
    })
}
