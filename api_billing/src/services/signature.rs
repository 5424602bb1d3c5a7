//! Paddle webhook signature verification.
//!
//! Paddle signs `"{ts}:{raw body}"` with HMAC-SHA256 and sends
//! `Paddle-Signature: ts=<unix seconds>;h1=<hex digest>`.

use common::error::{AppError, Res};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

/// Deliveries older than this are refused whatever their signature.
pub const MAX_WEBHOOK_AGE_SECS: i64 = 180;

/// Parsed `Paddle-Signature` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaddleSignature {
    /// The timestamp exactly as sent; it is part of the signed payload.
    pub raw_timestamp: String,
    pub timestamp: i64,
    pub h1: String,
}

impl PaddleSignature {
    /// Format: `ts=<timestamp>;h1=<hex>`. Unknown keys are ignored.
    pub fn parse(header: &str) -> Res<Self> {
        let invalid = || AppError::Unauthorized("Invalid signature format".to_string());

        let mut raw_timestamp = None;
        let mut h1 = None;
        for part in header.split(';') {
            let (key, value) = part.trim().split_once('=').ok_or_else(invalid)?;
            match key {
                "ts" => raw_timestamp = Some(value.to_string()),
                "h1" => h1 = Some(value.to_string()),
                _ => {}
            }
        }

        let raw_timestamp = raw_timestamp.filter(|ts| !ts.is_empty()).ok_or_else(invalid)?;
        let h1 = h1.filter(|h1| !h1.is_empty()).ok_or_else(invalid)?;
        let timestamp = raw_timestamp.parse::<i64>().map_err(|_| invalid())?;

        Ok(PaddleSignature {
            raw_timestamp,
            timestamp,
            h1,
        })
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}:{body}"`.
pub fn compute_signature(secret: &str, timestamp: &str, body: &[u8]) -> Res<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| AppError::Internal(format!("Invalid webhook secret: {}", e)))?;
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the header against the raw body. `now` is unix seconds.
///
/// Every failure is `Unauthorized`: missing header, bad format, a delivery
/// older than [`MAX_WEBHOOK_AGE_SECS`], or a digest mismatch.
pub fn verify_paddle_signature(
    secret: &str,
    header: Option<&str>,
    body: &[u8],
    now: i64,
) -> Res<PaddleSignature> {
    if secret.is_empty() {
        log::error!("PADDLE_WEBHOOK_SECRET not configured");
        return Err(AppError::Unauthorized("Webhook secret not configured".to_string()));
    }

    let header = header
        .filter(|value| !value.is_empty())
        .ok_or_else(|| AppError::Unauthorized("Missing signature".to_string()))?;
    let signature = PaddleSignature::parse(header)?;

    let age = now - signature.timestamp;
    if age > MAX_WEBHOOK_AGE_SECS {
        log::warn!("Webhook expired: age={}s", age);
        return Err(AppError::Unauthorized("Webhook expired".to_string()));
    }

    let expected = compute_signature(secret, &signature.raw_timestamp, body)?;
    if !constant_time_compare(expected.as_bytes(), signature.h1.to_ascii_lowercase().as_bytes()) {
        log::warn!("Invalid Paddle webhook signature");
        return Err(AppError::Unauthorized("Invalid signature".to_string()));
    }

    Ok(signature)
}

fn constant_time_compare(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.ct_eq(b).into()
}
