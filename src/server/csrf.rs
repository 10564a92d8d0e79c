//! Stateless tokens for the HTML upload form.
//!
//! Token format: `<hmac>.<timestamp>`, where the HMAC-SHA256 of the timestamp
//! is keyed with the process secret.

use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Form tokens expire after an hour.
pub const TOKEN_TTL_SECS: i64 = 3600;

pub fn issue_token(secret: &str, now: i64) -> String {
    let signature = hex::encode(sign(secret, now).finalize().into_bytes());
    format!("{}.{}", signature, now)
}

pub fn verify_token(secret: &str, token: &str, now: i64) -> bool {
    let Some((signature, timestamp)) = token.split_once('.') else {
        return false;
    };
    let Ok(timestamp) = timestamp.parse::<i64>() else {
        return false;
    };
    let expired = now
        .checked_sub(timestamp)
        .map_or(true, |age| !(0..=TOKEN_TTL_SECS).contains(&age));
    if expired {
        log::debug!("Upload form token expired");
        return false;
    }
    let Ok(signature) = hex::decode(signature) else {
        return false;
    };

    sign(secret, timestamp).verify_slice(&signature).is_ok()
}

fn sign(secret: &str, timestamp: i64) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac
}
