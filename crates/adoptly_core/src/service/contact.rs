//! Direct-contact deep links (WhatsApp, phone dialer, e-mail).
//!
//! # Invariants
//! - WhatsApp and `tel:` links carry ASCII digits only (international format,
//!   without `+` or a leading `00`).
//! - Query values are percent-encoded with `%20` for spaces.

use super::{ServiceError, ServiceResult};
use once_cell::sync::Lazy;
use regex::Regex;
use url::form_urlencoded::byte_serialize;

static NON_DIGIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9]+").expect("valid digit regex"));
static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// E.164 allows at most 15 digits.
const MAX_PHONE_DIGITS: usize = 15;
const MIN_PHONE_DIGITS: usize = 7;

/// Digits of `phone` in international form.
pub fn normalize_phone(phone: &str) -> ServiceResult<String> {
    let digits = NON_DIGIT_RE.replace_all(phone, "");
    let digits = digits.strip_prefix("00").unwrap_or(&digits);
    if !(MIN_PHONE_DIGITS..=MAX_PHONE_DIGITS).contains(&digits.chars().count()) {
        return Err(ServiceError::InvalidInput(format!(
            "phone number must have {MIN_PHONE_DIGITS}-{MAX_PHONE_DIGITS} digits"
        )));
    }
    Ok(digits.to_string())
}

/// `https://wa.me/<digits>?text=<message>`; the query is omitted for an empty message.
pub fn whatsapp_link(phone: &str, message: &str) -> ServiceResult<String> {
    let digits = normalize_phone(phone)?;
    let message = message.trim();
    if message.is_empty() {
        return Ok(format!("https://wa.me/{digits}"));
    }
    Ok(format!("https://wa.me/{digits}?text={}", encode(message)))
}

pub fn phone_link(phone: &str) -> ServiceResult<String> {
    Ok(format!("tel:+{}", normalize_phone(phone)?))
}

pub fn email_link(address: &str, subject: &str, body: &str) -> ServiceResult<String> {
    let address = address.trim();
    if !EMAIL_RE.is_match(address) {
        return Err(ServiceError::InvalidInput("invalid email address".to_string()));
    }
    let params: Vec<String> = [("subject", subject.trim()), ("body", body.trim())]
        .into_iter()
        .filter(|(_, value)| !value.is_empty())
        .map(|(key, value)| format!("{key}={}", encode(value)))
        .collect();
    if params.is_empty() {
        Ok(format!("mailto:{address}"))
    } else {
        Ok(format!("mailto:{address}?{}", params.join("&")))
    }
}

fn encode(value: &str) -> String {
    // Literal '+' is already escaped as %2B, so every remaining '+' is a space.
    byte_serialize(value.as_bytes())
        .collect::<String>()
        .replace('+', "%20")
}
