//! HTTP gateway boundary.
//!
//! The satellite uplink is reached through an HTTP endpoint: message bytes
//! travel as the hex-encoded `data` field of a form-urlencoded POST body,
//! alongside the account credentials the commercial gateway requires. This
//! module owns that contract - the form codec, the credential set and the
//! [`GatewayClient`] seam - while the HTTP transport mechanics themselves
//! stay outside the crate.

use bytes::Bytes;
use thiserror::Error;

/// Account fields the commercial gateway expects on every outbound POST.
#[derive(Debug, Clone)]
pub struct GatewayCredentials {
    pub imei: String,
    pub username: String,
    pub password: String,
}

/// Errors at the gateway boundary.
///
/// A timeout is deliberately indistinguishable from any other transport
/// failure downstream: both feed the same retry path.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("gateway rejected the message with status {0}")]
    Rejected(u16),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("request timed out")]
    Timeout,

    #[error("form body has no data field")]
    MissingData,

    #[error("data field is not valid hex: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Client half of the gateway contract.
///
/// One implementation POSTs to the real gateway; the simulated topology
/// points the same trait at the relay (for the emulator's MO bursts) or at
/// the emulator (for the relay's MT hand-offs). Implementations map any
/// non-2xx response, transport error or timeout to a [`GatewayError`].
pub trait GatewayClient {
    /// Hand one message to the gateway.
    async fn send(&mut self, message: &[u8]) -> Result<(), GatewayError>;
}

/// Build the form-urlencoded POST body for `message`.
///
/// With credentials the body carries the gateway's account fields; without
/// (the simulated topology) it is the bare `data` field.
pub fn encode_form(credentials: Option<&GatewayCredentials>, message: &[u8]) -> String {
    let mut body = String::new();

    if let Some(creds) = credentials {
        push_field(&mut body, "imei", &creds.imei);
        push_field(&mut body, "username", &creds.username);
        push_field(&mut body, "password", &creds.password);
    }
    push_field(&mut body, "data", &hex::encode(message));

    body
}

/// Extract and hex-decode the `data` field of a form-urlencoded body.
pub fn decode_form(body: &str) -> Result<Bytes, GatewayError> {
    for pair in body.split('&') {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        if key == "data" {
            return Ok(Bytes::from(hex::decode(percent_decode(value))?));
        }
    }

    Err(GatewayError::MissingData)
}

fn push_field(body: &mut String, key: &str, value: &str) {
    if !body.is_empty() {
        body.push('&');
    }
    body.push_str(key);
    body.push('=');
    body.push_str(&percent_encode(value));
}

// Minimal application/x-www-form-urlencoded escaping. Hex payloads pass
// through untouched; only the credential fields ever need it.
fn percent_encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char);
            }
            b' ' => out.push('+'),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

fn percent_decode(value: &str) -> String {
    let mut out = Vec::with_capacity(value.len());
    let mut bytes = value.bytes();
    while let Some(byte) = bytes.next() {
        match byte {
            b'+' => out.push(b' '),
            b'%' => {
                let high = bytes.next();
                let low = bytes.next();
                match (high, low) {
                    (Some(h), Some(l)) => {
                        let pair = [h, l];
                        match u8::from_str_radix(std::str::from_utf8(&pair).unwrap_or(""), 16) {
                            Ok(decoded) => out.push(decoded),
                            Err(_) => out.extend_from_slice(&[b'%', h, l]),
                        }
                    }
                    _ => out.push(b'%'),
                }
            }
            _ => out.push(byte),
        }
    }
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn form_roundtrip() {
        let message = b"\x01\x00\x00";
        let body = encode_form(None, message);
        assert_eq!(body, "data=010000");

        let decoded = decode_form(&body).unwrap();
        assert_eq!(decoded.as_ref(), message);
    }

    #[test]
    fn form_carries_credentials_first() {
        let creds = GatewayCredentials {
            imei: "300234060392630".into(),
            username: "relay ops".into(),
            password: "p&ss".into(),
        };

        let body = encode_form(Some(&creds), &[0xAB]);
        assert_eq!(
            body,
            "imei=300234060392630&username=relay+ops&password=p%26ss&data=ab"
        );
    }

    #[test]
    fn decode_rejects_missing_data_field() {
        let result = decode_form("imei=300234060392630");
        assert!(matches!(result, Err(GatewayError::MissingData)));
    }

    #[test]
    fn decode_rejects_bad_hex() {
        let result = decode_form("data=zz");
        assert!(matches!(result, Err(GatewayError::Hex(_))));
    }

    #[test]
    fn decode_ignores_other_fields() {
        let decoded = decode_form("username=x&data=ff00&password=y").unwrap();
        assert_eq!(decoded.as_ref(), &[0xFF, 0x00]);
    }
}
