//! OAuth 1.0a HMAC-SHA1 request signing (RFC 5849).

use super::gateway::GatewayError;
use crate::config::TwitterCredentials;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rand::distributions::Alphanumeric;
use rand::Rng;
use sha1::Sha1;

/// Everything but the RFC 3986 unreserved characters gets encoded.
const OAUTH_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

type HmacSha1 = Hmac<Sha1>;

#[derive(Debug, Clone)]
pub(crate) struct OAuthSigner {
    credentials: TwitterCredentials,
}

impl OAuthSigner {
    pub(crate) fn new(credentials: TwitterCredentials) -> Self {
        Self { credentials }
    }

    /// `Authorization` header for a request whose body parameters are not
    /// form-encoded (JSON and multipart bodies are never signed).
    pub(crate) fn authorization(&self, method: &str, url: &str) -> Result<String, GatewayError> {
        let nonce: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(32)
            .map(char::from)
            .collect();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        self.authorization_with(method, url, &[], &nonce, &timestamp)
    }

    pub(crate) fn authorization_with(
        &self,
        method: &str,
        url: &str,
        request_params: &[(&str, &str)],
        nonce: &str,
        timestamp: &str,
    ) -> Result<String, GatewayError> {
        let oauth_params = vec![
            ("oauth_consumer_key", self.credentials.consumer_key.as_str()),
            ("oauth_nonce", nonce),
            ("oauth_signature_method", "HMAC-SHA1"),
            ("oauth_timestamp", timestamp),
            ("oauth_token", self.credentials.access_token.as_str()),
            ("oauth_version", "1.0"),
        ];

        let mut signed_params = oauth_params.clone();
        signed_params.extend_from_slice(request_params);
        let base = signature_base(method, url, &signed_params);
        let signature = self.sign(&base)?;

        let mut fields: Vec<String> = oauth_params
            .iter()
            .map(|(key, value)| format!("{}=\"{}\"", encode(key), encode(value)))
            .collect();
        fields.push(format!("oauth_signature=\"{}\"", encode(&signature)));
        Ok(format!("OAuth {}", fields.join(", ")))
    }

    fn sign(&self, base: &str) -> Result<String, GatewayError> {
        let key = format!(
            "{}&{}",
            encode(self.credentials.consumer_secret.expose()),
            encode(self.credentials.access_token_secret.expose())
        );
        let mut mac = HmacSha1::new_from_slice(key.as_bytes())
            .map_err(|err| GatewayError::Signing(err.to_string()))?;
        mac.update(base.as_bytes());
        Ok(STANDARD.encode(mac.finalize().into_bytes()))
    }
}

pub(crate) fn encode(raw: &str) -> String {
    utf8_percent_encode(raw, OAUTH_ENCODE_SET).to_string()
}

fn signature_base(method: &str, url: &str, params: &[(&str, &str)]) -> String {
    let mut encoded: Vec<(String, String)> = params
        .iter()
        .map(|(key, value)| (encode(key), encode(value)))
        .collect();
    encoded.sort();

    let parameter_string = encoded
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");

    format!(
        "{}&{}&{}",
        method.to_ascii_uppercase(),
        encode(url),
        encode(&parameter_string)
    )
}
