//! Discovery handshake.
//!
//! One authenticated GET against the discovery endpoint, returning the
//! address of the streaming endpoint. The response embeds the address as a
//! JSON-escaped string, e.g. `"url":"wss:\/\/host\/path"`.

use crate::error::{HandshakeError, SetupError};
use crate::tls;
use async_trait::async_trait;
use inkwire_core::{Credential, Endpoint, Fingerprint};
use serde::Deserialize;
use std::time::Duration;

/// Default discovery endpoint.
pub const DEFAULT_DISCOVERY_URL: &str = "https://slack.com/api/rtm.connect";

const ESCAPED_MARKER: &str = r"wss:\/\/";
const PLAIN_MARKER: &str = "wss://";

/// Turns a credential into a streaming endpoint.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, credential: &Credential) -> Result<Endpoint, HandshakeError>;
}

/// Resolver backed by the HTTPS discovery endpoint, pinned to one certificate.
pub struct DiscoveryResolver {
    client: reqwest::Client,
    url: String,
}

impl DiscoveryResolver {
    pub fn new(
        url: impl Into<String>,
        fingerprint: Fingerprint,
        timeout: Duration,
    ) -> Result<Self, SetupError> {
        let tls = tls::pinned_client_config(fingerprint)?;
        let client = reqwest::Client::builder()
            .use_preconfigured_tls(tls)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl Resolve for DiscoveryResolver {
    async fn resolve(&self, credential: &Credential) -> Result<Endpoint, HandshakeError> {
        tracing::debug!("Requesting streaming endpoint from {}", self.url);

        // The url carries the token, so it is stripped from every error.
        let response = self
            .client
            .get(&self.url)
            .query(&[("token", credential.expose())])
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(HandshakeError::UnexpectedStatus(status.as_u16()));
        }

        let body = response.text().await.map_err(request_error)?;
        parse_discovery_body(&body)
    }
}

fn request_error(e: reqwest::Error) -> HandshakeError {
    if tls::is_pin_mismatch(&e) {
        HandshakeError::CertificateMismatch
    } else {
        HandshakeError::Request(e.without_url())
    }
}

#[derive(Deserialize)]
struct Envelope {
    ok: Option<bool>,
    error: Option<String>,
}

/// Interpret a successful discovery body.
pub fn parse_discovery_body(body: &str) -> Result<Endpoint, HandshakeError> {
    if let Ok(Envelope {
        ok: Some(false),
        error,
    }) = serde_json::from_str::<Envelope>(body)
    {
        return Err(HandshakeError::Rejected(
            error.unwrap_or_else(|| "unknown error".to_string()),
        ));
    }
    extract_endpoint(body)
}

/// Pull `wss://host/path` out of a raw body, unescaping `\/`.
pub fn extract_endpoint(body: &str) -> Result<Endpoint, HandshakeError> {
    let rest = [ESCAPED_MARKER, PLAIN_MARKER]
        .iter()
        .find_map(|marker| body.find(marker).map(|i| &body[i + marker.len()..]))
        .ok_or(HandshakeError::MalformedResponse)?;

    let end = rest.find('"').ok_or(HandshakeError::MalformedResponse)?;
    let address = rest[..end].replace(r"\/", "/");

    let (host, path) = match address.find('/') {
        Some(i) => address.split_at(i),
        None => (address.as_str(), "/"),
    };
    if host.is_empty() {
        return Err(HandshakeError::MalformedResponse);
    }

    Ok(Endpoint::new(host, path))
}
