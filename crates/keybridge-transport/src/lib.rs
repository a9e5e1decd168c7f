#![warn(missing_docs)]
//! # keybridge-transport
//!
//! ## Purpose
//! Provides the HTTP transport abstraction the console drives the key
//! service through.
//!
//! ## Responsibilities
//! - Define a backend-agnostic [`ApiTransport`] trait.
//! - Validate the service endpoint policy at client construction.
//! - Join absolute request paths against the configured base URL.
//!
//! ## Data flow
//! Orchestration calls [`ServiceClient::get`]/[`ServiceClient::post_form`]
//! -> injected transport performs the request -> [`HttpReply`] flows back to
//! envelope interpretation.
//!
//! ## Ownership and lifetimes
//! Replies own their body buffers; the client holds its transport behind
//! `Arc<dyn ApiTransport>` so test doubles stay observable from outside.
//!
//! ## Error model
//! Endpoint policy violations and request failures are reported as
//! [`TransportError`]. No timeout is imposed here; a hung transport resolves
//! or fails on its own terms.
//!
//! ## Security and privacy notes
//! Plain `http` is accepted only for loopback hosts; any remote service
//! must be reached over `https`. Bodies are never logged by this crate.

use std::sync::Arc;

use thiserror::Error;
use url::{Host, Url};

/// One raw HTTP reply: status code plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpReply {
    /// HTTP status code.
    pub status: u16,
    /// Response body as text.
    pub body: String,
}

impl HttpReply {
    /// Returns `true` for 2xx status codes.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Abstract blocking transport used by the service client.
pub trait ApiTransport: Send + Sync {
    /// Issues a GET request to an absolute URL.
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] when the request cannot complete.
    fn get(&self, url: &str) -> Result<HttpReply, TransportError>;

    /// Issues a form-encoded POST request to an absolute URL.
    ///
    /// # Errors
    /// Returns [`TransportError::Connect`] when the request cannot complete.
    fn post_form(&self, url: &str, body: &str) -> Result<HttpReply, TransportError>;
}

/// Client that validates endpoint policy and routes requests through the
/// injected transport.
#[derive(Clone)]
pub struct ServiceClient {
    base: Url,
    transport: Arc<dyn ApiTransport>,
}

impl ServiceClient {
    /// Creates a validated service client.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidEndpoint`] when the base URL does
    /// not parse, lacks a host, or violates the scheme policy (`https`
    /// anywhere, `http` for loopback hosts only).
    pub fn new(
        base_url: impl Into<String>,
        transport: Arc<dyn ApiTransport>,
    ) -> Result<Self, TransportError> {
        let base_url = base_url.into();
        let base = validate_service_endpoint(&base_url)?;
        Ok(Self { base, transport })
    }

    /// Returns the configured base URL.
    pub fn base_url(&self) -> &str {
        self.base.as_str()
    }

    /// Issues a GET against `path` relative to the base URL.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidPath`] for non-absolute paths and
    /// propagates transport failures.
    pub fn get(&self, path: &str) -> Result<HttpReply, TransportError> {
        let url = self.resolve(path)?;
        self.transport.get(url.as_str())
    }

    /// Issues a form-encoded POST against `path` relative to the base URL.
    ///
    /// # Errors
    /// Returns [`TransportError::InvalidPath`] for non-absolute paths and
    /// propagates transport failures.
    pub fn post_form(&self, path: &str, body: &str) -> Result<HttpReply, TransportError> {
        let url = self.resolve(path)?;
        self.transport.post_form(url.as_str(), body)
    }

    fn resolve(&self, path: &str) -> Result<Url, TransportError> {
        if !path.starts_with('/') {
            return Err(TransportError::InvalidPath(path.to_string()));
        }

        self.base
            .join(path)
            .map_err(|error| TransportError::InvalidPath(format!("{path}: {error}")))
    }
}

/// Validates the service endpoint policy and returns the parsed base URL.
///
/// # Errors
/// Returns [`TransportError::InvalidEndpoint`] for unparseable URLs,
/// missing hosts, unsupported schemes, or plain `http` on a non-loopback
/// host.
pub fn validate_service_endpoint(endpoint: &str) -> Result<Url, TransportError> {
    let parsed = Url::parse(endpoint)
        .map_err(|error| TransportError::InvalidEndpoint(format!("invalid url: {error}")))?;

    let host = parsed
        .host()
        .ok_or_else(|| TransportError::InvalidEndpoint("endpoint has no host".to_string()))?;

    match parsed.scheme() {
        "https" => Ok(parsed),
        "http" if host_is_loopback(&host) => Ok(parsed),
        "http" => Err(TransportError::InvalidEndpoint(
            "plain http is allowed for loopback hosts only".to_string(),
        )),
        other => Err(TransportError::InvalidEndpoint(format!(
            "unsupported scheme: {other}"
        ))),
    }
}

fn host_is_loopback(host: &Host<&str>) -> bool {
    match host {
        Host::Domain(name) => name.eq_ignore_ascii_case("localhost"),
        Host::Ipv4(address) => address.is_loopback(),
        Host::Ipv6(address) => address.is_loopback(),
    }
}

/// Transport layer error type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Base endpoint violates the service URL policy.
    #[error("invalid endpoint: {0}")]
    InvalidEndpoint(String),
    /// Request path is not absolute or does not join cleanly.
    #[error("invalid request path: {0}")]
    InvalidPath(String),
    /// Underlying request could not complete.
    #[error("transport failure: {0}")]
    Connect(String),
}
