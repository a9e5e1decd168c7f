#![warn(missing_docs)]
//! # keybridge-envelope
//!
//! ## Purpose
//! Defines the service response contract and the interpretation step that
//! turns raw HTTP replies into display models.
//!
//! ## Responsibilities
//! - Parse the uniform success/error envelope returned by every endpoint.
//! - Parse the top-level status reply and the classification reply shapes.
//! - Interpret a raw reply into a [`DisplayModel`], never panicking.
//! - Escape rendered text for HTML embedding.
//!
//! ## Data flow
//! Raw reply body -> [`parse_envelope`] -> [`interpret_reply`] ->
//! [`DisplayModel`] consumed by console state.
//!
//! ## Ownership and lifetimes
//! Parsed values are owned structs to avoid borrowing from transient
//! transport buffers.
//!
//! ## Error model
//! Invalid JSON or contract deviations return [`EnvelopeError`] from the
//! parse functions; [`interpret_reply`] absorbs every failure into a
//! rendered [`RenderedResult::Failure`].
//!
//! ## Security and privacy notes
//! All `data`/`error` text is HTML-escaped before rendering. The `qr_code`
//! field is trusted service-generated SVG markup and passes through
//! unescaped.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Caption rendered under a transfer QR panel.
pub const QR_TRANSFER_CAPTION: &str = "Scan this QR code with the other device.";

/// Uniform envelope returned by every operation endpoint.
///
/// Invariant: exactly one of `data`/`error` is meaningful, gated by
/// `success`; `qr_code` may accompany a success regardless of `data`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Operation output: plain text or a structured value.
    #[serde(default)]
    pub data: Option<Value>,
    /// Operation error message when `success` is `false`.
    #[serde(default)]
    pub error: Option<String>,
    /// Optional SVG markup carrying the result as a scannable code.
    #[serde(default)]
    pub qr_code: Option<String>,
}

/// Top-level status reply listing current key identities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusReply {
    /// Whether the status fetch succeeded.
    pub success: bool,
    /// Public key identities in service order.
    #[serde(default)]
    pub public_keys: Vec<String>,
    /// Secret key identities in service order.
    #[serde(default)]
    pub secret_keys: Vec<String>,
    /// Error detail when `success` is `false`.
    #[serde(default)]
    pub error: Option<String>,
}

/// Structured `data` payload of a classification reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReply {
    /// Label assigned to the scanned payload.
    #[serde(default)]
    pub data_type: Option<String>,
    /// Echo of the scanned text; tolerated and ignored.
    #[serde(default)]
    pub received_data: Option<String>,
    /// Operator hint; tolerated and ignored.
    #[serde(default)]
    pub message: Option<String>,
}

/// Parses the uniform envelope.
///
/// A body whose `success` field is missing or non-boolean fails to
/// deserialize and surfaces as [`EnvelopeError::Decode`]; callers treat that
/// as a malformed response, never a panic.
///
/// # Errors
/// Returns [`EnvelopeError::Decode`] for invalid JSON or contract deviation.
pub fn parse_envelope(raw: &str) -> Result<ResponseEnvelope, EnvelopeError> {
    serde_json::from_str(raw).map_err(EnvelopeError::Decode)
}

/// Parses the top-level status reply.
///
/// # Errors
/// Returns [`EnvelopeError::Decode`] for invalid JSON or a missing/non-bool
/// `success` field.
pub fn parse_status_reply(raw: &str) -> Result<StatusReply, EnvelopeError> {
    serde_json::from_str(raw).map_err(EnvelopeError::Decode)
}

/// Extracts the classification payload from an envelope's `data` value.
///
/// # Errors
/// Returns [`EnvelopeError::InvalidContract`] when `data` is absent or not
/// an object carrying the classification shape.
pub fn classification_from_data(data: Option<&Value>) -> Result<ClassificationReply, EnvelopeError> {
    let value = data.ok_or_else(|| {
        EnvelopeError::InvalidContract("classification reply carries no data".to_string())
    })?;

    serde_json::from_value(value.clone()).map_err(EnvelopeError::Decode)
}

/// Result panel produced by interpreting one reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderedResult {
    /// Successful operation with output text (already HTML-escaped).
    Success {
        /// Escaped output text, pretty-printed when structured.
        body: String,
        /// `true` when the body is a pretty-printed structured value.
        structured: bool,
    },
    /// Successful operation with no output payload.
    Completed,
    /// Failed operation with an escaped message.
    Failure {
        /// Escaped failure message.
        message: String,
    },
}

/// Transfer-aid panel rendered next to the result.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QrPanel {
    /// Raw SVG markup from the service.
    pub svg_markup: String,
    /// Fixed explanatory caption.
    pub caption: String,
}

/// Display model for one interpreted reply.
///
/// Rendering a new model always replaces the previous one wholesale; the
/// console never appends to a stale panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayModel {
    /// Interpreted result panel.
    pub result: RenderedResult,
    /// Optional transfer panel; additive with the result, never exclusive.
    pub qr_panel: Option<QrPanel>,
}

impl DisplayModel {
    /// Builds a failure-only model from an already-escaped message.
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            result: RenderedResult::Failure {
                message: message.into(),
            },
            qr_panel: None,
        }
    }
}

/// Interprets one raw HTTP reply into a display model.
///
/// # Semantics
/// - Unparseable body with a non-2xx status: generic failure carrying the
///   status code.
/// - Parseable envelope with an `error`: the server message wins over the
///   generic one.
/// - `success` with string `data`: escaped verbatim. Structured `data`:
///   pretty-printed, then escaped. Absent `data`: a neutral completed
///   marker.
/// - A present `qr_code` becomes a [`QrPanel`] regardless of the `data`
///   rendering.
///
/// This function never panics; every parse failure becomes a rendered
/// failure.
pub fn interpret_reply(status: u16, body: &str) -> DisplayModel {
    let envelope = match parse_envelope(body) {
        Ok(envelope) => envelope,
        Err(_) => {
            let message = if (200..300).contains(&status) {
                "Malformed response from service".to_string()
            } else {
                format!("Request failed with status {status}")
            };
            return DisplayModel::failure(escape_html(&message));
        }
    };

    if !envelope.success {
        let message = envelope
            .error
            .unwrap_or_else(|| "Unknown error".to_string());
        return DisplayModel::failure(escape_html(&message));
    }

    let result = match envelope.data {
        None => RenderedResult::Completed,
        Some(Value::String(text)) => RenderedResult::Success {
            body: escape_html(&text),
            structured: false,
        },
        Some(structured) => match serde_json::to_string_pretty(&structured) {
            Ok(pretty) => RenderedResult::Success {
                body: escape_html(&pretty),
                structured: true,
            },
            Err(error) => {
                return DisplayModel::failure(escape_html(&format!(
                    "Malformed response from service: {error}"
                )));
            }
        },
    };

    let qr_panel = envelope.qr_code.map(|svg_markup| QrPanel {
        svg_markup,
        caption: QR_TRANSFER_CAPTION.to_string(),
    });

    DisplayModel { result, qr_panel }
}

/// Builds the generic connectivity-failure model for transport errors.
pub fn connectivity_failure(detail: &str) -> DisplayModel {
    DisplayModel::failure(escape_html(&format!("Failed to connect: {detail}")))
}

/// Escapes text for HTML embedding.
pub fn escape_html(unsafe_text: &str) -> String {
    let mut escaped = String::with_capacity(unsafe_text.len());
    for character in unsafe_text.chars() {
        match character {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#039;"),
            other => escaped.push(other),
        }
    }
    escaped
}

/// Envelope contract errors.
#[derive(Debug, Error)]
pub enum EnvelopeError {
    /// JSON decode failure or contract deviation.
    #[error("envelope decode failure: {0}")]
    Decode(#[from] serde_json::Error),
    /// Parsed payload violates contract invariants.
    #[error("envelope contract violation: {0}")]
    InvalidContract(String),
}
