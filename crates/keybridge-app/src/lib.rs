#![warn(missing_docs)]
//! # keybridge-app
//!
//! ## Purpose
//! Orchestrates form submission, status polling, scanning, and scanned
//! payload dispatch for the `keybridge` console.
//!
//! ## Responsibilities
//! - Drive the generic submit pipeline: busy indicator, form encoding,
//!   POST, envelope interpretation, unconditional status refresh.
//! - Keep key-identity lists current via the status poller.
//! - Feed captured scan payloads through remote classification and reveal
//!   only the actions valid for the assigned category.
//! - Provide runtime status projection, the scan kill switch, and log
//!   redaction helpers.
//!
//! ## Data flow
//! User action -> [`Console::submit`] or scan lifecycle ->
//! (remote classify on capture) -> envelope interpretation -> console state
//! -> status refresh.
//!
//! ## Ownership and lifetimes
//! [`Console`] owns the state, client, registry, and scan session; every
//! external collaborator arrives as an injected trait object.
//!
//! ## Error model
//! No failure escapes an orchestration entry point: transport, contract,
//! and scanner failures are converted into rendered state plus indicator
//! resets. Constructors return [`AppError`].
//!
//! ## Security and privacy notes
//! - The scan kill-switch env var can block camera starts at runtime.
//! - [`redact_sensitive`] strips armored material and secret-bearing
//!   fields from log-safe strings.

use keybridge_core::{
    ClassifiedPayload, CoreError, FormInputs, OperationKind, OperationRegistry, PayloadCategory,
    ScanAction, StatusSnapshot, action_target, actions_for_category, encode_form,
    encode_single_field,
};
use keybridge_envelope::{
    DisplayModel, EnvelopeError, classification_from_data, connectivity_failure, escape_html,
    interpret_reply, parse_envelope, parse_status_reply,
};
use keybridge_scanner::{
    DecoderFactory, FrameEvent, ScanConfig, ScanError, ScanSession, StartOutcome, StopOutcome,
    scan_fingerprint,
};
use keybridge_transport::{ApiTransport, ServiceClient, TransportError};
use keybridge_ui::{BusyState, ConsoleState, ServiceStatus};
use std::sync::Arc;
use thiserror::Error;

/// Build-time application version loaded from root `VERSION` file.
pub const APP_VERSION: &str = env!("KEYBRIDGE_VERSION");

/// Status enumeration endpoint.
pub const STATUS_PATH: &str = "/api/status";

/// Scanned payload classification endpoint.
pub const CLASSIFY_PATH: &str = "/api/process_qr_data";

/// Form field carrying the scanned text to the classification endpoint.
pub const SCANNED_DATA_FIELD: &str = "scanned_data";

/// Fixed viewport target the decoder binds to.
pub const SCAN_VIEWPORT_TARGET: &str = "qr-reader";

/// Returns the app version sourced from root `VERSION`.
pub fn app_version() -> &'static str {
    APP_VERSION
}

/// Console orchestrator wiring state, transport, registry, and scanner.
pub struct Console {
    state: ConsoleState,
    client: ServiceClient,
    registry: OperationRegistry,
    session: ScanSession,
}

impl Console {
    /// Creates a console from prebuilt collaborators.
    pub fn new(client: ServiceClient, session: ScanSession) -> Self {
        Self {
            state: ConsoleState::new(app_version()),
            client,
            registry: OperationRegistry::v1(),
            session,
        }
    }

    /// Creates a console for `base_url` with injected transport and decoder
    /// factory, using default scan configuration.
    ///
    /// # Errors
    /// Returns [`AppError::Transport`] when the endpoint violates the
    /// service URL policy.
    pub fn connect(
        base_url: impl Into<String>,
        transport: Arc<dyn ApiTransport>,
        factory: Arc<dyn DecoderFactory>,
    ) -> Result<Self, AppError> {
        let client = ServiceClient::new(base_url, transport)?;
        let session = ScanSession::new(SCAN_VIEWPORT_TARGET, ScanConfig::default(), factory);
        Ok(Self::new(client, session))
    }

    /// Returns the current console state.
    pub fn state(&self) -> &ConsoleState {
        &self.state
    }

    /// Returns mutable console state for rendering shells and tests.
    pub fn state_mut(&mut self) -> &mut ConsoleState {
        &mut self.state
    }

    /// Returns the scan session.
    pub fn session(&self) -> &ScanSession {
        &self.session
    }

    /// Submits one operation through the generic pipeline.
    ///
    /// The busy indicator engages synchronously before any network call and
    /// always resets afterwards; every completion, success or failure,
    /// triggers a status refresh.
    pub fn submit(&mut self, kind: OperationKind, inputs: &FormInputs) {
        self.state.busy = BusyState::Working;
        self.state.clear_result();

        let descriptor = self.registry.descriptor(kind);
        let model = match encode_form(descriptor, inputs) {
            // Local validation failure: rendered without a network call.
            Err(error) => DisplayModel::failure(escape_html(&error.to_string())),
            Ok(body) => match self.client.post_form(&descriptor.endpoint_path, &body) {
                Ok(reply) => interpret_reply(reply.status, &reply.body),
                Err(error) => connectivity_failure(&error.to_string()),
            },
        };
        self.state.set_result(model);

        self.state.busy = BusyState::Ready;
        self.refresh_status();
    }

    /// Fetches the current key identities and replaces the lists wholesale.
    ///
    /// On a service-reported failure or an unreachable/malformed reply the
    /// existing lists are preserved; only the indicator changes.
    pub fn refresh_status(&mut self) {
        self.state.service = ServiceStatus::Fetching;

        let reply = match self.client.get(STATUS_PATH) {
            Ok(reply) => reply,
            Err(error) => {
                self.state.service = ServiceStatus::Unreachable;
                self.state.service_detail = Some(error.to_string());
                return;
            }
        };

        match parse_status_reply(&reply.body) {
            Ok(status) if status.success => {
                self.state.apply_status_snapshot(StatusSnapshot {
                    public_key_identities: status.public_keys,
                    secret_key_identities: status.secret_keys,
                });
            }
            Ok(status) => {
                self.state.service = ServiceStatus::Error;
                self.state.service_detail =
                    Some(status.error.unwrap_or_else(|| "status error".to_string()));
            }
            Err(error) => {
                self.state.service = ServiceStatus::Unreachable;
                self.state.service_detail = Some(error.to_string());
            }
        }
    }

    /// Starts a scan unless the kill switch disables scanning.
    pub fn start_scan(&mut self) {
        if !scan_enabled_from_env() {
            self.state.scan_notice = "Scanning is disabled by operator policy.".to_string();
            return;
        }

        match self.session.start() {
            Ok(StartOutcome::Started) => {
                self.state.scan_notice =
                    "Scanner started. Point the camera at a code.".to_string();
            }
            Ok(StartOutcome::AlreadyActive) => {}
            Err(error) => {
                self.state.scan_notice = format!("ERROR: {error}");
            }
        }
    }

    /// Stops an active scan; a stop with nothing running is a no-op.
    pub fn stop_scan(&mut self) {
        match self.session.stop() {
            StopOutcome::Stopped => {
                self.state.scan_notice = "Scanner stopped.".to_string();
            }
            StopOutcome::NotRunning => {}
            StopOutcome::Failed(detail) => {
                self.state.scan_notice = format!("Failed to stop scanner: {detail}");
            }
        }
    }

    /// Processes one scanner tick.
    ///
    /// A captured payload updates the notice line and triggers exactly one
    /// classification call; empty frames only refresh the progress line.
    pub fn poll_scan(&mut self) {
        match self.session.poll_frame() {
            FrameEvent::Captured { text, stop } => {
                let fingerprint = scan_fingerprint(&text);
                self.state.scan_notice = match stop {
                    StopOutcome::Failed(detail) => format!(
                        "Scan successful ({} bytes, {}), but the scanner failed to stop: {detail}",
                        text.len(),
                        &fingerprint[..12],
                    ),
                    _ => format!(
                        "Scan successful. Captured {} bytes ({}).",
                        text.len(),
                        &fingerprint[..12],
                    ),
                };
                self.classify(text);
            }
            FrameEvent::Searching { detail } => {
                self.state.scan_notice = format!("Scanning... ({detail})");
            }
            FrameEvent::Inactive => {}
        }
    }

    /// Sends freshly scanned text for classification and stores the result.
    ///
    /// The held payload is cleared first, so no stale action controls
    /// survive across scans; on any failure the raw text is preserved under
    /// the failure marker and no actions are revealed.
    pub fn classify(&mut self, raw_text: String) {
        self.state.begin_classification();

        let body = encode_single_field(SCANNED_DATA_FIELD, &raw_text);
        let classified = match self.client.post_form(CLASSIFY_PATH, &body) {
            Err(error) => {
                self.state.scan_notice = format!("Failed to process scanned data: {error}");
                ClassifiedPayload {
                    raw_text,
                    category: PayloadCategory::AnalysisFailed,
                }
            }
            Ok(reply) => match parse_envelope(&reply.body) {
                Ok(envelope) if envelope.success && envelope.data.is_some() => {
                    let category = classification_from_data(envelope.data.as_ref())
                        .ok()
                        .and_then(|reply| reply.data_type)
                        .map(|label| PayloadCategory::from_label(&label))
                        .unwrap_or(PayloadCategory::Unknown);
                    self.state.scan_notice =
                        format!("Scanned data classified as {}.", category.display_label());
                    ClassifiedPayload { raw_text, category }
                }
                Ok(envelope) => {
                    let detail = envelope
                        .error
                        .unwrap_or_else(|| "Unknown error".to_string());
                    self.state.scan_notice = format!("Analysis failed: {detail}");
                    ClassifiedPayload {
                        raw_text,
                        category: PayloadCategory::AnalysisFailed,
                    }
                }
                Err(error) => {
                    self.state.scan_notice = format!("Failed to process scanned data: {error}");
                    ClassifiedPayload {
                        raw_text,
                        category: PayloadCategory::AnalysisFailed,
                    }
                }
            },
        };

        self.state.complete_classification(classified);
    }

    /// Invokes one scan-derived action through the normal submit path.
    ///
    /// Refuses with a visible notice, and without any network call, when no
    /// payload is held or the action is not valid for the held category.
    pub fn invoke_scan_action(&mut self, action: ScanAction) {
        let Some(payload) = self.state.scanned.clone() else {
            self.state.scan_notice = "No scanned data available.".to_string();
            return;
        };

        if !actions_for_category(payload.category).contains(&action) {
            self.state.scan_notice = format!(
                "{} is not available for {}.",
                action.display_label(),
                payload.category.display_label()
            );
            return;
        }

        let (kind, field) = action_target(action);
        let mut inputs = FormInputs::new();
        inputs.insert(field, payload.raw_text);
        self.submit(kind, &inputs);
    }

    /// Projects the console into a flat runtime status snapshot.
    pub fn runtime_status(&self) -> RuntimeStatus {
        project_runtime_status(&self.state, self.session.is_active())
    }
}

/// Consolidated runtime status snapshot for simple rendering shells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeStatus {
    /// App version string.
    pub version: String,
    /// Busy indicator as human-readable string.
    pub busy: String,
    /// Service status as human-readable string.
    pub service: String,
    /// Count of listed public key identities.
    pub public_key_count: usize,
    /// Count of listed secret key identities.
    pub secret_key_count: usize,
    /// Whether a scan is currently active (stop control visible).
    pub scan_active: bool,
    /// Category label of the held scanned payload, if any.
    pub scanned_category: Option<String>,
    /// Labels of the currently visible scan actions.
    pub visible_actions: Vec<String>,
    /// Current scanner notice line.
    pub notice: String,
}

/// Projects console state into a flat status snapshot.
pub fn project_runtime_status(state: &ConsoleState, scan_active: bool) -> RuntimeStatus {
    RuntimeStatus {
        version: state.version.clone(),
        busy: format!("{:?}", state.busy),
        service: format!("{:?}", state.service),
        public_key_count: state.keys.public_key_identities.len(),
        secret_key_count: state.keys.secret_key_identities.len(),
        scan_active,
        scanned_category: state
            .scanned
            .as_ref()
            .map(|payload| payload.category.display_label().to_string()),
        visible_actions: state
            .visible_actions()
            .iter()
            .map(|action| action.display_label().to_string())
            .collect(),
        notice: state.scan_notice.clone(),
    }
}

/// Checks the runtime scan kill-switch env var.
///
/// Semantics:
/// - Unset => scanning enabled.
/// - `0`, `false`, `off` (case-insensitive) => scanning disabled.
/// - Any other value => scanning enabled.
pub fn scan_enabled_from_env() -> bool {
    match std::env::var("KEYBRIDGE_SCAN_ENABLED") {
        Ok(value) => {
            let normalized = value.trim().to_ascii_lowercase();
            !(normalized == "0" || normalized == "false" || normalized == "off")
        }
        Err(_) => true,
    }
}

/// Redacts armored material and secret-bearing fields in log-safe output.
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = redact_armored_block(input);
    for key in ["key_data", "plaintext", "ciphertext", "passphrase"] {
        redacted = redact_key_value(&redacted, key);
    }
    redacted
}

fn redact_armored_block(input: &str) -> String {
    if let Some(position) = input.find("-----BEGIN PGP") {
        let prefix = &input[..position];
        return format!("{prefix}<redacted armored block>");
    }

    input.to_string()
}

fn redact_key_value(input: &str, key: &str) -> String {
    let lower = input.to_ascii_lowercase();
    if let Some(position) = lower.find(key) {
        let prefix = &input[..position];
        return format!("{prefix}{key}=<redacted>");
    }

    input.to_string()
}

/// App integration error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Core model error.
    #[error("core error: {0}")]
    Core(#[from] CoreError),
    /// Envelope contract error.
    #[error("envelope error: {0}")]
    Envelope(#[from] EnvelopeError),
    /// Transport/endpoint error.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    /// Scanner error.
    #[error("scan error: {0}")]
    Scan(#[from] ScanError),
}
