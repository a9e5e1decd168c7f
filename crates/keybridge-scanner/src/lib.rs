#![warn(missing_docs)]
//! # keybridge-scanner
//!
//! ## Purpose
//! Implements the camera-scan session lifecycle and the decoder
//! abstractions it drives.
//!
//! ## Responsibilities
//! - Model the scan session state machine (idle/starting/scanning/stopping).
//! - Define a backend-agnostic decoder trait plus a lazy decoder factory.
//! - Enforce one-shot capture: the first decoded payload stops the session.
//! - Expose deterministic synthetic decoders for CI and unit tests.
//! - Fingerprint decoded payloads for status lines and rescan identity.
//!
//! ## Data flow
//! `start()` lazily constructs a decoder via [`DecoderFactory`] and starts
//! it with a validated [`ScanConfig`]; `poll_frame()` pulls one
//! [`DecodeAttempt`] per tick and converts the first decoded payload into a
//! [`FrameEvent::Captured`], stopping the decoder on the way out.
//!
//! ## Ownership and lifetimes
//! The session owns its decoder (`Box<dyn DecodeBackend>`); a created
//! instance is reused across stop/start cycles, except after a start
//! failure, where the handle is discarded.
//!
//! ## Error model
//! Invalid configuration and camera start/stop failures are reported as
//! [`ScanError`]. Failed decode attempts are expected, high-frequency, and
//! never errors; they surface only as transient [`FrameEvent::Searching`]
//! detail.
//!
//! ## Security and privacy notes
//! Decoded payload text is held verbatim for dispatch but never logged by
//! this crate; fingerprints are one-way digests safe for status lines.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use sha2::{Digest, Sha256};
use thiserror::Error;

/// Default decode attempts per second requested from the camera engine.
pub const DEFAULT_SCAN_FPS: u32 = 10;

/// Default square detection-region edge in pixels.
pub const DEFAULT_REGION_EDGE: u32 = 250;

/// Scan configuration handed to the decoder at start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanConfig {
    /// Decode attempts per second.
    pub fps: u32,
    /// Detection region width in pixels.
    pub region_width: u32,
    /// Detection region height in pixels.
    pub region_height: u32,
}

impl ScanConfig {
    /// Creates a validated scan configuration.
    ///
    /// # Errors
    /// Returns [`ScanError::InvalidFps`] when `fps == 0` and
    /// [`ScanError::InvalidRegion`] for a zero-sized detection region.
    pub fn new(fps: u32, region_width: u32, region_height: u32) -> Result<Self, ScanError> {
        if fps == 0 {
            return Err(ScanError::InvalidFps);
        }
        if region_width == 0 || region_height == 0 {
            return Err(ScanError::InvalidRegion);
        }
        Ok(Self {
            fps,
            region_width,
            region_height,
        })
    }

    /// Returns the decode interval in milliseconds.
    pub fn interval_ms(&self) -> u64 {
        1_000 / self.fps as u64
    }
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            fps: DEFAULT_SCAN_FPS,
            region_width: DEFAULT_REGION_EDGE,
            region_height: DEFAULT_REGION_EDGE,
        }
    }
}

/// Camera selection preference passed to the decoder.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CameraFacing {
    /// Rear ("environment") camera; the transfer-scan default.
    #[default]
    Environment,
    /// Front ("user") camera.
    User,
}

/// One pull from the decode stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeAttempt {
    /// A payload was decoded from the current frame.
    Decoded(String),
    /// No code was found in the current frame; expected and non-actionable.
    NoCode {
        /// Engine detail for the transient progress line.
        detail: String,
    },
}

/// Trait implemented by concrete camera/decode engines.
pub trait DecodeBackend: Send {
    /// Starts the camera and decode loop.
    ///
    /// # Errors
    /// Returns [`ScanError::Camera`] when the camera cannot be acquired
    /// (permissions, hardware, viewport).
    fn start(&mut self, config: &ScanConfig, facing: CameraFacing) -> Result<(), ScanError>;

    /// Stops the camera and decode loop.
    ///
    /// # Errors
    /// Returns [`ScanError::Stop`] when the engine fails to tear down.
    fn stop(&mut self) -> Result<(), ScanError>;

    /// Pulls the next decode attempt from the stream.
    fn next_attempt(&mut self) -> DecodeAttempt;
}

/// Factory for lazily constructing a decoder bound to a viewport target.
pub trait DecoderFactory: Send + Sync {
    /// Creates a decoder bound to `viewport_target`.
    fn create(&self, viewport_target: &str) -> Box<dyn DecodeBackend>;
}

/// Scan session lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanState {
    /// No scan in progress.
    Idle,
    /// Decoder is being constructed/started.
    Starting,
    /// Decoder is running; attempts are being pulled.
    Scanning,
    /// Teardown after capture or explicit stop.
    Stopping,
}

/// Result of a start request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    /// Decoder is now scanning.
    Started,
    /// A scan was already active; no second decoder was created.
    AlreadyActive,
}

/// Result of a stop request or of the post-capture teardown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// Decoder confirmed the stop.
    Stopped,
    /// Nothing was running; no stop command was issued.
    NotRunning,
    /// Decoder reported a stop failure; the session is still restartable.
    Failed(String),
}

/// One observed tick of the scanning loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// First successful decode; the session has already initiated stop.
    Captured {
        /// Decoded payload text.
        text: String,
        /// Outcome of the automatic teardown.
        stop: StopOutcome,
    },
    /// Frame carried no code; only the progress line should change.
    Searching {
        /// Engine detail for the progress line.
        detail: String,
    },
    /// Session is not scanning; nothing to do.
    Inactive,
}

/// State machine wrapping one camera decoder.
///
/// Exactly one session exists per console; the decoder instance is created
/// lazily on first start and reused across stop/start cycles.
pub struct ScanSession {
    state: ScanState,
    config: ScanConfig,
    facing: CameraFacing,
    viewport_target: String,
    factory: Arc<dyn DecoderFactory>,
    decoder: Option<Box<dyn DecodeBackend>>,
    last_decoded_text: Option<String>,
}

impl ScanSession {
    /// Creates an idle session bound to a fixed viewport target.
    pub fn new(
        viewport_target: impl Into<String>,
        config: ScanConfig,
        factory: Arc<dyn DecoderFactory>,
    ) -> Self {
        Self {
            state: ScanState::Idle,
            config,
            facing: CameraFacing::Environment,
            viewport_target: viewport_target.into(),
            factory,
            decoder: None,
            last_decoded_text: None,
        }
    }

    /// Returns the current lifecycle state.
    pub fn state(&self) -> ScanState {
        self.state
    }

    /// Returns `true` while the decoder is running or tearing down.
    pub fn is_active(&self) -> bool {
        matches!(self.state, ScanState::Scanning | ScanState::Stopping)
    }

    /// Returns the most recently decoded payload, if any.
    pub fn last_decoded_text(&self) -> Option<&str> {
        self.last_decoded_text.as_deref()
    }

    /// Starts scanning.
    ///
    /// Idempotent: a start while a scan is active returns
    /// [`StartOutcome::AlreadyActive`] and never creates a second decoder.
    ///
    /// # Errors
    /// Returns [`ScanError::Camera`] when the decoder fails to start; the
    /// failed handle is discarded and the session returns to idle.
    pub fn start(&mut self) -> Result<StartOutcome, ScanError> {
        if !matches!(self.state, ScanState::Idle) {
            return Ok(StartOutcome::AlreadyActive);
        }

        self.state = ScanState::Starting;
        if self.decoder.is_none() {
            let handle = self.factory.create(&self.viewport_target);
            self.decoder = Some(handle);
        }

        let Some(decoder) = self.decoder.as_mut() else {
            self.state = ScanState::Idle;
            return Err(ScanError::Camera("decoder was not constructed".to_string()));
        };

        match decoder.start(&self.config, self.facing) {
            Ok(()) => {
                self.state = ScanState::Scanning;
                Ok(StartOutcome::Started)
            }
            Err(error) => {
                // A handle that failed to start is not trusted again.
                self.decoder = None;
                self.state = ScanState::Idle;
                Err(error)
            }
        }
    }

    /// Pulls one decode attempt and applies one-shot capture semantics.
    ///
    /// The first decoded payload stores `last_decoded_text`, initiates
    /// teardown, and is reported exactly once; attempts arriving after that
    /// observe an inactive session.
    pub fn poll_frame(&mut self) -> FrameEvent {
        if !matches!(self.state, ScanState::Scanning) {
            return FrameEvent::Inactive;
        }

        let Some(decoder) = self.decoder.as_mut() else {
            self.state = ScanState::Idle;
            return FrameEvent::Inactive;
        };

        match decoder.next_attempt() {
            DecodeAttempt::Decoded(text) => {
                self.last_decoded_text = Some(text.clone());
                self.state = ScanState::Stopping;
                let stop = match decoder.stop() {
                    Ok(()) => StopOutcome::Stopped,
                    Err(error) => StopOutcome::Failed(error.to_string()),
                };
                self.state = ScanState::Idle;
                FrameEvent::Captured { text, stop }
            }
            DecodeAttempt::NoCode { detail } => FrameEvent::Searching { detail },
        }
    }

    /// Stops an active scan.
    ///
    /// A stop while nothing is running is a no-op and issues no command to
    /// the decoder. A decoder stop failure is surfaced, but the session
    /// still returns to a restartable idle state.
    pub fn stop(&mut self) -> StopOutcome {
        if !self.is_active() {
            return StopOutcome::NotRunning;
        }

        let Some(decoder) = self.decoder.as_mut() else {
            self.state = ScanState::Idle;
            return StopOutcome::NotRunning;
        };

        self.state = ScanState::Stopping;
        let outcome = match decoder.stop() {
            Ok(()) => StopOutcome::Stopped,
            Err(error) => StopOutcome::Failed(error.to_string()),
        };
        self.state = ScanState::Idle;
        outcome
    }
}

/// Computes the stable hex SHA-256 fingerprint of a decoded payload.
pub fn scan_fingerprint(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

/// Shared counters observed by tests through the synthetic factory.
#[derive(Debug, Default)]
pub struct BackendProbe {
    /// Number of decoder start commands issued.
    pub start_calls: u32,
    /// Number of decoder stop commands issued.
    pub stop_calls: u32,
    /// Number of decoder instances constructed.
    pub created_decoders: u32,
}

/// Deterministic scripted decoder for test and CI usage.
pub struct SyntheticDecodeBackend {
    attempts: VecDeque<DecodeAttempt>,
    start_failure: Option<String>,
    stop_failure: Option<String>,
    probe: Arc<Mutex<BackendProbe>>,
}

impl SyntheticDecodeBackend {
    /// Creates a backend that replays `attempts` in order, then reports
    /// empty frames.
    pub fn scripted(attempts: Vec<DecodeAttempt>) -> Self {
        Self {
            attempts: attempts.into(),
            start_failure: None,
            stop_failure: None,
            probe: Arc::new(Mutex::new(BackendProbe::default())),
        }
    }

    /// Creates a backend whose start command fails with `detail`.
    pub fn failing_start(detail: impl Into<String>) -> Self {
        let mut backend = Self::scripted(Vec::new());
        backend.start_failure = Some(detail.into());
        backend
    }

    /// Makes the stop command fail with `detail`.
    pub fn with_stop_failure(mut self, detail: impl Into<String>) -> Self {
        self.stop_failure = Some(detail.into());
        self
    }

    /// Attaches a shared probe for call counting.
    pub fn with_probe(mut self, probe: Arc<Mutex<BackendProbe>>) -> Self {
        self.probe = probe;
        self
    }
}

impl DecodeBackend for SyntheticDecodeBackend {
    fn start(&mut self, _config: &ScanConfig, _facing: CameraFacing) -> Result<(), ScanError> {
        if let Ok(mut probe) = self.probe.lock() {
            probe.start_calls += 1;
        }
        match &self.start_failure {
            Some(detail) => Err(ScanError::Camera(detail.clone())),
            None => Ok(()),
        }
    }

    fn stop(&mut self) -> Result<(), ScanError> {
        if let Ok(mut probe) = self.probe.lock() {
            probe.stop_calls += 1;
        }
        match &self.stop_failure {
            Some(detail) => Err(ScanError::Stop(detail.clone())),
            None => Ok(()),
        }
    }

    fn next_attempt(&mut self) -> DecodeAttempt {
        self.attempts.pop_front().unwrap_or(DecodeAttempt::NoCode {
            detail: "no code in frame".to_string(),
        })
    }
}

/// Factory dispensing scripted backends, sharing one probe across them.
pub struct SyntheticDecoderFactory {
    backends: Mutex<VecDeque<SyntheticDecodeBackend>>,
    probe: Arc<Mutex<BackendProbe>>,
}

impl SyntheticDecoderFactory {
    /// Creates a factory that dispenses `backends` in order; once
    /// exhausted, it dispenses empty-scripted backends.
    pub fn new(backends: Vec<SyntheticDecodeBackend>) -> Self {
        Self {
            backends: Mutex::new(backends.into()),
            probe: Arc::new(Mutex::new(BackendProbe::default())),
        }
    }

    /// Returns the shared probe handle.
    pub fn probe(&self) -> Arc<Mutex<BackendProbe>> {
        Arc::clone(&self.probe)
    }
}

impl DecoderFactory for SyntheticDecoderFactory {
    fn create(&self, _viewport_target: &str) -> Box<dyn DecodeBackend> {
        if let Ok(mut probe) = self.probe.lock() {
            probe.created_decoders += 1;
        }

        let backend = self
            .backends
            .lock()
            .ok()
            .and_then(|mut queue| queue.pop_front())
            .unwrap_or_else(|| SyntheticDecodeBackend::scripted(Vec::new()));

        Box::new(backend.with_probe(Arc::clone(&self.probe)))
    }
}

/// Scan layer error type.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Decode rate must be positive.
    #[error("invalid scan rate: fps must be greater than zero")]
    InvalidFps,
    /// Detection region must have positive area.
    #[error("invalid detection region: width and height must be positive")]
    InvalidRegion,
    /// Camera/decoder start failure.
    #[error("could not start scanner: {0}")]
    Camera(String),
    /// Decoder stop failure.
    #[error("could not stop scanner: {0}")]
    Stop(String),
}
