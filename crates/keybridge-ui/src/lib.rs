#![warn(missing_docs)]
//! # keybridge-ui
//!
//! ## Purpose
//! Defines the UI-facing runtime state model for the `keybridge` console.
//!
//! ## Responsibilities
//! - Represent busy/service indicators, key lists, result panels, and the
//!   held scanned payload.
//! - Replace rendered output wholesale so stale panels never linger.
//! - Project action-control visibility from the classified category.
//!
//! ## Data flow
//! Orchestration events mutate [`ConsoleState`]; rendering reads it and the
//! pure projections, never the other way around.
//!
//! ## Ownership and lifetimes
//! `ConsoleState` owns all values to keep event handling free of
//! cross-component borrowing.
//!
//! ## Error model
//! This crate favors explicit state over recoverable errors; invalid
//! combinations are prevented by the mutation methods.
//!
//! ## Security and privacy notes
//! The state holds scanned payload text for dispatch; it never holds
//! credentials and is not a log sink.

use keybridge_core::{ClassifiedPayload, ScanAction, StatusSnapshot, actions_for_category};
use keybridge_envelope::DisplayModel;

/// Process-wide busy indicator for operation submissions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusyState {
    /// No submission in flight.
    Ready,
    /// A submission is being processed.
    Working,
}

/// Service reachability/status indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    /// No status fetch has completed yet.
    Unknown,
    /// A status fetch is in flight.
    Fetching,
    /// Last status fetch succeeded.
    Ready,
    /// Service replied but reported a status error.
    Error,
    /// Service could not be reached or replied with garbage.
    Unreachable,
}

/// Aggregate console runtime state.
#[derive(Debug, Clone, PartialEq)]
pub struct ConsoleState {
    /// App version string sourced from root `VERSION`.
    pub version: String,
    /// Busy indicator for submissions.
    pub busy: BusyState,
    /// Service status indicator.
    pub service: ServiceStatus,
    /// Detail recorded for a service-side status error.
    pub service_detail: Option<String>,
    /// Current key identity lists.
    pub keys: StatusSnapshot,
    /// Rendered result of the most recent operation, if any.
    pub result: Option<DisplayModel>,
    /// Transient scanner progress/notice line.
    pub scan_notice: String,
    /// Scanned payload currently held for dispatch, if any.
    pub scanned: Option<ClassifiedPayload>,
}

impl ConsoleState {
    /// Creates the initial console state.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            busy: BusyState::Ready,
            service: ServiceStatus::Unknown,
            service_detail: None,
            keys: StatusSnapshot::empty(),
            result: None,
            scan_notice: String::new(),
            scanned: None,
        }
    }

    /// Replaces the rendered result wholesale; prior output never lingers.
    pub fn set_result(&mut self, model: DisplayModel) {
        self.result = Some(model);
    }

    /// Clears the rendered result ahead of a new submission.
    pub fn clear_result(&mut self) {
        self.result = None;
    }

    /// Replaces the key lists wholesale and marks the service ready.
    pub fn apply_status_snapshot(&mut self, snapshot: StatusSnapshot) {
        self.keys.replace_with(snapshot);
        self.service = ServiceStatus::Ready;
        self.service_detail = None;
    }

    /// Drops the held payload at the start of a classification attempt, so
    /// no stale action controls survive across scans.
    pub fn begin_classification(&mut self) {
        self.scanned = None;
    }

    /// Stores the classification outcome for the current scan.
    pub fn complete_classification(&mut self, payload: ClassifiedPayload) {
        self.scanned = Some(payload);
    }

    /// Projects the currently visible scan actions.
    ///
    /// Visibility is derived from the held category alone; it is never
    /// tracked as independent state.
    pub fn visible_actions(&self) -> &'static [ScanAction] {
        match &self.scanned {
            Some(payload) => actions_for_category(payload.category),
            None => &[],
        }
    }
}
