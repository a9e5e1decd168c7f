//! Integration tests for runtime status projection.

use keybridge_app::project_runtime_status;
use keybridge_core::{ClassifiedPayload, PayloadCategory, StatusSnapshot};
use keybridge_ui::{BusyState, ConsoleState, ServiceStatus};

#[test]
fn projection_reflects_console_state() {
    let mut state = ConsoleState::new("0.1.0");
    state.busy = BusyState::Working;
    state.service = ServiceStatus::Ready;
    state.apply_status_snapshot(StatusSnapshot {
        public_key_identities: vec!["alice@example.com".to_string()],
        secret_key_identities: vec![],
    });
    state.complete_classification(ClassifiedPayload {
        raw_text: "armored".to_string(),
        category: PayloadCategory::EncryptedMessage,
    });
    state.scan_notice = "Scan successful.".to_string();

    let snapshot = project_runtime_status(&state, true);
    assert_eq!(snapshot.busy, "Working");
    assert_eq!(snapshot.service, "Ready");
    assert_eq!(snapshot.public_key_count, 1);
    assert_eq!(snapshot.secret_key_count, 0);
    assert!(snapshot.scan_active);
    assert_eq!(
        snapshot.scanned_category.as_deref(),
        Some("PGP Encrypted Message")
    );
    assert_eq!(snapshot.visible_actions, vec!["Decrypt this message"]);
    assert_eq!(snapshot.notice, "Scan successful.");
}
