//! Integration tests for scanner start/stop lifecycle through the console.

mod common;

use common::{ScriptedTransport, console_with_probe};
use keybridge_scanner::{ScanState, SyntheticDecodeBackend};

#[test]
fn start_failure_surfaces_error_and_allows_a_retry() {
    let transport = ScriptedTransport::new();
    let (mut console, probe) = console_with_probe(
        transport,
        vec![
            SyntheticDecodeBackend::failing_start("camera permission denied"),
            SyntheticDecodeBackend::scripted(Vec::new()),
        ],
    );

    console.start_scan();
    assert_eq!(console.session().state(), ScanState::Idle);
    assert!(console.state().scan_notice.starts_with("ERROR:"));

    console.start_scan();
    assert_eq!(console.session().state(), ScanState::Scanning);

    // The failed handle was discarded; the retry built a fresh decoder.
    let probe = probe.lock().expect("probe lock should work");
    assert_eq!(probe.created_decoders, 2);
}

#[test]
fn stop_with_no_active_scan_is_a_no_op() {
    let transport = ScriptedTransport::new();
    let (mut console, probe) = console_with_probe(transport, Vec::new());

    console.stop_scan();

    assert_eq!(console.session().state(), ScanState::Idle);
    let probe = probe.lock().expect("probe lock should work");
    assert_eq!(probe.stop_calls, 0);
}

#[test]
fn explicit_stop_reverts_controls_and_reports_neutral_notice() {
    let transport = ScriptedTransport::new();
    let (mut console, _probe) =
        console_with_probe(transport, vec![SyntheticDecodeBackend::scripted(Vec::new())]);

    console.start_scan();
    assert!(console.runtime_status().scan_active);

    console.stop_scan();
    assert!(!console.runtime_status().scan_active);
    assert_eq!(console.state().scan_notice, "Scanner stopped.");
}

#[test]
fn stop_failure_is_surfaced_but_scanning_can_restart() {
    let transport = ScriptedTransport::new();
    let (mut console, _probe) = console_with_probe(
        transport,
        vec![SyntheticDecodeBackend::scripted(Vec::new()).with_stop_failure("engine wedged")],
    );

    console.start_scan();
    console.stop_scan();
    assert!(
        console
            .state()
            .scan_notice
            .starts_with("Failed to stop scanner")
    );

    console.start_scan();
    assert_eq!(console.session().state(), ScanState::Scanning);
}
