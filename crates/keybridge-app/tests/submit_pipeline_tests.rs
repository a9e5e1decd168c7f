//! Integration tests for the generic submit pipeline.

mod common;

use common::{ScriptedTransport, console_with};
use keybridge_core::{FormInputs, OperationKind};
use keybridge_envelope::RenderedResult;
use keybridge_ui::BusyState;

#[test]
fn transport_failure_renders_connectivity_error_and_resets_busy() {
    let transport = ScriptedTransport::new();
    let mut console = console_with(transport.clone(), Vec::new());

    transport.push_failure("connection refused");
    let mut inputs = FormInputs::new();
    inputs.insert("signed_data", "-----BEGIN PGP SIGNED MESSAGE-----");
    console.submit(OperationKind::Verify, &inputs);

    assert_eq!(console.state().busy, BusyState::Ready);
    let model = console.state().result.as_ref().expect("result should exist");
    assert!(matches!(
        &model.result,
        RenderedResult::Failure { message } if message.contains("Failed to connect")
    ));
}

#[test]
fn every_submission_triggers_a_status_refresh() {
    let transport = ScriptedTransport::new();
    let mut console = console_with(transport.clone(), Vec::new());

    // Verify is read-only, and the refresh still runs unconditionally.
    transport.push_reply(200, r#"{"success":true,"data":"Good signature"}"#);
    let mut inputs = FormInputs::new();
    inputs.insert("signed_data", "signed");
    console.submit(OperationKind::Verify, &inputs);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert_eq!(requests[0].method, "POST");
    assert!(requests[0].url.ends_with("/api/verify"));
    assert_eq!(requests[1].method, "GET");
    assert!(requests[1].url.ends_with("/api/status"));
}

#[test]
fn refresh_runs_even_when_the_submission_fails() {
    let transport = ScriptedTransport::new();
    let mut console = console_with(transport.clone(), Vec::new());

    transport.push_failure("connection refused");
    let mut inputs = FormInputs::new();
    inputs.insert("key_data", "armored");
    console.submit(OperationKind::ImportKey, &inputs);

    let requests = transport.requests();
    assert_eq!(requests.len(), 2);
    assert!(requests[1].url.ends_with("/api/status"));
}

#[test]
fn undeclared_field_is_rejected_locally_without_an_operation_call() {
    let transport = ScriptedTransport::new();
    let mut console = console_with(transport.clone(), Vec::new());

    let mut inputs = FormInputs::new();
    inputs.insert("ciphertext", "data");
    inputs.insert("passphrase", "hunter2");
    console.submit(OperationKind::Decrypt, &inputs);

    let model = console.state().result.as_ref().expect("result should exist");
    assert!(matches!(
        &model.result,
        RenderedResult::Failure { message } if message.contains("passphrase")
    ));

    // Only the unconditional status refresh reached the transport.
    let requests = transport.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "GET");
}

#[test]
fn submitted_body_is_form_encoded_in_declared_order() {
    let transport = ScriptedTransport::new();
    let mut console = console_with(transport.clone(), Vec::new());

    transport.push_reply(200, r#"{"success":true}"#);
    let mut inputs = FormInputs::new();
    inputs.insert("plaintext", "hello world");
    inputs.insert("recipients", "alice@example.com");
    console.submit(OperationKind::Encrypt, &inputs);

    let requests = transport.requests();
    assert_eq!(
        requests[0].body,
        "recipients=alice%40example.com&plaintext=hello+world"
    );
}
