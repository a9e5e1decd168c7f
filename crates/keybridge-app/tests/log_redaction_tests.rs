//! Integration tests for log redaction.

use keybridge_app::redact_sensitive;

#[test]
fn log_redaction_removes_armored_material() {
    let raw = "classified payload: -----BEGIN PGP PUBLIC KEY BLOCK-----\nmQENBF...";
    let redacted = redact_sensitive(raw);

    assert!(redacted.contains("<redacted armored block>"));
    assert!(!redacted.contains("mQENBF"));
}

#[test]
fn log_redaction_removes_secret_bearing_fields() {
    let raw = "submitting ciphertext=hQEMA3xyz";
    let redacted = redact_sensitive(raw);

    assert!(redacted.contains("ciphertext=<redacted>"));
    assert!(!redacted.contains("hQEMA3xyz"));
}
