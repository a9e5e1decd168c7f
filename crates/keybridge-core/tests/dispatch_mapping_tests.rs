//! Integration tests for category labels and scan-action dispatch mapping.

use keybridge_core::{
    OperationKind, PayloadCategory, ScanAction, action_target, actions_for_category,
};

#[test]
fn category_label_mapping_preserves_unknown_labels() {
    assert_eq!(
        PayloadCategory::from_label("PGP Public Key"),
        PayloadCategory::PublicKey
    );
    assert_eq!(
        PayloadCategory::from_label("PGP Encrypted Message"),
        PayloadCategory::EncryptedMessage
    );
    assert_eq!(
        PayloadCategory::from_label("PGP Signed Message"),
        PayloadCategory::SignedMessage
    );
    assert_eq!(
        PayloadCategory::from_label("PGP Detached Signature"),
        PayloadCategory::DetachedSignature
    );
    assert_eq!(
        PayloadCategory::from_label("Unknown / Plain Text"),
        PayloadCategory::Unknown
    );
}

#[test]
fn known_categories_reveal_exactly_their_action() {
    assert_eq!(
        actions_for_category(PayloadCategory::PublicKey),
        &[ScanAction::ImportKey]
    );
    assert_eq!(
        actions_for_category(PayloadCategory::EncryptedMessage),
        &[ScanAction::DecryptMessage]
    );
    assert_eq!(
        actions_for_category(PayloadCategory::SignedMessage),
        &[ScanAction::VerifyMessage]
    );
    assert_eq!(
        actions_for_category(PayloadCategory::DetachedSignature),
        &[ScanAction::VerifyMessage]
    );
}

#[test]
fn unknown_and_failed_categories_reveal_nothing() {
    assert!(actions_for_category(PayloadCategory::Unknown).is_empty());
    assert!(actions_for_category(PayloadCategory::AnalysisFailed).is_empty());
}

#[test]
fn action_targets_prefill_the_designated_field() {
    assert_eq!(
        action_target(ScanAction::ImportKey),
        (OperationKind::ImportKey, "key_data")
    );
    assert_eq!(
        action_target(ScanAction::DecryptMessage),
        (OperationKind::Decrypt, "ciphertext")
    );
    assert_eq!(
        action_target(ScanAction::VerifyMessage),
        (OperationKind::Verify, "signed_data")
    );
}
