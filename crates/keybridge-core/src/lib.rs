#![warn(missing_docs)]
//! # keybridge-core
//!
//! ## Purpose
//! Defines the pure data model used across the `keybridge` workspace.
//!
//! ## Responsibilities
//! - Declare the fixed registry of console operations and their form fields.
//! - Encode user-supplied inputs into standard form bodies.
//! - Represent key-identity status snapshots and classified scan payloads.
//! - Map payload categories to the scan actions they enable.
//!
//! ## Data flow
//! Form input collection produces [`FormInputs`], which [`encode_form`]
//! serializes against an [`OperationDescriptor`] from the
//! [`OperationRegistry`]. Classification replies become [`ClassifiedPayload`]
//! values whose category drives [`actions_for_category`].
//!
//! ## Ownership and lifetimes
//! Descriptors, snapshots, and payloads own their strings (`String`/`Vec`)
//! to avoid hidden borrow coupling between orchestration stages.
//!
//! ## Error model
//! Descriptor validation failures and undeclared form fields return
//! [`CoreError`] variants with caller-actionable categorization.
//!
//! ## Security and privacy notes
//! This crate treats key material and scanned payloads as opaque text and
//! never transforms or logs them.
//!
//! ## Example
//! ```rust
//! use keybridge_core::{FormInputs, OperationKind, OperationRegistry, encode_form};
//!
//! let registry = OperationRegistry::v1();
//! let mut inputs = FormInputs::new();
//! inputs.insert("key_data", "-----BEGIN PGP PUBLIC KEY BLOCK-----");
//! let body = encode_form(registry.descriptor(OperationKind::ImportKey), &inputs).unwrap();
//! assert!(body.starts_with("key_data="));
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::form_urlencoded;

/// The six console operations backed by remote endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    /// Export a key by identity.
    ExportKey,
    /// Import raw key material.
    ImportKey,
    /// Encrypt plaintext for recipients.
    Encrypt,
    /// Decrypt a ciphertext.
    Decrypt,
    /// Sign plaintext with a selected key.
    Sign,
    /// Verify signed data.
    Verify,
}

impl OperationKind {
    /// All operation kinds in registry order.
    pub const ALL: [OperationKind; 6] = [
        OperationKind::ExportKey,
        OperationKind::ImportKey,
        OperationKind::Encrypt,
        OperationKind::Decrypt,
        OperationKind::Sign,
        OperationKind::Verify,
    ];

    /// Returns the stable wire name of the operation.
    pub fn name(self) -> &'static str {
        match self {
            OperationKind::ExportKey => "export_key",
            OperationKind::ImportKey => "import_key",
            OperationKind::Encrypt => "encrypt",
            OperationKind::Decrypt => "decrypt",
            OperationKind::Sign => "sign",
            OperationKind::Verify => "verify",
        }
    }

    fn registry_slot(self) -> usize {
        match self {
            OperationKind::ExportKey => 0,
            OperationKind::ImportKey => 1,
            OperationKind::Encrypt => 2,
            OperationKind::Decrypt => 3,
            OperationKind::Sign => 4,
            OperationKind::Verify => 5,
        }
    }
}

/// Immutable description of one remote operation: endpoint plus the ordered
/// form fields it accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationDescriptor {
    /// Operation kind this descriptor belongs to.
    pub kind: OperationKind,
    /// Absolute request path, for example `/api/import_key`.
    pub endpoint_path: String,
    /// Declared input field names in submission order.
    pub input_fields: Vec<String>,
}

impl OperationDescriptor {
    /// Constructs a validated descriptor.
    ///
    /// # Errors
    /// Returns [`CoreError::InvalidEndpointPath`] when the path is not
    /// absolute, [`CoreError::EmptyFieldName`] for a blank field, and
    /// [`CoreError::DuplicateField`] when a field name repeats.
    pub fn new(
        kind: OperationKind,
        endpoint_path: impl Into<String>,
        input_fields: Vec<String>,
    ) -> Result<Self, CoreError> {
        let endpoint_path = endpoint_path.into();
        if !endpoint_path.starts_with('/') {
            return Err(CoreError::InvalidEndpointPath(endpoint_path));
        }

        for (index, field) in input_fields.iter().enumerate() {
            if field.trim().is_empty() {
                return Err(CoreError::EmptyFieldName);
            }
            if input_fields[..index].iter().any(|seen| seen == field) {
                return Err(CoreError::DuplicateField(field.clone()));
            }
        }

        Ok(Self {
            kind,
            endpoint_path,
            input_fields,
        })
    }

    /// Returns `true` when `name` is one of the declared input fields.
    pub fn declares_field(&self, name: &str) -> bool {
        self.input_fields.iter().any(|field| field == name)
    }
}

/// Fixed registry of operation descriptors, created once at process start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationRegistry {
    // Invariant:
    // - Holds exactly one descriptor per OperationKind, in ALL order.
    descriptors: Vec<OperationDescriptor>,
}

impl OperationRegistry {
    /// Builds the v1 registry with the six fixed console operations.
    pub fn v1() -> Self {
        let entries: [(OperationKind, &str, &[&str]); 6] = [
            (
                OperationKind::ExportKey,
                "/api/export_key",
                &["key_id", "secret"],
            ),
            (OperationKind::ImportKey, "/api/import_key", &["key_data"]),
            (
                OperationKind::Encrypt,
                "/api/encrypt",
                &["recipients", "plaintext"],
            ),
            (OperationKind::Decrypt, "/api/decrypt", &["ciphertext"]),
            (
                OperationKind::Sign,
                "/api/sign",
                &["signer_key_id", "plaintext", "sign_mode"],
            ),
            (OperationKind::Verify, "/api/verify", &["signed_data"]),
        ];

        let descriptors = entries
            .into_iter()
            .map(|(kind, path, fields)| OperationDescriptor {
                kind,
                endpoint_path: path.to_string(),
                input_fields: fields.iter().map(|field| field.to_string()).collect(),
            })
            .collect();

        Self { descriptors }
    }

    /// Returns the descriptor for `kind`.
    pub fn descriptor(&self, kind: OperationKind) -> &OperationDescriptor {
        &self.descriptors[kind.registry_slot()]
    }

    /// Returns all descriptors in registry order.
    pub fn descriptors(&self) -> &[OperationDescriptor] {
        &self.descriptors
    }
}

/// Ordered field-name/value pairs collected from a form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormInputs {
    entries: Vec<(String, String)>,
}

impl FormInputs {
    /// Creates an empty input set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets one field value; setting the same field twice keeps the last value.
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self.entries.iter_mut().find(|(seen, _)| *seen == name) {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    /// Returns the value for `name`, if present.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(seen, _)| seen == name)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates supplied field names in insertion order.
    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    /// Returns `true` when no fields were supplied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Encodes `inputs` against a descriptor into a standard form body.
///
/// # Semantics
/// Only declared fields are serialized, in the descriptor's declared order.
/// A declared field with no supplied value is skipped (absent-checkbox
/// semantics).
///
/// # Errors
/// Returns [`CoreError::UndeclaredField`] when `inputs` carries a field the
/// descriptor does not declare; callers may not smuggle extra parameters
/// past the operation contract.
pub fn encode_form(
    descriptor: &OperationDescriptor,
    inputs: &FormInputs,
) -> Result<String, CoreError> {
    for name in inputs.field_names() {
        if !descriptor.declares_field(name) {
            return Err(CoreError::UndeclaredField {
                operation: descriptor.kind.name().to_string(),
                field: name.to_string(),
            });
        }
    }

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for field in &descriptor.input_fields {
        if let Some(value) = inputs.get(field) {
            serializer.append_pair(field, value);
        }
    }

    Ok(serializer.finish())
}

/// Encodes a single field/value pair as a standalone form body.
pub fn encode_single_field(name: &str, value: &str) -> String {
    form_urlencoded::Serializer::new(String::new())
        .append_pair(name, value)
        .finish()
}

/// Wholesale snapshot of the key identities the service currently holds.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    /// Public key identities in service order.
    pub public_key_identities: Vec<String>,
    /// Secret key identities in service order.
    pub secret_key_identities: Vec<String>,
}

impl StatusSnapshot {
    /// Creates an empty snapshot.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Replaces this snapshot wholesale; lists are never merged.
    pub fn replace_with(&mut self, next: StatusSnapshot) {
        *self = next;
    }
}

/// Category the service assigned to a scanned payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PayloadCategory {
    /// An armored public key, importable.
    PublicKey,
    /// An armored encrypted message, decryptable.
    EncryptedMessage,
    /// A clearsigned message, verifiable.
    SignedMessage,
    /// A detached signature, verifiable.
    DetachedSignature,
    /// Recognized by neither side; no action applies.
    Unknown,
    /// Classification itself failed; no action applies.
    AnalysisFailed,
}

impl PayloadCategory {
    /// Maps the service's `data_type` label to a category.
    ///
    /// Unrecognized labels map to [`PayloadCategory::Unknown`] so newly
    /// introduced server labels never break dispatch.
    pub fn from_label(label: &str) -> Self {
        match label {
            "PGP Public Key" => PayloadCategory::PublicKey,
            "PGP Encrypted Message" => PayloadCategory::EncryptedMessage,
            "PGP Signed Message" => PayloadCategory::SignedMessage,
            "PGP Detached Signature" => PayloadCategory::DetachedSignature,
            _ => PayloadCategory::Unknown,
        }
    }

    /// Returns a short operator-facing label.
    pub fn display_label(self) -> &'static str {
        match self {
            PayloadCategory::PublicKey => "PGP Public Key",
            PayloadCategory::EncryptedMessage => "PGP Encrypted Message",
            PayloadCategory::SignedMessage => "PGP Signed Message",
            PayloadCategory::DetachedSignature => "PGP Detached Signature",
            PayloadCategory::Unknown => "Unknown",
            PayloadCategory::AnalysisFailed => "Analysis Failed",
        }
    }
}

/// One scanned payload plus the category the service assigned to it.
///
/// Derived and ephemeral: recomputed on every new scan, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifiedPayload {
    /// Decoded text exactly as captured.
    pub raw_text: String,
    /// Assigned category.
    pub category: PayloadCategory,
}

/// Follow-up actions a classified scan can enable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanAction {
    /// Import the scanned key material.
    ImportKey,
    /// Decrypt the scanned message.
    DecryptMessage,
    /// Verify the scanned message or signature.
    VerifyMessage,
}

impl ScanAction {
    /// Returns a short operator-facing label.
    pub fn display_label(self) -> &'static str {
        match self {
            ScanAction::ImportKey => "Import this key",
            ScanAction::DecryptMessage => "Decrypt this message",
            ScanAction::VerifyMessage => "Verify this message",
        }
    }
}

/// Returns the actions valid for `category`.
///
/// This mapping is the single source of truth for action-control
/// visibility; rendering must project it rather than track its own flags.
pub fn actions_for_category(category: PayloadCategory) -> &'static [ScanAction] {
    match category {
        PayloadCategory::PublicKey => &[ScanAction::ImportKey],
        PayloadCategory::EncryptedMessage => &[ScanAction::DecryptMessage],
        PayloadCategory::SignedMessage | PayloadCategory::DetachedSignature => {
            &[ScanAction::VerifyMessage]
        }
        PayloadCategory::Unknown | PayloadCategory::AnalysisFailed => &[],
    }
}

/// Returns the operation an action drives and the input field it pre-fills.
pub fn action_target(action: ScanAction) -> (OperationKind, &'static str) {
    match action {
        ScanAction::ImportKey => (OperationKind::ImportKey, "key_data"),
        ScanAction::DecryptMessage => (OperationKind::Decrypt, "ciphertext"),
        ScanAction::VerifyMessage => (OperationKind::Verify, "signed_data"),
    }
}

/// Error type for core model validation.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Endpoint paths must be absolute.
    #[error("endpoint path must start with '/': {0}")]
    InvalidEndpointPath(String),
    /// Declared field names cannot be blank.
    #[error("declared field name is empty")]
    EmptyFieldName,
    /// Declared field names must be unique per descriptor.
    #[error("duplicate declared field: {0}")]
    DuplicateField(String),
    /// Supplied input field is not declared by the operation.
    #[error("field '{field}' is not declared by operation '{operation}'")]
    UndeclaredField {
        /// Operation wire name.
        operation: String,
        /// Offending field name.
        field: String,
    },
}
