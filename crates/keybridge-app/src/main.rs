#![warn(missing_docs)]
//! # keybridge-app binary
//!
//! Console entry point for keybridge.

/// CLI entry point.
fn main() {
    println!("keybridge-app {}", keybridge_app::app_version());
    println!(
        "scan_enabled={} (KEYBRIDGE_SCAN_ENABLED)",
        keybridge_app::scan_enabled_from_env()
    );
}
