#![warn(missing_docs)]
//! Test-only crate hosting lightweight NFR smoke checks for the keybridge
//! interpret/encode pipeline.
