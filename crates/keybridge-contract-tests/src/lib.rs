#![warn(missing_docs)]
//! Test-only crate validating keybridge wire-contract fixtures against the
//! frozen JSON schemas under `contracts/`.
