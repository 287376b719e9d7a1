//! Version name handling for package records
//!
//! Version names in an index document are free-form strings that usually, but
//! not always, follow semantic versioning. This module turns them into an
//! ordering that never fails.
//!
//! # Modules
//!
//! - [`semver`]: lenient parsing and total ordering of version names

pub mod semver;
