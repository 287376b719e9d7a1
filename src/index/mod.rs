//! Repository index documents
//!
//! An index document describes a package repository: opaque repository and
//! app metadata plus every known build of every package. This module loads
//! such a document into a typed model, answers latest-version queries over
//! it, and stores it back atomically.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │    Store    │────▶│  RepoIndex  │────▶│   semver    │
//! │ (load/save) │     │   (model)   │     │ (ordering)  │
//! └─────────────┘     └─────────────┘     └─────────────┘
//!        ▲
//!        │
//! ┌─────────────┐
//! │     Ops     │
//! │(load-query- │
//! │   store)    │
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`types`]: `RepoIndex` and `PackageInfo`, latest-version query and redaction
//! - [`store`]: JSON decoding and temp-file-then-rename storage
//! - [`ops`]: operations over any [`ops::IndexStorer`]
//! - [`error`]: error type for loading and storing

pub mod error;
pub mod ops;
pub mod store;
pub mod types;

pub use error::IndexError;
pub use ops::IndexStorer;
pub use store::{FileIndexStore, load, store};
pub use types::{PackageInfo, RepoIndex};
