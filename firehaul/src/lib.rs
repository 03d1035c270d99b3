//! Firehaul core: walks a hierarchical document store (collections of
//! documents, documents holding further collections, unbounded depth) and
//! mirrors it onto disk as a tree of pretty-printed JSON files.
//!
//! Two serialization modes, mutually exclusive per run:
//! - **readable**: plain values, optimized for human inspection
//! - **typed**: marker-tagged values, lossless and machine-reconstructible
//!
//! The store and the filesystem are consumed through narrow traits
//! ([`store::DocumentStore`], [`sink::ExportSink`]); everything between
//! them is the engine: [`value`] for classification and serialization,
//! [`export`] for the recursive walk and run orchestration.

pub mod config;
pub mod error;
pub mod export;
pub mod sink;
pub mod store;
pub mod value;

pub use config::{ExportConfig, ExportMode};
pub use error::{Error, Result};
pub use export::{run_export, ExportMetadata, RunReport};
