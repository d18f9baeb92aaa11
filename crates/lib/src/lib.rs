//! layersync-lib: Core types and logic for LayerSync
//!
//! This crate provides the moving parts of batched document-variant export:
//! - `path` / `props`: logical element paths and the tagged property model
//! - `host`: the document host abstraction and the JSON-backed host
//! - `resolve`: path-to-handle resolution with shadow siblings and caching
//! - `snapshot` / `reconcile`: baseline capture, diffing, and restoration
//! - `apply`: translation of property sets into host mutations
//! - `batch`: the export driver tying a task list to one document session

pub mod apply;
pub mod batch;
pub mod host;
pub mod path;
pub mod props;
pub mod reconcile;
pub mod resolve;
pub mod snapshot;
pub mod task;
