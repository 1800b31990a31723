//! Shared foundational types used across the vdep virtual-dependency engine.
//!
//! This crate provides validated dotted import paths and content hashing.

#![warn(missing_docs)]

pub mod hash;
pub mod import_path;

pub use hash::{short_hash, ContentHash};
pub use import_path::{ImportPath, InvalidImportPath};
