//! Stowage Core Library
//!
//! This crate provides the domain models, error type, and configuration shared by
//! every Stowage component: the record shape touched by the migration and derivative
//! workflows, the storage labels written into records, and the environment-driven
//! settings used to build object-store clients and local upload roots.

pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{Config, GcsConfig, UploadConfig};
pub use error::{AppError, LogLevel};
pub use models::{AssetKind, AssetRecord, ExtraData, StyleConfig};
pub use storage_types::StorageName;
