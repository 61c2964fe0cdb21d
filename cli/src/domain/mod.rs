//! Domain layer: pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod batch;
pub mod checkpoint;
pub mod config;
pub mod error;
pub mod identity;
pub mod record;
pub mod reset;

pub use batch::{Chunk, MAX_CHUNK_SIZE, split};
pub use checkpoint::{CheckpointBook, CheckpointRecord, OperationKind};
pub use config::{RoutectlConfig, TransferConfig, validate_config_key, validate_config_value};
pub use error::{ConfigError, InputError, TransferError};
pub use identity::{WorkIdentity, fingerprint};
pub use record::{RawRow, RawTable, RedirectRecord, RedirectType, validate_delete, validate_import};
