//! Infrastructure layer: concrete implementations of application port traits.
//!
//! This module contains all I/O-performing code: the HTTP rule client, the
//! checkpoint and config files, delimited record files and signal handling.
//!
//! Imports from `crate::domain` and `crate::application::ports` are allowed.
//! Imports from `crate::commands` or `crate::output` are forbidden.

pub mod checkpoint;
pub mod config;
pub mod csv_files;
pub mod interrupt;
pub mod rewriter;
