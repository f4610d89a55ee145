//! `issuedb` - issue tracker core library
//!
//! This crate provides the mutation and history core behind the `idb` CLI:
//! version-guarded issue updates, an append-only audit trail, atomic bulk
//! status transitions, CSV import and report aggregation.
//!
//! # Architecture
//!
//! - [`cli`] - Command-line interface using clap
//! - [`model`] - Data types (Issue, Label, Comment, HistoryEntry, User)
//! - [`storage`] - `SQLite` record store, mutator and audit trail writer
//! - [`import`] - CSV import pipeline
//! - [`auth`] - Actor authentication
//! - [`config`] - Workspace discovery and layered configuration
//! - [`error`] - Error types and structured error output
//! - [`format`] - Output types and text rendering
//! - [`util`] - Progress reporting helpers

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod cli;
pub mod config;
pub mod error;
pub mod format;
pub mod import;
pub mod logging;
pub mod model;
pub mod storage;
pub mod util;
pub mod validation;

pub use error::{ErrorCode, IssueDbError, Result, StructuredError};
