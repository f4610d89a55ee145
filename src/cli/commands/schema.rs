//! Schema command implementation.
//!
//! Emits JSON Schema documents for the machine-readable outputs of `idb`.

use crate::cli::{SchemaArgs, SchemaTarget};
use crate::error::Result;
use crate::format::{AssigneeStats, Dashboard, IssueDetails, ResolutionStats};
use crate::import::ImportResult;
use crate::model::{HistoryEntry, Issue};
use crate::storage::BulkStatusResult;
use schemars::schema::RootSchema;
use schemars::schema_for;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Serialize, schemars::JsonSchema)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Serialize, schemars::JsonSchema)]
struct ErrorBody {
    /// Machine-readable error code (SCREAMING_SNAKE_CASE)
    code: String,
    /// HTTP status the same failure maps to
    status: u16,
    /// Human-readable message
    message: String,
    /// Optional hint for remediation
    hint: Option<String>,
    /// Whether the operation can be retried
    retryable: bool,
    /// Additional context (arbitrary JSON)
    context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize)]
struct SchemaOutput {
    tool: &'static str,
    schemas: BTreeMap<&'static str, RootSchema>,
}

/// Execute the schema command. Output is always JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn execute(args: &SchemaArgs) -> Result<()> {
    let payload = SchemaOutput {
        tool: "idb",
        schemas: build_schemas(args.target),
    };
    super::print_json(&payload)
}

fn build_schemas(target: SchemaTarget) -> BTreeMap<&'static str, RootSchema> {
    let all = target == SchemaTarget::All;
    let wants = |t: SchemaTarget| all || target == t;
    let mut schemas = BTreeMap::new();

    if wants(SchemaTarget::Issue) {
        schemas.insert("Issue", schema_for!(Issue));
    }
    if wants(SchemaTarget::IssueDetails) {
        schemas.insert("IssueDetails", schema_for!(IssueDetails));
    }
    if wants(SchemaTarget::HistoryEntry) {
        schemas.insert("HistoryEntry", schema_for!(HistoryEntry));
    }
    if wants(SchemaTarget::ImportResult) {
        schemas.insert("ImportResult", schema_for!(ImportResult));
    }
    if wants(SchemaTarget::BulkStatusResult) {
        schemas.insert("BulkStatusResult", schema_for!(BulkStatusResult));
    }
    if wants(SchemaTarget::TopAssignees) {
        schemas.insert("TopAssignees", schema_for!(Vec<AssigneeStats>));
    }
    if wants(SchemaTarget::ResolutionStats) {
        schemas.insert("ResolutionStats", schema_for!(ResolutionStats));
    }
    if wants(SchemaTarget::Dashboard) {
        schemas.insert("Dashboard", schema_for!(Dashboard));
    }
    if wants(SchemaTarget::Error) {
        schemas.insert("ErrorEnvelope", schema_for!(ErrorEnvelope));
    }

    schemas
}
