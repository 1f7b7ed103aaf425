//! Workflow requests: JSON files describing job chains and the join jobs that wait on them

/// Embedded JSON schema for workflow requests
pub mod schema;

/// Read, validate and deserialise a workflow request file
pub mod read;

/// Submit the chains of a request, then fan their ids into join jobs
pub mod pipeline;
