//! Error types for the top-chart aggregation pipeline.
//!
//! This module defines a hierarchy of error types:
//!
//! - [`FetchError`] - HTTP fetch failures after retry classification
//! - [`ChartError`] - chart source failures
//! - [`LookupError`] - detail lookup failures
//! - [`InputError`] - category list loading errors
//! - [`WriteError`] - output artifact errors
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Almost nothing here is fatal to a run: chart and lookup errors
//! degrade to "no data" at their call sites, and write errors skip a
//! single category. Only [`InputError`] aborts the pipeline, before
//! any network activity.

use thiserror::Error;

// =============================================================================
// Fetch Errors
// =============================================================================

/// Outcome of a fetch that did not produce a 2xx body.
///
/// Callers must treat every variant as "no data", never as fatal.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Non-retryable HTTP status; returned after exactly one attempt.
    #[error("HTTP {status} for {url} (not retryable)")]
    Status { url: String, status: u16 },

    /// Retry budget exhausted on retryable statuses or transport errors.
    #[error("gave up on {url} after {attempts} attempts (last: {last})")]
    Exhausted {
        url: String,
        attempts: u32,
        last: String,
    },

    /// Failed to construct the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

// =============================================================================
// Chart Source Errors
// =============================================================================

/// Errors from a single chart source attempt.
///
/// The source chain logs these and moves on to the next source; an
/// erroring source is equivalent to an empty one for chain purposes,
/// but the variant keeps "transport failure" distinguishable from
/// "upstream returned nothing" in diagnostics.
#[derive(Debug, Error)]
pub enum ChartError {
    /// The underlying fetch failed.
    #[error("chart fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload did not parse as the expected feed or page shape.
    #[error("malformed chart payload: {0}")]
    Malformed(String),
}

// =============================================================================
// Detail Lookup Errors
// =============================================================================

/// Errors from the authoritative per-app lookup.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The underlying fetch failed.
    #[error("lookup fetch failed: {0}")]
    Fetch(#[from] FetchError),

    /// The payload did not parse as a lookup response.
    #[error("malformed lookup payload: {0}")]
    Malformed(String),
}

// =============================================================================
// Category Input Errors
// =============================================================================

/// Errors while loading the category list.
///
/// This is the only error that aborts a run.
#[derive(Debug, Error)]
pub enum InputError {
    /// Failed to read the input file.
    #[error("failed to read category file: {0}")]
    Io(#[from] std::io::Error),

    /// The input file contained no rows at all.
    #[error("category file is empty")]
    EmptyFile,

    /// No non-empty category values were found.
    #[error("no categories found in input")]
    NoCategories,
}

// =============================================================================
// Output Errors
// =============================================================================

/// Errors while writing a category artifact.
#[derive(Debug, Error)]
pub enum WriteError {
    /// Failed to serialize a row.
    #[error("CSV serialization error: {0}")]
    Csv(#[from] csv::Error),

    /// Failed to flush the in-memory buffer.
    #[error("CSV buffer error: {0}")]
    Buffer(String),

    /// Failed to persist the artifact.
    #[error("failed to write artifact: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::pipeline::run`].
/// Per-category failures never surface here; they degrade to skipped
/// categories inside the driver.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Category list could not be loaded.
    #[error("input error: {0}")]
    Input(#[from] InputError),

    /// HTTP client construction failed before the run started.
    #[error("fetch setup error: {0}")]
    Fetch(#[from] FetchError),

    /// Output directory could not be created.
    #[error("output setup error: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;

/// Result type for chart source operations.
pub type ChartResult<T> = Result<T, ChartError>;

/// Result type for detail lookup operations.
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type for category input operations.
pub type InputResult<T> = Result<T, InputError>;

/// Result type for artifact writing.
pub type WriteResult<T> = Result<T, WriteError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
