//! Error Types
//!
//! This module defines the error types used throughout the engine.
//!
//! # Overview
//!
//! The main error type [`EaselError`] covers every failure mode of the scene
//! graph and the render-state layer:
//! - Tree structure errors (stale handles, bad indices, missing children)
//! - Lifecycle ordering errors (double init, destroy before init)
//! - Graphics backend failures (unknown brush, shader compilation, fatal GPU state)
//!
//! Equality short-circuits in mutators and state diffing are **not** errors;
//! they are the normal fast path and never surface here.
//!
//! # Usage
//!
//! All public APIs return [`Result<T>`] which is an alias for `std::result::Result<T, EaselError>`.
//!
//! ```rust,ignore
//! use easel::errors::{EaselError, Result};
//!
//! fn attach(tree: &mut EntityTree, parent: NodeKey, child: NodeKey) -> Result<()> {
//!     tree.add_child(parent, child)?;
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// The main error type for the Easel engine.
#[derive(Error, Debug)]
pub enum EaselError {
    // ========================================================================
    // Tree Structure Errors
    // ========================================================================
    /// A required handle did not refer to a live node.
    #[error("Null reference: {0}")]
    NullReference(String),

    /// A child index was past the end of the children sequence.
    #[error("Index out of range: {index} (len: {len})")]
    OutOfRange {
        /// The invalid index
        index: usize,
        /// Number of children at the time of the call
        len: usize,
    },

    /// The requested node or component is not present.
    #[error("Not found: {0}")]
    NotFound(String),

    // ========================================================================
    // Lifecycle Errors
    // ========================================================================
    /// Operation attempted in the wrong lifecycle state.
    #[error("Invalid state: {0}")]
    InvalidState(String),

    // ========================================================================
    // Graphics Backend Errors
    // ========================================================================
    /// A brush discriminant outside the known set.
    #[error("Unsupported brush type: {0}")]
    UnsupportedBrush(u8),

    /// The backend rejected a shader program.
    #[error("Shader compile error: {0}")]
    ShaderCompile(String),

    /// Unrecoverable backend failure (incomplete framebuffer, lost device...).
    #[error("Backend fatal error: {0}")]
    BackendFatal(String),

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Renderer settings could not be parsed.
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl EaselError {
    /// Returns `true` for errors that leave GPU state undefined and must
    /// abort the frame.
    #[must_use]
    pub fn is_backend_fatal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedBrush(_) | Self::ShaderCompile(_) | Self::BackendFatal(_)
        )
    }
}

/// Alias for `Result<T, EaselError>`.
pub type Result<T> = std::result::Result<T, EaselError>;
