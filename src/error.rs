// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Engine error types.

use thiserror::Error;

/// Errors surfaced by the rendering engine.
///
/// Missing optional fields never error (they default at load time); these
/// are the conditions that indicate a corrupt document and fail fast.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A loop event referenced a name that is neither a built-in generator
    /// nor a configured loop in the document
    #[error("unknown loop reference '{0}'")]
    UnknownLoop(String),
}
