// Copyright (c) 2026 Arcanum AI
// SPDX-License-Identifier: AGPL-3.0
//! # Core Error Taxonomy
//!
//! Every public operation either returns a typed success payload or one of
//! these failure kinds. Argument, lookup, and scope failures surface
//! immediately; store and transaction failures carry their original cause;
//! best-effort post-commit steps report through logs instead of unwinding
//! committed state.

use crate::domain::dispatcher::DispatchError;
use crate::domain::store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("not authenticated: {0}")]
    NotAuthenticated(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error(transparent)]
    Persistence(#[from] StoreError),

    /// Release creation aborted; the transaction was rolled back.
    #[error("Error creating release: {0}")]
    Transaction(String),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl CoreError {
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound(message.into())
    }
}

/// Presence check for required call fields.
pub fn require<T>(value: Option<T>, field: &str) -> Result<T, CoreError> {
    value.ok_or_else(|| CoreError::InvalidArgument(format!("{field} is required")))
}
