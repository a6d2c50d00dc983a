//! Error types for registry operations.

use thiserror::Error;

/// Errors from provider registry operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A provider with this name is already registered
    #[error("provider '{0}' is already registered")]
    DuplicateProvider(String),

    /// No provider with this name exists
    #[error("provider '{0}' not found")]
    ProviderNotFound(String),
}
