//! Error types for the crate.
//!
//! One `thiserror`-derived enum per failure family, with
//! `miette::Diagnostic` for rich reporting at the edges (configuration,
//! deserialization).

use miette::Diagnostic;
use thiserror::Error;

#[derive(Error, Diagnostic, Debug)]
pub enum NeatError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("deserialization mismatch: {0}")]
    DeserializationMismatch(String),

    #[error("population is empty")]
    EmptyPopulation,
}

pub type NeatResult<T> = Result<T, NeatError>;

/// Errors raised while activating a decoded network.
#[derive(Error, Diagnostic, Debug)]
pub enum NetworkError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
