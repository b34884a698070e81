//! Error types for the rustyhid library
//!
//! This module defines the error returned by every HID service entry point.
//! Errors raised by a remote peer never surface here; those are answered on
//! the air with an ATT Error Response.

use crate::hids::engine::EngineError;
use thiserror::Error;

/// Errors that can occur when driving a HID service instance
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HidsError {
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Invalid Bluetooth stack ID: {0}")]
    InvalidStackId(u32),

    #[error("Insufficient resources")]
    InsufficientResources,

    #[error("Service already registered")]
    ServiceAlreadyRegistered,

    #[error("Invalid service instance ID: {0}")]
    InvalidInstanceId(u32),

    #[error("Malformatted data: {0}")]
    MalformattedData(String),

    #[error("GATT engine error: {0}")]
    Engine(EngineError),
}

impl From<EngineError> for HidsError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::AlreadyRegistered => HidsError::ServiceAlreadyRegistered,
            EngineError::InsufficientResources => HidsError::InsufficientResources,
            other => HidsError::Engine(other),
        }
    }
}

/// HID service result type
pub type HidsResult<T> = Result<T, HidsError>;
