//! Error types for the trigger crate.
//!
//! Errors are designed for layered context using rootcause:
//! - `StoreError`: Failures of the key-value cursor store
//! - `FetchError`: Failures reported by an item source
//! - `PollingError`: Failures of a dedupe strategy
//! - `TriggerError`: Failures raised by a trigger definition
//! - `LifecycleError`: High-level wrapper for context
//!
//! Messages name the trigger, never the store keys behind it.

use crate::lifecycle::TriggerState;
use crate::polling::DedupeStrategy;
use std::fmt;

/// Errors from the key-value store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached.
    Unavailable { reason: String },
    /// A value could not be written.
    WriteFailed { reason: String },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable { reason } => write!(f, "trigger store unavailable: {reason}"),
            Self::WriteFailed { reason } => write!(f, "trigger store write failed: {reason}"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Errors reported by an item source while listing items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The remote source could not be queried.
    Request { reason: String },
    /// The remote source answered with data that could not be read.
    Malformed { reason: String },
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Request { reason } => write!(f, "item source request failed: {reason}"),
            Self::Malformed { reason } => write!(f, "item source returned malformed data: {reason}"),
        }
    }
}

impl std::error::Error for FetchError {}

/// Errors from a polling dedupe strategy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollingError {
    /// No cursor is stored; the trigger was polled before being enabled.
    MissingCursor { strategy: DedupeStrategy },
    /// The stored cursor has an unexpected shape.
    CorruptCursor { strategy: DedupeStrategy },
    /// Reading or writing the cursor failed (use as context wrapper).
    Store,
    /// The item source failed (use as context wrapper).
    Fetch,
}

impl fmt::Display for PollingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingCursor { strategy } => {
                write!(
                    f,
                    "no {strategy} cursor stored; the trigger must be enabled before polling"
                )
            }
            Self::CorruptCursor { strategy } => write!(f, "stored {strategy} cursor is unreadable"),
            Self::Store => write!(f, "failed to access the polling cursor"),
            Self::Fetch => write!(f, "failed to fetch items"),
        }
    }
}

impl std::error::Error for PollingError {}

/// Errors raised by a trigger definition's hooks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TriggerError {
    /// A polling strategy failed (use as context wrapper).
    Polling,
    /// The provider rejected or failed a request.
    Provider { reason: String },
    /// The trigger received input it cannot handle.
    InvalidInput { reason: String },
    /// The trigger produced output that cannot be serialized.
    Output { reason: String },
}

impl fmt::Display for TriggerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Polling => write!(f, "polling failed"),
            Self::Provider { reason } => write!(f, "provider error: {reason}"),
            Self::InvalidInput { reason } => write!(f, "invalid trigger input: {reason}"),
            Self::Output { reason } => write!(f, "trigger output is not serializable: {reason}"),
        }
    }
}

impl std::error::Error for TriggerError {}

/// High-level lifecycle errors.
///
/// Use these to add context when wrapping lower-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LifecycleError {
    /// The requested operation is not allowed in the current state.
    InvalidTransition {
        trigger: String,
        from: TriggerState,
        operation: &'static str,
    },
    /// Enabling failed; the trigger stays disabled.
    EnableFailed { trigger: String },
    /// The handshake hook failed.
    HandshakeFailed { trigger: String },
    /// The trigger does not declare a renew schedule.
    RenewNotSupported { trigger: String },
    /// Renewing the provider subscription failed.
    RenewFailed { trigger: String },
    /// Running the trigger failed.
    RunFailed { trigger: String },
    /// Producing test data failed.
    TestFailed { trigger: String },
}

impl fmt::Display for LifecycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidTransition {
                trigger,
                from,
                operation,
            } => {
                write!(f, "cannot {operation} trigger '{trigger}' while {from}")
            }
            Self::EnableFailed { trigger } => write!(f, "failed to enable trigger '{trigger}'"),
            Self::HandshakeFailed { trigger } => {
                write!(f, "webhook handshake failed for trigger '{trigger}'")
            }
            Self::RenewNotSupported { trigger } => {
                write!(f, "trigger '{trigger}' has no renew schedule")
            }
            Self::RenewFailed { trigger } => write!(f, "failed to renew trigger '{trigger}'"),
            Self::RunFailed { trigger } => write!(f, "failed to run trigger '{trigger}'"),
            Self::TestFailed { trigger } => write!(f, "failed to test trigger '{trigger}'"),
        }
    }
}

impl std::error::Error for LifecycleError {}
