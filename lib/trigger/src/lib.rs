//! Triggers for piecework flows.
//!
//! This crate provides:
//!
//! - **Store**: The key-value contract triggers keep their cursors in
//! - **Polling**: TIMEBASED and LAST_ITEM dedupe over a listing source
//! - **Definition**: The surface a trigger exposes to the engine
//! - **Lifecycle**: Enable, handshake, run, renew and disable sequencing

pub mod config;
pub mod definition;
pub mod error;
pub mod lifecycle;
pub mod polling;
pub mod store;

pub use config::LifecycleConfig;
pub use definition::{
    AppEventListener, HandshakeConfiguration, HandshakeStrategy, RenewConfiguration,
    TriggerContext, TriggerDefinition, TriggerStrategy, WebhookPayload, WebhookResponse,
};
pub use error::{FetchError, LifecycleError, PollingError, StoreError, TriggerError};
pub use lifecycle::{Activation, TriggerLifecycle, TriggerState};
pub use polling::{
    DedupeStrategy, FetchContext, FetchCursor, ItemSource, PollContext, PolledItem, Polling,
    PollingTrigger, PREVIEW_LIMIT,
};
pub use store::{InMemoryStore, ScopedStore, TriggerStore};
