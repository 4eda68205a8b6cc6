//! Trigger definitions as seen by the lifecycle controller.
//!
//! A trigger declares exactly one [`TriggerStrategy`] when it is authored.
//! The controller dispatches on that value and never inspects a definition
//! for optional capabilities.

use crate::error::TriggerError;
use crate::polling::PollContext;
use crate::store::TriggerStore;
use async_trait::async_trait;
use rootcause::prelude::Report;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::collections::BTreeMap;
use std::fmt;

/// How a trigger receives events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerStrategy {
    /// A provider calls a webhook registered for this trigger.
    Webhook,
    /// The scheduler polls the provider.
    Polling,
    /// A provider-wide app webhook fans events out by listener.
    AppWebhook,
}

impl fmt::Display for TriggerStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Webhook => write!(f, "WEBHOOK"),
            Self::Polling => write!(f, "POLLING"),
            Self::AppWebhook => write!(f, "APP_WEBHOOK"),
        }
    }
}

/// Where a handshake request is recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HandshakeStrategy {
    #[default]
    None,
    HeaderPresent,
    QueryPresent,
    BodyParamPresent,
}

/// Declares how a provider's enable-time handshake is recognized.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandshakeConfiguration {
    pub strategy: HandshakeStrategy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub param_name: Option<String>,
}

impl HandshakeConfiguration {
    /// A trigger without a handshake.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn new(strategy: HandshakeStrategy, param_name: impl Into<String>) -> Self {
        Self {
            strategy,
            param_name: Some(param_name.into()),
        }
    }

    /// Returns whether `payload` is a handshake request.
    ///
    /// Header names are compared case-insensitively.
    #[must_use]
    pub fn is_handshake(&self, payload: &WebhookPayload) -> bool {
        let Some(param) = self.param_name.as_deref() else {
            return false;
        };
        match self.strategy {
            HandshakeStrategy::None => false,
            HandshakeStrategy::HeaderPresent => payload
                .headers
                .keys()
                .any(|name| name.eq_ignore_ascii_case(param)),
            HandshakeStrategy::QueryPresent => payload.query_params.contains_key(param),
            HandshakeStrategy::BodyParamPresent => payload
                .body
                .as_object()
                .is_some_and(|body| body.contains_key(param)),
        }
    }
}

/// Declares whether a webhook subscription expires and must be renewed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RenewConfiguration {
    #[default]
    None,
    #[serde(rename_all = "camelCase")]
    Cron { cron_expression: String },
}

/// An incoming webhook request.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookPayload {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub query_params: BTreeMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
}

/// The answer returned to a webhook caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
}

impl WebhookResponse {
    /// A bare 200 acknowledgement.
    #[must_use]
    pub fn ok() -> Self {
        Self {
            status: 200,
            headers: BTreeMap::new(),
            body: JsonValue::Null,
        }
    }

    #[must_use]
    pub fn with_body(mut self, body: JsonValue) -> Self {
        self.body = body;
        self
    }
}

/// A subscription to app webhook events, registered by `on_enable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppEventListener {
    pub events: Vec<String>,
    pub identifier_value: String,
}

/// Everything a trigger hook may use.
///
/// The store is injected by the caller and is already scoped to one
/// (flow, trigger) pair.
pub struct TriggerContext<'a> {
    store: &'a dyn TriggerStore,
    pub auth: JsonValue,
    pub props_value: JsonValue,
    pub webhook_url: Option<String>,
    listeners: Vec<AppEventListener>,
}

impl<'a> TriggerContext<'a> {
    pub fn new(store: &'a dyn TriggerStore) -> Self {
        Self {
            store,
            auth: JsonValue::Null,
            props_value: JsonValue::Null,
            webhook_url: None,
            listeners: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_auth(mut self, auth: JsonValue) -> Self {
        self.auth = auth;
        self
    }

    #[must_use]
    pub fn with_props(mut self, props_value: JsonValue) -> Self {
        self.props_value = props_value;
        self
    }

    #[must_use]
    pub fn with_webhook_url(mut self, url: impl Into<String>) -> Self {
        self.webhook_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn store(&self) -> &'a dyn TriggerStore {
        self.store
    }

    /// Registers interest in app webhook events matching `identifier_value`.
    pub fn create_listeners(&mut self, events: Vec<String>, identifier_value: impl Into<String>) {
        self.listeners.push(AppEventListener {
            events,
            identifier_value: identifier_value.into(),
        });
    }

    #[must_use]
    pub fn listeners(&self) -> &[AppEventListener] {
        &self.listeners
    }

    pub(crate) fn take_listeners(&mut self) -> Vec<AppEventListener> {
        std::mem::take(&mut self.listeners)
    }

    /// The subset of the context a polling strategy uses.
    #[must_use]
    pub fn poll_context(&self) -> PollContext<'_> {
        PollContext {
            store: self.store,
            auth: &self.auth,
            props_value: &self.props_value,
        }
    }
}

impl fmt::Debug for TriggerContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TriggerContext")
            .field("webhook_url", &self.webhook_url)
            .field("listeners", &self.listeners)
            .finish_non_exhaustive()
    }
}

/// A trigger as authored by an integration.
#[async_trait]
pub trait TriggerDefinition: Send + Sync {
    /// Name of the trigger within its integration.
    fn name(&self) -> &str;

    fn strategy(&self) -> TriggerStrategy;

    /// An example event, shown when no live data is available.
    fn sample_data(&self) -> JsonValue;

    fn handshake_configuration(&self) -> HandshakeConfiguration {
        HandshakeConfiguration::none()
    }

    fn renew_configuration(&self) -> RenewConfiguration {
        RenewConfiguration::None
    }

    /// Sets up provider-side state (webhooks, listeners, cursors).
    async fn on_enable(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>>;

    /// Tears down provider-side state.
    ///
    /// Must succeed when `on_enable` never ran or failed half way.
    async fn on_disable(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>>;

    /// Turns an event into zero or more flow runs' payloads.
    ///
    /// `payload` is the incoming webhook request, or `None` for a poll.
    async fn run(
        &self,
        ctx: &mut TriggerContext<'_>,
        payload: Option<&WebhookPayload>,
    ) -> Result<Vec<JsonValue>, Report<TriggerError>>;

    /// Produces preview data.
    async fn test(&self, ctx: &mut TriggerContext<'_>) -> Result<Vec<JsonValue>, Report<TriggerError>> {
        let _ = ctx;
        Ok(vec![self.sample_data()])
    }

    /// Answers a handshake request. `None` means a bare acknowledgement.
    async fn on_handshake(
        &self,
        ctx: &mut TriggerContext<'_>,
        payload: &WebhookPayload,
    ) -> Result<Option<WebhookResponse>, Report<TriggerError>> {
        let _ = (ctx, payload);
        Ok(None)
    }

    /// Refreshes an expiring provider subscription.
    async fn on_renew(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
        let _ = ctx;
        Ok(())
    }
}
