//! Trigger lifecycle controller.
//!
//! Sequences a trigger definition's hooks as its flow is enabled, run,
//! renewed and disabled:
//!
//! ```text
//! DISABLED -> ENABLING -> ENABLED -> DISABLING -> DISABLED
//!                           |  ^
//!                           v  |
//!                         RENEWING   (webhooks with a CRON renew schedule)
//! ```
//!
//! A failed enable leaves the trigger `DISABLED`. Disable is best effort:
//! hook and cleanup failures are logged and the trigger ends `DISABLED`.
//! Retrying is up to the caller.

use crate::config::LifecycleConfig;
use crate::definition::{
    AppEventListener, RenewConfiguration, TriggerContext, TriggerDefinition, TriggerStrategy,
    WebhookPayload, WebhookResponse,
};
use crate::error::LifecycleError;
use crate::polling::CURSOR_KEYS;
use piecework_core::TriggerId;
use rootcause::prelude::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use tracing::{debug, info, instrument, warn};

/// Lifecycle state of one trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerState {
    #[default]
    Disabled,
    Enabling,
    Enabled,
    Renewing,
    Disabling,
}

impl TriggerState {
    /// Returns true if the trigger is between two stable states.
    #[must_use]
    pub fn is_transitional(&self) -> bool {
        matches!(self, Self::Enabling | Self::Renewing | Self::Disabling)
    }
}

impl fmt::Display for TriggerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disabled => "DISABLED",
            Self::Enabling => "ENABLING",
            Self::Enabled => "ENABLED",
            Self::Renewing => "RENEWING",
            Self::Disabling => "DISABLING",
        };
        f.write_str(name)
    }
}

/// What the scheduler must set up after a trigger is enabled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Activation {
    /// Route the webhook URL to the trigger, renewing on the given schedule.
    Webhook { renew: RenewConfiguration },
    /// Poll the trigger on the given cron schedule.
    Polling { cron: String },
    /// Route matching app webhook events to the trigger.
    AppWebhook { listeners: Vec<AppEventListener> },
}

/// Drives one trigger through its lifecycle.
#[derive(Debug)]
pub struct TriggerLifecycle<D> {
    trigger_id: TriggerId,
    definition: D,
    config: LifecycleConfig,
    state: TriggerState,
}

impl<D: TriggerDefinition> TriggerLifecycle<D> {
    /// Creates a controller for a disabled trigger.
    pub fn new(trigger_id: TriggerId, definition: D, config: LifecycleConfig) -> Self {
        Self::restore(trigger_id, definition, config, TriggerState::Disabled)
    }

    /// Rebuilds a controller for a trigger whose state was persisted.
    pub fn restore(
        trigger_id: TriggerId,
        definition: D,
        config: LifecycleConfig,
        state: TriggerState,
    ) -> Self {
        Self {
            trigger_id,
            definition,
            config,
            state,
        }
    }

    #[must_use]
    pub fn state(&self) -> TriggerState {
        self.state
    }

    #[must_use]
    pub fn trigger_id(&self) -> TriggerId {
        self.trigger_id
    }

    #[must_use]
    pub fn definition(&self) -> &D {
        &self.definition
    }

    /// Runs `on_enable` and reports what the scheduler must set up.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] unless the trigger is
    /// disabled, and [`LifecycleError::EnableFailed`] if `on_enable` fails.
    /// Either way the trigger is left disabled.
    #[instrument(skip(self, ctx), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn enable(
        &mut self,
        ctx: &mut TriggerContext<'_>,
    ) -> Result<Activation, Report<LifecycleError>> {
        self.expect_state(&[TriggerState::Disabled], "enable")?;
        self.state = TriggerState::Enabling;

        let enabled = self.definition.on_enable(ctx).await;
        if enabled.is_err() {
            self.state = TriggerState::Disabled;
        }
        enabled.context(LifecycleError::EnableFailed {
            trigger: self.name(),
        })?;

        let activation = match self.definition.strategy() {
            TriggerStrategy::Webhook => Activation::Webhook {
                renew: self.definition.renew_configuration(),
            },
            TriggerStrategy::Polling => Activation::Polling {
                cron: self.config.polling_cron.clone(),
            },
            TriggerStrategy::AppWebhook => Activation::AppWebhook {
                listeners: ctx.take_listeners(),
            },
        };
        self.state = TriggerState::Enabled;
        info!(strategy = %self.definition.strategy(), "trigger enabled");
        Ok(activation)
    }

    /// Runs `on_disable` and removes polling cursors.
    ///
    /// Allowed from `DISABLED` so that state left by a failed enable can
    /// be cleaned up.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] while another
    /// transition is in progress. Hook and cleanup failures are logged,
    /// not returned.
    #[instrument(skip(self, ctx), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn disable(&mut self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<LifecycleError>> {
        self.expect_state(&[TriggerState::Enabled, TriggerState::Disabled], "disable")?;
        self.state = TriggerState::Disabling;

        if let Err(report) = self.definition.on_disable(ctx).await {
            warn!(error = %report, "on_disable failed; continuing");
        }

        match self.definition.strategy() {
            TriggerStrategy::Polling => {
                for key in CURSOR_KEYS {
                    if let Err(report) = ctx.store().delete(key).await {
                        warn!(error = %report, "failed to clear polling cursor");
                    }
                }
            }
            TriggerStrategy::Webhook | TriggerStrategy::AppWebhook => {}
        }

        self.state = TriggerState::Disabled;
        info!("trigger disabled");
        Ok(())
    }

    /// Answers a webhook handshake.
    ///
    /// Returns `None` if the payload is not a handshake, in which case the
    /// caller should `run` the trigger with it. A hook that answers `None`
    /// gets a bare 200.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::HandshakeFailed`] if the hook fails.
    #[instrument(skip(self, ctx, payload), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn handshake(
        &self,
        ctx: &mut TriggerContext<'_>,
        payload: &WebhookPayload,
    ) -> Result<Option<WebhookResponse>, Report<LifecycleError>> {
        self.expect_state(&[TriggerState::Enabling, TriggerState::Enabled], "handshake")?;
        match self.definition.strategy() {
            TriggerStrategy::Webhook => {}
            TriggerStrategy::Polling | TriggerStrategy::AppWebhook => return Ok(None),
        }
        if !self.definition.handshake_configuration().is_handshake(payload) {
            return Ok(None);
        }

        let response = self
            .definition
            .on_handshake(ctx, payload)
            .await
            .context(LifecycleError::HandshakeFailed {
                trigger: self.name(),
            })?;
        debug!(custom = response.is_some(), "handshake answered");
        Ok(Some(response.unwrap_or_else(WebhookResponse::ok)))
    }

    /// Refreshes an expiring webhook subscription.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::RenewNotSupported`] unless the trigger is a
    /// webhook with a CRON renew schedule, and
    /// [`LifecycleError::RenewFailed`] if `on_renew` fails. The trigger
    /// stays enabled in both cases.
    #[instrument(skip(self, ctx), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn renew(&mut self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<LifecycleError>> {
        self.expect_state(&[TriggerState::Enabled], "renew")?;
        let renewable = match self.definition.strategy() {
            TriggerStrategy::Webhook => matches!(
                self.definition.renew_configuration(),
                RenewConfiguration::Cron { .. }
            ),
            TriggerStrategy::Polling | TriggerStrategy::AppWebhook => false,
        };
        if !renewable {
            return Err(LifecycleError::RenewNotSupported {
                trigger: self.name(),
            }
            .into());
        }

        self.state = TriggerState::Renewing;
        let renewed = self.definition.on_renew(ctx).await;
        self.state = TriggerState::Enabled;
        renewed.context(LifecycleError::RenewFailed {
            trigger: self.name(),
        })?;
        info!("trigger renewed");
        Ok(())
    }

    /// Runs the trigger for one webhook delivery or poll tick.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::InvalidTransition`] unless the trigger is
    /// enabled, and [`LifecycleError::RunFailed`] if the hook fails.
    #[instrument(skip(self, ctx, payload), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn run(
        &self,
        ctx: &mut TriggerContext<'_>,
        payload: Option<&WebhookPayload>,
    ) -> Result<Vec<JsonValue>, Report<LifecycleError>> {
        self.expect_state(&[TriggerState::Enabled], "run")?;
        let events = self
            .definition
            .run(ctx, payload)
            .await
            .context(LifecycleError::RunFailed {
                trigger: self.name(),
            })?;
        debug!(events = events.len(), "trigger ran");
        Ok(events)
    }

    /// Produces preview data, never more than five events.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::TestFailed`] if the hook fails.
    #[instrument(skip(self, ctx), fields(trigger = %self.definition.name(), trigger_id = %self.trigger_id))]
    pub async fn test(&self, ctx: &mut TriggerContext<'_>) -> Result<Vec<JsonValue>, Report<LifecycleError>> {
        let mut events = self
            .definition
            .test(ctx)
            .await
            .context(LifecycleError::TestFailed {
                trigger: self.name(),
            })?;
        events.truncate(self.config.preview_limit());
        Ok(events)
    }

    fn name(&self) -> String {
        self.definition.name().to_string()
    }

    fn expect_state(
        &self,
        allowed: &[TriggerState],
        operation: &'static str,
    ) -> Result<(), Report<LifecycleError>> {
        if allowed.contains(&self.state) {
            return Ok(());
        }
        Err(LifecycleError::InvalidTransition {
            trigger: self.name(),
            from: self.state,
            operation,
        }
        .into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{HandshakeConfiguration, HandshakeStrategy};
    use crate::error::TriggerError;
    use crate::polling::fixtures::{ScriptedSource, newest_first};
    use crate::polling::{DedupeStrategy, LAST_ITEM_KEY, Polling, PollingTrigger};
    use crate::store::{InMemoryStore, ScopedStore, TriggerStore};
    use async_trait::async_trait;
    use piecework_core::FlowId;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    struct RecordingTrigger {
        strategy: TriggerStrategy,
        calls: Mutex<Vec<&'static str>>,
        fail_enable: bool,
        fail_disable: bool,
        handshake: HandshakeConfiguration,
        handshake_response: Option<WebhookResponse>,
        renew: RenewConfiguration,
    }

    impl RecordingTrigger {
        fn new(strategy: TriggerStrategy) -> Self {
            Self {
                strategy,
                calls: Mutex::new(Vec::new()),
                fail_enable: false,
                fail_disable: false,
                handshake: HandshakeConfiguration::none(),
                handshake_response: None,
                renew: RenewConfiguration::None,
            }
        }

        fn record(&self, call: &'static str) {
            self.calls.lock().expect("calls lock").push(call);
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.lock().expect("calls lock").clone()
        }
    }

    #[async_trait]
    impl TriggerDefinition for RecordingTrigger {
        fn name(&self) -> &str {
            "new_message"
        }

        fn strategy(&self) -> TriggerStrategy {
            self.strategy
        }

        fn sample_data(&self) -> JsonValue {
            json!({"text": "hello"})
        }

        fn handshake_configuration(&self) -> HandshakeConfiguration {
            self.handshake.clone()
        }

        fn renew_configuration(&self) -> RenewConfiguration {
            self.renew.clone()
        }

        async fn on_enable(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
            self.record("on_enable");
            if self.fail_enable {
                return Err(TriggerError::Provider {
                    reason: "webhook registration rejected".to_string(),
                }
                .into());
            }
            if self.strategy == TriggerStrategy::AppWebhook {
                ctx.create_listeners(vec!["message".to_string()], "T024BE7LD");
            }
            Ok(())
        }

        async fn on_disable(&self, _ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
            self.record("on_disable");
            if self.fail_disable {
                return Err(TriggerError::Provider {
                    reason: "webhook already gone".to_string(),
                }
                .into());
            }
            Ok(())
        }

        async fn run(
            &self,
            _ctx: &mut TriggerContext<'_>,
            payload: Option<&WebhookPayload>,
        ) -> Result<Vec<JsonValue>, Report<TriggerError>> {
            self.record("run");
            Ok(payload.map(|p| p.body.clone()).into_iter().collect())
        }

        async fn test(&self, _ctx: &mut TriggerContext<'_>) -> Result<Vec<JsonValue>, Report<TriggerError>> {
            self.record("test");
            Ok(vec![self.sample_data(); 8])
        }

        async fn on_handshake(
            &self,
            _ctx: &mut TriggerContext<'_>,
            _payload: &WebhookPayload,
        ) -> Result<Option<WebhookResponse>, Report<TriggerError>> {
            self.record("on_handshake");
            Ok(self.handshake_response.clone())
        }

        async fn on_renew(&self, _ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
            self.record("on_renew");
            Ok(())
        }
    }

    fn lifecycle<D: TriggerDefinition>(definition: D) -> TriggerLifecycle<D> {
        TriggerLifecycle::new(TriggerId::new(), definition, LifecycleConfig::default())
    }

    fn delivery(body: JsonValue) -> WebhookPayload {
        WebhookPayload {
            method: "POST".to_string(),
            body,
            ..WebhookPayload::default()
        }
    }

    #[tokio::test]
    async fn webhook_enable_run_disable() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut trigger = lifecycle(RecordingTrigger::new(TriggerStrategy::Webhook));

        let activation = trigger.enable(&mut ctx).await.expect("enable");
        assert_eq!(
            activation,
            Activation::Webhook {
                renew: RenewConfiguration::None
            }
        );
        assert_eq!(trigger.state(), TriggerState::Enabled);

        let events = trigger
            .run(&mut ctx, Some(&delivery(json!({"id": 1}))))
            .await
            .expect("run");
        assert_eq!(events, vec![json!({"id": 1})]);

        trigger.disable(&mut ctx).await.expect("disable");
        assert_eq!(trigger.state(), TriggerState::Disabled);
        assert_eq!(
            trigger.definition().calls(),
            vec!["on_enable", "run", "on_disable"]
        );
    }

    #[tokio::test]
    async fn failed_enable_stays_disabled() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut definition = RecordingTrigger::new(TriggerStrategy::Webhook);
        definition.fail_enable = true;
        let mut trigger = lifecycle(definition);

        let report = trigger.enable(&mut ctx).await.unwrap_err();
        assert_eq!(
            report.current_context(),
            &LifecycleError::EnableFailed {
                trigger: "new_message".to_string()
            }
        );
        assert_eq!(trigger.state(), TriggerState::Disabled);

        // Cleanup after a half-done enable is allowed.
        trigger.disable(&mut ctx).await.expect("disable");
        assert_eq!(trigger.definition().calls(), vec!["on_enable", "on_disable"]);
    }

    #[tokio::test]
    async fn disable_tolerates_hook_failure() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut definition = RecordingTrigger::new(TriggerStrategy::Webhook);
        definition.fail_disable = true;
        let mut trigger = lifecycle(definition);

        trigger.enable(&mut ctx).await.expect("enable");
        trigger.disable(&mut ctx).await.expect("disable");
        assert_eq!(trigger.state(), TriggerState::Disabled);
    }

    #[tokio::test]
    async fn run_requires_enabled() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut trigger = lifecycle(RecordingTrigger::new(TriggerStrategy::Webhook));

        let report = trigger.run(&mut ctx, None).await.unwrap_err();
        assert!(matches!(
            report.current_context(),
            LifecycleError::InvalidTransition {
                from: TriggerState::Disabled,
                operation: "run",
                ..
            }
        ));

        trigger.enable(&mut ctx).await.expect("enable");
        let report = trigger.enable(&mut ctx).await.unwrap_err();
        assert!(matches!(
            report.current_context(),
            LifecycleError::InvalidTransition {
                from: TriggerState::Enabled,
                ..
            }
        ));
        assert!(trigger.definition().calls().iter().all(|c| *c != "run"));
    }

    #[tokio::test]
    async fn polling_trigger_keeps_cursor_until_disabled() {
        let shared = Arc::new(InMemoryStore::new());
        let scoped = ScopedStore::new(shared.clone(), FlowId::new(), "new_row");
        let mut ctx = TriggerContext::new(&scoped);
        let polling = Polling::new(
            DedupeStrategy::LastItem,
            ScriptedSource::with_items(newest_first(2)),
        );
        let mut trigger = lifecycle(PollingTrigger::new("new_row", polling, json!("row")));

        let activation = trigger.enable(&mut ctx).await.expect("enable");
        assert_eq!(
            activation,
            Activation::Polling {
                cron: "*/5 * * * *".to_string()
            }
        );
        assert_eq!(
            scoped.get(LAST_ITEM_KEY).await.expect("get"),
            Some(json!("item_1"))
        );
        assert!(trigger.run(&mut ctx, None).await.expect("run").is_empty());

        trigger
            .definition()
            .polling()
            .source()
            .set_items(newest_first(4));
        let events = trigger.run(&mut ctx, None).await.expect("run");
        assert_eq!(events, vec![json!("data_3"), json!("data_2")]);

        trigger.disable(&mut ctx).await.expect("disable");
        assert!(shared.is_empty().await);
    }

    #[tokio::test]
    async fn polling_run_before_enable_fails_with_cause() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let polling = Polling::new(DedupeStrategy::Timebased, ScriptedSource::default());
        let trigger = TriggerLifecycle::restore(
            TriggerId::new(),
            PollingTrigger::new("new_row", polling, json!("row")),
            LifecycleConfig::default(),
            TriggerState::Enabled,
        );

        let report = trigger.run(&mut ctx, None).await.unwrap_err();
        assert_eq!(
            report.current_context(),
            &LifecycleError::RunFailed {
                trigger: "new_row".to_string()
            }
        );
    }

    #[tokio::test]
    async fn app_webhook_reports_listeners() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut trigger = lifecycle(RecordingTrigger::new(TriggerStrategy::AppWebhook));

        let activation = trigger.enable(&mut ctx).await.expect("enable");
        assert_eq!(
            activation,
            Activation::AppWebhook {
                listeners: vec![AppEventListener {
                    events: vec!["message".to_string()],
                    identifier_value: "T024BE7LD".to_string(),
                }]
            }
        );
    }

    #[tokio::test]
    async fn handshake_defaults_to_bare_ok() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut definition = RecordingTrigger::new(TriggerStrategy::Webhook);
        definition.handshake =
            HandshakeConfiguration::new(HandshakeStrategy::BodyParamPresent, "challenge");
        let mut trigger = lifecycle(definition);
        trigger.enable(&mut ctx).await.expect("enable");

        let response = trigger
            .handshake(&mut ctx, &delivery(json!({"challenge": "abc"})))
            .await
            .expect("handshake");
        assert_eq!(response, Some(WebhookResponse::ok()));

        let not_handshake = trigger
            .handshake(&mut ctx, &delivery(json!({"event": "message"})))
            .await
            .expect("handshake");
        assert_eq!(not_handshake, None);
        assert_eq!(
            trigger.definition().calls(),
            vec!["on_enable", "on_handshake"]
        );
    }

    #[tokio::test]
    async fn handshake_uses_hook_response() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let mut definition = RecordingTrigger::new(TriggerStrategy::Webhook);
        definition.handshake =
            HandshakeConfiguration::new(HandshakeStrategy::QueryPresent, "hub.challenge");
        let custom = WebhookResponse::ok().with_body(json!("abc"));
        definition.handshake_response = Some(custom.clone());
        let trigger = TriggerLifecycle::restore(
            TriggerId::new(),
            definition,
            LifecycleConfig::default(),
            TriggerState::Enabling,
        );

        let mut payload = delivery(JsonValue::Null);
        payload
            .query_params
            .insert("hub.challenge".to_string(), "abc".to_string());
        let response = trigger.handshake(&mut ctx, &payload).await.expect("handshake");
        assert_eq!(response, Some(custom));
    }

    #[tokio::test]
    async fn renew_only_with_cron_schedule() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);

        let mut plain = lifecycle(RecordingTrigger::new(TriggerStrategy::Webhook));
        plain.enable(&mut ctx).await.expect("enable");
        let report = plain.renew(&mut ctx).await.unwrap_err();
        assert!(matches!(
            report.current_context(),
            LifecycleError::RenewNotSupported { .. }
        ));
        assert_eq!(plain.state(), TriggerState::Enabled);

        let mut definition = RecordingTrigger::new(TriggerStrategy::Webhook);
        definition.renew = RenewConfiguration::Cron {
            cron_expression: "0 */12 * * *".to_string(),
        };
        let mut renewing = lifecycle(definition);
        let activation = renewing.enable(&mut ctx).await.expect("enable");
        assert!(matches!(
            activation,
            Activation::Webhook {
                renew: RenewConfiguration::Cron { .. }
            }
        ));
        renewing.renew(&mut ctx).await.expect("renew");
        assert_eq!(renewing.state(), TriggerState::Enabled);
        assert_eq!(renewing.definition().calls(), vec!["on_enable", "on_renew"]);
    }

    #[tokio::test]
    async fn test_output_is_bounded() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let trigger = lifecycle(RecordingTrigger::new(TriggerStrategy::Webhook));

        let events = trigger.test(&mut ctx).await.expect("test");
        assert_eq!(events.len(), 5);
        assert_eq!(trigger.state(), TriggerState::Disabled);
    }

    #[tokio::test]
    async fn test_bound_ignores_larger_configured_limit() {
        let store = InMemoryStore::new();
        let mut ctx = TriggerContext::new(&store);
        let config = LifecycleConfig {
            test_preview_limit: 50,
            ..LifecycleConfig::default()
        };

        let webhook = TriggerLifecycle::new(
            TriggerId::new(),
            RecordingTrigger::new(TriggerStrategy::Webhook),
            config.clone(),
        );
        assert_eq!(webhook.test(&mut ctx).await.expect("test").len(), 5);

        let polling = TriggerLifecycle::new(
            TriggerId::new(),
            PollingTrigger::new(
                "new_row",
                Polling::new(
                    DedupeStrategy::LastItem,
                    ScriptedSource::with_items(newest_first(12)),
                )
                .with_preview_limit(50),
                json!({}),
            ),
            config,
        );
        assert_eq!(polling.test(&mut ctx).await.expect("test").len(), 5);
    }

    #[test]
    fn transitional_states() {
        assert!(TriggerState::Enabling.is_transitional());
        assert!(TriggerState::Renewing.is_transitional());
        assert!(!TriggerState::Enabled.is_transitional());
        assert_eq!(TriggerState::default(), TriggerState::Disabled);
    }
}
