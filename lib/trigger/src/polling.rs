//! Polling dedupe strategies.
//!
//! A polling trigger lists the current items of a remote source on every
//! tick. [`Polling`] turns that stateless listing into a stream of new
//! items by keeping a cursor in the trigger's store:
//!
//! - [`DedupeStrategy::Timebased`] keeps the newest item timestamp seen
//! - [`DedupeStrategy::LastItem`] keeps the id of the newest item seen,
//!   and expects the source to list items newest first
//!
//! Cursor access is read-then-write. Concurrent polls of the same trigger
//! lose updates.

use crate::definition::{TriggerContext, TriggerDefinition, TriggerStrategy, WebhookPayload};
use crate::error::{FetchError, PollingError, TriggerError};
use crate::store::TriggerStore;
use async_trait::async_trait;
use chrono::Utc;
use rootcause::prelude::{Report, ResultExt};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::fmt;
use std::num::NonZeroUsize;
use tracing::debug;

/// Store key of the TIMEBASED cursor.
pub const LAST_POLL_KEY: &str = "lastPoll";
/// Store key of the LAST_ITEM cursor.
pub const LAST_ITEM_KEY: &str = "lastItem";
/// Every key a polling strategy may write.
pub const CURSOR_KEYS: [&str; 2] = [LAST_POLL_KEY, LAST_ITEM_KEY];
/// Upper bound on the number of items `test` returns.
pub const PREVIEW_LIMIT: usize = 5;

/// How new items are told apart from items already seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DedupeStrategy {
    /// Items newer than the newest timestamp seen so far are new.
    Timebased,
    /// Items listed before the last seen item are new.
    LastItem,
}

impl DedupeStrategy {
    /// Returns the wire name of the strategy.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Timebased => "TIMEBASED",
            Self::LastItem => "LAST_ITEM",
        }
    }
}

impl fmt::Display for DedupeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One item listed by a source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolledItem<T> {
    /// Source-assigned id; used by LAST_ITEM.
    #[serde(default)]
    pub id: Option<String>,
    /// Item timestamp; used by TIMEBASED.
    pub epoch_milli_seconds: i64,
    pub data: T,
}

impl<T> PolledItem<T> {
    /// Creates an item with an id.
    pub fn new(id: impl Into<String>, epoch_milli_seconds: i64, data: T) -> Self {
        Self {
            id: Some(id.into()),
            epoch_milli_seconds,
            data,
        }
    }

    /// Creates an item without an id.
    pub fn anonymous(epoch_milli_seconds: i64, data: T) -> Self {
        Self {
            id: None,
            epoch_milli_seconds,
            data,
        }
    }
}

/// Where the source should list from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchCursor {
    Timebased { last_fetch_epoch_ms: i64 },
    LastItem { last_item_id: Option<String> },
}

/// Input of one listing call.
#[derive(Debug, Clone)]
pub struct FetchContext<'a> {
    pub auth: &'a JsonValue,
    pub props_value: &'a JsonValue,
    pub cursor: FetchCursor,
}

/// A remote source of items, implemented once per integration.
#[async_trait]
pub trait ItemSource: Send + Sync {
    type Item: Send;

    /// Lists the current items of the source.
    ///
    /// LAST_ITEM sources must list newest first.
    async fn items(
        &self,
        ctx: FetchContext<'_>,
    ) -> Result<Vec<PolledItem<Self::Item>>, Report<FetchError>>;
}

/// What a poll can see of its trigger.
#[derive(Clone, Copy)]
pub struct PollContext<'a> {
    pub store: &'a dyn TriggerStore,
    pub auth: &'a JsonValue,
    pub props_value: &'a JsonValue,
}

impl<'a> PollContext<'a> {
    fn fetch(&self, cursor: FetchCursor) -> FetchContext<'a> {
        FetchContext {
            auth: self.auth,
            props_value: self.props_value,
            cursor,
        }
    }
}

/// A dedupe strategy bound to an item source.
#[derive(Debug, Clone)]
pub struct Polling<S> {
    strategy: DedupeStrategy,
    max_items_to_poll: Option<NonZeroUsize>,
    preview_limit: usize,
    source: S,
}

impl<S: ItemSource> Polling<S> {
    /// Creates a polling driver for `source`.
    pub fn new(strategy: DedupeStrategy, source: S) -> Self {
        Self {
            strategy,
            max_items_to_poll: None,
            preview_limit: PREVIEW_LIMIT,
            source,
        }
    }

    /// Bounds how many new items one LAST_ITEM poll may return.
    #[must_use]
    pub fn with_max_items_to_poll(mut self, max: NonZeroUsize) -> Self {
        self.max_items_to_poll = Some(max);
        self
    }

    /// Lowers how many items `test` returns. Never raises it above
    /// [`PREVIEW_LIMIT`].
    #[must_use]
    pub fn with_preview_limit(mut self, limit: usize) -> Self {
        self.preview_limit = limit.min(PREVIEW_LIMIT);
        self
    }

    #[must_use]
    pub fn strategy(&self) -> DedupeStrategy {
        self.strategy
    }

    #[must_use]
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Returns the items that appeared since the previous poll, and moves
    /// the cursor past them.
    ///
    /// # Errors
    ///
    /// Returns [`PollingError::MissingCursor`] if a TIMEBASED trigger was
    /// never enabled. Store and source failures are returned as the cause
    /// of [`PollingError::Store`] and [`PollingError::Fetch`].
    pub async fn poll(&self, ctx: &PollContext<'_>) -> Result<Vec<S::Item>, Report<PollingError>> {
        match self.strategy {
            DedupeStrategy::Timebased => {
                let last_epoch = read_last_poll(ctx.store).await?.ok_or(
                    PollingError::MissingCursor {
                        strategy: DedupeStrategy::Timebased,
                    },
                )?;
                let items = self
                    .fetch(ctx, FetchCursor::Timebased {
                        last_fetch_epoch_ms: last_epoch,
                    })
                    .await?;

                let newest = items
                    .iter()
                    .map(|item| item.epoch_milli_seconds)
                    .fold(last_epoch, i64::max);
                ctx.store
                    .put(LAST_POLL_KEY, JsonValue::from(newest))
                    .await
                    .context(PollingError::Store)?;
                debug!(last_epoch, newest, fetched = items.len(), "timebased cursor advanced");

                Ok(items
                    .into_iter()
                    .filter(|item| item.epoch_milli_seconds > last_epoch)
                    .map(|item| item.data)
                    .collect())
            }
            DedupeStrategy::LastItem => {
                let last_item_id = read_last_item(ctx.store).await?;
                let items = self
                    .fetch(ctx, FetchCursor::LastItem {
                        last_item_id: last_item_id.clone(),
                    })
                    .await?;

                let newest_id = items.first().and_then(|item| item.id.clone());
                let fresh = items_since(items, last_item_id.as_deref(), self.max_items_to_poll);
                if let Some(id) = newest_id {
                    debug!(last_item_id = ?last_item_id, newest_id = %id, "last item cursor advanced");
                    ctx.store
                        .put(LAST_ITEM_KEY, JsonValue::from(id))
                        .await
                        .context(PollingError::Store)?;
                }
                Ok(fresh.into_iter().map(|item| item.data).collect())
            }
        }
    }

    /// Records the current position of the source without emitting items.
    ///
    /// # Errors
    ///
    /// Returns an error if the store or, for LAST_ITEM, the source fails.
    pub async fn on_enable(&self, ctx: &PollContext<'_>) -> Result<(), Report<PollingError>> {
        match self.strategy {
            DedupeStrategy::Timebased => {
                let now = Utc::now().timestamp_millis();
                debug!(now, "timebased baseline recorded");
                ctx.store
                    .put(LAST_POLL_KEY, JsonValue::from(now))
                    .await
                    .context(PollingError::Store)?;
            }
            DedupeStrategy::LastItem => {
                let items = self
                    .fetch(ctx, FetchCursor::LastItem { last_item_id: None })
                    .await?;
                match items.into_iter().next().and_then(|item| item.id) {
                    Some(id) => {
                        debug!(newest_id = %id, "last item baseline recorded");
                        ctx.store
                            .put(LAST_ITEM_KEY, JsonValue::from(id))
                            .await
                            .context(PollingError::Store)?;
                    }
                    None => {
                        debug!("source is empty; last item baseline cleared");
                        ctx.store
                            .delete(LAST_ITEM_KEY)
                            .await
                            .context(PollingError::Store)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Does nothing. The lifecycle controller removes cursors.
    ///
    /// # Errors
    ///
    /// Never fails.
    pub async fn on_disable(&self, ctx: &PollContext<'_>) -> Result<(), Report<PollingError>> {
        let _ = ctx;
        Ok(())
    }

    /// Lists items from the start of the source without touching the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if the source fails.
    pub async fn test(&self, ctx: &PollContext<'_>) -> Result<Vec<S::Item>, Report<PollingError>> {
        let cursor = match self.strategy {
            DedupeStrategy::Timebased => FetchCursor::Timebased {
                last_fetch_epoch_ms: 0,
            },
            DedupeStrategy::LastItem => FetchCursor::LastItem { last_item_id: None },
        };
        let items = self.fetch(ctx, cursor).await?;
        Ok(items
            .into_iter()
            .take(self.preview_limit)
            .map(|item| item.data)
            .collect())
    }

    async fn fetch(
        &self,
        ctx: &PollContext<'_>,
        cursor: FetchCursor,
    ) -> Result<Vec<PolledItem<S::Item>>, Report<PollingError>> {
        self.source
            .items(ctx.fetch(cursor))
            .await
            .context(PollingError::Fetch)
    }
}

/// Returns the items listed before `last_item_id`, newest first.
///
/// Without a known `last_item_id` every item is new. `max` keeps the items
/// closest to the boundary.
fn items_since<T>(
    mut items: Vec<PolledItem<T>>,
    last_item_id: Option<&str>,
    max: Option<NonZeroUsize>,
) -> Vec<PolledItem<T>> {
    let boundary = last_item_id
        .and_then(|last| items.iter().position(|item| item.id.as_deref() == Some(last)))
        .unwrap_or(items.len());
    items.truncate(boundary);
    if let Some(max) = max {
        let excess = items.len().saturating_sub(max.get());
        items.drain(..excess);
    }
    items
}

async fn read_last_poll(store: &dyn TriggerStore) -> Result<Option<i64>, Report<PollingError>> {
    match store.get(LAST_POLL_KEY).await.context(PollingError::Store)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(value) => value.as_i64().map(Some).ok_or_else(|| {
            PollingError::CorruptCursor {
                strategy: DedupeStrategy::Timebased,
            }
            .into()
        }),
    }
}

async fn read_last_item(store: &dyn TriggerStore) -> Result<Option<String>, Report<PollingError>> {
    match store.get(LAST_ITEM_KEY).await.context(PollingError::Store)? {
        None | Some(JsonValue::Null) => Ok(None),
        Some(JsonValue::String(id)) => Ok(Some(id)),
        Some(_) => Err(PollingError::CorruptCursor {
            strategy: DedupeStrategy::LastItem,
        }
        .into()),
    }
}

/// A trigger definition backed by a polling strategy.
///
/// Emitted items are serialized to JSON.
pub struct PollingTrigger<S> {
    name: String,
    polling: Polling<S>,
    sample_data: JsonValue,
}

impl<S: ItemSource> PollingTrigger<S> {
    pub fn new(name: impl Into<String>, polling: Polling<S>, sample_data: JsonValue) -> Self {
        Self {
            name: name.into(),
            polling,
            sample_data,
        }
    }

    #[must_use]
    pub fn polling(&self) -> &Polling<S> {
        &self.polling
    }
}

fn to_json<T: Serialize>(items: Vec<T>) -> Result<Vec<JsonValue>, Report<TriggerError>> {
    items
        .into_iter()
        .map(|item| {
            serde_json::to_value(item).map_err(|e| {
                Report::from(TriggerError::Output {
                    reason: e.to_string(),
                })
            })
        })
        .collect()
}

#[async_trait]
impl<S> TriggerDefinition for PollingTrigger<S>
where
    S: ItemSource,
    S::Item: Serialize,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn strategy(&self) -> TriggerStrategy {
        TriggerStrategy::Polling
    }

    fn sample_data(&self) -> JsonValue {
        self.sample_data.clone()
    }

    async fn on_enable(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
        self.polling
            .on_enable(&ctx.poll_context())
            .await
            .context(TriggerError::Polling)
    }

    async fn on_disable(&self, ctx: &mut TriggerContext<'_>) -> Result<(), Report<TriggerError>> {
        self.polling
            .on_disable(&ctx.poll_context())
            .await
            .context(TriggerError::Polling)
    }

    async fn run(
        &self,
        ctx: &mut TriggerContext<'_>,
        payload: Option<&WebhookPayload>,
    ) -> Result<Vec<JsonValue>, Report<TriggerError>> {
        let _ = payload;
        let items = self
            .polling
            .poll(&ctx.poll_context())
            .await
            .context(TriggerError::Polling)?;
        to_json(items)
    }

    async fn test(&self, ctx: &mut TriggerContext<'_>) -> Result<Vec<JsonValue>, Report<TriggerError>> {
        let items = self
            .polling
            .test(&ctx.poll_context())
            .await
            .context(TriggerError::Polling)?;
        to_json(items)
    }
}
