//! Collaborator interfaces consumed by the scheduler service.
//!
//! The service never issues raw queries: it loads items, hands them to an
//! engine, and writes the resulting `SchedulerUpdate` back through these
//! traits. Read-modify-write atomicity per item is the store's concern.

use std::future::Future;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

use danci_srs::{LearnableItem, SchedulerUpdate};

use crate::error::{ConfigError, StoreError};

pub trait ItemStore: Send + Sync {
    fn get(
        &self,
        id: &str,
    ) -> impl Future<Output = Result<Option<LearnableItem>, StoreError>> + Send;

    fn update(
        &self,
        id: &str,
        update: &SchedulerUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Replace the item's state with `initial`, discarding review history
    /// and any FSRS block `initial` does not carry
    fn reset(
        &self,
        id: &str,
        initial: &SchedulerUpdate,
    ) -> impl Future<Output = Result<(), StoreError>> + Send;

    /// Due items (`next_due <= now`), earliest due first, at most `limit`
    fn query_due(
        &self,
        scope: Option<&str>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<LearnableItem>, StoreError>> + Send;

    fn query_all(
        &self,
        scope: Option<&str>,
    ) -> impl Future<Output = Result<Vec<LearnableItem>, StoreError>> + Send;

    fn count_due(
        &self,
        scope: Option<&str>,
        now: DateTime<Utc>,
    ) -> impl Future<Output = Result<usize, StoreError>> + Send {
        async move {
            let items = self.query_all(scope).await?;
            Ok(items.iter().filter(|item| item.is_due_at(now)).count())
        }
    }
}

pub trait ConfigStore: Send + Sync {
    /// Raw preference; `None` when unset
    fn algorithm_preference(
        &self,
    ) -> impl Future<Output = Result<Option<String>, ConfigError>> + Send;
}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Manually advanced clock for tests and simulations
#[derive(Debug)]
pub struct FixedClock {
    now: Mutex<DateTime<Utc>>,
}

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}
