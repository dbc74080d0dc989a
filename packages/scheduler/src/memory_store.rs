//! 内存存储模块
//!
//! 提供 `ItemStore` 与 `ConfigStore` 的内存实现，用于测试与模拟运行。

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock as SyncRwLock;
use tokio::sync::RwLock;
use uuid::Uuid;

use danci_srs::{LearnableItem, SchedulerUpdate};

use crate::error::{ConfigError, StoreError};
use crate::store::{ConfigStore, ItemStore};

// ============================================================
// MemoryItemStore - 学习项仓储
// ============================================================

#[derive(Debug, Clone)]
struct StoredItem {
    item: LearnableItem,
    scope: Option<String>,
    /// 插入顺序，保证查询结果稳定
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    items: HashMap<String, StoredItem>,
    next_seq: u64,
}

/// 学习项内存仓储
///
/// 以插入顺序返回查询结果；`scope` 为 `None` 时匹配全部学习项
#[derive(Debug, Default)]
pub struct MemoryItemStore {
    inner: RwLock<Inner>,
}

impl MemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入或替换学习项
    pub async fn insert(&self, item: LearnableItem, scope: Option<&str>) {
        let mut inner = self.inner.write().await;
        let seq = match inner.items.get(&item.id) {
            Some(existing) => existing.seq,
            None => {
                inner.next_seq += 1;
                inner.next_seq
            }
        };
        inner.items.insert(
            item.id.clone(),
            StoredItem {
                item,
                scope: scope.map(str::to_string),
                seq,
            },
        );
    }

    /// 创建一个未初始化的学习项，返回其快照
    pub async fn create(&self, scope: Option<&str>, now: DateTime<Utc>) -> LearnableItem {
        let item = LearnableItem::new(Uuid::new_v4().to_string(), now);
        self.insert(item.clone(), scope).await;
        item
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn in_scope(stored: &StoredItem, scope: Option<&str>) -> bool {
        match scope {
            Some(scope) => stored.scope.as_deref() == Some(scope),
            None => true,
        }
    }

    async fn scoped(&self, scope: Option<&str>) -> Vec<StoredItem> {
        let inner = self.inner.read().await;
        let mut items: Vec<StoredItem> = inner
            .items
            .values()
            .filter(|stored| Self::in_scope(stored, scope))
            .cloned()
            .collect();
        items.sort_by_key(|stored| stored.seq);
        items
    }
}

impl ItemStore for MemoryItemStore {
    async fn get(&self, id: &str) -> Result<Option<LearnableItem>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.items.get(id).map(|stored| stored.item.clone()))
    }

    async fn update(&self, id: &str, update: &SchedulerUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        stored.item.apply(update);
        Ok(())
    }

    async fn reset(&self, id: &str, initial: &SchedulerUpdate) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner
            .items
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing(id.to_string()))?;
        stored.item.reset(initial);
        Ok(())
    }

    async fn query_due(
        &self,
        scope: Option<&str>,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<LearnableItem>, StoreError> {
        let mut due: Vec<StoredItem> = self
            .scoped(scope)
            .await
            .into_iter()
            .filter(|stored| stored.item.is_due_at(now))
            .collect();
        due.sort_by(|a, b| a.item.next_due.cmp(&b.item.next_due).then(a.seq.cmp(&b.seq)));
        Ok(due.into_iter().take(limit).map(|stored| stored.item).collect())
    }

    async fn query_all(&self, scope: Option<&str>) -> Result<Vec<LearnableItem>, StoreError> {
        Ok(self
            .scoped(scope)
            .await
            .into_iter()
            .map(|stored| stored.item)
            .collect())
    }

    async fn count_due(&self, scope: Option<&str>, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .items
            .values()
            .filter(|stored| Self::in_scope(stored, scope) && stored.item.is_due_at(now))
            .count())
    }
}

// ============================================================
// 配置存储
// ============================================================

/// Environment variable holding the algorithm preference
pub const ALGORITHM_ENV: &str = "SRS_ALGORITHM";

/// Reads `SRS_ALGORITHM` on every call, so edits apply without a restart
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvConfigStore;

impl ConfigStore for EnvConfigStore {
    async fn algorithm_preference(&self) -> Result<Option<String>, ConfigError> {
        match std::env::var(ALGORITHM_ENV) {
            Ok(value) => Ok(Some(value)),
            Err(std::env::VarError::NotPresent) => Ok(None),
            Err(err) => Err(ConfigError(format!("{ALGORITHM_ENV}: {err}"))),
        }
    }
}

/// In-memory preference that can be switched at runtime or made to fail
#[derive(Debug, Default)]
pub struct StaticConfigStore {
    preference: SyncRwLock<Option<String>>,
    failing: AtomicBool,
}

impl StaticConfigStore {
    pub fn new(preference: Option<&str>) -> Self {
        Self {
            preference: SyncRwLock::new(preference.map(str::to_string)),
            failing: AtomicBool::new(false),
        }
    }

    pub fn set(&self, preference: Option<&str>) {
        *self.preference.write() = preference.map(str::to_string);
    }

    /// While set, every read fails with `ConfigError`
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

impl ConfigStore for StaticConfigStore {
    async fn algorithm_preference(&self) -> Result<Option<String>, ConfigError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ConfigError("config store unavailable".to_string()));
        }
        Ok(self.preference.read().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
    }

    fn due_in(id: &str, hours: i64) -> LearnableItem {
        let mut item = LearnableItem::new(id, t0());
        item.next_due = t0() + Duration::hours(hours);
        item
    }

    #[tokio::test]
    async fn test_query_due_orders_by_next_due() {
        let store = MemoryItemStore::new();
        store.insert(due_in("late", -1), None).await;
        store.insert(due_in("future", 5), None).await;
        store.insert(due_in("early", -30), None).await;

        let due = store.query_due(None, t0(), 10).await.unwrap();
        let ids: Vec<&str> = due.iter().map(|item| item.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);

        let limited = store.query_due(None, t0(), 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(store.count_due(None, t0()).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_scope_filtering() {
        let store = MemoryItemStore::new();
        store.insert(due_in("a", -1), Some("book-1")).await;
        store.insert(due_in("b", -1), Some("book-2")).await;
        store.insert(due_in("c", -1), None).await;

        assert_eq!(store.query_all(Some("book-1")).await.unwrap().len(), 1);
        assert_eq!(store.query_all(None).await.unwrap().len(), 3);
        assert_eq!(store.count_due(Some("book-2"), t0()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_item() {
        let store = MemoryItemStore::new();
        let update = SchedulerUpdate {
            strength: 20,
            interval_days: 1,
            ease_factor: 2.5,
            next_due: t0(),
            last_review: None,
            fsrs: None,
        };
        let err = store.update("ghost", &update).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing(id) if id == "ghost"));
    }

    #[tokio::test]
    async fn test_insert_replaces_and_keeps_order() {
        let store = MemoryItemStore::new();
        store.insert(due_in("a", 0), None).await;
        store.insert(due_in("b", 0), None).await;
        let mut replaced = due_in("a", 0);
        replaced.strength = 77;
        store.insert(replaced, None).await;

        let all = store.query_all(None).await.unwrap();
        assert_eq!(all[0].id, "a");
        assert_eq!(all[0].strength, 77);
        assert_eq!(store.len().await, 2);
    }

    #[tokio::test]
    async fn test_static_config_store() {
        let config = StaticConfigStore::new(Some("fsrs"));
        assert_eq!(config.algorithm_preference().await.unwrap().as_deref(), Some("fsrs"));

        config.set_failing(true);
        assert!(config.algorithm_preference().await.is_err());

        config.set_failing(false);
        config.set(None);
        assert_eq!(config.algorithm_preference().await.unwrap(), None);
    }
}
