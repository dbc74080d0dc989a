#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};

use danci_scheduler::{FixedClock, MemoryItemStore, SchedulerService, StaticConfigStore};
use danci_srs::LearnableItem;

pub type TestService = SchedulerService<MemoryItemStore, StaticConfigStore, FixedClock>;

pub fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap()
}

pub fn service(algorithm: Option<&str>) -> TestService {
    SchedulerService::with_seed(
        MemoryItemStore::new(),
        StaticConfigStore::new(algorithm),
        FixedClock::new(t0()),
        7,
    )
}

/// Pristine item whose due date is `hours` from `t0` (negative = past)
pub fn item_due_in(id: &str, hours: i64) -> LearnableItem {
    let mut item = LearnableItem::new(id, t0());
    item.next_due = t0() + Duration::hours(hours);
    item
}

/// Item that has been reviewed before and is due `hours` from `t0`
pub fn reviewed_item(id: &str, hours: i64, strength: i32, interval_days: i32) -> LearnableItem {
    let mut item = item_due_in(id, hours);
    item.strength = strength;
    item.interval_days = interval_days;
    item.last_review = Some(item.next_due - Duration::days(i64::from(interval_days)));
    item.last_studied = item.last_review;
    item
}

pub async fn seed_due(service: &TestService, count: usize, scope: Option<&str>) {
    for i in 0..count {
        let id = match scope {
            Some(scope) => format!("{scope}-{i}"),
            None => format!("w{i}"),
        };
        let hours = -1 - i as i64;
        service
            .store()
            .insert(reviewed_item(&id, hours, (i % 100) as i32, 3), scope)
            .await;
    }
}
