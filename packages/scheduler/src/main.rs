use chrono::{Duration, Utc};
use rand::Rng;

use danci_scheduler::{
    DifficultyMark, EnvConfigStore, FixedClock, MemoryItemStore, QuizResult, SchedulerConfig,
    SchedulerResult, SchedulerService,
};
use danci_srs::{fuzz_rng, QuizDifficulty};

const DEFAULT_SIM_ITEMS: usize = 50;
const DEFAULT_SIM_DAYS: u32 = 30;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let config = SchedulerConfig::from_env();
    let _log_guard = danci_scheduler::logging::init_tracing(&config);

    if let Err(err) = simulate(&config).await {
        tracing::error!(error = %err, "simulation failed");
        std::process::exit(1);
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}

async fn simulate(config: &SchedulerConfig) -> SchedulerResult<()> {
    let items = env_or("SIM_ITEMS", DEFAULT_SIM_ITEMS);
    let days = env_or("SIM_DAYS", DEFAULT_SIM_DAYS);

    let clock = FixedClock::new(Utc::now());
    let store = MemoryItemStore::new();
    for _ in 0..items {
        store.create(Some("sim"), Utc::now()).await;
    }

    let service = SchedulerService::from_config(store, EnvConfigStore, clock, config);
    let algorithm = service.active_algorithm().await;
    let initialized = service.bulk_initialize_stale(Some("sim")).await?;
    tracing::info!(%algorithm, items, days, initialized, "simulation started");

    // learner answers come from their own stream so the fuzz sequence stays pinned
    let mut learner = fuzz_rng(config.rng_seed.map(|seed| seed.wrapping_add(1)));

    for day in 1..=days {
        service.clock().advance(Duration::days(1));

        let batch = service.get_due_batch(None, Some("sim")).await?;
        let results: Vec<QuizResult> = batch
            .iter()
            .map(|item| {
                let recall = 0.55 + f64::from(item.strength) / 250.0;
                let mut result = QuizResult::new(item.id.clone(), learner.gen_bool(recall.min(0.95)))
                    .with_response_time(learner.gen_range(1_000..12_000));
                if learner.gen_bool(0.1) {
                    result = result.with_difficulty(QuizDifficulty::Medium);
                }
                result
            })
            .collect();
        let outcome = service.process_batch(&results).await;

        if let Some(first) = batch.first() {
            if day % 7 == 0 {
                let previews = service.preview(&first.id).await?;
                tracing::debug!(item_id = %first.id, ?previews, "weekly preview");
                service.mark_difficulty(&first.id, DifficultyMark::Hard).await?;
            }
            if day == days / 2 {
                service.reset_progress(&first.id).await?;
            }
        }

        let stats = service.due_stats(Some("sim")).await?;
        let overdue = service.get_overdue(Some("sim")).await?;
        tracing::info!(
            day,
            reviewed = outcome.processed,
            failed = outcome.failures.len(),
            remaining_due = overdue.len(),
            fresh = stats.fresh,
            "day simulated"
        );
    }

    let stats = service.due_stats(Some("sim")).await?;
    match serde_json::to_string_pretty(&stats) {
        Ok(json) => println!("{json}"),
        Err(err) => tracing::warn!(error = %err, "failed to encode final stats"),
    }
    Ok(())
}
