use danci_srs::EngineTuning;

#[derive(Debug, Clone)]
pub struct SchedulerConfig {
    pub log_level: String,
    /// Daily log files go here when `ENABLE_FILE_LOGS` is `true` or `1`
    pub log_dir: Option<String>,
    /// Seeds the fuzz RNG; entropy when absent
    pub rng_seed: Option<u64>,
    pub tuning: EngineTuning,
}

impl SchedulerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parse_f64 = |key: &str| {
            lookup(key)
                .and_then(|value| value.trim().parse::<f64>().ok())
                .filter(|value| value.is_finite() && *value >= 0.0)
        };

        let log_level = lookup("RUST_LOG").unwrap_or_else(|| "info".to_string());

        let log_dir = lookup("ENABLE_FILE_LOGS")
            .filter(|v| v == "true" || v == "1")
            .map(|_| lookup("LOG_DIR").unwrap_or_else(|| "./logs".to_string()));

        let rng_seed = lookup("SRS_RNG_SEED").and_then(|value| value.trim().parse::<u64>().ok());

        let mut tuning = EngineTuning::default();
        if let Some(bonus) = parse_f64("SRS_CLASSIC_LATENESS_BONUS") {
            tuning.classic.lateness_bonus = bonus;
        }
        // fuzz_range is indexed by rating ordinal; a fail schedules one day so
        // its slot follows the hard override
        if let Some(range) = parse_f64("SRS_FSRS_FUZZ_HARD") {
            tuning.fsrs.fuzz_range[0] = range;
            tuning.fsrs.fuzz_range[1] = range;
        }
        if let Some(range) = parse_f64("SRS_FSRS_FUZZ_GOOD") {
            tuning.fsrs.fuzz_range[2] = range;
        }
        if let Some(range) = parse_f64("SRS_FSRS_FUZZ_EASY") {
            tuning.fsrs.fuzz_range[3] = range;
        }

        Self {
            log_level,
            log_dir,
            rng_seed,
            tuning,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self::from_lookup(|_| None)
    }
}
