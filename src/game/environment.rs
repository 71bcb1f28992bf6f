use log::warn;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use std::path::PathBuf;

pub const DATA_DIR_VAR: &str = "PLUSMINUS_DATA_DIR";
pub const SEED_VAR: &str = "SEED";
const APP_DIR_NAME: &str = "plusminus";

/// Process-level overrides read from the environment.
pub struct Environment;

impl Environment {
    pub fn is_debug_mode() -> bool {
        std::env::var("DEBUG").map(|v| v == "1").unwrap_or(false)
    }

    /// `SEED=<u64>` makes every round of the process reproducible. An
    /// unparsable value is ignored.
    pub fn seed_from_env() -> Option<u64> {
        let value = std::env::var(SEED_VAR).ok()?;
        match value.trim().parse::<u64>() {
            Ok(seed) => Some(seed),
            Err(_) => {
                warn!(target: "environment", "Ignoring unparsable {}={:?}", SEED_VAR, value);
                None
            }
        }
    }

    pub fn data_dir() -> PathBuf {
        if let Ok(dir) = std::env::var(DATA_DIR_VAR) {
            if !dir.trim().is_empty() {
                return PathBuf::from(dir);
            }
        }
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME)
    }

    /// Seeded generator when a seed is given, otherwise seeded from the OS.
    pub fn rng(seed: Option<u64>) -> Box<dyn RngCore> {
        let seed = seed.unwrap_or_else(|| rand::rng().next_u64());
        Box::new(StdRng::seed_from_u64(seed))
    }
}
