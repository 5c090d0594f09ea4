use std::{env, fmt::Display, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PresetRoom {
    pub name: String,
    pub duration: f64,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub allowed_origin: String,

    /// XP needed per level; level = xp / xp_per_level + 1.
    pub xp_per_level: i64,

    /// Tolerance subtracted from the room duration when deciding whether a
    /// session counts as completed.
    pub grace_minutes: f64,

    /// Presence records older than this are treated as offline.
    pub presence_window_ms: i64,

    pub presets: Vec<PresetRoom>,
}

impl Config {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", "3000"),
            allowed_origin: try_load("ALLOWED_ORIGIN", "http://localhost:5173"),
            xp_per_level: try_load("XP_PER_LEVEL", "100"),
            grace_minutes: try_load("GRACE_MINUTES", "1"),
            presence_window_ms: try_load::<i64>("PRESENCE_WINDOW_SECS", "30") * 1000,
            presets: default_presets(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            allowed_origin: "http://localhost:5173".to_string(),
            xp_per_level: 100,
            grace_minutes: 1.0,
            presence_window_ms: 30_000,
            presets: default_presets(),
        }
    }
}

fn default_presets() -> Vec<PresetRoom> {
    [("Quick Break", 15.0), ("Focus Session", 25.0), ("Deep Work", 45.0)]
        .into_iter()
        .map(|(name, duration)| PresetRoom {
            name: name.to_string(),
            duration,
        })
        .collect()
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
        })
        .expect("Environment misconfigured!")
}
