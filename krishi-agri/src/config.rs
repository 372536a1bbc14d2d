//! Environment-driven configuration for the agriculture services

use crate::error::{AgriError, AgriResult};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
pub const DEFAULT_OPEN_METEO_ARCHIVE_URL: &str = "https://archive-api.open-meteo.com/v1/archive";
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

#[derive(Debug, Clone)]
pub struct AgriConfig {
    pub open_meteo_url: String,
    pub open_meteo_archive_url: String,
    pub weather_timeout: Duration,
    pub archive_timeout: Duration,
    pub crop_model_path: PathBuf,
    pub neighbours_csv: PathBuf,
    pub crop_prices_csv: PathBuf,
    pub ecocrop_csv: PathBuf,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub gemini_base_url: String,
    /// Exchanges replayed to the model on every chat turn
    pub chat_memory_turns: usize,
    pub chat_max_sessions: usize,
    pub chat_session_ttl: Duration,
}

impl Default for AgriConfig {
    fn default() -> Self {
        Self {
            open_meteo_url: DEFAULT_OPEN_METEO_URL.to_string(),
            open_meteo_archive_url: DEFAULT_OPEN_METEO_ARCHIVE_URL.to_string(),
            weather_timeout: Duration::from_secs(25),
            archive_timeout: Duration::from_secs(40),
            crop_model_path: PathBuf::from("artifacts/crop_model.json"),
            neighbours_csv: PathBuf::from("artifacts/neighbours_data.csv"),
            crop_prices_csv: PathBuf::from("artifacts/crop_prices_yield_revenue.csv"),
            ecocrop_csv: PathBuf::from("artifacts/cleaned_EcoCrop_DB.csv"),
            google_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            gemini_base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            chat_memory_turns: 10,
            chat_max_sessions: 1000,
            chat_session_ttl: Duration::from_secs(3600),
        }
    }
}

fn parse_number<T: FromStr>(key: &str, value: Option<String>, default: T) -> AgriResult<T> {
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AgriError::Config(format!("{key} must be a number, got {raw:?}"))),
        None => Ok(default),
    }
}

/// Like [`parse_number`], rejecting an explicit zero
fn parse_positive<T>(key: &str, value: Option<String>, default: T) -> AgriResult<T>
where
    T: FromStr + Default + PartialEq,
{
    let parsed = parse_number(key, value, default)?;
    if parsed == T::default() {
        return Err(AgriError::Config(format!("{key} must be at least 1")));
    }
    Ok(parsed)
}

impl AgriConfig {
    pub fn from_env() -> AgriResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary key lookup; blank values count as unset
    pub fn from_lookup<F>(lookup: F) -> AgriResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let d = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let weather_secs = parse_positive(
            "WEATHER_TIMEOUT_SECS",
            get("WEATHER_TIMEOUT_SECS"),
            d.weather_timeout.as_secs(),
        )?;
        let ttl_secs = parse_positive(
            "CHAT_SESSION_TTL_SECS",
            get("CHAT_SESSION_TTL_SECS"),
            d.chat_session_ttl.as_secs(),
        )?;
        let max_sessions = parse_positive(
            "CHAT_MAX_SESSIONS",
            get("CHAT_MAX_SESSIONS"),
            d.chat_max_sessions,
        )?;

        Ok(Self {
            open_meteo_url: get("OPEN_METEO_URL").unwrap_or(d.open_meteo_url),
            open_meteo_archive_url: get("OPEN_METEO_ARCHIVE_URL")
                .unwrap_or(d.open_meteo_archive_url),
            weather_timeout: Duration::from_secs(weather_secs),
            archive_timeout: d.archive_timeout.max(Duration::from_secs(weather_secs)),
            crop_model_path: get("CROP_MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(d.crop_model_path),
            neighbours_csv: get("NEIGHBOURS_CSV")
                .map(PathBuf::from)
                .unwrap_or(d.neighbours_csv),
            crop_prices_csv: get("CROP_PRICES_CSV")
                .map(PathBuf::from)
                .unwrap_or(d.crop_prices_csv),
            ecocrop_csv: get("ECOCROP_CSV")
                .map(PathBuf::from)
                .unwrap_or(d.ecocrop_csv),
            google_api_key: get("GOOGLE_API_KEY"),
            gemini_model: get("GEMINI_MODEL").unwrap_or(d.gemini_model),
            gemini_base_url: get("GEMINI_BASE_URL").unwrap_or(d.gemini_base_url),
            chat_memory_turns: parse_number(
                "CHAT_MEMORY_TURNS",
                get("CHAT_MEMORY_TURNS"),
                d.chat_memory_turns,
            )?,
            chat_max_sessions: max_sessions,
            chat_session_ttl: Duration::from_secs(ttl_secs),
        })
    }
}
