//! Runtime configuration and the CSV column catalogue.
//!
//! Values come from the process environment (after `.env` is loaded by
//! `dotenvy` in `main`):
//!
//! | Variable               | Default          |
//! |------------------------|------------------|
//! | `DATABASE_PATH`        | `airweather.db`  |
//! | `CITY_ID`              | `1` (Jakarta)    |
//! | `CITY_AGG_LOCATION_ID` | `6` (`CITY_AGG_JKT`) |
//! | `INCOMING_DIR`         | `INCOMING`       |

use std::path::PathBuf;

use crate::error::ConfigError;

pub const DEFAULT_CITY_ID: i64 = 1;
pub const CITY_AGG_LOCATION_ID: i64 = 6;

pub const REQUIRED_WEATHER_COLS: &[&str] = &[
    "TANGGAL", "TN", "TX", "TAVG", "RH_AVG", "RR", "SS", "FF_X", "DDD_X", "FF_AVG", "DDD_CAR",
];
pub const REQUIRED_ISPU_COLS: &[&str] = &[
    "tanggal", "stasiun", "pm25", "pm10", "so2", "co", "o3", "no2", "max", "critical", "categori",
];

/// Weather CSV column -> canonical attribute code. `DDD_CAR` is dropped.
pub const WEATHER_RENAME: &[(&str, &str)] = &[
    ("TN", "suhu_min"),
    ("TX", "suhu_max"),
    ("TAVG", "suhu_avg"),
    ("RH_AVG", "kelembapan_avg"),
    ("RR", "curah_hujan"),
    ("SS", "durasi_penyinaran"),
    ("FF_X", "kecepatan_angin_max"),
    ("DDD_X", "arah_angin_max"),
    ("FF_AVG", "kecepatan_angin_avg"),
];

/// Pollutant columns loaded as observations; codes equal the column names.
pub const POLLUTANT_CODES: &[&str] = &["pm25", "pm10", "so2", "co", "o3", "no2"];

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub city_id: i64,
    pub city_agg_location_id: i64,
    pub incoming_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from("airweather.db"),
            city_id: DEFAULT_CITY_ID,
            city_agg_location_id: CITY_AGG_LOCATION_ID,
            incoming_dir: PathBuf::from("INCOMING"),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from any key lookup; unset or blank keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&'static str) -> Option<String>,
    {
        let get = |key| lookup(key).filter(|v: &String| !v.trim().is_empty());
        let mut cfg = Self::default();

        if let Some(path) = get("DATABASE_PATH") {
            cfg.database_path = PathBuf::from(path);
        }
        if let Some(dir) = get("INCOMING_DIR") {
            cfg.incoming_dir = PathBuf::from(dir);
        }
        if let Some(raw) = get("CITY_ID") {
            cfg.city_id = parse_id("CITY_ID", &raw)?;
        }
        if let Some(raw) = get("CITY_AGG_LOCATION_ID") {
            cfg.city_agg_location_id = parse_id("CITY_AGG_LOCATION_ID", &raw)?;
        }

        Ok(cfg)
    }
}

fn parse_id(key: &'static str, raw: &str) -> Result<i64, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&'static str, &str)]) -> impl Fn(&'static str) -> Option<String> {
        let map: HashMap<&'static str, String> =
            pairs.iter().map(|(k, v)| (*k, v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.city_id, 1);
        assert_eq!(cfg.city_agg_location_id, 6);
    }

    #[test]
    fn test_overrides() {
        let cfg = AppConfig::from_lookup(lookup(&[
            ("DATABASE_PATH", "/tmp/aw.db"),
            ("CITY_ID", " 3 "),
            ("CITY_AGG_LOCATION_ID", "42"),
            ("INCOMING_DIR", ""),
        ]))
        .unwrap();
        assert_eq!(cfg.database_path, PathBuf::from("/tmp/aw.db"));
        assert_eq!(cfg.city_id, 3);
        assert_eq!(cfg.city_agg_location_id, 42);
        assert_eq!(cfg.incoming_dir, PathBuf::from("INCOMING"));
    }

    #[test]
    fn test_invalid_number() {
        let err = AppConfig::from_lookup(lookup(&[("CITY_ID", "jakarta")])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "CITY_ID", .. }));
    }

    #[test]
    fn test_rename_covers_required_weather_columns() {
        for (col, _) in WEATHER_RENAME {
            assert!(REQUIRED_WEATHER_COLS.contains(col));
        }
    }
}
