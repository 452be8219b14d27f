use std::{path::PathBuf, str::FromStr};

use farmdb::{
    NutrientFormat, DEFAULT_CSV_PATH, DEFAULT_DATABASE_PATH, DEFAULT_JSON_PATH,
    DEFAULT_REPORT_PATH,
};
use tracing::Level;

use crate::{FarmMinderError, FarmMinderResult};

/// Runtime settings, read from the environment (and an optional `.env`
/// file in the working directory)
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub database_path: PathBuf,
    pub csv_path: PathBuf,
    pub json_path: PathBuf,
    pub report_path: PathBuf,
    pub log_dir: PathBuf,
    pub log_level: Level,
    pub nutrient_format: NutrientFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: DEFAULT_DATABASE_PATH.into(),
            csv_path: DEFAULT_CSV_PATH.into(),
            json_path: DEFAULT_JSON_PATH.into(),
            report_path: DEFAULT_REPORT_PATH.into(),
            log_dir: "./logs".into(),
            log_level: Level::INFO,
            nutrient_format: NutrientFormat::Presence,
        }
    }
}

impl Config {
    pub fn from_env() -> FarmMinderResult<Self> {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from any key lookup, unset keys keep their default
    pub fn from_lookup<F>(lookup: F) -> FarmMinderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();
        let path = |key: &str, target: &mut PathBuf| {
            if let Some(value) = lookup(key).filter(|v| !v.trim().is_empty()) {
                *target = PathBuf::from(value.trim());
            }
        };

        path("FARM_DATABASE_PATH", &mut config.database_path);
        path("FARM_CSV_PATH", &mut config.csv_path);
        path("FARM_JSON_PATH", &mut config.json_path);
        path("FARM_REPORT_PATH", &mut config.report_path);
        path("FARM_LOG_DIR", &mut config.log_dir);

        if let Some(level) = lookup("FARM_LOG_LEVEL") {
            config.log_level = Level::from_str(level.trim()).map_err(|_| {
                FarmMinderError::Config(format!("FARM_LOG_LEVEL {level:?} is not a log level"))
            })?;
        }

        if let Some(format) = lookup("FARM_NUTRIENT_FORMAT") {
            config.nutrient_format = format
                .parse()
                .map_err(|e| FarmMinderError::Config(format!("FARM_NUTRIENT_FORMAT: {e}")))?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<HashMap<_, _>>();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.database_path, PathBuf::from("dados_agricolas.db"));
        assert_eq!(config.csv_path, PathBuf::from("dados_sensores.csv"));
    }

    #[test]
    fn overrides_from_env() {
        let config = Config::from_lookup(lookup(&[
            ("FARM_DATABASE_PATH", "/var/lib/farm/readings.db"),
            ("FARM_CSV_PATH", " out.csv "),
            ("FARM_LOG_LEVEL", "debug"),
            ("FARM_NUTRIENT_FORMAT", "level"),
            ("FARM_JSON_PATH", ""),
        ]))
        .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/var/lib/farm/readings.db"));
        assert_eq!(config.csv_path, PathBuf::from("out.csv"));
        assert_eq!(config.json_path, PathBuf::from(DEFAULT_JSON_PATH));
        assert_eq!(config.log_level, Level::DEBUG);
        assert_eq!(config.nutrient_format, NutrientFormat::Level);
    }

    #[test]
    fn invalid_values_are_errors() {
        assert!(matches!(
            Config::from_lookup(lookup(&[("FARM_LOG_LEVEL", "loud")])),
            Err(FarmMinderError::Config(_))
        ));
        assert!(matches!(
            Config::from_lookup(lookup(&[("FARM_NUTRIENT_FORMAT", "ppm")])),
            Err(FarmMinderError::Config(_))
        ));
    }
}
