use std::env;
use std::ops::RangeInclusive;
use std::time::Duration;

use anyhow::{anyhow, Result};
use go_core::RowOrigin;

use crate::engine::{Backend, EngineCommand};

/// Strength values accepted from requests and `DEFAULT_STRENGTH`.
pub const STRENGTH_RANGE: RangeInclusive<i32> = 0..=20;

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub backend: Backend,
    /// Engine program and base arguments for the active backend
    pub engine: EngineCommand,
    /// Bound on every read from the engine
    pub engine_timeout: Duration,
    /// Log full GTP traffic at info level
    pub engine_trace: bool,
    pub default_strength: i32,
    /// Stop reading `kata-analyze` after this many reported candidates
    pub max_candidates: usize,
    /// `kata-analyze` reporting interval in centiseconds
    pub analysis_interval: u32,
    pub row_origin: RowOrigin,
}

impl Config {
    /// Defaults for `backend` running `engine`.
    pub fn new(backend: Backend, engine: EngineCommand) -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            backend,
            engine,
            engine_timeout: Duration::from_secs(30),
            engine_trace: false,
            default_strength: 10,
            max_candidates: 1000,
            analysis_interval: 1,
            row_origin: RowOrigin::Top,
        }
    }

    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the config from `lookup`, which maps a variable name to its value.
    ///
    /// Unknown backends or row origins and an out of range default strength
    /// are errors. Numbers that do not parse fall back to the defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let trimmed = |name: &str| lookup(name).map(|v| v.trim().to_string());

        let backend: Backend = lookup("ENGINE_BACKEND")
            .unwrap_or_else(|| "katago-weak".to_string())
            .parse()
            .map_err(|e: String| anyhow!(e))?;

        let mut config = Self::new(backend, engine_from_lookup(backend, &lookup));

        if let Some(host) = lookup("HOST") {
            config.host = host;
        }
        config.port = trimmed("PORT")
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.port);
        config.engine_timeout = trimmed("ENGINE_TIMEOUT_MS")
            .and_then(|v| v.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(config.engine_timeout);
        config.engine_trace = lookup("ENGINE_TRACE")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
            .unwrap_or(false);
        config.default_strength = trimmed("DEFAULT_STRENGTH")
            .and_then(|v| v.parse().ok())
            .unwrap_or(config.default_strength);
        if !STRENGTH_RANGE.contains(&config.default_strength) {
            return Err(anyhow!(
                "DEFAULT_STRENGTH must be between {} and {}, got {}",
                STRENGTH_RANGE.start(),
                STRENGTH_RANGE.end(),
                config.default_strength
            ));
        }
        config.max_candidates = trimmed("ANALYSIS_MAX_CANDIDATES")
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(config.max_candidates);
        config.analysis_interval = trimmed("ANALYSIS_INTERVAL")
            .and_then(|v| v.parse().ok())
            .filter(|n| *n > 0)
            .unwrap_or(config.analysis_interval);
        if let Some(origin) = lookup("GTP_ROW_ORIGIN") {
            config.row_origin = origin.parse().map_err(|e: String| anyhow!(e))?;
        }

        Ok(config)
    }
}

/// Backend defaults, then `ENGINE_PATH` / `ENGINE_ARGS` overrides.
fn engine_from_lookup(backend: Backend, lookup: impl Fn(&str) -> Option<String>) -> EngineCommand {
    let var_or = |name: &str, default: &str| lookup(name).unwrap_or_else(|| default.to_string());

    let (program, args) = match backend {
        Backend::GnuGo => (
            var_or("GNUGO_PATH", "gnugo"),
            vec!["--mode".to_string(), "gtp".to_string()],
        ),
        Backend::KataGo | Backend::KataGoWeak => (
            var_or("KATAGO_PATH", "katago"),
            vec![
                "gtp".to_string(),
                "-model".to_string(),
                var_or("KATAGO_MODEL", "./kata1-strongest.bin.gz"),
                "-config".to_string(),
                var_or("KATAGO_CONFIG", "./katago.cfg"),
            ],
        ),
    };

    EngineCommand {
        program: lookup("ENGINE_PATH").unwrap_or(program),
        args: lookup("ENGINE_ARGS")
            .map(|v| v.split_whitespace().map(String::from).collect())
            .unwrap_or(args),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_without_variables() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.backend, Backend::KataGoWeak);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 5000);
        assert_eq!(config.engine.program, "katago");
        assert_eq!(
            config.engine.args,
            vec!["gtp", "-model", "./kata1-strongest.bin.gz", "-config", "./katago.cfg"]
        );
        assert_eq!(config.default_strength, 10);
        assert_eq!(config.row_origin, RowOrigin::Top);
    }

    #[test]
    fn test_unknown_backend_fails() {
        assert!(config_from(&[("ENGINE_BACKEND", "leela")]).is_err());
    }

    #[test]
    fn test_unknown_row_origin_fails() {
        assert!(config_from(&[("GTP_ROW_ORIGIN", "sideways")]).is_err());
        let config = config_from(&[("GTP_ROW_ORIGIN", "bottom")]).unwrap();
        assert_eq!(config.row_origin, RowOrigin::Bottom);
    }

    #[test]
    fn test_bad_numbers_fall_back() {
        let config = config_from(&[
            ("PORT", "abc"),
            ("ANALYSIS_MAX_CANDIDATES", "0"),
            ("ANALYSIS_INTERVAL", "-3"),
            ("ENGINE_TIMEOUT_MS", "soon"),
        ])
        .unwrap();
        assert_eq!(config.port, 5000);
        assert_eq!(config.max_candidates, 1000);
        assert_eq!(config.analysis_interval, 1);
        assert_eq!(config.engine_timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_numbers_are_read() {
        let config = config_from(&[
            ("PORT", " 8080 "),
            ("ENGINE_TIMEOUT_MS", "1500"),
            ("ENGINE_TRACE", "Yes"),
            ("DEFAULT_STRENGTH", "3"),
        ])
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.engine_timeout, Duration::from_millis(1500));
        assert!(config.engine_trace);
        assert_eq!(config.default_strength, 3);
    }

    #[test]
    fn test_default_strength_out_of_range_fails() {
        assert!(config_from(&[("DEFAULT_STRENGTH", "50")]).is_err());
        assert!(config_from(&[("DEFAULT_STRENGTH", "-1")]).is_err());
        assert!(config_from(&[("DEFAULT_STRENGTH", "20")]).is_ok());
    }

    #[test]
    fn test_gnugo_paths() {
        let config = config_from(&[
            ("ENGINE_BACKEND", "gnugo"),
            ("GNUGO_PATH", "/usr/games/gnugo"),
        ])
        .unwrap();
        assert_eq!(config.engine.program, "/usr/games/gnugo");
        assert_eq!(config.engine.args, vec!["--mode", "gtp"]);
    }

    #[test]
    fn test_engine_overrides() {
        let config = config_from(&[
            ("ENGINE_BACKEND", "katago"),
            ("ENGINE_PATH", "/opt/engine"),
            ("ENGINE_ARGS", "  gtp   -config\tfast.cfg "),
        ])
        .unwrap();
        assert_eq!(config.engine.program, "/opt/engine");
        assert_eq!(config.engine.args, vec!["gtp", "-config", "fast.cfg"]);
    }
}
