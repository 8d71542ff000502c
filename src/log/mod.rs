//! Logging for the simulation engine, built on the `log` facade.
//!
//! The five `log` macros are re-exported from here. The engine logs network generation and run
//! termination at `info`, one line per simulated day at `debug`, and the phases of each day at
//! `trace`. Reports are a separate concern; see [`crate::report`].
//!
//! Nothing is logged until a level is set. The `epinet` binary takes `--log-level <level>` for
//! the whole crate and `--log-filter <module>=<level>` to override it for one module:
//!
//! ```rust
//! use epinet::log::{set_log_level, set_module_filters, LevelFilter};
//!
//! // Daily summaries, plus every phase of the daily step.
//! set_log_level(LevelFilter::Debug);
//! set_module_filters(&[("epinet::simulation".to_string(), LevelFilter::Trace)]);
//! ```
#[cfg(feature = "logging")]
mod standard_logger;

#[cfg(not(feature = "logging"))]
mod null_logger;

use std::str::FromStr;
use std::sync::{LazyLock, Mutex, MutexGuard, PoisonError};

pub use log::{debug, error, info, trace, warn, LevelFilter};

use crate::hashing::HashMap;

/// Random streams are reseeded several times a day; silence them unless asked for.
const QUIET_MODULES: [&str; 1] = ["epinet::random"];

static LOG_SETTINGS: LazyLock<Mutex<LogSettings>> = LazyLock::new(Mutex::default);

/// The crate-wide level and the per-module overrides currently in force.
#[derive(Debug)]
pub(in crate::log) struct LogSettings {
    pub(in crate::log) level: LevelFilter,
    pub(in crate::log) module_levels: HashMap<String, LevelFilter>,
    #[cfg(feature = "logging")]
    handle: Option<log4rs::Handle>,
}

impl Default for LogSettings {
    fn default() -> Self {
        LogSettings {
            level: LevelFilter::Off,
            module_levels: QUIET_MODULES
                .iter()
                .map(|module| ((*module).to_string(), LevelFilter::Off))
                .collect(),
            #[cfg(feature = "logging")]
            handle: None,
        }
    }
}

fn settings() -> MutexGuard<'static, LogSettings> {
    // The settings stay usable even if a thread panicked while holding them.
    LOG_SETTINGS.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Sets the level for every module without an override. `LevelFilter::Off` silences them.
pub fn set_log_level(level: LevelFilter) {
    let mut settings = settings();
    settings.level = level;
    settings.apply();
}

/// Overrides the level of each listed module path, e.g. `"epinet::simulation"`.
pub fn set_module_filters(filters: &[(String, LevelFilter)]) {
    if filters.is_empty() {
        return;
    }
    let mut settings = settings();
    for (module, level) in filters {
        settings.module_levels.insert(module.clone(), *level);
    }
    settings.apply();
}

/// Parses a `module=level` pair, as given to `--log-filter`.
///
/// # Errors
///
/// Returns a message if the `=` is missing, the module is empty or the level is unknown.
pub fn parse_module_filter(text: &str) -> Result<(String, LevelFilter), String> {
    let (module, level) = text
        .split_once('=')
        .ok_or_else(|| format!("expected <module>=<level>, got `{text}`"))?;
    let module = module.trim();
    if module.is_empty() {
        return Err(format!("missing module path in `{text}`"));
    }
    let level = LevelFilter::from_str(level.trim())
        .map_err(|_| format!("unknown log level `{}`", level.trim()))?;
    Ok((module.to_string(), level))
}

#[cfg(test)]
mod tests {
    use std::sync::{LazyLock, Mutex, PoisonError};

    use super::*;

    // The settings are global; tests that change them take turns.
    static SERIAL: LazyLock<Mutex<()>> = LazyLock::new(Mutex::default);

    #[test]
    fn level_reaches_log_facade() {
        let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        set_log_level(LevelFilter::Warn);
        assert_eq!(settings().level, LevelFilter::Warn);
        assert!(log::max_level() >= LevelFilter::Warn);
        set_log_level(LevelFilter::Off);
        assert_eq!(settings().level, LevelFilter::Off);
    }

    #[test]
    fn module_overrides_accumulate() {
        let _serial = SERIAL.lock().unwrap_or_else(PoisonError::into_inner);
        assert_eq!(
            settings().module_levels.get("epinet::random"),
            Some(&LevelFilter::Off)
        );
        set_module_filters(&[
            ("epinet::simulation".to_string(), LevelFilter::Trace),
            ("epinet::network".to_string(), LevelFilter::Info),
        ]);
        {
            let settings = settings();
            assert_eq!(
                settings.module_levels.get("epinet::simulation"),
                Some(&LevelFilter::Trace)
            );
            assert_eq!(settings.module_levels.len(), 3);
        }
        set_module_filters(&[
            ("epinet::simulation".to_string(), LevelFilter::Off),
            ("epinet::network".to_string(), LevelFilter::Off),
        ]);
        set_log_level(LevelFilter::Off);
    }

    #[test]
    fn parses_module_filters() {
        assert_eq!(
            parse_module_filter("epinet::simulation=trace"),
            Ok(("epinet::simulation".to_string(), LevelFilter::Trace))
        );
        assert_eq!(
            parse_module_filter(" epinet::report = WARN "),
            Ok(("epinet::report".to_string(), LevelFilter::Warn))
        );
        assert!(parse_module_filter("epinet::simulation").is_err());
        assert!(parse_module_filter("=debug").is_err());
        assert!(parse_module_filter("epinet=loud").is_err());
    }
}
