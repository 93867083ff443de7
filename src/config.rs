use std::env;

use log::LevelFilter;

use crate::loader::LoaderOptions;

pub const TRACE_VAR: &str = "LS8_TRACE";
pub const WARN_UNPARSABLE_VAR: &str = "LS8_WARN_UNPARSABLE";

/// Runtime switches that sit outside the command line.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub trace: bool,
    pub warn_unparsable: bool,
    pub log_level: LevelFilter,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            trace: false,
            warn_unparsable: false,
            log_level: LevelFilter::Warn,
        }
    }
}

fn truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn from_env() -> Config {
        Config::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Config {
        let flag = |key: &str| lookup(key).is_some_and(|value| truthy(&value));

        Config {
            trace: flag(TRACE_VAR),
            warn_unparsable: flag(WARN_UNPARSABLE_VAR),
            ..Config::default()
        }
    }

    pub fn loader_options(&self) -> LoaderOptions {
        LoaderOptions {
            warn_unparsable: self.warn_unparsable,
        }
    }
}
