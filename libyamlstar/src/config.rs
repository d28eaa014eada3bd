//! Loader configuration.

/// Environment variable that enables debug output in the binary.
pub const DEBUG_ENV: &str = "YAMLSTAR_DEBUG";

/// Settings threaded explicitly into [`crate::YamlStar`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Config {
    /// Emit `tracing` debug events for each boundary call.
    pub debug: bool,
}

impl Config {
    /// Read settings from the process environment. Debug output is on when
    /// `YAMLSTAR_DEBUG` is set to anything but an empty string, `0` or
    /// `false`.
    pub fn from_env() -> Self {
        let debug = std::env::var(DEBUG_ENV)
            .map(|value| is_truthy(&value))
            .unwrap_or(false);
        Self { debug }
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }
}

fn is_truthy(value: &str) -> bool {
    !matches!(value.trim(), "" | "0" | "false")
}
