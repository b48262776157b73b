//! Configuration types for the chat application.
//!
//! This module provides CLI argument parsing via `arrrg` and configuration
//! structures for controlling chat behavior.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use arrrg_derive::CommandLine;

/// Default timeout for requests that do not stream, in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Preferences file relative to the home directory.
const PREFERENCES_DIR: &str = ".kovcheg";
const PREFERENCES_FILE: &str = "preferences.json";

/// Command-line arguments for the kovcheg-chat tool.
#[derive(CommandLine, Debug, Default, PartialEq, Eq)]
pub struct ChatArgs {
    /// Base URL of the chat service.
    #[arrrg(optional, "API base URL (default: $KOVCHEG_API_URL or http://localhost:8000/api/v1/)", "URL")]
    pub base_url: Option<String>,

    /// Request timeout in seconds.
    #[arrrg(optional, "Request timeout in seconds (default: 60)", "SECS")]
    pub timeout_secs: Option<u64>,

    /// Path of the preferences file.
    #[arrrg(optional, "Preferences file (default: ~/.kovcheg/preferences.json)", "PATH")]
    pub prefs: Option<String>,

    /// Disable ANSI colors and styles.
    #[arrrg(flag, "Disable ANSI colors/styles")]
    pub no_color: bool,

    /// Log requests and stream lines to stderr.
    #[arrrg(flag, "Log requests and stream events to stderr")]
    pub verbose: bool,
}

/// Configuration for a chat session.
///
/// This struct holds the resolved configuration values after processing
/// command-line arguments with appropriate defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    /// Base URL override; `None` defers to the environment and then the
    /// built-in default.
    pub base_url: Option<String>,

    /// Timeout for connection setup and for requests that do not stream.
    pub timeout: Duration,

    /// Where the theme preference is stored.
    pub preferences_path: PathBuf,

    /// Whether to use ANSI colors and styles in output.
    pub use_color: bool,

    /// Whether to log requests and stream events to stderr.
    pub verbose: bool,
}

impl ChatConfig {
    /// Creates a new ChatConfig with default values.
    ///
    /// Defaults:
    /// - Base URL: from the environment, else local
    /// - Timeout: 60 seconds
    /// - Color: enabled
    /// - Verbose: disabled
    pub fn new() -> Self {
        Self {
            base_url: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            preferences_path: default_preferences_path(),
            use_color: true,
            verbose: false,
        }
    }

    /// Sets the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Sets the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the preferences file.
    pub fn with_preferences_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.preferences_path = path.into();
        self
    }

    /// Disables ANSI color output.
    pub fn without_color(mut self) -> Self {
        self.use_color = false;
        self
    }

    /// Enables stderr logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl From<ChatArgs> for ChatConfig {
    fn from(args: ChatArgs) -> Self {
        let defaults = ChatConfig::new();
        ChatConfig {
            base_url: args.base_url,
            timeout: args
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            preferences_path: args
                .prefs
                .map(PathBuf::from)
                .unwrap_or(defaults.preferences_path),
            use_color: !args.no_color,
            verbose: args.verbose,
        }
    }
}

fn default_preferences_path() -> PathBuf {
    let home = env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(PREFERENCES_DIR).join(PREFERENCES_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ChatConfig::new();
        assert!(config.base_url.is_none());
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert!(config.preferences_path.ends_with(".kovcheg/preferences.json"));
        assert!(config.use_color);
        assert!(!config.verbose);
    }

    #[test]
    fn config_from_args_defaults() {
        let args = ChatArgs::default();
        let config = ChatConfig::from(args);
        assert_eq!(config, ChatConfig::new());
    }

    #[test]
    fn config_from_args_custom() {
        let args = ChatArgs {
            base_url: Some("http://ark.local:9000/api/v1/".to_string()),
            timeout_secs: Some(5),
            prefs: Some("/tmp/kovcheg.json".to_string()),
            no_color: true,
            verbose: true,
        };
        let config = ChatConfig::from(args);
        assert_eq!(
            config.base_url.as_deref(),
            Some("http://ark.local:9000/api/v1/")
        );
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.preferences_path, PathBuf::from("/tmp/kovcheg.json"));
        assert!(!config.use_color);
        assert!(config.verbose);
    }

    #[test]
    fn config_builder_pattern() {
        let config = ChatConfig::new()
            .with_base_url("https://ark.example.com/api/v1/")
            .with_timeout(Duration::from_secs(10))
            .with_preferences_path("prefs.json")
            .without_color()
            .with_verbose(true);

        assert_eq!(
            config.base_url.as_deref(),
            Some("https://ark.example.com/api/v1/")
        );
        assert_eq!(config.timeout, Duration::from_secs(10));
        assert_eq!(config.preferences_path, PathBuf::from("prefs.json"));
        assert!(!config.use_color);
        assert!(config.verbose);
    }
}
