//! Client-side preferences.
//!
//! The only value persisted across runs is the color theme, stored under
//! [`THEME_KEY`] in a small JSON file.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use serde_json::{from_reader, to_writer_pretty};

use crate::error::{Error, Result};

/// Key the theme is stored under.
pub const THEME_KEY: &str = "kovcheg_theme";

/// Color theme.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

impl Theme {
    /// The stored representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Dark => "dark",
            Theme::Light => "light",
        }
    }

    /// The other theme.
    pub fn toggled(self) -> Self {
        match self {
            Theme::Dark => Theme::Light,
            Theme::Light => Theme::Dark,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Theme {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "dark" => Ok(Theme::Dark),
            "light" => Ok(Theme::Light),
            other => Err(Error::validation(
                format!("unknown theme: {other}"),
                Some(THEME_KEY.to_string()),
            )),
        }
    }
}

/// String key-value storage that outlives the process.
pub trait Preferences: Send + Sync {
    /// Reads a value.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores a value, replacing any previous one.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Reads the stored theme, falling back to [`Theme::Dark`] when it is
    /// missing, unreadable, or not a known theme.
    fn theme(&self) -> Theme {
        self.get(THEME_KEY)
            .ok()
            .flatten()
            .and_then(|value| value.parse().ok())
            .unwrap_or_default()
    }

    /// Stores the theme.
    fn set_theme(&self, theme: Theme) -> Result<()> {
        self.set(THEME_KEY, theme.as_str())
    }
}

/// Preferences kept in a JSON file.
#[derive(Debug, Clone)]
pub struct FilePreferences {
    path: PathBuf,
}

impl FilePreferences {
    /// Uses `path`; the file and its directory are created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<PreferencesFile> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(PreferencesFile::new()),
            Err(err) => return Err(Error::io("failed to open preferences file", err)),
        };
        from_reader(BufReader::new(file)).map_err(|err| {
            Error::serialization("failed to parse preferences", Some(Box::new(err)))
        })
    }

    fn store(&self, prefs: &PreferencesFile) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|err| Error::io("failed to create preferences directory", err))?;
        }
        let file = File::create(&self.path)
            .map_err(|err| Error::io("failed to create preferences file", err))?;
        to_writer_pretty(BufWriter::new(file), prefs).map_err(|err| {
            Error::serialization("failed to serialize preferences", Some(Box::new(err)))
        })
    }
}

impl Preferences for FilePreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        // An unreadable file is replaced rather than blocking the write.
        let mut prefs = self.load().unwrap_or_else(|_| PreferencesFile::new());
        prefs.entries.insert(key.to_string(), value.to_string());
        self.store(&prefs)
    }
}

/// In-memory preferences.
///
/// Clones share storage, so a clone handed to a second controller sees what
/// the first one stored.
#[derive(Debug, Default, Clone)]
pub struct MemoryPreferences {
    entries: Arc<Mutex<BTreeMap<String, String>>>,
}

impl MemoryPreferences {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Preferences for MemoryPreferences {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

#[derive(Serialize, Deserialize)]
struct PreferencesFile {
    version: u8,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

impl PreferencesFile {
    fn new() -> Self {
        Self {
            version: 1,
            entries: BTreeMap::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn scratch_path(name: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        std::env::temp_dir()
            .join(format!("kovcheg-prefs-{}-{nanos}", std::process::id()))
            .join(name)
    }

    #[test]
    fn theme_parses_and_toggles() {
        assert_eq!("dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert_eq!("light".parse::<Theme>().unwrap(), Theme::Light);
        assert!("sepia".parse::<Theme>().unwrap_err().is_validation());
        assert_eq!(Theme::Dark.toggled(), Theme::Light);
        assert_eq!(Theme::Light.toggled().to_string(), "dark");
    }

    #[test]
    fn missing_theme_defaults_to_dark() {
        let prefs = MemoryPreferences::new();
        assert_eq!(prefs.theme(), Theme::Dark);

        prefs.set(THEME_KEY, "neon").unwrap();
        assert_eq!(prefs.theme(), Theme::Dark);
    }

    #[test]
    fn memory_clones_share_storage() {
        let prefs = MemoryPreferences::new();
        let reloaded = prefs.clone();
        prefs.set_theme(Theme::Light).unwrap();
        assert_eq!(reloaded.theme(), Theme::Light);
    }

    #[test]
    fn file_preferences_survive_reopen() {
        let path = scratch_path("preferences.json");
        let prefs = FilePreferences::new(&path);
        assert_eq!(prefs.get(THEME_KEY).unwrap(), None);

        prefs.set_theme(Theme::Light).unwrap();
        prefs.set("other", "value").unwrap();

        let reopened = FilePreferences::new(&path);
        assert_eq!(reopened.theme(), Theme::Light);
        assert_eq!(reopened.get("other").unwrap().as_deref(), Some("value"));

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": 1"));
        assert!(raw.contains("\"kovcheg_theme\": \"light\""));

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn corrupt_file_is_replaced_on_write() {
        let path = scratch_path("preferences.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "{not json").unwrap();

        let prefs = FilePreferences::new(&path);
        assert!(prefs.get(THEME_KEY).unwrap_err().is_serialization());
        assert_eq!(prefs.theme(), Theme::Dark);

        prefs.set_theme(Theme::Light).unwrap();
        assert_eq!(prefs.theme(), Theme::Light);

        let _ = fs::remove_dir_all(path.parent().unwrap());
    }
}
