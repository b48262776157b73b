use serde::{Deserialize, Serialize};

/// Title shown for a module whose listing entry has none.
pub const DEFAULT_MODULE_TITLE: &str = "Untitled Module";

/// Version shown for a module whose listing entry has none.
pub const DEFAULT_MODULE_VERSION: &str = "1.0";

/// Size shown for a module whose listing entry has none.
pub const DEFAULT_MODULE_SIZE: &str = "Unknown";

/// Description shown for a module whose listing entry has none.
pub const DEFAULT_MODULE_DESCRIPTION: &str = "Local knowledge container";

/// A module entry exactly as the listing endpoint returns it.
///
/// Only `id` is guaranteed. Convert into [`Module`] before rendering; that
/// conversion is the single place where defaults are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ModuleRecord {
    /// Opaque module identifier.
    pub id: String,

    /// Human-readable title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,

    /// Module version string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,

    /// Display size, already formatted by the server.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<String>,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether the module carries a verified signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub verified: Option<bool>,
}

impl ModuleRecord {
    /// Creates a record carrying only an id.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    /// Sets the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the verified flag.
    pub fn with_verified(mut self, verified: bool) -> Self {
        self.verified = Some(verified);
        self
    }
}

/// A document module with every display field resolved.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Module {
    /// Opaque module identifier.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Module version string.
    pub version: String,
    /// Display size.
    pub size: String,
    /// Free-form description.
    pub description: String,
    /// Whether the module carries a verified signature.
    pub verified: bool,
}

impl Module {
    /// Applies the display defaults to a raw listing entry.
    ///
    /// Empty strings count as absent.
    pub fn normalize(record: ModuleRecord) -> Self {
        fn or_default(value: Option<String>, default: &str) -> String {
            value
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        }

        Self {
            id: record.id,
            title: or_default(record.title, DEFAULT_MODULE_TITLE),
            version: or_default(record.version, DEFAULT_MODULE_VERSION),
            size: or_default(record.size, DEFAULT_MODULE_SIZE),
            description: or_default(record.description, DEFAULT_MODULE_DESCRIPTION),
            verified: record.verified.unwrap_or(false),
        }
    }
}

impl From<ModuleRecord> for Module {
    fn from(record: ModuleRecord) -> Self {
        Module::normalize(record)
    }
}
