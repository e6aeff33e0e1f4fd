//! Static configuration, read once at startup from `<base>/passboard.yaml`.
//!
//! Every field is optional. Relative paths resolve against the base
//! directory; [`Config::resolve`] turns the file-level [`Config`] into a
//! [`ResolvedConfig`] with absolute paths and typed durations.

use std::fmt;
use std::num::NonZeroU32;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{config_io_err, ConfigError};
use crate::store::RecordStore;
use crate::types::PriorityOrder;

/// Default config file name inside the base directory.
pub const CONFIG_FILE: &str = "passboard.yaml";

/// Environment variable through which extraction commands learn where to
/// write their snapshot.
pub const SNAPSHOT_ENV: &str = "PASSBOARD_SNAPSHOT";

// ---------------------------------------------------------------------------
// MaxAttempts
// ---------------------------------------------------------------------------

/// Attempt budget for the retry loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAttempts {
    Bounded(NonZeroU32),
    Unbounded,
}

impl MaxAttempts {
    pub const ONCE: MaxAttempts = MaxAttempts::Bounded(NonZeroU32::MIN);

    pub fn bounded(n: u32) -> Option<MaxAttempts> {
        NonZeroU32::new(n).map(MaxAttempts::Bounded)
    }

    /// Whether another attempt may follow attempt number `made` (1-based).
    pub fn allows_after(&self, made: u32) -> bool {
        match self {
            MaxAttempts::Bounded(max) => made < max.get(),
            MaxAttempts::Unbounded => true,
        }
    }
}

impl Default for MaxAttempts {
    fn default() -> Self {
        MaxAttempts::Bounded(NonZeroU32::new(120).unwrap_or(NonZeroU32::MIN))
    }
}

impl fmt::Display for MaxAttempts {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MaxAttempts::Bounded(n) => write!(f, "{n}"),
            MaxAttempts::Unbounded => write!(f, "unbounded"),
        }
    }
}

impl FromStr for MaxAttempts {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("unbounded") {
            return Ok(MaxAttempts::Unbounded);
        }
        let n: u32 = s
            .parse()
            .map_err(|_| format!("expected a positive attempt count or 'unbounded', got '{s}'"))?;
        MaxAttempts::bounded(n)
            .ok_or_else(|| "max attempts must be at least 1 (use 'unbounded' for no cap)".to_string())
    }
}

impl Serialize for MaxAttempts {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            MaxAttempts::Bounded(n) => serializer.serialize_u32(n.get()),
            MaxAttempts::Unbounded => serializer.serialize_str("unbounded"),
        }
    }
}

impl<'de> Deserialize<'de> for MaxAttempts {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Repr {
            Count(u32),
            Word(String),
        }
        match Repr::deserialize(deserializer)? {
            Repr::Count(n) => MaxAttempts::bounded(n).ok_or_else(|| {
                serde::de::Error::custom("max_attempts must be at least 1 (or \"unbounded\")")
            }),
            Repr::Word(word) => word.parse().map_err(serde::de::Error::custom),
        }
    }
}

// ---------------------------------------------------------------------------
// RegionMarker
// ---------------------------------------------------------------------------

/// Structural marker of the listing region inside the target document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegionMarker {
    /// Element name, e.g. `section`.
    pub tag: String,
    /// Class the element must carry.
    pub class: String,
    /// When set, written into the region's `aria-label` attribute on publish.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
}

impl Default for RegionMarker {
    fn default() -> Self {
        RegionMarker {
            tag: "section".to_string(),
            class: "list".to_string(),
            label: None,
        }
    }
}

impl fmt::Display for RegionMarker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} class=\"{}\">", self.tag, self.class)
    }
}

// ---------------------------------------------------------------------------
// Config (file shape)
// ---------------------------------------------------------------------------

/// Contents of `passboard.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Persisted dataset.
    pub store: PathBuf,
    /// Extraction snapshot slot; its mtime is the watermark.
    pub snapshot: PathBuf,
    /// Document whose listing region gets rewritten.
    pub document: PathBuf,
    /// Optional directory of `.tera` overrides for the listing template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_dir: Option<PathBuf>,
    /// Shell command that refreshes the snapshot slot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_command: Option<String>,
    pub extract_timeout_secs: u64,
    pub retry_interval_secs: u64,
    pub max_attempts: MaxAttempts,
    /// Skip publishing when the persisted dataset is empty or malformed
    /// instead of bootstrapping from an empty baseline.
    pub strict_baseline: bool,
    /// Canonical display order of known names.
    pub priority: Vec<String>,
    pub region: RegionMarker,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            store: PathBuf::from("output").join("records.json"),
            snapshot: PathBuf::from("output").join("snapshot.json"),
            document: PathBuf::from("index.html"),
            template_dir: None,
            extract_command: None,
            extract_timeout_secs: 120,
            retry_interval_secs: 30,
            max_attempts: MaxAttempts::default(),
            strict_baseline: false,
            priority: Vec::new(),
            region: RegionMarker::default(),
        }
    }
}

impl Config {
    /// Path of the default config file for `base_dir`.
    pub fn path_in(base_dir: &Path) -> PathBuf {
        base_dir.join(CONFIG_FILE)
    }

    /// Load configuration.
    ///
    /// With `explicit = None` the default file in `base_dir` is used and a
    /// missing file yields [`Config::default`]. An explicitly named file must
    /// exist.
    pub fn load_at(base_dir: &Path, explicit: Option<&Path>) -> Result<Config, ConfigError> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let path = Config::path_in(base_dir);
                if !path.exists() {
                    return Ok(Config::default());
                }
                path
            }
        };
        let contents = std::fs::read_to_string(&path).map_err(|e| config_io_err(&path, e))?;
        if contents.trim().is_empty() {
            return Ok(Config::default());
        }
        serde_yaml::from_str(&contents).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Write this config to `path` unless a file is already there.
    ///
    /// Returns `false` when an existing file was left untouched.
    pub fn write_if_absent(&self, path: &Path) -> Result<bool, ConfigError> {
        if path.exists() {
            return Ok(false);
        }
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| config_io_err(parent, e))?;
            }
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml).map_err(|e| config_io_err(path, e))?;
        Ok(true)
    }

    /// Validate and anchor every path at `base_dir`.
    pub fn resolve(self, base_dir: &Path) -> Result<ResolvedConfig, ConfigError> {
        if self.region.tag.trim().is_empty() || self.region.class.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "region.tag and region.class must not be empty".to_string(),
            ));
        }
        if self.region.tag.chars().any(|c| !c.is_ascii_alphanumeric() && c != '-') {
            return Err(ConfigError::Invalid(format!(
                "region.tag '{}' is not a valid element name",
                self.region.tag
            )));
        }
        if self.extract_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "extract_timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(command) = &self.extract_command {
            if command.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "extract_command must not be blank".to_string(),
                ));
            }
        }

        let anchor = |p: &Path| -> PathBuf {
            if p.is_absolute() {
                p.to_path_buf()
            } else {
                base_dir.join(p)
            }
        };
        let document = anchor(&self.document);
        let backup = backup_path_for(&document);

        Ok(ResolvedConfig {
            base_dir: base_dir.to_path_buf(),
            store: anchor(&self.store),
            snapshot: anchor(&self.snapshot),
            backup,
            document,
            template_dir: self.template_dir.as_deref().map(anchor),
            extract_command: self.extract_command,
            extract_timeout: Duration::from_secs(self.extract_timeout_secs),
            retry_interval: Duration::from_secs(self.retry_interval_secs),
            max_attempts: self.max_attempts,
            strict_baseline: self.strict_baseline,
            priority: PriorityOrder::new(self.priority),
            region: self.region,
        })
    }
}

/// `<document>.bak` next to the document, e.g. `index.html.bak`.
pub fn backup_path_for(document: &Path) -> PathBuf {
    let mut name = document.file_name().unwrap_or_default().to_os_string();
    name.push(".bak");
    document.with_file_name(name)
}

// ---------------------------------------------------------------------------
// ResolvedConfig
// ---------------------------------------------------------------------------

/// Configuration after path anchoring and validation.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub base_dir: PathBuf,
    pub store: PathBuf,
    pub snapshot: PathBuf,
    pub document: PathBuf,
    pub backup: PathBuf,
    pub template_dir: Option<PathBuf>,
    pub extract_command: Option<String>,
    pub extract_timeout: Duration,
    pub retry_interval: Duration,
    pub max_attempts: MaxAttempts,
    pub strict_baseline: bool,
    pub priority: PriorityOrder,
    pub region: RegionMarker,
}

impl ResolvedConfig {
    pub fn record_store(&self) -> RecordStore {
        RecordStore::new(&self.store, &self.snapshot)
    }
}
