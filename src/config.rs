use std::path::{Path, PathBuf};

use crate::error::Error;

/// Name of the optional tool config at the project root.
pub const CONFIG_FILE: &str = ".symdoc.toml";

/// Project configuration loaded from `.symdoc.toml`.
/// Include/exclude patterns are path prefixes applied to the `modules` listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Config {
    /// Prefixes removed from the listing.
    exclude: Vec<String>,
    /// Prefixes kept in the listing; empty keeps everything.
    include: Vec<String>,
    /// Explicit tsconfig/jsconfig path, relative to the root.
    tsconfig: Option<PathBuf>,
}

/// Raw TOML structure for `.symdoc.toml`.
#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct SymdocTomlConfig {
    /// `exclude = ["dist/"]`.
    #[serde(default)]
    exclude: Vec<String>,
    /// `include = ["src/"]`.
    #[serde(default)]
    include: Vec<String>,
    /// `tsconfig = "tsconfig.build.json"`.
    tsconfig: Option<PathBuf>,
}

impl Config {
    /// Load config from `.symdoc.toml` in the given root directory.
    /// Returns a default that lists everything if the file doesn't exist.
    /// Returns an error if the file exists but is malformed. Never silently
    /// falls back to defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };

        let raw: SymdocTomlConfig = toml::from_str(&content)?;
        tracing::debug!(config = %path.display(), "loaded tool config");
        return Ok(Self {
            exclude: raw.exclude,
            include: raw.include,
            tsconfig: raw.tsconfig,
        });
    }

    /// Check whether a module path (relative to the root) belongs in the listing.
    ///
    /// A path is included if no include patterns are set (list everything),
    /// or if the path starts with at least one include pattern.
    /// An included path is then excluded if it starts with any exclude pattern.
    pub fn should_scan(&self, relative_path: &str) -> bool {
        let included = self.include.is_empty()
            || self.include.iter().any(|p| return relative_path.starts_with(p.as_str()));

        if !included {
            return false;
        }

        return !self.exclude.iter().any(|p| return relative_path.starts_with(p.as_str()));
    }

    /// Project config path that overrides tsconfig/jsconfig discovery.
    pub fn tsconfig(&self) -> Option<&Path> {
        return self.tsconfig.as_deref();
    }
}
