//! Configuration loader and index settings.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `MARKIDX_*` env vars. Every settings struct clamps its own out-of-range
//! values through `normalized()`.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::cap::CapConfiguration;
use crate::error::{Error, Result};

/// Chunk sizes for the rebuild scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildTuning {
    pub background_chunk: usize,
    pub forced_chunk: usize,
    pub large_dirty_chunk: usize,
    pub large_dirty_threshold: usize,
}

impl Default for RebuildTuning {
    fn default() -> Self {
        Self { background_chunk: 12, forced_chunk: 32, large_dirty_chunk: 64, large_dirty_threshold: 256 }
    }
}

impl RebuildTuning {
    #[must_use]
    pub fn normalized(self) -> Self {
        let background_chunk = self.background_chunk.max(1);
        Self {
            background_chunk,
            forced_chunk: self.forced_chunk.max(background_chunk),
            large_dirty_chunk: self.large_dirty_chunk.max(background_chunk),
            large_dirty_threshold: self.large_dirty_threshold.max(1),
        }
    }

    /// Pages per chunk. Forced refreshes and large dirty sets favor
    /// throughput; small background refreshes favor short slices.
    pub fn chunk_size(&self, force_immediate: bool, dirty_pages: usize) -> usize {
        let large = dirty_pages >= self.large_dirty_threshold;
        match (force_immediate, large) {
            (true, true) => self.forced_chunk.max(self.large_dirty_chunk),
            (true, false) => self.forced_chunk,
            (false, true) => self.large_dirty_chunk,
            (false, false) => self.background_chunk,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WarmupTuning {
    pub enabled: bool,
    /// New search entries computed per warmup slice.
    pub slice_budget: usize,
}

impl Default for WarmupTuning {
    fn default() -> Self {
        Self { enabled: true, slice_budget: 500 }
    }
}

impl WarmupTuning {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self { enabled: self.enabled, slice_budget: self.slice_budget.max(1) }
    }
}

/// When a cold start emits its one early preview.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionalTuning {
    pub enabled: bool,
    pub min_dirty_pages: usize,
    pub preview_records: usize,
    pub preview_pages: usize,
}

impl Default for ProvisionalTuning {
    fn default() -> Self {
        Self { enabled: true, min_dirty_pages: 300, preview_records: 200, preview_pages: 100 }
    }
}

impl ProvisionalTuning {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            enabled: self.enabled,
            min_dirty_pages: self.min_dirty_pages.max(1),
            preview_records: self.preview_records.max(1),
            preview_pages: self.preview_pages.max(1),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub caps: CapConfiguration,
    pub rebuild: RebuildTuning,
    pub warmup: WarmupTuning,
    pub provisional: ProvisionalTuning,
}

impl IndexSettings {
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            caps: self.caps.normalized(),
            rebuild: self.rebuild.normalized(),
            warmup: self.warmup.normalized(),
            provisional: self.provisional.normalized(),
        }
    }
}

/// Prefix of environment overrides; `__` separates nested keys, as in
/// `MARKIDX_CAPS__CONFIGURED_CAP=5000`.
pub const ENV_PREFIX: &str = "MARKIDX_";

pub struct Config {
    figment: Figment,
}

impl Config {
    /// Loads from the working directory for the environment named by
    /// `RUST_ENV` (default `dev`).
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").ok();
        Self::load_for_env(env_name.as_deref())
    }

    pub fn load_for_env(env_name: Option<&str>) -> anyhow::Result<Self> {
        Ok(Self::layered(Path::new("."), env_name.unwrap_or("dev"), ENV_PREFIX))
    }

    fn layered(dir: &Path, env_name: &str, env_prefix: &str) -> Self {
        let mut figment = Self::defaults().merge(Toml::file(dir.join("config.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed(env_prefix).split("__"));
        Self { figment }
    }

    /// Loads defaults overlaid with one explicit TOML file. The path may use
    /// `~` and `$VAR`.
    pub fn load_from<S: AsRef<str>>(path: S) -> anyhow::Result<Self> {
        let path = expand_path(path);
        if !path.is_file() {
            anyhow::bail!("config file not found: {}", path.display());
        }
        let figment = Self::defaults().merge(Toml::file(&path));
        Ok(Self { figment })
    }

    pub fn from_toml_str(toml: &str) -> Self {
        Self { figment: Self::defaults().merge(Toml::string(toml)) }
    }

    fn defaults() -> Figment {
        Figment::from(Serialized::defaults(IndexSettings::default()))
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Extracts and clamps the index settings. Values of the wrong type
    /// surface as [`Error::InvalidConfig`]; out-of-range values are clamped.
    pub fn index_settings(&self) -> Result<IndexSettings> {
        let settings: IndexSettings =
            self.figment.extract().map_err(|e| Error::InvalidConfig(e.to_string()))?;
        Ok(settings.normalized())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chunk_size_heuristic() {
        let t = RebuildTuning::default();
        assert_eq!(t.chunk_size(false, 10), 12);
        assert_eq!(t.chunk_size(true, 10), 32);
        assert_eq!(t.chunk_size(false, 1000), 64);
        assert_eq!(t.chunk_size(true, 1000), 64);
    }

    #[test]
    fn zero_sizes_are_clamped() {
        let t = RebuildTuning { background_chunk: 0, forced_chunk: 0, large_dirty_chunk: 0, large_dirty_threshold: 0 }.normalized();
        assert_eq!(t.chunk_size(false, 0), 1);
        assert_eq!(WarmupTuning { enabled: true, slice_budget: 0 }.normalized().slice_budget, 1);
    }

    #[test]
    fn toml_overrides_defaults() {
        let cfg = Config::from_toml_str(
            r#"
            [caps]
            configured_cap = 1000
            adaptive_enabled = false

            [warmup]
            slice_budget = 50
            "#,
        );
        let s = cfg.index_settings().expect("settings");
        assert_eq!(s.caps.configured_cap, 1000);
        assert!(!s.caps.adaptive_enabled);
        assert_eq!(s.caps.min_indexed, CapConfiguration::default().min_indexed);
        assert_eq!(s.caps.tiers.len(), 2);
        assert_eq!(s.warmup.slice_budget, 50);
        assert_eq!(s.rebuild, RebuildTuning::default());
    }

    #[test]
    fn env_file_and_variables_layer_over_base_file() {
        let tmp = tempfile::TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "[caps]\nconfigured_cap = 1000\n\n[warmup]\nslice_budget = 40\n").unwrap();
        std::fs::write(tmp.path().join("config.prod.toml"), "[caps]\nconfigured_cap = 2000\n").unwrap();

        let prefix = "MARKIDX_LAYERING_TEST_";
        env::set_var("MARKIDX_LAYERING_TEST_WARMUP__SLICE_BUDGET", "9");
        env::set_var("MARKIDX_LAYERING_TEST_CAPS__ADAPTIVE_ENABLED", "false");

        let prod = Config::layered(tmp.path(), "production", prefix).index_settings().unwrap();
        assert_eq!(prod.caps.configured_cap, 2000);
        assert_eq!(prod.warmup.slice_budget, 9);
        assert!(!prod.caps.adaptive_enabled);

        let dev = Config::layered(tmp.path(), "dev", prefix).index_settings().unwrap();
        assert_eq!(dev.caps.configured_cap, 1000);
        assert_eq!(dev.warmup.slice_budget, 9);

        let other = Config::layered(tmp.path(), "staging", prefix);
        assert_eq!(other.get::<usize>("caps.configured_cap").unwrap(), 1000);

        env::remove_var("MARKIDX_LAYERING_TEST_WARMUP__SLICE_BUDGET");
        env::remove_var("MARKIDX_LAYERING_TEST_CAPS__ADAPTIVE_ENABLED");
    }

    #[test]
    fn wrong_value_type_is_invalid_config() {
        let cfg = Config::from_toml_str("[warmup]\nslice_budget = \"lots\"\n");
        assert!(matches!(cfg.index_settings(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let base = Path::new("/srv/app");
        assert_eq!(resolve_with_base(base, "config.toml"), PathBuf::from("/srv/app/config.toml"));
        assert_eq!(resolve_with_base(base, "/etc/markidx.toml"), PathBuf::from("/etc/markidx.toml"));
    }
}
