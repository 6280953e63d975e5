use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use super::platform::Platform;

const BUILTIN_SITES: &str = include_str!("sites.json");

#[derive(Debug, Error)]
pub enum SiteTableError {
    #[error("read site table {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },
    #[error("parse site table: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid pattern {pattern:?} for {platform}: {source}")]
    Pattern { platform: Platform, pattern: String, source: regex::Error },
}

// On-disk shape; every list may be omitted.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ProfileSpec {
    title_selectors: Vec<String>,
    title_suffixes: Vec<String>,
    default_title: String,
    price_meta: Vec<String>,
    price_selectors: Vec<String>,
    price_patterns: Vec<String>,
    image_selectors: Vec<String>,
    image_attrs: Vec<String>,
    image_meta: Vec<String>,
}

/// Selector and pattern lists for one platform, most specific first.
#[derive(Debug, Clone, Default)]
pub struct SiteProfile {
    pub title_selectors: Vec<String>,
    pub title_suffixes: Vec<Regex>,
    pub default_title: String,
    pub price_meta: Vec<String>,
    pub price_selectors: Vec<String>,
    /// Each pattern carries the number in capture group 1.
    pub price_patterns: Vec<Regex>,
    pub image_selectors: Vec<String>,
    pub image_attrs: Vec<String>,
    pub image_meta: Vec<String>,
}

impl SiteProfile {
    fn compile(platform: Platform, spec: ProfileSpec) -> Result<Self, SiteTableError> {
        let compile_all = |patterns: Vec<String>| -> Result<Vec<Regex>, SiteTableError> {
            patterns
                .into_iter()
                .map(|p| Regex::new(&p).map_err(|source| SiteTableError::Pattern { platform, pattern: p.clone(), source }))
                .collect()
        };
        Ok(SiteProfile {
            title_selectors: spec.title_selectors,
            title_suffixes: compile_all(spec.title_suffixes)?,
            default_title: spec.default_title,
            price_meta: spec.price_meta,
            price_selectors: spec.price_selectors,
            price_patterns: compile_all(spec.price_patterns)?,
            image_selectors: spec.image_selectors,
            image_attrs: if spec.image_attrs.is_empty() { vec!["src".to_string()] } else { spec.image_attrs },
            image_meta: spec.image_meta,
        })
    }
}

/// platform -> profile mapping, immutable once loaded.
#[derive(Debug, Clone)]
pub struct SiteTable {
    profiles: HashMap<Platform, SiteProfile>,
    fallback: SiteProfile,
}

impl SiteTable {
    pub fn from_json(json: &str) -> Result<Self, SiteTableError> {
        let raw: HashMap<Platform, ProfileSpec> = serde_json::from_str(json)?;
        let mut profiles = HashMap::with_capacity(raw.len());
        for (platform, spec) in raw {
            profiles.insert(platform, SiteProfile::compile(platform, spec)?);
        }
        let fallback = profiles.get(&Platform::Other).cloned().unwrap_or_default();
        Ok(SiteTable { profiles, fallback })
    }

    pub fn builtin() -> Result<Self, SiteTableError> {
        Self::from_json(BUILTIN_SITES)
    }

    pub fn from_path(path: &Path) -> Result<Self, SiteTableError> {
        let json = std::fs::read_to_string(path)
            .map_err(|source| SiteTableError::Io { path: path.to_path_buf(), source })?;
        Self::from_json(&json)
    }

    /// `PRICEWATCH_SITES` names a JSON file overriding the built-in table.
    pub fn from_env() -> Result<Self, SiteTableError> {
        match std::env::var("PRICEWATCH_SITES") {
            Ok(p) if !p.trim().is_empty() => Self::from_path(Path::new(p.trim())),
            _ => Self::builtin(),
        }
    }

    /// Platforms missing from the table use the `other` profile.
    pub fn profile(&self, platform: Platform) -> &SiteProfile {
        self.profiles.get(&platform).unwrap_or(&self.fallback)
    }
}

static GLOBAL: OnceLock<SiteTable> = OnceLock::new();

/// Install the process-wide table. Only the first call has an effect.
pub fn install(table: SiteTable) {
    let _ = GLOBAL.set(table);
}

pub fn global() -> &'static SiteTable {
    GLOBAL.get_or_init(|| SiteTable::builtin().expect("built-in site table"))
}
