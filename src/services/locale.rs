//! Translated default names
//!
//! Locale files are `<code>.json` documents whose `backend` object may carry
//! `default_page_name` and `default_timer_name`. Missing keys fall back to the
//! default locale, then to the built-in English names.

use std::{collections::HashMap, path::Path};

use serde::Deserialize;
use tracing::{debug, info, warn};

use super::StorageError;

pub const DEFAULT_LOCALE: &str = "en";

/// Default names used for new pages and timers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub default_page_name: String,
    pub default_timer_name: String,
}

impl Default for Locale {
    fn default() -> Self {
        Self {
            default_page_name: "Cloud-synchronized chronometers".to_string(),
            default_timer_name: "Chronometer".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct LocaleOverrides {
    default_page_name: Option<String>,
    default_timer_name: Option<String>,
}

impl LocaleOverrides {
    fn apply(&self, locale: &mut Locale) {
        if let Some(name) = &self.default_page_name {
            locale.default_page_name = name.clone();
        }
        if let Some(name) = &self.default_timer_name {
            locale.default_timer_name = name.clone();
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocaleFile {
    #[serde(default)]
    backend: LocaleOverrides,
}

/// Every known locale, resolved against the default one
#[derive(Debug, Clone, Default)]
pub struct LocaleCatalog {
    fallback: Locale,
    locales: HashMap<String, LocaleOverrides>,
}

impl LocaleCatalog {
    /// Catalog holding only the built-in English names
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Load every `*.json` locale file in `dir`
    pub fn load(dir: &Path) -> Result<Self, StorageError> {
        let mut locales = HashMap::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(code) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };

            let body = std::fs::read(&path)?;
            match serde_json::from_slice::<LocaleFile>(&body) {
                Ok(file) => {
                    debug!("Loaded locale {}", code);
                    locales.insert(code.to_string(), file.backend);
                }
                Err(e) => warn!("Skipping invalid locale file {}: {}", path.display(), e),
            }
        }

        let mut fallback = Locale::default();
        if let Some(default) = locales.get(DEFAULT_LOCALE) {
            default.apply(&mut fallback);
        }

        info!("Loaded {} locales", locales.len());
        Ok(Self { fallback, locales })
    }

    /// Names for the requested locale code, falling back key by key
    pub fn resolve(&self, code: Option<&str>) -> Locale {
        let mut locale = self.fallback.clone();
        if let Some(overrides) = code.and_then(|code| self.locales.get(code)) {
            overrides.apply(&mut locale);
        }
        locale
    }

    pub fn len(&self) -> usize {
        self.locales.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locales.is_empty()
    }
}
