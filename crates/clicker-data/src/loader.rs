//! Loading pipeline: reads data files, checks cross-references, builds the
//! catalog.
//!
//! Provides format detection (RON/JSON/TOML), file discovery, and
//! deserialization helpers, plus [`load_game_data`] which ties them
//! together for a whole catalog directory.

use crate::condition::RefKind;
use crate::schema::{AchievementData, CurrencyData, ProducerData, UpgradeData};
use clicker_core::catalog::{Catalog, CatalogBuilder, CatalogError};
use clicker_core::engine::EngineConfig;
use serde::de::DeserializeOwned;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

// ===========================================================================
// Errors
// ===========================================================================

/// Errors that can occur during data loading.
#[derive(Debug, thiserror::Error)]
pub enum DataLoadError {
    /// A required data file was not found in the given directory.
    #[error("required file '{file}' not found in {dir}")]
    MissingRequired { file: String, dir: PathBuf },

    /// The file has an extension we don't support.
    #[error("unsupported format for file: {file}")]
    UnsupportedFormat { file: PathBuf },

    /// Two files with the same base name but different formats exist.
    #[error("conflicting formats: {a} and {b}")]
    ConflictingFormats { a: PathBuf, b: PathBuf },

    /// A deserialization error occurred.
    #[error("parse error in {file}: {detail}")]
    Parse { file: PathBuf, detail: String },

    /// An id reference could not be resolved.
    #[error("unresolved {expected_kind} reference '{name}' in {file}")]
    UnresolvedRef {
        file: PathBuf,
        name: String,
        expected_kind: &'static str,
    },

    /// A duplicate id was found.
    #[error("duplicate id '{name}' in {file}")]
    DuplicateName { file: PathBuf, name: String },

    /// The definitions parsed but do not form a valid catalog.
    #[error(transparent)]
    Catalog(#[from] CatalogError),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

// ===========================================================================
// Format detection
// ===========================================================================

/// Supported data file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Ron,
    Toml,
    Json,
}

/// Detect the format of a file based on its extension.
pub fn detect_format(path: &Path) -> Result<Format, DataLoadError> {
    match path.extension().and_then(|e| e.to_str()) {
        Some("ron") => Ok(Format::Ron),
        Some("toml") => Ok(Format::Toml),
        Some("json") => Ok(Format::Json),
        _ => Err(DataLoadError::UnsupportedFormat {
            file: path.to_path_buf(),
        }),
    }
}

// ===========================================================================
// File discovery
// ===========================================================================

/// Scan a directory for a data file with the given base name (without extension).
///
/// Looks for `{base_name}.ron`, `{base_name}.toml`, and `{base_name}.json`.
/// Returns `Ok(None)` if no file is found, or `Err(ConflictingFormats)` if
/// multiple formats exist for the same base name.
pub fn find_data_file(dir: &Path, base_name: &str) -> Result<Option<PathBuf>, DataLoadError> {
    let mut found: Option<PathBuf> = None;

    for ext in ["ron", "toml", "json"] {
        let candidate = dir.join(format!("{base_name}.{ext}"));
        if !candidate.exists() {
            continue;
        }
        if let Some(existing) = found {
            return Err(DataLoadError::ConflictingFormats {
                a: existing,
                b: candidate,
            });
        }
        found = Some(candidate);
    }

    Ok(found)
}

/// Like [`find_data_file`], but returns an error if no file is found.
pub fn require_data_file(dir: &Path, base_name: &str) -> Result<PathBuf, DataLoadError> {
    find_data_file(dir, base_name)?.ok_or_else(|| DataLoadError::MissingRequired {
        file: base_name.to_string(),
        dir: dir.to_path_buf(),
    })
}

// ===========================================================================
// Deserialization
// ===========================================================================

fn parse_error(path: &Path, e: impl std::fmt::Display) -> DataLoadError {
    DataLoadError::Parse {
        file: path.to_path_buf(),
        detail: e.to_string(),
    }
}

/// Read a file and deserialize it according to its format (detected from extension).
pub fn deserialize_file<T: DeserializeOwned>(path: &Path) -> Result<T, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => toml::from_str(&content).map_err(|e| parse_error(path, e)),
    }
}

/// Deserialize a list from a file. For TOML files, extracts the array at the
/// given `toml_key` from a top-level table. For RON and JSON, deserializes
/// directly as `Vec<T>`.
pub fn deserialize_list<T: DeserializeOwned>(
    path: &Path,
    toml_key: &str,
) -> Result<Vec<T>, DataLoadError> {
    let format = detect_format(path)?;
    let content = std::fs::read_to_string(path)?;

    match format {
        Format::Ron => ron::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Json => serde_json::from_str(&content).map_err(|e| parse_error(path, e)),
        Format::Toml => {
            let table: toml::Value = toml::from_str(&content).map_err(|e| parse_error(path, e))?;
            let array = table
                .get(toml_key)
                .ok_or_else(|| parse_error(path, format!("missing key '{toml_key}' in TOML file")))?
                .clone();
            array
                .try_into()
                .map_err(|e: toml::de::Error| parse_error(path, e))
        }
    }
}

// ===========================================================================
// Reference checks
// ===========================================================================

/// Return an `UnresolvedRef` error if `name` is not among the known ids.
pub fn resolve_name(
    known: &HashSet<String>,
    name: &str,
    file: &Path,
    expected_kind: &'static str,
) -> Result<(), DataLoadError> {
    if known.contains(name) {
        Ok(())
    } else {
        Err(DataLoadError::UnresolvedRef {
            file: file.to_path_buf(),
            name: name.to_string(),
            expected_kind,
        })
    }
}

/// Record `name` as seen, returning a `DuplicateName` error if it already was.
pub fn check_duplicate(
    seen: &mut HashSet<String>,
    name: &str,
    file: &Path,
) -> Result<(), DataLoadError> {
    if seen.insert(name.to_string()) {
        Ok(())
    } else {
        Err(DataLoadError::DuplicateName {
            file: file.to_path_buf(),
            name: name.to_string(),
        })
    }
}

// ===========================================================================
// Pipeline
// ===========================================================================

/// Everything loaded from a catalog directory.
#[derive(Debug)]
pub struct GameData {
    pub catalog: Catalog,
    /// From `engine.*`, or the defaults if that file is absent.
    pub config: EngineConfig,
}

/// Ids already loaded, used to check references from later files.
#[derive(Debug, Default)]
struct KnownIds {
    currencies: HashSet<String>,
    producers: HashSet<String>,
    upgrades: HashSet<String>,
}

impl KnownIds {
    fn check(&self, kind: RefKind, name: &str, file: &Path) -> Result<(), DataLoadError> {
        let known = match kind {
            RefKind::Currency => &self.currencies,
            RefKind::Producer => &self.producers,
            RefKind::Upgrade => &self.upgrades,
        };
        resolve_name(known, name, file, kind.name())
    }
}

/// Load a catalog directory.
///
/// Files are read in dependency order (currencies, producers, upgrades,
/// achievements) so that every reference can be checked against the ids
/// defined before it.
pub fn load_game_data(dir: &Path) -> Result<GameData, DataLoadError> {
    let mut builder = CatalogBuilder::new();
    let mut known = KnownIds::default();

    // --- Currencies ---
    let path = require_data_file(dir, "currencies")?;
    let currencies: Vec<CurrencyData> = deserialize_list(&path, "currencies")?;
    for currency in &currencies {
        check_duplicate(&mut known.currencies, &currency.id, &path)?;
        builder.register_currency(&currency.id, currency.info());
    }
    log::debug!("{}: {} currencies", path.display(), currencies.len());

    // --- Producers ---
    let path = require_data_file(dir, "producers")?;
    let producers: Vec<ProducerData> = deserialize_list(&path, "producers")?;
    let producer_count = producers.len();
    for producer in producers {
        check_duplicate(&mut known.producers, &producer.id, &path)?;
        for output in &producer.base_production {
            known.check(RefKind::Currency, &output.currency, &path)?;
        }
        builder.register_producer(producer);
    }
    log::debug!("{}: {} producers", path.display(), producer_count);

    // --- Upgrades ---
    let path = require_data_file(dir, "upgrades")?;
    let upgrades: Vec<UpgradeData> = deserialize_list(&path, "upgrades")?;
    let upgrade_count = upgrades.len();
    for upgrade in upgrades {
        check_duplicate(&mut known.upgrades, &upgrade.id, &path)?;
        for price in &upgrade.base_cost {
            known.check(RefKind::Currency, &price.currency, &path)?;
        }
        for effect in &upgrade.effect {
            known.check(RefKind::Producer, &effect.producer_id, &path)?;
        }
        builder.register_upgrade(upgrade);
    }
    log::debug!("{}: {} upgrades", path.display(), upgrade_count);

    // --- Achievements ---
    if let Some(path) = find_data_file(dir, "achievements")? {
        let achievements: Vec<AchievementData> = deserialize_list(&path, "achievements")?;
        let mut seen = HashSet::new();
        let achievement_count = achievements.len();
        for achievement in achievements {
            check_duplicate(&mut seen, &achievement.id, &path)?;
            for (kind, name) in achievement.condition.references() {
                known.check(kind, name, &path)?;
            }
            builder.register_achievement(achievement.into_def());
        }
        log::debug!("{}: {} achievements", path.display(), achievement_count);
    }

    // --- Engine config ---
    let config = match find_data_file(dir, "engine")? {
        Some(path) => deserialize_file(&path)?,
        None => EngineConfig::default(),
    };

    let catalog = builder.build()?;
    log::info!(
        "loaded catalog from {} ({} currencies, {} producers, {} upgrades, {} achievements)",
        dir.display(),
        catalog.currencies().len(),
        catalog.producers().len(),
        catalog.upgrades().len(),
        catalog.achievements().len(),
    );
    Ok(GameData { catalog, config })
}

// ===========================================================================
// Tests
// ===========================================================================
