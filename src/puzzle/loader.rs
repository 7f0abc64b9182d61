use log::{debug, info};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};

use super::types::{KindTag, LevelTemplate, PoolEntry};

pub const POOLS_FILE: &str = "pools.toml";

#[derive(Debug, thiserror::Error)]
pub enum ContentError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid content pattern: {0}")]
    Pattern(#[from] glob::PatternError),
    #[error("no level files found in {}", .0.display())]
    NoLevels(PathBuf),
    #[error("level {0} has no puzzles")]
    EmptyLevel(String),
    #[error("puzzle {puzzle} draws from unknown pool {pool}")]
    UnknownPool { puzzle: String, pool: String },
    #[error("pool {0} has no entries")]
    EmptyPool(String),
    #[error("puzzle id {0} is used more than once")]
    DuplicatePuzzle(String),
    #[error("puzzle {puzzle} has no {field} and no pool to draw it from")]
    MissingField {
        puzzle: String,
        field: &'static str,
    },
}

/// Level templates in play order plus the pools their slots draw from.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub levels: Vec<LevelTemplate>,
    pub pools: BTreeMap<String, Vec<PoolEntry>>,
}

impl Catalog {
    pub fn new(levels: Vec<LevelTemplate>, pools: BTreeMap<String, Vec<PoolEntry>>) -> Self {
        Self { levels, pools }
    }

    /// Builds a catalog from in-memory TOML sources, in the given order.
    pub fn parse(levels: &[&str], pools: &str) -> Result<Self, ContentError> {
        let levels = levels
            .iter()
            .enumerate()
            .map(|(i, text)| parse_level(text, &format!("level source {i}")))
            .collect::<Result<Vec<_>, _>>()?;
        let catalog = Self::new(levels, parse_pools(pools, "pool source")?);
        catalog.check()?;
        Ok(catalog)
    }

    /// Everything the level factory relies on: at least one level, no empty
    /// levels, unique puzzle ids, pools that exist and are non-empty, and a
    /// question and answer for every slot that has no pool.
    pub fn check(&self) -> Result<(), ContentError> {
        if self.levels.is_empty() {
            return Err(ContentError::NoLevels(PathBuf::new()));
        }

        let mut seen = HashSet::new();
        for level in &self.levels {
            if level.puzzles.is_empty() {
                return Err(ContentError::EmptyLevel(level.meta.id.clone()));
            }
            for slot in &level.puzzles {
                if !seen.insert(slot.id.as_str()) {
                    return Err(ContentError::DuplicatePuzzle(slot.id.clone()));
                }
                match &slot.pool {
                    Some(pool) => match self.pools.get(pool) {
                        None => {
                            return Err(ContentError::UnknownPool {
                                puzzle: slot.id.clone(),
                                pool: pool.clone(),
                            })
                        }
                        Some(entries) if entries.is_empty() => {
                            return Err(ContentError::EmptyPool(pool.clone()))
                        }
                        Some(entries) => {
                            if slot.question.is_none() && entries.iter().any(|e| e.question.is_none()) {
                                return Err(ContentError::MissingField {
                                    puzzle: slot.id.clone(),
                                    field: "question",
                                });
                            }
                        }
                    },
                    None => {
                        if slot.question.is_none() {
                            return Err(ContentError::MissingField {
                                puzzle: slot.id.clone(),
                                field: "question",
                            });
                        }
                        let has_implied_answer =
                            matches!(slot.kind, KindTag::Pattern | KindTag::Timing | KindTag::Creative);
                        if slot.answer.is_none() && !has_implied_answer {
                            return Err(ContentError::MissingField {
                                puzzle: slot.id.clone(),
                                field: "answer",
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }

    pub fn puzzle_count(&self) -> usize {
        self.levels.iter().map(|l| l.puzzles.len()).sum()
    }
}

pub fn parse_level(text: &str, origin: &str) -> Result<LevelTemplate, ContentError> {
    toml::from_str(text).map_err(|source| ContentError::Parse {
        origin: origin.to_string(),
        source,
    })
}

pub fn parse_pools(text: &str, origin: &str) -> Result<BTreeMap<String, Vec<PoolEntry>>, ContentError> {
    toml::from_str(text).map_err(|source| ContentError::Parse {
        origin: origin.to_string(),
        source,
    })
}

fn read(path: &Path) -> Result<String, ContentError> {
    std::fs::read_to_string(path).map_err(|source| ContentError::Io {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_level(path: &Path) -> Result<LevelTemplate, ContentError> {
    parse_level(&read(path)?, &path.display().to_string())
}

/// Loads `level_*.toml` (in file name order) and the optional `pools.toml`
/// from `content_dir`.
pub fn load_catalog(content_dir: &Path) -> Result<Catalog, ContentError> {
    let pattern = content_dir.join("level_*.toml");
    let mut paths: Vec<PathBuf> = glob::glob(&pattern.to_string_lossy())?
        .filter_map(|e| e.ok())
        .collect();

    // Sort by filename so level_01, level_02, level_03 are in order
    paths.sort();

    if paths.is_empty() {
        return Err(ContentError::NoLevels(content_dir.to_path_buf()));
    }

    let mut levels = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!("loading level {}", path.display());
        levels.push(load_level(path)?);
    }

    let pools_path = content_dir.join(POOLS_FILE);
    let pools = if pools_path.exists() {
        parse_pools(&read(&pools_path)?, &pools_path.display().to_string())?
    } else {
        BTreeMap::new()
    };

    let catalog = Catalog::new(levels, pools);
    catalog.check()?;
    info!(
        "loaded {} levels ({} puzzle slots, {} pools) from {}",
        catalog.levels.len(),
        catalog.puzzle_count(),
        catalog.pools.len(),
        content_dir.display()
    );
    Ok(catalog)
}
