//! Turns level templates into playable levels, drawing pooled puzzles from an
//! injected random source.

use log::{debug, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

use super::loader::{Catalog, ContentError};
use super::types::{
    KindTag, Level, LevelTemplate, PoolEntry, Puzzle, PuzzleKind, PuzzleSlot, ValidateWith,
    Validation, ALIGNED_ANSWER, DEFAULT_PATTERN_LENGTH, MATCHED_ANSWER, SURVIVAL_ANSWER,
};

/// Owns the catalog and the random source; `build` is called once per
/// session and again on every restart.
#[derive(Debug)]
pub struct LevelFactory {
    catalog: Catalog,
    rng: StdRng,
}

impl LevelFactory {
    pub fn new(catalog: Catalog, rng: StdRng) -> Self {
        Self { catalog, rng }
    }

    pub fn seeded(catalog: Catalog, seed: u64) -> Self {
        Self::new(catalog, StdRng::seed_from_u64(seed))
    }

    pub fn build(&mut self) -> Result<Vec<Level>, ContentError> {
        build_levels(&self.catalog, &mut self.rng)
    }
}

pub fn build_levels<R: Rng + ?Sized>(
    catalog: &Catalog,
    rng: &mut R,
) -> Result<Vec<Level>, ContentError> {
    if catalog.levels.is_empty() {
        return Err(ContentError::NoLevels(Default::default()));
    }
    catalog
        .levels
        .iter()
        .map(|template| build_level(template, &catalog.pools, rng))
        .collect()
}

fn build_level<R: Rng + ?Sized>(
    template: &LevelTemplate,
    pools: &BTreeMap<String, Vec<PoolEntry>>,
    rng: &mut R,
) -> Result<Level, ContentError> {
    if template.puzzles.is_empty() {
        return Err(ContentError::EmptyLevel(template.meta.id.clone()));
    }
    let puzzles = template
        .puzzles
        .iter()
        .map(|slot| build_puzzle(slot, pools, rng))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Level {
        id: template.meta.id.clone(),
        name: template.meta.name.clone(),
        description: template.meta.description.clone(),
        puzzles,
        story_intro: template.story.intro.clone().filter(|s| !s.trim().is_empty()),
        story_outro: template.story.outro.clone().filter(|s| !s.trim().is_empty()),
    })
}

fn build_puzzle<R: Rng + ?Sized>(
    slot: &PuzzleSlot,
    pools: &BTreeMap<String, Vec<PoolEntry>>,
    rng: &mut R,
) -> Result<Puzzle, ContentError> {
    let drawn = match &slot.pool {
        Some(name) => {
            let pool = pools.get(name).ok_or_else(|| ContentError::UnknownPool {
                puzzle: slot.id.clone(),
                pool: name.clone(),
            })?;
            let entry = pool
                .choose(rng)
                .ok_or_else(|| ContentError::EmptyPool(name.clone()))?;
            debug!("{} drew {:?} from pool {}", slot.id, entry.answer, name);
            Some(entry)
        }
        None => None,
    };

    let question = drawn
        .and_then(|e| e.question.clone())
        .or_else(|| slot.question.clone())
        .ok_or_else(|| ContentError::MissingField {
            puzzle: slot.id.clone(),
            field: "question",
        })?;

    let answer = match (drawn, &slot.answer) {
        (Some(entry), _) => entry.answer.clone(),
        (None, Some(answer)) => answer.clone(),
        (None, None) => implied_answer(slot.kind)
            .ok_or_else(|| ContentError::MissingField {
                puzzle: slot.id.clone(),
                field: "answer",
            })?
            .to_string(),
    };

    let hints = match drawn {
        Some(entry) if !entry.hints.is_empty() => entry.hints.clone(),
        _ => slot.hints.clone(),
    };

    let kind = match slot.kind {
        KindTag::Text => PuzzleKind::Text,
        KindTag::Image => PuzzleKind::Image {
            clue: drawn.and_then(|e| e.clue.clone()).or_else(|| slot.clue.clone()),
        },
        KindTag::Voice => PuzzleKind::Voice,
        KindTag::Pattern => PuzzleKind::Pattern {
            length: slot.pattern_length.unwrap_or(DEFAULT_PATTERN_LENGTH).max(1),
        },
        KindTag::Timing => PuzzleKind::Timing,
        KindTag::Creative => PuzzleKind::Creative(slot.creative.clone().unwrap_or_default()),
    };

    let validation = match (slot.validate_with, &slot.ai) {
        (Some(ValidateWith::Ai), Some(config)) => Validation::Ai(config.clone()),
        (Some(ValidateWith::Ai), None) => {
            warn!("{} asks for model validation but has no [ai] table; using exact match", slot.id);
            Validation::Exact
        }
        _ => Validation::Exact,
    };

    Ok(Puzzle {
        id: slot.id.clone(),
        kind,
        question,
        answer,
        hints,
        validation,
    })
}

fn implied_answer(kind: KindTag) -> Option<&'static str> {
    match kind {
        KindTag::Pattern => Some(MATCHED_ANSWER),
        KindTag::Timing => Some(ALIGNED_ANSWER),
        KindTag::Creative => Some(SURVIVAL_ANSWER),
        KindTag::Text | KindTag::Image | KindTag::Voice => None,
    }
}
