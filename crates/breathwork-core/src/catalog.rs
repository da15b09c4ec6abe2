//! Exercise catalog.
//!
//! Exercises are small static definitions: an ordered list of phases, each
//! with a label, a duration and a shape-motion directive. Built-in exercises
//! ship with the crate; extra ones can come from `config.toml`. Both go
//! through the same validation, and nothing is mutated after load.

use std::collections::HashSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::cue::CueKind;
use crate::error::CatalogError;

/// How the breathing shape moves during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Motion {
    Grow,
    Shrink,
    /// Held at full size.
    Hold,
    /// Held at minimum size (pause after an exhale).
    Rest,
}

/// A phase as written in configuration, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseSpec {
    pub label: String,
    pub duration_ms: u64,
    pub motion: Motion,
}

/// An exercise as written in configuration, before validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseSpec {
    pub id: String,
    pub name: String,
    pub phases: Vec<PhaseSpec>,
}

/// A validated phase with its cue already resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Phase {
    label: String,
    duration_ms: u64,
    motion: Motion,
    cue: CueKind,
}

impl Phase {
    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    pub fn motion(&self) -> Motion {
        self.motion
    }

    pub fn cue(&self) -> CueKind {
        self.cue
    }
}

/// An immutable, validated exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExerciseDefinition {
    id: String,
    name: String,
    phases: Vec<Phase>,
}

impl ExerciseDefinition {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    /// Phase at `index`, wrapping around the phase list.
    pub fn phase(&self, index: usize) -> &Phase {
        &self.phases[index % self.phases.len()]
    }

    pub fn len(&self) -> usize {
        self.phases.len()
    }

    /// Always false for a validated exercise.
    pub fn is_empty(&self) -> bool {
        self.phases.is_empty()
    }

    /// Length of one full cycle in milliseconds.
    pub fn cycle_ms(&self) -> u64 {
        self.phases.iter().map(|p| p.duration_ms).sum()
    }
}

impl TryFrom<ExerciseSpec> for ExerciseDefinition {
    type Error = CatalogError;

    fn try_from(spec: ExerciseSpec) -> Result<Self, Self::Error> {
        if spec.phases.is_empty() {
            return Err(CatalogError::EmptyExercise(spec.id));
        }

        let mut phases = Vec::with_capacity(spec.phases.len());
        for p in spec.phases {
            if p.duration_ms == 0 {
                return Err(CatalogError::NonPositiveDuration {
                    exercise: spec.id,
                    label: p.label,
                });
            }
            let Some(cue) = CueKind::from_label(&p.label) else {
                return Err(CatalogError::UnmappedCue {
                    exercise: spec.id,
                    label: p.label,
                });
            };
            phases.push(Phase {
                label: p.label,
                duration_ms: p.duration_ms,
                motion: p.motion,
                cue,
            });
        }

        Ok(Self {
            id: spec.id,
            name: spec.name,
            phases,
        })
    }
}

fn phase(label: &str, secs: f64, motion: Motion) -> PhaseSpec {
    PhaseSpec {
        label: label.into(),
        duration_ms: (secs * 1000.0).round() as u64,
        motion,
    }
}

/// The exercises shipped with the crate.
pub fn builtin_specs() -> Vec<ExerciseSpec> {
    vec![
        ExerciseSpec {
            id: "box".into(),
            name: "Box Breathing".into(),
            phases: vec![
                phase("Inhale", 4.0, Motion::Grow),
                phase("Hold", 4.0, Motion::Hold),
                phase("Exhale", 4.0, Motion::Shrink),
                phase("Hold", 4.0, Motion::Rest),
            ],
        },
        ExerciseSpec {
            id: "4-7-8".into(),
            name: "Relaxing Breath".into(),
            phases: vec![
                phase("Inhale", 4.0, Motion::Grow),
                phase("Hold", 7.0, Motion::Hold),
                phase("Exhale", 8.0, Motion::Shrink),
            ],
        },
        ExerciseSpec {
            id: "coherent".into(),
            name: "Coherent Breathing".into(),
            phases: vec![
                phase("Inhale", 5.5, Motion::Grow),
                phase("Exhale", 5.5, Motion::Shrink),
            ],
        },
        ExerciseSpec {
            id: "calm".into(),
            name: "Calm".into(),
            phases: vec![
                phase("Inhale", 4.0, Motion::Grow),
                phase("Exhale", 6.0, Motion::Shrink),
            ],
        },
    ]
}

/// Validated set of exercises, in display order.
#[derive(Debug, Clone)]
pub struct Catalog {
    exercises: Vec<Arc<ExerciseDefinition>>,
}

impl Catalog {
    pub const DEFAULT_EXERCISE: &'static str = "box";

    /// Built-in exercises only.
    pub fn builtin() -> Self {
        // Built-ins are covered by tests; a failure here is a programming error.
        Self::from_specs(builtin_specs())
            .unwrap_or_else(|e| panic!("invalid builtin catalog: {e}"))
    }

    /// Built-in exercises followed by `extra`.
    ///
    /// # Errors
    /// Returns the first validation failure, or a duplicate id.
    pub fn with_extra(extra: Vec<ExerciseSpec>) -> Result<Self, CatalogError> {
        let mut specs = builtin_specs();
        specs.extend(extra);
        Self::from_specs(specs)
    }

    /// # Errors
    /// Returns `EmptyCatalog` for no exercises, otherwise the first
    /// validation failure or a duplicate id.
    pub fn from_specs(specs: Vec<ExerciseSpec>) -> Result<Self, CatalogError> {
        if specs.is_empty() {
            return Err(CatalogError::EmptyCatalog);
        }
        let mut seen = HashSet::new();
        let mut exercises = Vec::with_capacity(specs.len());
        for spec in specs {
            if !seen.insert(spec.id.clone()) {
                return Err(CatalogError::DuplicateExercise(spec.id));
            }
            exercises.push(Arc::new(ExerciseDefinition::try_from(spec)?));
        }
        Ok(Self { exercises })
    }

    /// # Errors
    /// Returns `UnknownExercise` if no exercise has this id.
    pub fn get(&self, id: &str) -> Result<Arc<ExerciseDefinition>, CatalogError> {
        self.exercises
            .iter()
            .find(|e| e.id() == id)
            .cloned()
            .ok_or_else(|| CatalogError::UnknownExercise(id.to_string()))
    }

    pub fn contains(&self, id: &str) -> bool {
        self.exercises.iter().any(|e| e.id() == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<ExerciseDefinition>> {
        self.exercises.iter()
    }

    /// The default exercise, or the first one if the default was never added.
    /// A catalog is never empty.
    pub fn default_exercise(&self) -> Arc<ExerciseDefinition> {
        self.get(Self::DEFAULT_EXERCISE)
            .unwrap_or_else(|_| self.exercises[0].clone())
    }
}
