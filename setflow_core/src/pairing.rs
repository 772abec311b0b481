//! Workout templates and the superset pairing resolver.
//!
//! A template is an ordered list of exercise slots. Pairing two slots into a
//! superset is an explicit symmetric relation `slot id -> paired slot id`
//! held by the template, never a mutation of a sibling slot's own fields.

use crate::protocol::SupersetConfig;
use crate::types::{ExerciseRef, ProtocolMethod};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One exercise row of a template
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct TemplateSlot {
    pub id: String,
    pub exercise: ExerciseRef,
    pub method: ProtocolMethod,
    pub sets: u32,
    pub target_reps: Option<u32>,
    /// Rest after each set, in seconds
    pub rest_seconds: u32,
}

/// Symmetric slot pairing relation
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(transparent)]
pub struct Pairings(BTreeMap<String, String>);

impl Pairings {
    pub fn partner(&self, slot_id: &str) -> Option<&str> {
        self.0.get(slot_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len() / 2
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Both directions, so a pair can never be half-linked
    fn link(&mut self, a: &str, b: &str) {
        self.0.insert(a.to_string(), b.to_string());
        self.0.insert(b.to_string(), a.to_string());
    }

    fn unlink(&mut self, slot_id: &str) -> Option<String> {
        let partner = self.0.remove(slot_id)?;
        self.0.remove(&partner);
        Some(partner)
    }

    /// `(a, b)` once per pair, `a` sorting first
    pub fn pairs(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(a, b)| a < b)
            .map(|(a, b)| (a.as_str(), b.as_str()))
    }
}

/// Authored workout template
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Template {
    pub name: String,
    pub slots: Vec<TemplateSlot>,
    #[serde(default)]
    pub pairings: Pairings,
    #[serde(default)]
    next_slot: u32,
}

impl Template {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Append a standard slot and return its id
    pub fn add_slot(&mut self, exercise: ExerciseRef, sets: u32, rest_seconds: u32) -> String {
        let id = self.allocate_id();
        self.slots.push(TemplateSlot {
            id: id.clone(),
            exercise,
            method: ProtocolMethod::Standard,
            sets,
            target_reps: None,
            rest_seconds,
        });
        id
    }

    pub fn slot(&self, slot_id: &str) -> Option<&TemplateSlot> {
        self.slots.iter().find(|s| s.id == slot_id)
    }

    /// First slot authored for `exercise_id`
    pub fn slot_for_exercise(&self, exercise_id: &str) -> Option<&TemplateSlot> {
        self.slots.iter().find(|s| s.exercise.id == exercise_id)
    }

    pub fn partner_of(&self, slot_id: &str) -> Option<&TemplateSlot> {
        self.pairings.partner(slot_id).and_then(|id| self.slot(id))
    }

    /// Superset configuration for a paired slot, built on `defaults`
    pub fn superset_config(&self, slot_id: &str, defaults: &SupersetConfig) -> Option<SupersetConfig> {
        let slot = self.slot(slot_id)?;
        let partner = self.partner_of(slot_id)?;
        Some(
            defaults
                .clone()
                .with_exercises(slot.exercise.clone(), partner.exercise.clone()),
        )
    }

    fn allocate_id(&mut self) -> String {
        self.next_slot += 1;
        format!("slot_{}", self.next_slot)
    }

    fn slot_mut(&mut self, slot_id: &str) -> Option<&mut TemplateSlot> {
        self.slots.iter_mut().find(|s| s.id == slot_id)
    }

    fn set_method(&mut self, slot_id: &str, method: ProtocolMethod) {
        if let Some(slot) = self.slot_mut(slot_id) {
            slot.method = method;
        }
    }
}

/// How [`PairingResolver::pair`] satisfied the request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PairOutcome {
    /// An existing slot for the target exercise now points back at the source
    Linked { slot_id: String },
    /// A reciprocal slot was created right after the source
    Created { slot_id: String },
}

impl PairOutcome {
    pub fn slot_id(&self) -> &str {
        match self {
            PairOutcome::Linked { slot_id } | PairOutcome::Created { slot_id } => slot_id,
        }
    }
}

/// Keeps both halves of a superset pairing consistent
pub struct PairingResolver<'a> {
    template: &'a mut Template,
}

impl<'a> PairingResolver<'a> {
    pub fn new(template: &'a mut Template) -> Self {
        Self { template }
    }

    /// Designate `target` as the superset partner of `slot_id`
    ///
    /// Reuses the template's slot for the target exercise when one exists;
    /// otherwise creates one with the source slot's set and rest
    /// configuration. Any earlier pairing of either slot is dissolved first.
    pub fn pair(&mut self, slot_id: &str, target: ExerciseRef) -> Result<PairOutcome> {
        let source = self
            .template
            .slot(slot_id)
            .cloned()
            .ok_or_else(|| Error::Template(format!("unknown slot: {}", slot_id)))?;

        if !target.is_fully_specified() {
            return Err(Error::Template("pair target needs an id and a name".into()));
        }
        if target.id == source.exercise.id {
            return Err(Error::Template(format!(
                "{} cannot be paired with itself",
                source.exercise.id
            )));
        }

        let existing = self
            .template
            .slots
            .iter()
            .find(|s| s.id != source.id && s.exercise.id == target.id)
            .map(|s| s.id.clone());

        if let Some(current) = self.template.pairings.partner(slot_id) {
            if existing.as_deref() == Some(current) {
                tracing::debug!("{} already paired with {}", slot_id, current);
                return Ok(PairOutcome::Linked {
                    slot_id: current.to_string(),
                });
            }
        }
        self.dissolve(slot_id);

        let outcome = match existing {
            Some(partner_id) => {
                self.dissolve(&partner_id);
                PairOutcome::Linked { slot_id: partner_id }
            }
            None => {
                let partner_id = self.template.allocate_id();
                let reciprocal = TemplateSlot {
                    id: partner_id.clone(),
                    exercise: target,
                    method: ProtocolMethod::Superset,
                    sets: source.sets,
                    target_reps: source.target_reps,
                    rest_seconds: source.rest_seconds,
                };
                let at = self
                    .template
                    .slots
                    .iter()
                    .position(|s| s.id == source.id)
                    .map_or(self.template.slots.len(), |i| i + 1);
                self.template.slots.insert(at, reciprocal);
                PairOutcome::Created { slot_id: partner_id }
            }
        };

        let partner_id = outcome.slot_id().to_string();
        self.template.pairings.link(slot_id, &partner_id);
        self.template.set_method(slot_id, ProtocolMethod::Superset);
        self.template.set_method(&partner_id, ProtocolMethod::Superset);

        tracing::info!("Paired {} with {} ({:?})", slot_id, partner_id, outcome);
        Ok(outcome)
    }

    /// Remove the pairing of `slot_id` in both directions
    pub fn unpair(&mut self, slot_id: &str) -> Result<Option<String>> {
        if self.template.slot(slot_id).is_none() {
            return Err(Error::Template(format!("unknown slot: {}", slot_id)));
        }
        let partner = self.dissolve(slot_id);
        if let Some(partner_id) = &partner {
            tracing::info!("Unpaired {} from {}", slot_id, partner_id);
        }
        Ok(partner)
    }

    fn dissolve(&mut self, slot_id: &str) -> Option<String> {
        let partner = self.template.pairings.unlink(slot_id)?;
        self.template.set_method(slot_id, ProtocolMethod::Standard);
        self.template.set_method(&partner, ProtocolMethod::Standard);
        Some(partner)
    }
}
