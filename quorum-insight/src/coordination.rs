//! Coordination event log and emergent-behavior detection.
//!
//! The log is append-only: events are recorded, scanned, and never mutated
//! or removed. Detection walks every pair and triple of participants across
//! the logged events, keeps the groups that recur at or above the configured
//! frequency threshold, and classifies each by mean outcome score.

use quorum_core::{
    AgentId, BehaviorImpact, CoordinationEvent, CoordinationKind, CoreConfig, DurationMs,
    EmergentBehavior, OutcomeKind, QuorumResult, ValidationError,
};
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::sync::RwLock;

/// Append-only, thread-safe log of coordination events.
#[derive(Default)]
pub struct CoordinationLog {
    events: RwLock<Vec<CoordinationEvent>>,
}

impl CoordinationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event, re-validating that it names at least two distinct
    /// participants. Event fields are public, so the check at construction
    /// can be bypassed; the log enforces it again.
    pub fn append(&self, event: CoordinationEvent) -> QuorumResult<()> {
        let distinct: HashSet<AgentId> = event.participants.iter().copied().collect();
        if distinct.len() < 2 {
            return Err(ValidationError::ConstraintViolation {
                constraint: "participants".to_string(),
                reason: format!(
                    "coordination requires at least 2 distinct agents, got {}",
                    distinct.len()
                ),
            }
            .into());
        }
        if let Ok(mut events) = self.events.write() {
            events.push(event);
        }
        Ok(())
    }

    /// Build, validate, and append an event in one step, returning a copy.
    pub fn record(
        &self,
        kind: CoordinationKind,
        participants: Vec<AgentId>,
        description: impl Into<String>,
        outcome: OutcomeKind,
        duration_ms: DurationMs,
    ) -> QuorumResult<CoordinationEvent> {
        let event = CoordinationEvent::new(kind, participants, description, outcome, duration_ms)?;
        self.append(event.clone())?;
        Ok(event)
    }

    /// Snapshot of all logged events, oldest first.
    pub fn events(&self) -> Vec<CoordinationEvent> {
        self.events
            .read()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    /// Number of logged events.
    pub fn len(&self) -> usize {
        self.events.read().map(|events| events.len()).unwrap_or(0)
    }

    /// Whether the log is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Scan the log for recurring participant groups.
    ///
    /// Every pair and triple of distinct participants in each event counts
    /// as one occurrence of that group. Groups recurring at or above
    /// `config.emergent_frequency_threshold` become behaviors, classified by
    /// mean outcome score: at or above the positive threshold is Positive,
    /// at or below the negative threshold is Negative, otherwise Neutral.
    /// Results are ordered by frequency, most frequent first.
    pub fn detect_emergent_behaviors(&self, config: &CoreConfig) -> Vec<EmergentBehavior> {
        let mut patterns: BTreeMap<Vec<AgentId>, (u64, f64)> = BTreeMap::new();

        for event in self.events() {
            let mut members: Vec<AgentId> = event
                .participants
                .iter()
                .copied()
                .collect::<HashSet<AgentId>>()
                .into_iter()
                .collect();
            members.sort();

            let score = event.outcome.score();
            for i in 0..members.len() {
                for j in (i + 1)..members.len() {
                    note(&mut patterns, vec![members[i], members[j]], score);
                    for k in (j + 1)..members.len() {
                        note(
                            &mut patterns,
                            vec![members[i], members[j], members[k]],
                            score,
                        );
                    }
                }
            }
        }

        let mut behaviors: Vec<EmergentBehavior> = patterns
            .into_iter()
            .filter(|(_, (frequency, _))| *frequency >= u64::from(config.emergent_frequency_threshold))
            .map(|(pattern, (frequency, score_sum))| {
                let effectiveness = score_sum / frequency as f64;
                let impact = if effectiveness >= config.positive_outcome_threshold {
                    BehaviorImpact::Positive
                } else if effectiveness <= config.negative_outcome_threshold {
                    BehaviorImpact::Negative
                } else {
                    BehaviorImpact::Neutral
                };
                let recommendation = match impact {
                    BehaviorImpact::Positive => "Formalize as coordination protocol",
                    BehaviorImpact::Neutral => "Continue monitoring for measurable impact",
                    BehaviorImpact::Negative => "Review pairing and rebalance task routing",
                };
                let description = if pattern.len() == 2 {
                    format!("Spontaneous agent pairing recurring across {frequency} events")
                } else {
                    format!(
                        "{}-agent collective recurring across {frequency} events",
                        pattern.len()
                    )
                };
                EmergentBehavior {
                    pattern,
                    description,
                    frequency,
                    effectiveness,
                    impact,
                    recommendation: recommendation.to_string(),
                }
            })
            .collect();

        behaviors.sort_by(|a, b| b.frequency.cmp(&a.frequency));
        behaviors
    }
}

fn note(patterns: &mut BTreeMap<Vec<AgentId>, (u64, f64)>, pattern: Vec<AgentId>, score: f64) {
    let entry = patterns.entry(pattern).or_insert((0, 0.0));
    entry.0 += 1;
    entry.1 += score;
}

impl fmt::Debug for CoordinationLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CoordinationLog")
            .field("events", &self.len())
            .finish()
    }
}
