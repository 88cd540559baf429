//! Domain events for scoring.

use chatplays_core::event::{DomainEvent, EventMetadata};
use chatplays_core::identity::Identity;
use serde::{Deserialize, Serialize};

/// Emitted when a solve is credited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveAwarded {
    /// Who solved the module.
    pub identity: Identity,
    /// The module's display name.
    pub module_name: String,
    /// Points the solve is worth.
    pub points: i32,
}

/// Emitted when points are added to (or taken from) a player's score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreAdded {
    pub identity: Identity,
    pub delta: i32,
}

/// Emitted when a no-points player's solve goes to the reward pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsBanked {
    pub identity: Identity,
    pub points: i32,
    /// Reward pool after banking.
    pub reward_bonus: i32,
}

/// Emitted when a solve adds time in time mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeAdded {
    pub seconds: f32,
    /// Timer after the addition.
    pub new_timer: f32,
}

/// Emitted when a solve raises the time-mode multiplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MultiplierRaised {
    pub multiplier: f32,
}

/// Emitted for every strike award, including zero-count fake strikes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikesAwarded {
    pub identity: Identity,
    pub module_name: String,
    pub count: u32,
    /// Score change announced for the award.
    pub penalty: i32,
    /// What caused the strike, if the handler said.
    pub strike_message: Option<String>,
    /// Strikes written to the log.
    pub logged_count: u32,
}

/// Emitted when a strike shrinks the reward pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewardReduced {
    pub reward_bonus: i32,
}

/// Emitted when a strike costs time in time mode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimePenalty {
    /// Multiplier after the strike.
    pub multiplier: f32,
    /// Whether the multiplier moved; it cannot drop below the minimum.
    pub multiplier_dropped: bool,
    pub seconds: f32,
    /// Share of the timer lost, in percent, when the loss was proportional.
    pub percent: Option<f32>,
    pub new_timer: f32,
}

/// Emitted when strikes are added to a player's tally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrikesRecorded {
    pub identity: Identity,
    pub count: u32,
}

/// Emitted when time mode clears the bomb's strike counter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BombStrikesReset;

/// Emitted when an answer the module cannot accept costs points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnsubmittablePenalised {
    pub identity: Identity,
    pub module_name: String,
    pub penalty: i32,
}

/// Event payload variants for scoring.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ScoringEventKind {
    SolveAwarded(SolveAwarded),
    ScoreAdded(ScoreAdded),
    PointsBanked(PointsBanked),
    TimeAdded(TimeAdded),
    MultiplierRaised(MultiplierRaised),
    StrikesAwarded(StrikesAwarded),
    RewardReduced(RewardReduced),
    TimePenalty(TimePenalty),
    StrikesRecorded(StrikesRecorded),
    BombStrikesReset(BombStrikesReset),
    UnsubmittablePenalised(UnsubmittablePenalised),
}

impl ScoringEventKind {
    /// The routing name of this kind.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::SolveAwarded(_) => "scoring.solve_awarded",
            Self::ScoreAdded(_) => "scoring.score_added",
            Self::PointsBanked(_) => "scoring.points_banked",
            Self::TimeAdded(_) => "scoring.time_added",
            Self::MultiplierRaised(_) => "scoring.multiplier_raised",
            Self::StrikesAwarded(_) => "scoring.strikes_awarded",
            Self::RewardReduced(_) => "scoring.reward_reduced",
            Self::TimePenalty(_) => "scoring.time_penalty",
            Self::StrikesRecorded(_) => "scoring.strikes_recorded",
            Self::BombStrikesReset(_) => "scoring.bomb_strikes_reset",
            Self::UnsubmittablePenalised(_) => "scoring.unsubmittable_penalised",
        }
    }
}

/// Domain event envelope for scoring.
#[derive(Debug, Clone)]
pub struct ScoringEvent {
    /// Event metadata.
    pub metadata: EventMetadata,
    /// Event-specific payload.
    pub kind: ScoringEventKind,
}

impl DomainEvent for ScoringEvent {
    fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }

    fn to_payload(&self) -> serde_json::Value {
        serde_json::to_value(&self.kind).unwrap_or_default()
    }

    fn metadata(&self) -> &EventMetadata {
        &self.metadata
    }
}
