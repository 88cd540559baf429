//! The ledger shared by every module solver on a bomb.

use std::sync::{Arc, Mutex};

use chatplays_core::clock::Clock;
use chatplays_core::event::EventMetadata;
use chatplays_core::identity::Identity;
use chatplays_core::settings::{GameModes, PlaySettings};
use tracing::debug;
use uuid::Uuid;

use crate::domain::events::{
    BombStrikesReset, MultiplierRaised, PointsBanked, RewardReduced, ScoreAdded, ScoringEvent,
    ScoringEventKind, SolveAwarded, StrikesAwarded, StrikesRecorded, TimeAdded, TimePenalty,
    UnsubmittablePenalised,
};
use crate::domain::rules::{self, TimeLoss};

/// The ledger as shared between module solvers.
pub type SharedLedger = Arc<Mutex<ScoringLedger>>;

/// Who and what an award is for.
#[derive(Debug, Clone, Copy)]
pub struct Award<'a> {
    /// The module code on the bomb.
    pub module_code: &'a str,
    /// The module's display name.
    pub module_name: &'a str,
    /// The player credited.
    pub identity: &'a Identity,
    /// Correlates the award with the dispatch session that caused it.
    pub correlation_id: Uuid,
}

/// Reward pool and time-mode multiplier.
#[derive(Debug, Clone)]
pub struct ScoringLedger {
    settings: PlaySettings,
    modes: GameModes,
    reward_bonus: i32,
    multiplier: f32,
}

impl ScoringLedger {
    /// Creates a ledger with an empty reward pool and the starting
    /// multiplier.
    #[must_use]
    pub fn new(settings: PlaySettings, modes: GameModes) -> Self {
        let multiplier = settings.time_mode_starting_multiplier;
        Self {
            settings,
            modes,
            reward_bonus: 0,
            multiplier,
        }
    }

    /// Wraps the ledger for sharing.
    #[must_use]
    pub fn shared(self) -> SharedLedger {
        Arc::new(Mutex::new(self))
    }

    #[must_use]
    pub fn settings(&self) -> &PlaySettings {
        &self.settings
    }

    #[must_use]
    pub fn modes(&self) -> GameModes {
        self.modes
    }

    #[must_use]
    pub fn reward_bonus(&self) -> i32 {
        self.reward_bonus
    }

    pub fn set_reward_bonus(&mut self, reward_bonus: i32) {
        self.reward_bonus = reward_bonus;
    }

    #[must_use]
    pub fn multiplier(&self) -> f32 {
        self.multiplier
    }

    /// Points a solve of the described module is worth.
    #[must_use]
    pub fn module_score(&self, score: i32, is_dynamic: bool, solvable_modules: u32) -> i32 {
        rules::module_score(score, is_dynamic, solvable_modules)
    }

    /// Credits a solve worth `points`.
    ///
    /// No-points players bank the points into the reward pool. In time mode
    /// the solve adds `multiplier × points` seconds and raises the
    /// multiplier while it is below the maximum.
    #[allow(clippy::cast_precision_loss)]
    pub fn award_solve(
        &mut self,
        award: &Award<'_>,
        points: i32,
        no_points: bool,
        timer: f32,
        clock: &dyn Clock,
    ) -> Vec<ScoringEvent> {
        let mut events = vec![event(
            award,
            ScoringEventKind::SolveAwarded(SolveAwarded {
                identity: award.identity.clone(),
                module_name: award.module_name.to_owned(),
                points,
            }),
            clock,
        )];

        if no_points {
            self.reward_bonus = self.reward_bonus.saturating_add(points);
            events.push(event(
                award,
                ScoringEventKind::PointsBanked(PointsBanked {
                    identity: award.identity.clone(),
                    points,
                    reward_bonus: self.reward_bonus,
                }),
                clock,
            ));
        } else {
            events.push(event(
                award,
                ScoringEventKind::ScoreAdded(ScoreAdded {
                    identity: award.identity.clone(),
                    delta: points,
                }),
                clock,
            ));
        }

        if self.modes.time_mode {
            let seconds = self.multiplier * points as f32;
            events.push(event(
                award,
                ScoringEventKind::TimeAdded(TimeAdded {
                    seconds,
                    new_timer: timer + seconds,
                }),
                clock,
            ));
            if self.multiplier < self.settings.time_mode_max_multiplier {
                self.multiplier += self.settings.time_mode_solve_bonus;
                events.push(event(
                    award,
                    ScoringEventKind::MultiplierRaised(MultiplierRaised {
                        multiplier: self.multiplier,
                    }),
                    clock,
                ));
            }
        }

        debug!(
            module = award.module_code,
            identity = %award.identity,
            points,
            "solve awarded"
        );
        events
    }

    /// Credits `count` strikes carrying `strike_penalty` each.
    ///
    /// A count of zero is a fake strike: it is announced and nothing else
    /// changes.
    pub fn award_strikes(
        &mut self,
        award: &Award<'_>,
        count: u32,
        strike_penalty: i32,
        strike_message: Option<&str>,
        timer: f32,
        clock: &dyn Clock,
    ) -> Vec<ScoringEvent> {
        let reward_multiple = self.settings.enable_reward_multiple_strikes;
        let penalty = rules::strike_penalty(strike_penalty, count, reward_multiple);
        let mut events = vec![event(
            award,
            ScoringEventKind::StrikesAwarded(StrikesAwarded {
                identity: award.identity.clone(),
                module_name: award.module_name.to_owned(),
                count,
                penalty,
                strike_message: strike_message
                    .filter(|m| !m.is_empty())
                    .map(str::to_owned),
                logged_count: rules::logged_strikes(count, reward_multiple),
            }),
            clock,
        )];
        if count == 0 {
            return events;
        }

        self.reward_bonus = rules::reduced_reward(self.reward_bonus);
        events.push(event(
            award,
            ScoringEventKind::RewardReduced(RewardReduced {
                reward_bonus: self.reward_bonus,
            }),
            clock,
        ));

        if self.modes.time_mode {
            let (multiplier, multiplier_dropped) = rules::dropped_multiplier(
                self.multiplier,
                self.settings.time_mode_multiplier_strike_penalty,
                self.settings.time_mode_min_multiplier,
            );
            self.multiplier = multiplier;
            let loss = rules::time_lost(
                timer,
                self.settings.time_mode_minimum_time_lost,
                self.settings.time_mode_timer_strike_penalty,
            );
            events.push(event(
                award,
                ScoringEventKind::TimePenalty(TimePenalty {
                    multiplier,
                    multiplier_dropped,
                    seconds: loss.seconds(),
                    percent: match loss {
                        TimeLoss::Fixed { .. } => None,
                        TimeLoss::Share { percent, .. } => Some(percent),
                    },
                    new_timer: timer - loss.seconds(),
                }),
                clock,
            ));
        }

        events.push(event(
            award,
            ScoringEventKind::ScoreAdded(ScoreAdded {
                identity: award.identity.clone(),
                delta: penalty,
            }),
            clock,
        ));
        events.push(event(
            award,
            ScoringEventKind::StrikesRecorded(StrikesRecorded {
                identity: award.identity.clone(),
                count,
            }),
            clock,
        ));
        if self.modes.time_mode {
            events.push(event(
                award,
                ScoringEventKind::BombStrikesReset(BombStrikesReset),
                clock,
            ));
        }

        debug!(
            module = award.module_code,
            identity = %award.identity,
            count,
            penalty,
            "strikes awarded"
        );
        events
    }

    /// Penalises an answer the module cannot accept. Returns `None` when
    /// the penalty is disabled.
    #[must_use]
    pub fn unsubmittable_penalty(
        &self,
        award: &Award<'_>,
        module_score: i32,
        clock: &dyn Clock,
    ) -> Option<ScoringEvent> {
        let penalty =
            rules::unsubmittable_penalty(module_score, self.settings.unsubmittable_penalty_percent)?;
        Some(event(
            award,
            ScoringEventKind::UnsubmittablePenalised(UnsubmittablePenalised {
                identity: award.identity.clone(),
                module_name: award.module_name.to_owned(),
                penalty,
            }),
            clock,
        ))
    }
}

fn event(award: &Award<'_>, kind: ScoringEventKind, clock: &dyn Clock) -> ScoringEvent {
    ScoringEvent {
        metadata: EventMetadata::new(
            kind.event_type(),
            award.module_code,
            award.correlation_id,
            clock.now(),
        ),
        kind,
    }
}
