//! Applies scoring events to chat, the scoreboard and the bomb.

use chatplays_core::event::DomainEvent;
use chatplays_core::scoreboard::{LogKind, LogRecord};
use chatplays_scoring::{ScoringEvent, ScoringEventKind};
use tracing::debug;

use crate::application::solver::ModuleSolver;

impl ModuleSolver {
    pub(crate) fn apply(&self, events: &[ScoringEvent]) {
        for event in events {
            debug!(
                event_type = event.event_type(),
                event_id = %event.metadata.event_id,
                correlation_id = %event.metadata.correlation_id,
                payload = %event.to_payload(),
                "applying scoring event"
            );
            self.apply_one(event);
        }
    }

    fn apply_one(&self, event: &ScoringEvent) {
        let chat = &self.ctx.chat;
        let scoreboard = &self.ctx.scoreboard;
        match &event.kind {
            ScoringEventKind::SolveAwarded(solve) => {
                chat.send_message(&format!(
                    "{} solved Module {} ({})! +{} {}.",
                    solve.identity,
                    self.code,
                    solve.module_name,
                    solve.points,
                    points_word(solve.points)
                ));
                scoreboard.add_solve(&solve.identity);
                scoreboard.append_log(&LogRecord {
                    occurred_at: event.metadata.occurred_at,
                    module_code: event.metadata.module_code.clone(),
                    identity: solve.identity.clone(),
                    module_name: solve.module_name.clone(),
                    kind: LogKind::Solve {
                        value: solve.points,
                    },
                });
            }
            ScoringEventKind::ScoreAdded(score) => {
                scoreboard.add_score(&score.identity, score.delta);
            }
            ScoringEventKind::PointsBanked(banked) => {
                debug!(
                    identity = %banked.identity,
                    points = banked.points,
                    reward_bonus = banked.reward_bonus,
                    "points banked into the reward pool"
                );
            }
            ScoringEventKind::TimeAdded(time) => {
                self.ctx.bomb.set_time_remaining(time.new_timer);
                chat.send_message(&format!(
                    "Bomb time increased by {:.1} seconds!",
                    time.seconds
                ));
            }
            ScoringEventKind::MultiplierRaised(raised) => {
                debug!(multiplier = raised.multiplier, "multiplier raised");
            }
            ScoringEventKind::StrikesAwarded(strikes) => {
                let amount = if strikes.count == 1 {
                    "a strike".to_owned()
                } else {
                    format!("{} strikes", strikes.count)
                };
                let cause = strikes
                    .strike_message
                    .as_ref()
                    .map(|message| format!(" caused by {message}"))
                    .unwrap_or_default();
                chat.send_message(&format!(
                    "Module {} ({}) got {amount}! {} {} from {}{cause}.",
                    self.code,
                    strikes.module_name,
                    strikes.penalty,
                    points_word(strikes.penalty),
                    strikes.identity
                ));
                if strikes.count > 0 {
                    scoreboard.append_log(&LogRecord {
                        occurred_at: event.metadata.occurred_at,
                        module_code: event.metadata.module_code.clone(),
                        identity: strikes.identity.clone(),
                        module_name: strikes.module_name.clone(),
                        kind: LogKind::Strike {
                            count: strikes.logged_count,
                        },
                    });
                }
            }
            ScoringEventKind::RewardReduced(reward) => {
                chat.send_message(&format!(
                    "Reward reduced to {} points.",
                    reward.reward_bonus
                ));
            }
            ScoringEventKind::TimePenalty(penalty) => {
                self.ctx.bomb.set_time_remaining(penalty.new_timer);
                let head = if penalty.multiplier_dropped {
                    format!("Multiplier reduced to {:.1} and time", penalty.multiplier)
                } else {
                    format!(
                        "Multiplier set at {:.1}, cannot be further reduced. Time",
                        penalty.multiplier
                    )
                };
                let tail = match penalty.percent {
                    Some(percent) => format!(
                        " reduced by {percent:.1}%. ({:.1} seconds)",
                        penalty.seconds
                    ),
                    None => format!(" reduced by {} seconds.", penalty.seconds),
                };
                chat.send_message(&format!("{head}{tail}"));
            }
            ScoringEventKind::StrikesRecorded(recorded) => {
                scoreboard.add_strike(&recorded.identity, recorded.count);
            }
            ScoringEventKind::BombStrikesReset(_) => {
                self.ctx.bomb.reset_strike_count();
                self.ctx.with_cameras(|cameras| cameras.update_strikes(false));
            }
            ScoringEventKind::UnsubmittablePenalised(penalised) => {
                scoreboard.add_score(&penalised.identity, -penalised.penalty);
                chat.send_message(&format!(
                    "{}, Module {} ({}) got an invalid answer! -{} {}.",
                    penalised.identity,
                    self.code,
                    penalised.module_name,
                    penalised.penalty,
                    points_word(penalised.penalty)
                ));
            }
        }
    }
}

fn points_word(points: i32) -> &'static str {
    if points.abs() == 1 { "point" } else { "points" }
}
