//! Pure scoring rules.

/// Score used for dynamically scored modules with a non-zero tag.
pub const DYNAMIC_FALLBACK_SCORE: i32 = 5;

/// Fraction of the reward pool kept after a strike.
pub const REWARD_KEPT_ON_STRIKE: f64 = 0.8;

/// Points a solve is worth.
///
/// A dynamically scored module's `score` is a tag: `0` means half the
/// solvable modules on the bomb, anything else the fallback score.
#[must_use]
pub fn module_score(score: i32, is_dynamic: bool, solvable_modules: u32) -> i32 {
    if !is_dynamic {
        return score;
    }
    match score {
        0 => i32::try_from(solvable_modules / 2).unwrap_or(i32::MAX),
        _ => DYNAMIC_FALLBACK_SCORE,
    }
}

/// Points taken for an answer the module cannot accept, or `None` when the
/// penalty is disabled. Never less than one point.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
pub fn unsubmittable_penalty(module_score: i32, percent: f32) -> Option<i32> {
    if percent <= 0.0 {
        return None;
    }
    Some(((module_score as f32 * percent) as i32).max(1))
}

/// Score change for `count` strikes.
#[must_use]
pub fn strike_penalty(penalty: i32, count: u32, reward_multiple_strikes: bool) -> i32 {
    if reward_multiple_strikes {
        penalty.saturating_mul(i32::try_from(count).unwrap_or(i32::MAX))
    } else {
        penalty
    }
}

/// Strikes written to the log for an award of `count`.
#[must_use]
pub fn logged_strikes(count: u32, reward_multiple_strikes: bool) -> u32 {
    if reward_multiple_strikes { count } else { 1 }
}

/// The reward pool after one strike.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn reduced_reward(reward: i32) -> i32 {
    (f64::from(reward) * REWARD_KEPT_ON_STRIKE).round_ties_even() as i32
}

/// The time-mode multiplier after one strike, and whether it moved.
#[must_use]
pub fn dropped_multiplier(multiplier: f32, step: f32, minimum: f32) -> (f32, bool) {
    if multiplier <= minimum {
        return (minimum, false);
    }
    ((multiplier - step).max(minimum), true)
}

/// Time taken from the bomb for one strike in time mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TimeLoss {
    /// The timer was low; a fixed number of seconds is lost.
    Fixed { seconds: f32 },
    /// A share of the remaining time is lost.
    Share { percent: f32, seconds: f32 },
}

impl TimeLoss {
    /// Seconds taken from the timer.
    #[must_use]
    pub fn seconds(self) -> f32 {
        match self {
            Self::Fixed { seconds } | Self::Share { seconds, .. } => seconds,
        }
    }
}

/// Computes the time lost for one strike with `timer` seconds left.
#[must_use]
pub fn time_lost(timer: f32, minimum_time_lost: f32, timer_strike_penalty: f32) -> TimeLoss {
    if timer_strike_penalty <= 0.0 || timer < minimum_time_lost / timer_strike_penalty {
        return TimeLoss::Fixed {
            seconds: minimum_time_lost,
        };
    }
    TimeLoss::Share {
        percent: timer_strike_penalty * 100.0,
        seconds: timer * timer_strike_penalty,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_score_is_used_as_is() {
        assert_eq!(module_score(7, false, 20), 7);
    }

    #[test]
    fn test_dynamic_score_tag_zero_is_half_the_bomb() {
        assert_eq!(module_score(0, true, 10), 5);
        assert_eq!(module_score(0, true, 11), 5);
        assert_eq!(module_score(0, true, 40), 20);
    }

    #[test]
    fn test_dynamic_score_other_tag_is_fallback() {
        assert_eq!(module_score(3, true, 100), 5);
    }

    #[test]
    fn test_unsubmittable_penalty_floors_at_one() {
        assert_eq!(unsubmittable_penalty(10, 0.3), Some(3));
        assert_eq!(unsubmittable_penalty(1, 0.3), Some(1));
        assert_eq!(unsubmittable_penalty(10, 0.0), None);
        assert_eq!(unsubmittable_penalty(10, -1.0), None);
    }

    #[test]
    fn test_strike_penalty_scales_with_count() {
        assert_eq!(strike_penalty(-6, 3, true), -18);
        assert_eq!(strike_penalty(-6, 3, false), -6);
        assert_eq!(logged_strikes(3, false), 1);
    }

    #[test]
    fn test_reward_shrinks_by_a_fifth() {
        assert_eq!(reduced_reward(100), 80);
        assert_eq!(reduced_reward(0), 0);
        assert_eq!(reduced_reward(3), 2);
    }

    #[test]
    fn test_multiplier_floors_at_minimum() {
        assert_eq!(dropped_multiplier(9.0, 1.5, 1.0), (7.5, true));
        assert_eq!(dropped_multiplier(2.0, 1.5, 1.0), (1.0, true));
        assert_eq!(dropped_multiplier(1.0, 1.5, 1.0), (1.0, false));
    }

    #[test]
    fn test_time_lost_switches_at_threshold() {
        assert_eq!(time_lost(59.0, 15.0, 0.25), TimeLoss::Fixed { seconds: 15.0 });
        assert_eq!(
            time_lost(100.0, 15.0, 0.25),
            TimeLoss::Share {
                percent: 25.0,
                seconds: 25.0
            }
        );
    }
}
