//! Streak counters
//!
//! Counters are signed: positive is a run of wins, negative a run of losses.
//! A result against the current run resets it to ±1.

use crate::config::ScoringConfig;
use crate::scoring::result::StreakScore;

/// Counter value after one more result
pub fn next_streak(prior: i32, win: bool) -> i32 {
    if win {
        prior.max(0).saturating_add(1)
    } else {
        prior.min(0).saturating_sub(1)
    }
}

/// Streak component of a player's score
pub fn streak_score(config: &ScoringConfig, prior: i32, win: bool) -> StreakScore {
    let progressive = next_streak(prior, win);
    let milestone = config.milestone_for(progressive);

    StreakScore {
        progressive,
        milestone,
        total: progressive + milestone,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_streak_on_win() {
        assert_eq!(next_streak(0, true), 1);
        assert_eq!(next_streak(2, true), 3);
        assert_eq!(next_streak(-4, true), 1);
    }

    #[test]
    fn test_next_streak_on_loss() {
        assert_eq!(next_streak(0, false), -1);
        assert_eq!(next_streak(-2, false), -3);
        assert_eq!(next_streak(6, false), -1);
    }

    #[test]
    fn test_third_win_hits_first_milestone() {
        let config = ScoringConfig::default();
        let score = streak_score(&config, 2, true);
        assert_eq!(score.progressive, 3);
        assert_eq!(score.milestone, 10);
        assert_eq!(score.total, 13);
    }

    #[test]
    fn test_fifth_win_hits_second_milestone() {
        let config = ScoringConfig::default();
        let score = streak_score(&config, 4, true);
        assert_eq!(score.progressive, 5);
        assert_eq!(score.milestone, 20);
        assert_eq!(score.total, 25);
    }

    #[test]
    fn test_loss_milestones_are_mirrored() {
        let config = ScoringConfig::default();
        let score = streak_score(&config, -2, false);
        assert_eq!(score.total, -13);

        let score = streak_score(&config, -4, false);
        assert_eq!(score.progressive, -5);
        assert_eq!(score.milestone, -20);
        assert_eq!(score.total, -25);
    }

    #[test]
    fn test_no_milestone_beyond_schedule() {
        let config = ScoringConfig::default();
        let score = streak_score(&config, 5, true);
        assert_eq!(score.progressive, 6);
        assert_eq!(score.milestone, 0);
        assert_eq!(score.total, 6);
    }

    #[test]
    fn test_broken_win_streak() {
        let config = ScoringConfig::default();
        let score = streak_score(&config, 4, false);
        assert_eq!(score.progressive, -1);
        assert_eq!(score.milestone, 0);
        assert_eq!(score.total, -1);
    }
}
