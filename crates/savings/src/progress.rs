use crate::models::SavingsGoal;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SavingsGoalProgress {
    /// Percentage of the target reached; exceeds 100 once the goal is overshot.
    pub progress_ratio: f64,
    /// `progress_ratio` clamped to 0..=100, for progress bars.
    pub display_progress: f64,
    pub is_complete: bool,
    pub remaining: i64, // Cents
    /// Negative when the target date has passed.
    pub days_remaining: i64,
}

pub fn savings_goal_progress(goal: &SavingsGoal, today: NaiveDate) -> SavingsGoalProgress {
    let progress_ratio = if goal.target_amount > 0 {
        goal.current_amount as f64 / goal.target_amount as f64 * 100.0
    } else {
        0.0
    };

    SavingsGoalProgress {
        progress_ratio,
        display_progress: progress_ratio.clamp(0.0, 100.0),
        is_complete: goal.current_amount >= goal.target_amount,
        remaining: (goal.target_amount - goal.current_amount).max(0),
        days_remaining: (goal.target_date - today).num_days(),
    }
}
