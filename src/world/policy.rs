use std::time::Duration;

/// Rule deciding whether a container closed after looting gets emptied.
/// Counts are numbers of item stacks, not summed amounts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerPolicy {
    /// Fire when at least `threshold` stacks were taken out.
    LootedCount { threshold: u32 },
    /// Fire when between 1 and `threshold` stacks are left behind.
    RemainingCount { threshold: u32 },
}

impl TriggerPolicy {
    pub fn threshold(self) -> u32 {
        match self {
            TriggerPolicy::LootedCount { threshold } | TriggerPolicy::RemainingCount { threshold } => {
                threshold
            }
        }
    }

    /// Stacks removed between open and close. Negative when items were added.
    pub fn looted_count(original_count: usize, remaining_count: usize) -> i64 {
        original_count as i64 - remaining_count as i64
    }

    pub fn should_empty(self, original_count: usize, remaining_count: usize) -> bool {
        match self {
            TriggerPolicy::LootedCount { threshold } => {
                Self::looted_count(original_count, remaining_count) >= i64::from(threshold)
            }
            TriggerPolicy::RemainingCount { threshold } => {
                remaining_count > 0 && remaining_count as u64 <= u64::from(threshold)
            }
        }
    }
}

impl Default for TriggerPolicy {
    fn default() -> Self {
        TriggerPolicy::LootedCount { threshold: 1 }
    }
}

/// What happens to a container once its delay runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmptyAction {
    pub delay: Duration,
    pub remove_instead_of_drop: bool,
}

impl EmptyAction {
    /// Negative and non-finite delays collapse to zero.
    pub fn from_seconds(delay_seconds: f32, remove_instead_of_drop: bool) -> Self {
        let delay = if delay_seconds.is_finite() && delay_seconds > 0.0 {
            Duration::try_from_secs_f64(f64::from(delay_seconds)).unwrap_or(Duration::MAX)
        } else {
            Duration::ZERO
        };
        Self {
            delay,
            remove_instead_of_drop,
        }
    }
}

impl Default for EmptyAction {
    fn default() -> Self {
        Self::from_seconds(30.0, false)
    }
}
