use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};
use std::time::Duration;

use crate::entities::container::ContainerId;

/// Handle of one scheduled action. Never reused within a `CronSystem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(pub u64);

/// Cron entry for a delayed action
#[derive(Clone, Copy, Debug)]
pub struct CronEntry {
    pub handle: TimerHandle,
    pub target_ms: u64,
}

/// Min-heap by target_ms (earliest first)
impl Ord for CronEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior in BinaryHeap (which is max-heap)
        other
            .target_ms
            .cmp(&self.target_ms)
            .then_with(|| other.handle.cmp(&self.handle))
    }
}

impl PartialOrd for CronEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for CronEntry {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle && self.target_ms == other.target_ms
    }
}

impl Eq for CronEntry {}

#[derive(Clone, Copy, Debug)]
struct ActiveTimer {
    container: ContainerId,
    target_ms: u64,
}

/// Timer facility for delayed container actions. Time is supplied by the
/// caller in milliseconds on a monotonic clock.
///
/// Cancelled entries stay in the heap until they surface and are skipped
/// there; only handles still in the active index are ever returned.
#[derive(Debug)]
pub struct CronSystem {
    heap: BinaryHeap<CronEntry>,
    active: HashMap<TimerHandle, ActiveTimer>,
    next_handle: u64,
}

impl Default for CronSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl CronSystem {
    pub fn new() -> Self {
        CronSystem {
            heap: BinaryHeap::new(),
            active: HashMap::new(),
            next_handle: 1,
        }
    }

    /// Schedule an action for `container` after `delay`
    pub fn set(&mut self, container: ContainerId, delay: Duration, now_ms: u64) -> TimerHandle {
        let handle = TimerHandle(self.next_handle);
        self.next_handle += 1;

        let delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        let target_ms = now_ms.saturating_add(delay_ms);
        self.active.insert(handle, ActiveTimer { container, target_ms });
        self.heap.push(CronEntry { handle, target_ms });
        handle
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn stop(&mut self, handle: TimerHandle) -> bool {
        self.active.remove(&handle).is_some()
    }

    /// Peek at the next due timer without removing it
    pub fn check(&mut self, now_ms: u64) -> Option<(TimerHandle, ContainerId)> {
        loop {
            let entry = *self.heap.peek()?;
            match self.active.get(&entry.handle) {
                Some(active) if active.target_ms == entry.target_ms => {
                    if entry.target_ms <= now_ms {
                        return Some((entry.handle, active.container));
                    }
                    return None;
                }
                _ => {
                    self.heap.pop();
                }
            }
        }
    }

    /// Pop and return next due timer
    pub fn pop_ready(&mut self, now_ms: u64) -> Option<(TimerHandle, ContainerId)> {
        let (handle, container) = self.check(now_ms)?;
        self.heap.pop();
        self.active.remove(&handle);
        Some((handle, container))
    }

    /// Drop every pending timer, returning how many were cancelled
    pub fn clear(&mut self) -> usize {
        let cancelled = self.active.len();
        self.active.clear();
        self.heap.clear();
        cancelled
    }

    /// Get number of pending timers
    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }
}
