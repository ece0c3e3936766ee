use std::time::Duration;

use crate::entities::container::ContainerId;
use crate::entities::item::ItemSnapshot;
use crate::world::cron::{CronSystem, TimerHandle};
use crate::world::position::Position;

/// Game-side view of lootable containers. Every query resolves the id again,
/// so an id whose container is gone simply stops resolving.
pub trait ContainerHost {
    /// True while the container exists and still has a network identity.
    fn is_valid(&self, container: ContainerId) -> bool;

    /// Current contents, or `None` when the container cannot be enumerated.
    fn contents(&self, container: ContainerId) -> Option<ItemSnapshot>;

    fn drop_position(&self, container: ContainerId) -> Option<Position>;

    /// Spill the whole inventory onto the ground at `position`.
    fn drop_items(&mut self, container: ContainerId, position: Position);

    /// Delete the whole inventory without spawning anything.
    fn clear_inventory(&mut self, container: ContainerId);

    fn destroy_container(&mut self, container: ContainerId, with_effects: bool);
}

/// Delayed-action facility. Cancelling an unknown, fired or already
/// cancelled handle is a no-op.
pub trait Scheduler {
    fn schedule(&mut self, delay: Duration, container: ContainerId) -> TimerHandle;
    fn cancel(&mut self, handle: TimerHandle);
}

/// `CronSystem` bound to a clock reading taken by the caller.
pub struct ClockedCron<'a> {
    pub cron: &'a mut CronSystem,
    pub now_ms: u64,
}

impl Scheduler for ClockedCron<'_> {
    fn schedule(&mut self, delay: Duration, container: ContainerId) -> TimerHandle {
        self.cron.set(container, delay, self.now_ms)
    }

    fn cancel(&mut self, handle: TimerHandle) {
        self.cron.stop(handle);
    }
}
