use std::collections::HashMap;

use crate::entities::container::{ContainerId, PlayerId};
use crate::entities::item::ItemSnapshot;
use crate::telemetry::logging;
use crate::world::cron::TimerHandle;
use crate::world::host::{ContainerHost, Scheduler};
use crate::world::policy::{EmptyAction, TriggerPolicy};
use crate::world::position::Position;

/// Per-container state kept between loot-open and the end of tracking.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedContainer {
    pub original_items: ItemSnapshot,
    /// Present iff an empty-and-destroy action is scheduled.
    pub pending_action: Option<TimerHandle>,
}

/// Where a container sits in its loot cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackingState {
    Untracked,
    Tracking,
    Scheduled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// Null player or container, or the container is not live.
    Ignored,
    Tracking { cancelled: Option<TimerHandle> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Ignored,
    NotTracked,
    /// A close for a container whose action is already waiting to fire.
    AlreadyScheduled,
    /// The host could not enumerate the contents; tracking is kept.
    ContentsUnavailable,
    Released { original: usize, remaining: usize },
    Scheduled {
        handle: TimerHandle,
        original: usize,
        remaining: usize,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    Ignored,
    NotTracked,
    /// Tracking ended; nothing had been scheduled.
    Released,
    Cancelled(TimerHandle),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FireOutcome {
    /// The handle no longer belongs to this container's tracking cycle.
    Stale,
    /// The container stopped resolving before the action ran.
    ContainerGone,
    Dropped { position: Position },
    Cleared,
}

/// Decides per container whether a half-looted container gets emptied and
/// destroyed after a delay. Owns all tracking state; timers live in the
/// `Scheduler` passed to each call.
#[derive(Debug)]
pub struct LootTracker {
    policy: TriggerPolicy,
    action: EmptyAction,
    tracked: HashMap<ContainerId, TrackedContainer>,
}

impl LootTracker {
    pub fn new(policy: TriggerPolicy, action: EmptyAction) -> Self {
        Self {
            policy,
            action,
            tracked: HashMap::new(),
        }
    }

    pub fn policy(&self) -> TriggerPolicy {
        self.policy
    }

    pub fn action(&self) -> EmptyAction {
        self.action
    }

    pub fn tracked(&self, container: ContainerId) -> Option<&TrackedContainer> {
        self.tracked.get(&container)
    }

    pub fn state(&self, container: ContainerId) -> TrackingState {
        match self.tracked.get(&container) {
            None => TrackingState::Untracked,
            Some(entry) if entry.pending_action.is_some() => TrackingState::Scheduled,
            Some(_) => TrackingState::Tracking,
        }
    }

    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    pub fn pending_count(&self) -> usize {
        self.tracked
            .values()
            .filter(|entry| entry.pending_action.is_some())
            .count()
    }

    pub fn on_loot_opened<H, S>(
        &mut self,
        host: &H,
        scheduler: &mut S,
        player: Option<PlayerId>,
        container: Option<ContainerId>,
    ) -> OpenOutcome
    where
        H: ContainerHost + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(container) = live_container(host, player, container) else {
            return OpenOutcome::Ignored;
        };
        let Some(original_items) = host.contents(container) else {
            return OpenOutcome::Ignored;
        };

        let cancelled = self
            .tracked
            .get(&container)
            .and_then(|entry| entry.pending_action);
        if let Some(handle) = cancelled {
            scheduler.cancel(handle);
            logging::log_game(&format!(
                "container {} reopened, pending emptying cancelled",
                container
            ));
        }

        self.tracked.insert(
            container,
            TrackedContainer {
                original_items,
                pending_action: None,
            },
        );
        OpenOutcome::Tracking { cancelled }
    }

    pub fn on_loot_closed<H, S>(
        &mut self,
        host: &H,
        scheduler: &mut S,
        player: Option<PlayerId>,
        container: Option<ContainerId>,
    ) -> CloseOutcome
    where
        H: ContainerHost + ?Sized,
        S: Scheduler + ?Sized,
    {
        let Some(container) = live_container(host, player, container) else {
            return CloseOutcome::Ignored;
        };
        let Some(entry) = self.tracked.get_mut(&container) else {
            return CloseOutcome::NotTracked;
        };
        if entry.pending_action.is_some() {
            return CloseOutcome::AlreadyScheduled;
        }
        let Some(remaining_items) = host.contents(container) else {
            return CloseOutcome::ContentsUnavailable;
        };

        let original = entry.original_items.count();
        let remaining = remaining_items.count();
        if !self.policy.should_empty(original, remaining) {
            self.tracked.remove(&container);
            return CloseOutcome::Released {
                original,
                remaining,
            };
        }

        let handle = scheduler.schedule(self.action.delay, container);
        entry.pending_action = Some(handle);
        logging::log_game(&format!(
            "container {} left with {}/{} stacks ({} items), emptying in {:.1}s",
            container,
            remaining,
            original,
            remaining_items.total_amount(),
            self.action.delay.as_secs_f32()
        ));
        CloseOutcome::Scheduled {
            handle,
            original,
            remaining,
        }
    }

    pub fn on_container_destroyed<S>(
        &mut self,
        scheduler: &mut S,
        container: Option<ContainerId>,
    ) -> DestroyOutcome
    where
        S: Scheduler + ?Sized,
    {
        let Some(container) = container.filter(|id| id.is_assigned()) else {
            return DestroyOutcome::Ignored;
        };
        let Some(entry) = self.tracked.remove(&container) else {
            return DestroyOutcome::NotTracked;
        };
        match entry.pending_action {
            Some(handle) => {
                scheduler.cancel(handle);
                logging::log_game(&format!(
                    "container {} destroyed before emptying, action cancelled",
                    container
                ));
                DestroyOutcome::Cancelled(handle)
            }
            None => DestroyOutcome::Released,
        }
    }

    /// Runs the action behind `handle` once its delay elapsed.
    pub fn fire<H>(&mut self, host: &mut H, handle: TimerHandle, container: ContainerId) -> FireOutcome
    where
        H: ContainerHost + ?Sized,
    {
        match self.tracked.get(&container) {
            Some(entry) if entry.pending_action == Some(handle) => {}
            _ => return FireOutcome::Stale,
        }
        self.tracked.remove(&container);

        if !host.is_valid(container) {
            return FireOutcome::ContainerGone;
        }

        let outcome = if self.action.remove_instead_of_drop {
            host.clear_inventory(container);
            FireOutcome::Cleared
        } else {
            let Some(position) = host.drop_position(container) else {
                return FireOutcome::ContainerGone;
            };
            host.drop_items(container, position);
            FireOutcome::Dropped { position }
        };
        host.destroy_container(container, true);

        match outcome {
            FireOutcome::Dropped { position } => logging::log_game(&format!(
                "container {} emptied, items dropped at {}",
                container, position
            )),
            _ => logging::log_game(&format!("container {} emptied, items removed", container)),
        }
        outcome
    }

    /// Cancels every pending action and forgets all containers.
    pub fn teardown<S>(&mut self, scheduler: &mut S) -> usize
    where
        S: Scheduler + ?Sized,
    {
        let mut cancelled = 0;
        for (_, entry) in self.tracked.drain() {
            if let Some(handle) = entry.pending_action {
                scheduler.cancel(handle);
                cancelled += 1;
            }
        }
        cancelled
    }
}

fn live_container<H>(
    host: &H,
    player: Option<PlayerId>,
    container: Option<ContainerId>,
) -> Option<ContainerId>
where
    H: ContainerHost + ?Sized,
{
    player?;
    let container = container.filter(|id| id.is_assigned())?;
    host.is_valid(container).then_some(container)
}
