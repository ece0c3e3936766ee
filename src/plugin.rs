use crate::entities::container::{ContainerId, PlayerId};
use crate::settings::Settings;
use crate::telemetry::logging;
use crate::world::cron::CronSystem;
use crate::world::host::{ClockedCron, ContainerHost};
use crate::world::tracker::{CloseOutcome, DestroyOutcome, FireOutcome, LootTracker, OpenOutcome};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EmptierStats {
    pub scheduled: usize,
    pub fired: usize,
    pub cancelled: usize,
    pub aborted: usize,
}

/// The loaded plugin: settings, tracking state and its timer facility.
/// Hook methods must be called from the host's single event thread.
#[derive(Debug)]
pub struct LootEmptier {
    settings: Settings,
    tracker: LootTracker,
    cron: CronSystem,
    now_ms: u64,
    stats: EmptierStats,
}

impl LootEmptier {
    pub fn new(settings: Settings) -> Self {
        let tracker = LootTracker::new(settings.trigger_policy(), settings.empty_action());
        Self {
            settings,
            tracker,
            cron: CronSystem::new(),
            now_ms: 0,
            stats: EmptierStats::default(),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn tracker(&self) -> &LootTracker {
        &self.tracker
    }

    pub fn stats(&self) -> EmptierStats {
        self.stats
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_timers(&self) -> usize {
        self.cron.len()
    }

    pub fn on_loot_entity<H>(
        &mut self,
        host: &H,
        player: Option<PlayerId>,
        container: Option<ContainerId>,
    ) -> OpenOutcome
    where
        H: ContainerHost + ?Sized,
    {
        let mut scheduler = ClockedCron {
            cron: &mut self.cron,
            now_ms: self.now_ms,
        };
        let outcome = self
            .tracker
            .on_loot_opened(host, &mut scheduler, player, container);
        if let OpenOutcome::Tracking { cancelled: Some(_) } = outcome {
            self.stats.cancelled += 1;
        }
        outcome
    }

    pub fn on_loot_entity_end<H>(
        &mut self,
        host: &H,
        player: Option<PlayerId>,
        container: Option<ContainerId>,
    ) -> CloseOutcome
    where
        H: ContainerHost + ?Sized,
    {
        let mut scheduler = ClockedCron {
            cron: &mut self.cron,
            now_ms: self.now_ms,
        };
        let outcome = self
            .tracker
            .on_loot_closed(host, &mut scheduler, player, container);
        if let CloseOutcome::Scheduled { .. } = outcome {
            self.stats.scheduled += 1;
        }
        outcome
    }

    pub fn on_entity_kill(&mut self, container: Option<ContainerId>) -> DestroyOutcome {
        let mut scheduler = ClockedCron {
            cron: &mut self.cron,
            now_ms: self.now_ms,
        };
        let outcome = self.tracker.on_container_destroyed(&mut scheduler, container);
        if let DestroyOutcome::Cancelled(_) = outcome {
            self.stats.cancelled += 1;
        }
        outcome
    }

    /// Advances the clock to `now_ms` and runs every action that came due.
    /// The clock never moves backwards.
    pub fn tick<H>(&mut self, host: &mut H, now_ms: u64) -> Vec<(ContainerId, FireOutcome)>
    where
        H: ContainerHost + ?Sized,
    {
        self.now_ms = self.now_ms.max(now_ms);
        let mut fired = Vec::new();
        while let Some((handle, container)) = self.cron.pop_ready(self.now_ms) {
            let outcome = self.tracker.fire(host, handle, container);
            match outcome {
                FireOutcome::Dropped { .. } | FireOutcome::Cleared => self.stats.fired += 1,
                FireOutcome::ContainerGone | FireOutcome::Stale => self.stats.aborted += 1,
            }
            fired.push((container, outcome));
        }
        fired
    }

    /// Plugin unload: cancels every pending action so nothing fires against
    /// a torn-down world.
    pub fn unload(mut self) -> EmptierStats {
        let mut scheduler = ClockedCron {
            cron: &mut self.cron,
            now_ms: self.now_ms,
        };
        let cancelled = self.tracker.teardown(&mut scheduler);
        let leftover = self.cron.clear();
        if leftover > 0 {
            logging::log_error(&format!(
                "unload found {} timers without a tracked container",
                leftover
            ));
        }
        self.stats.cancelled += cancelled;
        logging::log_game(&format!(
            "unloaded, {} pending actions cancelled",
            cancelled
        ));
        self.stats
    }
}
