use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::entities::container::{ContainerId, PlayerId};
use crate::entities::item::ItemStack;
use crate::plugin::{EmptierStats, LootEmptier};
use crate::settings::Settings;
use crate::world::host::ContainerHost;
use crate::world::position::Position;
use crate::world::sandbox::Sandbox;
use crate::world::tracker::FireOutcome;

#[derive(Debug, Clone, Deserialize)]
pub struct ReplayScript {
    #[serde(default)]
    pub containers: Vec<ScriptContainer>,
    #[serde(default)]
    pub events: Vec<ScriptEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptContainer {
    pub id: u64,
    #[serde(default)]
    pub drop_position: Position,
    #[serde(default)]
    pub items: Vec<ItemStack>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScriptEvent {
    /// Seconds since the start of the replay.
    pub at: f64,
    #[serde(flatten)]
    pub action: ScriptAction,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ScriptAction {
    Open {
        player: Option<u64>,
        container: Option<u64>,
    },
    Close {
        player: Option<u64>,
        container: Option<u64>,
    },
    /// A player moves every stack of `kind` out of the container.
    Loot { container: u64, kind: String },
    /// A player puts a stack into the container.
    Stash { container: u64, kind: String, amount: u32 },
    /// Something other than this plugin destroys the container.
    Destroy { container: Option<u64> },
    /// The container drops its network identity without a kill event.
    Despawn { container: u64 },
}

#[derive(Debug)]
pub enum ReplayError {
    Io(PathBuf, String),
    Parse(String),
    DuplicateContainer(u64),
    BadDropPosition(u64),
    BadTime { index: usize, at: f64 },
    OutOfOrder { index: usize, at: f64, previous: f64 },
}

impl std::fmt::Display for ReplayError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReplayError::Io(path, msg) => write!(f, "Failed to read {}: {}", path.display(), msg),
            ReplayError::Parse(msg) => write!(f, "Parse error: {}", msg),
            ReplayError::DuplicateContainer(id) => {
                write!(f, "Container {} declared more than once", id)
            }
            ReplayError::BadDropPosition(id) => {
                write!(f, "Container {} has a non-finite drop position", id)
            }
            ReplayError::BadTime { index, at } => {
                write!(f, "Event {} has invalid time {}", index, at)
            }
            ReplayError::OutOfOrder {
                index,
                at,
                previous,
            } => write!(
                f,
                "Event {} at {}s comes before previous event at {}s",
                index, at, previous
            ),
        }
    }
}

impl std::error::Error for ReplayError {}

#[derive(Debug, Clone, PartialEq)]
pub struct ReplaySummary {
    pub stats: EmptierStats,
    pub emptied: Vec<(ContainerId, FireOutcome)>,
    pub destroyed_containers: usize,
    pub ground_stacks: usize,
    pub cleared_stacks: usize,
    pub surviving_containers: usize,
}

impl ReplayScript {
    pub fn parse(text: &str) -> Result<Self, ReplayError> {
        serde_yaml::from_str(text).map_err(|err| ReplayError::Parse(err.to_string()))
    }

    pub fn load(path: &Path) -> Result<Self, ReplayError> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| ReplayError::Io(path.to_path_buf(), err.to_string()))?;
        Self::parse(&text)
    }

    fn check(&self) -> Result<(), ReplayError> {
        let mut seen = std::collections::HashSet::new();
        for container in &self.containers {
            if !seen.insert(container.id) {
                return Err(ReplayError::DuplicateContainer(container.id));
            }
            if !container.drop_position.is_finite() {
                return Err(ReplayError::BadDropPosition(container.id));
            }
        }
        let mut previous = 0.0;
        for (index, event) in self.events.iter().enumerate() {
            if !event.at.is_finite() || event.at < 0.0 {
                return Err(ReplayError::BadTime {
                    index,
                    at: event.at,
                });
            }
            if event.at < previous {
                return Err(ReplayError::OutOfOrder {
                    index,
                    at: event.at,
                    previous,
                });
            }
            previous = event.at;
        }
        Ok(())
    }
}

/// Plays `script` against a fresh sandbox world, then unloads the plugin.
pub fn run(settings: &Settings, script: &ReplayScript) -> Result<ReplaySummary, ReplayError> {
    script.check()?;

    let mut world = Sandbox::new();
    for container in &script.containers {
        world.spawn(
            ContainerId(container.id),
            container.drop_position,
            container.items.clone(),
        );
    }

    let mut plugin = LootEmptier::new(settings.clone());
    let mut emptied = Vec::new();
    for event in &script.events {
        let now_ms = (event.at * 1_000.0).round() as u64;
        advance(&mut plugin, &mut world, now_ms, &mut emptied);

        match &event.action {
            ScriptAction::Open { player, container } => {
                plugin.on_loot_entity(
                    &world,
                    player.map(PlayerId),
                    container.map(ContainerId),
                );
            }
            ScriptAction::Close { player, container } => {
                plugin.on_loot_entity_end(
                    &world,
                    player.map(PlayerId),
                    container.map(ContainerId),
                );
            }
            ScriptAction::Loot { container, kind } => {
                world.take(ContainerId(*container), kind);
            }
            ScriptAction::Stash {
                container,
                kind,
                amount,
            } => {
                world.put(ContainerId(*container), ItemStack::new(kind.as_str(), *amount));
            }
            ScriptAction::Destroy { container } => {
                if let Some(id) = container {
                    world.destroy_container(ContainerId(*id), false);
                }
                plugin.on_entity_kill(container.map(ContainerId));
            }
            ScriptAction::Despawn { container } => {
                world.detach_network(ContainerId(*container));
            }
        }
    }

    let stats = plugin.unload();
    Ok(ReplaySummary {
        stats,
        emptied,
        destroyed_containers: world.destroyed().len(),
        ground_stacks: world.ground().len(),
        cleared_stacks: world.cleared_stacks(),
        surviving_containers: world.container_count(),
    })
}

// Every kill the plugin causes reaches it again as a kill hook, as the host
// would deliver it.
fn advance(
    plugin: &mut LootEmptier,
    world: &mut Sandbox,
    now_ms: u64,
    emptied: &mut Vec<(ContainerId, FireOutcome)>,
) {
    for (container, outcome) in plugin.tick(world, now_ms) {
        if matches!(outcome, FireOutcome::Dropped { .. } | FireOutcome::Cleared) {
            plugin.on_entity_kill(Some(container));
        }
        emptied.push((container, outcome));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::TriggerMode;

    const SCRIPT: &str = "
containers:
  - id: 1
    drop_position: { x: 4.0, y: 0.0, z: 9.0 }
    items:
      - { kind: wood, amount: 100 }
      - { kind: metal, amount: 10 }
  - id: 2
    items:
      - { kind: cloth, amount: 5 }
events:
  - { at: 0, event: open, player: 1, container: 1 }
  - { at: 1, event: loot, container: 1, kind: wood }
  - { at: 2, event: close, player: 1, container: 1 }
  - { at: 3, event: open, player: 2, container: 2 }
  - { at: 4, event: close, player: 2, container: 2 }
  - { at: 40, event: open, player: 1 }
";

    #[test]
    fn looted_crate_is_emptied_and_untouched_crate_survives() {
        let script = ReplayScript::parse(SCRIPT).expect("parse");
        let summary = run(&Settings::default(), &script).expect("run");

        assert_eq!(
            summary.emptied,
            vec![(
                ContainerId(1),
                FireOutcome::Dropped {
                    position: Position::new(4.0, 0.0, 9.0)
                }
            )]
        );
        assert_eq!(summary.stats.scheduled, 1);
        assert_eq!(summary.stats.fired, 1);
        assert_eq!(summary.destroyed_containers, 1);
        assert_eq!(summary.ground_stacks, 1);
        assert_eq!(summary.surviving_containers, 1);
    }

    #[test]
    fn kill_before_delay_cancels() {
        let text = format!("{}  - {{ at: 5, event: destroy, container: 1 }}\n", SCRIPT);
        let mut script = ReplayScript::parse(&text).expect("parse");
        // keep events ordered: the destroy at 5s must precede the open at 40s
        let destroy = script.events.pop().expect("destroy event");
        script.events.insert(5, destroy);

        let summary = run(&Settings::default(), &script).expect("run");
        assert!(summary.emptied.is_empty());
        assert_eq!(summary.stats.cancelled, 1);
        assert_eq!(summary.ground_stacks, 0);
    }

    #[test]
    fn remove_mode_clears_instead_of_dropping() {
        let settings = Settings {
            remove_instead_of_drop: true,
            ..Settings::default()
        };
        let script = ReplayScript::parse(SCRIPT).expect("parse");
        let summary = run(&settings, &script).expect("run");

        assert_eq!(summary.emptied, vec![(ContainerId(1), FireOutcome::Cleared)]);
        assert_eq!(summary.ground_stacks, 0);
        assert_eq!(summary.cleared_stacks, 1);
    }

    #[test]
    fn remaining_mode_empties_untouched_small_crate() {
        let settings = Settings {
            trigger_mode: TriggerMode::Remaining,
            trigger_threshold: 2,
            delay_seconds: 10.0,
            ..Settings::default()
        };
        let script = ReplayScript::parse(SCRIPT).expect("parse");
        let summary = run(&settings, &script).expect("run");

        assert_eq!(summary.stats.scheduled, 2);
        assert_eq!(summary.destroyed_containers, 2);
        assert_eq!(summary.surviving_containers, 0);
    }

    #[test]
    fn despawned_container_aborts_action() {
        let script = ReplayScript::parse(
            "
containers:
  - id: 3
    items: [{ kind: wood, amount: 1 }, { kind: rope, amount: 1 }]
events:
  - { at: 0, event: open, player: 1, container: 3 }
  - { at: 0, event: loot, container: 3, kind: rope }
  - { at: 0, event: close, player: 1, container: 3 }
  - { at: 10, event: despawn, container: 3 }
  - { at: 60, event: close, player: 1, container: 3 }
",
        )
        .expect("parse");
        let summary = run(&Settings::default(), &script).expect("run");

        assert_eq!(summary.emptied, vec![(ContainerId(3), FireOutcome::ContainerGone)]);
        assert_eq!(summary.stats.aborted, 1);
        assert_eq!(summary.destroyed_containers, 0);
    }

    #[test]
    fn unload_cancels_what_is_still_pending() {
        let script = ReplayScript::parse(
            "
containers:
  - id: 1
    items: [{ kind: wood, amount: 1 }, { kind: rope, amount: 1 }]
events:
  - { at: 0, event: open, player: 1, container: 1 }
  - { at: 0, event: loot, container: 1, kind: rope }
  - { at: 1, event: close, player: 1, container: 1 }
",
        )
        .expect("parse");
        let summary = run(&Settings::default(), &script).expect("run");

        assert!(summary.emptied.is_empty());
        assert_eq!(summary.stats.cancelled, 1);
        assert_eq!(summary.surviving_containers, 1);
    }

    #[test]
    fn rejects_out_of_order_events() {
        let script = ReplayScript::parse(
            "
events:
  - { at: 5, event: destroy, container: 1 }
  - { at: 2, event: destroy, container: 1 }
",
        )
        .expect("parse");
        let err = run(&Settings::default(), &script).unwrap_err();
        assert!(matches!(err, ReplayError::OutOfOrder { index: 1, .. }));
    }

    #[test]
    fn rejects_duplicate_containers() {
        let script = ReplayScript::parse("containers: [{ id: 1 }, { id: 1 }]\n").expect("parse");
        let err = run(&Settings::default(), &script).unwrap_err();
        assert_eq!(err.to_string(), "Container 1 declared more than once");
    }

    #[test]
    fn stashed_items_keep_container_from_counting_as_looted() {
        let script = ReplayScript::parse(
            "
containers:
  - id: 4
    items: [{ kind: wood, amount: 1 }, { kind: rope, amount: 1 }]
events:
  - { at: 0, event: open, player: 1, container: 4 }
  - { at: 1, event: loot, container: 4, kind: rope }
  - { at: 2, event: stash, container: 4, kind: stones, amount: 20 }
  - { at: 3, event: close, player: 1, container: 4 }
  - { at: 60, event: destroy }
",
        )
        .expect("parse");
        let summary = run(&Settings::default(), &script).expect("run");

        assert_eq!(summary.stats.scheduled, 0);
        assert!(summary.emptied.is_empty());
        assert_eq!(summary.surviving_containers, 1);
    }

    #[test]
    fn rejects_non_finite_drop_position() {
        let script = ReplayScript::parse(
            "containers: [{ id: 6, drop_position: { x: .inf, y: 0.0, z: 0.0 } }]\n",
        )
        .expect("parse");
        let err = run(&Settings::default(), &script).unwrap_err();
        assert!(matches!(err, ReplayError::BadDropPosition(6)));
    }

    #[test]
    fn unknown_event_is_a_parse_error() {
        let err = ReplayScript::parse("events: [{ at: 1, event: explode }]\n").unwrap_err();
        assert!(matches!(err, ReplayError::Parse(_)));
    }
}
