use std::collections::BTreeMap;

use crate::entities::container::ContainerId;
use crate::entities::item::{ItemSnapshot, ItemStack};
use crate::world::host::ContainerHost;
use crate::world::position::Position;

#[derive(Debug, Clone, PartialEq)]
pub struct SandboxContainer {
    pub items: Vec<ItemStack>,
    pub drop_position: Position,
    /// False once the container lost its network identity (despawning).
    pub networked: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroundItem {
    pub stack: ItemStack,
    pub position: Position,
    pub source: ContainerId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestroyRecord {
    pub container: ContainerId,
    pub with_effects: bool,
}

/// In-memory world holding containers and the items spilled out of them.
#[derive(Debug, Default)]
pub struct Sandbox {
    containers: BTreeMap<ContainerId, SandboxContainer>,
    ground: Vec<GroundItem>,
    destroyed: Vec<DestroyRecord>,
    cleared_stacks: usize,
}

impl Sandbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn(&mut self, container: ContainerId, drop_position: Position, items: Vec<ItemStack>) {
        self.containers.insert(
            container,
            SandboxContainer {
                items,
                drop_position,
                networked: true,
            },
        );
    }

    pub fn container(&self, container: ContainerId) -> Option<&SandboxContainer> {
        self.containers.get(&container)
    }

    pub fn items(&self, container: ContainerId) -> Option<&[ItemStack]> {
        self.containers
            .get(&container)
            .map(|entry| entry.items.as_slice())
    }

    /// Move every stack of `kind` out of the container, as a player would.
    pub fn take(&mut self, container: ContainerId, kind: &str) -> Vec<ItemStack> {
        let Some(entry) = self.containers.get_mut(&container) else {
            return Vec::new();
        };
        let (taken, kept): (Vec<ItemStack>, Vec<ItemStack>) = entry
            .items
            .drain(..)
            .partition(|stack| stack.kind.as_str() == kind);
        entry.items = kept;
        taken
    }

    pub fn put(&mut self, container: ContainerId, stack: ItemStack) -> bool {
        match self.containers.get_mut(&container) {
            Some(entry) => {
                entry.items.push(stack);
                true
            }
            None => false,
        }
    }

    /// Container vanishes without going through `destroy_container`.
    pub fn despawn(&mut self, container: ContainerId) -> bool {
        self.containers.remove(&container).is_some()
    }

    pub fn detach_network(&mut self, container: ContainerId) {
        if let Some(entry) = self.containers.get_mut(&container) {
            entry.networked = false;
        }
    }

    pub fn ground(&self) -> &[GroundItem] {
        &self.ground
    }

    pub fn destroyed(&self) -> &[DestroyRecord] {
        &self.destroyed
    }

    pub fn cleared_stacks(&self) -> usize {
        self.cleared_stacks
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }
}

impl ContainerHost for Sandbox {
    fn is_valid(&self, container: ContainerId) -> bool {
        self.containers
            .get(&container)
            .map_or(false, |entry| entry.networked)
    }

    fn contents(&self, container: ContainerId) -> Option<ItemSnapshot> {
        self.containers
            .get(&container)
            .map(|entry| ItemSnapshot::capture(&entry.items))
    }

    fn drop_position(&self, container: ContainerId) -> Option<Position> {
        self.containers.get(&container).map(|entry| entry.drop_position)
    }

    fn drop_items(&mut self, container: ContainerId, position: Position) {
        let Some(entry) = self.containers.get_mut(&container) else {
            return;
        };
        for stack in entry.items.drain(..) {
            self.ground.push(GroundItem {
                stack,
                position,
                source: container,
            });
        }
    }

    fn clear_inventory(&mut self, container: ContainerId) {
        if let Some(entry) = self.containers.get_mut(&container) {
            self.cleared_stacks += entry.items.len();
            entry.items.clear();
        }
    }

    fn destroy_container(&mut self, container: ContainerId, with_effects: bool) {
        if self.containers.remove(&container).is_some() {
            self.destroyed.push(DestroyRecord {
                container,
                with_effects,
            });
        }
    }
}
