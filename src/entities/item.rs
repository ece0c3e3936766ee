use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemKind(pub String);

impl ItemKind {
    pub fn new(name: impl Into<String>) -> Self {
        ItemKind(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStack {
    pub kind: ItemKind,
    pub amount: u32,
}

impl ItemStack {
    pub fn new(kind: impl Into<String>, amount: u32) -> Self {
        Self {
            kind: ItemKind::new(kind),
            amount,
        }
    }
}

/// Contents of a container at one point in time. Owns its stacks, so later
/// changes to the live inventory never reach it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSnapshot {
    stacks: Vec<ItemStack>,
}

impl ItemSnapshot {
    pub fn capture<'a, I>(stacks: I) -> Self
    where
        I: IntoIterator<Item = &'a ItemStack>,
    {
        Self {
            stacks: stacks.into_iter().cloned().collect(),
        }
    }

    /// Number of stacks held.
    pub fn count(&self) -> usize {
        self.stacks.len()
    }

    pub fn total_amount(&self) -> u64 {
        self.stacks.iter().map(|stack| u64::from(stack.amount)).sum()
    }
}
