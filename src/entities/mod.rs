pub mod container;
pub mod item;
