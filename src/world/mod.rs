pub mod cron;
pub mod host;
pub mod policy;
pub mod position;
pub mod sandbox;
pub mod tracker;
