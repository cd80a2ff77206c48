//! Developer tooling: read-only world inspection for HUDs and CLIs.

pub mod inspector;

pub use inspector::{NodeInfo, WorldInspector, WorldSummary};
