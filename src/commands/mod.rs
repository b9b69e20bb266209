//! Command implementations for the wificom-update CLI

pub mod status;
pub mod update;
pub mod version;
