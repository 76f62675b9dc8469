//! Translation bot core library: activity model, language heuristic, translator client,
//! platform transport, and the webhook gateway used by the CLI.

pub mod activity;
pub mod bot;
pub mod channels;
pub mod config;
pub mod gateway;
pub mod language;
pub mod translator;
