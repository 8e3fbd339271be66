//! Integration tests for the canopy contract resolver

mod config_assignments;
mod multi_context;
mod record_merger;
