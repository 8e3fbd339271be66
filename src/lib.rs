//! Canopy: Deterministic Contract Resolution
//!
//! A build-time resolver that organizes candidate classes into specialization
//! forests and resolves, per deployment context, the single authoritative
//! concrete implementation for every contract root and contract interface.

pub mod catalog;
pub mod config;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod map;
pub mod merger;
pub mod registry;
pub mod resolve;
pub mod types;
