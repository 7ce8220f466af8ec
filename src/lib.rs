//! # rl-ones
//!
//! Statistics engine for a Rocket League 1v1 stats dashboard.
//!
//! ## Architecture
//!
//! - **models**: Snapshot rows (groups, games, players, settings, stats)
//! - **hierarchy**: Group hierarchy index and leaf-group resolution
//! - **join**: Typed joins across the snapshot tables
//! - **calculate**: Series grouping and reductions
//! - **catalog**: Named player statistics
//! - **storage**: Parquet snapshot reading and writing
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod catalog;
pub mod config;
pub mod hierarchy;
pub mod join;
pub mod models;
pub mod storage;

pub use models::*;
