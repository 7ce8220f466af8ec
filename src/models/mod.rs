//! Core data models for the statistics engine.

mod game;
mod group;
mod ids;
mod player;
mod snapshot;

pub use game::*;
pub use group::*;
pub use ids::*;
pub use player::*;
pub use snapshot::*;
