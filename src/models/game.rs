//! Game (replay) model.

use serde::{Deserialize, Serialize};

use super::{GameId, GroupId};

/// A single recorded game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Game {
    /// Replay id, shared with the settings and stats tables
    pub id: GameId,

    /// Arena the game was played on
    pub map_name: String,

    /// Group the replay was uploaded to. This is the direct group and is
    /// not guaranteed to be a leaf of the hierarchy.
    pub group_id: GroupId,
}

impl Game {
    pub fn new(
        id: impl Into<GameId>,
        map_name: impl Into<String>,
        group_id: impl Into<GroupId>,
    ) -> Self {
        Self {
            id: id.into(),
            map_name: map_name.into(),
            group_id: group_id.into(),
        }
    }
}
