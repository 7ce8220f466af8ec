//! Immutable snapshot of all source tables.

use serde::{Deserialize, Serialize};

use super::{Game, GroupEdge, Player, PlayerSetting, PlayerStat};

/// The five relations the engine reads, loaded once per session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Tables {
    pub games: Vec<Game>,
    pub groups: Vec<GroupEdge>,
    pub players: Vec<Player>,
    pub player_settings: Vec<PlayerSetting>,
    pub player_stats: Vec<PlayerStat>,
}

impl Tables {
    /// Total number of rows across all tables.
    pub fn row_count(&self) -> usize {
        self.games.len()
            + self.groups.len()
            + self.players.len()
            + self.player_settings.len()
            + self.player_stats.len()
    }
}
