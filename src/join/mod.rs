//! Typed joins across the snapshot tables.
//!
//! Every join is an inner join walked in left-table order: rows without a
//! counterpart are dropped, never reported. Row structs borrow from the
//! snapshot so a join allocates only the row vector.

use std::collections::HashMap;

use thiserror::Error;
use tracing::debug;

use crate::hierarchy::ResolvedLeafSet;
use crate::models::{Game, GameId, Player, PlayerId, PlayerSetting, PlayerStat, Tables};

/// Errors raised while resolving join inputs.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JoinError {
    #[error("Unknown player: {0}")]
    UnknownPlayer(String),
}

/// PlayerSetting ⋈ Player.
#[derive(Debug, Clone, Copy)]
pub struct SettingPlayerRow<'a> {
    pub setting: &'a PlayerSetting,
    pub player: &'a Player,
}

/// PlayerSetting ⋈ Game ⋈ Player.
#[derive(Debug, Clone, Copy)]
pub struct GameSettingPlayerRow<'a> {
    pub game: &'a Game,
    pub setting: &'a PlayerSetting,
    pub player: &'a Player,
}

/// PlayerStat ⋈ Player.
#[derive(Debug, Clone, Copy)]
pub struct StatPlayerRow<'a> {
    pub stat: &'a PlayerStat,
    pub player: &'a Player,
}

/// Key lookups over a [`Tables`] snapshot.
#[derive(Debug)]
pub struct EntityJoinGraph<'a> {
    tables: &'a Tables,
    players_by_id: HashMap<&'a PlayerId, &'a Player>,
    players_by_name: HashMap<&'a str, &'a Player>,
    games_by_id: HashMap<&'a GameId, &'a Game>,
}

impl<'a> EntityJoinGraph<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        let players_by_id = tables.players.iter().map(|p| (&p.id, p)).collect();
        let players_by_name = tables.players.iter().map(|p| (p.name.as_str(), p)).collect();
        let games_by_id = tables.games.iter().map(|g| (&g.id, g)).collect();

        Self {
            tables,
            players_by_id,
            players_by_name,
            games_by_id,
        }
    }

    pub fn tables(&self) -> &'a Tables {
        self.tables
    }

    pub fn game(&self, id: &GameId) -> Option<&'a Game> {
        self.games_by_id.get(id).copied()
    }

    /// Look a player up by display name.
    pub fn player_by_name(&self, name: &str) -> Result<&'a Player, JoinError> {
        self.players_by_name
            .get(name)
            .copied()
            .ok_or_else(|| JoinError::UnknownPlayer(name.to_string()))
    }

    /// Settings rows for one player.
    ///
    /// A known player with no settings yields an empty vector.
    pub fn settings_with_player(
        &self,
        name: &str,
    ) -> Result<Vec<SettingPlayerRow<'a>>, JoinError> {
        let player = self.player_by_name(name)?;

        let rows: Vec<_> = self
            .tables
            .player_settings
            .iter()
            .filter_map(|setting| {
                let joined = self.players_by_id.get(&setting.player_id).copied()?;
                (joined.id == player.id).then_some(SettingPlayerRow {
                    setting,
                    player: joined,
                })
            })
            .collect();

        debug!("Joined {} settings rows for {}", rows.len(), name);
        Ok(rows)
    }

    /// Settings rows for one player, joined with their game.
    pub fn games_with_settings(
        &self,
        name: &str,
    ) -> Result<Vec<GameSettingPlayerRow<'a>>, JoinError> {
        let settings = self.settings_with_player(name)?;
        let total = settings.len();

        let rows: Vec<_> = settings
            .into_iter()
            .filter_map(|row| {
                let game = self.games_by_id.get(&row.setting.id).copied()?;
                Some(GameSettingPlayerRow {
                    game,
                    setting: row.setting,
                    player: row.player,
                })
            })
            .collect();

        if rows.len() < total {
            debug!(
                "Dropped {} settings rows for {} with no matching game",
                total - rows.len(),
                name
            );
        }
        Ok(rows)
    }

    /// Like [`games_with_settings`](Self::games_with_settings), keeping only
    /// games played in one of `leaves`.
    pub fn games_with_settings_within(
        &self,
        name: &str,
        leaves: &ResolvedLeafSet,
    ) -> Result<Vec<GameSettingPlayerRow<'a>>, JoinError> {
        let mut rows = self.games_with_settings(name)?;
        rows.retain(|row| leaves.contains(&row.game.group_id));
        Ok(rows)
    }

    /// Stats rows for one player.
    pub fn stats_with_player(&self, name: &str) -> Result<Vec<StatPlayerRow<'a>>, JoinError> {
        let player = self.player_by_name(name)?;

        Ok(self
            .tables
            .player_stats
            .iter()
            .filter(|stat| stat.player_id == player.id)
            .map(|stat| StatPlayerRow { stat, player })
            .collect())
    }

    /// All games, or only those in `within` when given.
    pub fn games(&self, within: Option<&ResolvedLeafSet>) -> Vec<&'a Game> {
        self.tables
            .games
            .iter()
            .filter(|g| within.map_or(true, |leaves| leaves.contains(&g.group_id)))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use chrono::{NaiveDate, NaiveDateTime};

    use crate::models::*;

    pub fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, day)
            .unwrap()
            .and_hms_opt(18, 0, 0)
            .unwrap()
    }

    pub fn camera(fov: f64) -> CameraSettings {
        CameraSettings {
            fov,
            height: 100.0,
            pitch: -4.0,
            distance: 270.0,
            stiffness: 0.45,
            swivel_speed: 4.7,
            transition_speed: 1.2,
            steering_sensitivity: 1.35,
        }
    }

    pub fn setting(game: &str, player: &str, day: u32, car: &str, fov: f64) -> PlayerSetting {
        PlayerSetting {
            id: GameId::from(game),
            player_id: PlayerId::from(player),
            date: at(day),
            car_name: car.to_string(),
            camera: camera(fov),
        }
    }

    /// Two events: "major" with two series, "open" with one series.
    /// Player p1 ("Zen") changes camera mid-series in major-s1 and car in
    /// open-s1. Player p2 ("Jstn") has no settings rows.
    pub fn tables() -> Tables {
        Tables {
            groups: vec![
                GroupEdge::new("season", "major"),
                GroupEdge::new("season", "open"),
                GroupEdge::new("major", "major-s1"),
                GroupEdge::new("major", "major-s2"),
                GroupEdge::childless("major-s1"),
                GroupEdge::childless("major-s2"),
                GroupEdge::new("open", "open-s1"),
                GroupEdge::childless("open-s1"),
            ],
            games: vec![
                Game::new("g1", "DFH Stadium", "major-s1"),
                Game::new("g2", "Mannfield", "major-s1"),
                Game::new("g3", "DFH Stadium", "major-s2"),
                Game::new("g4", "Champions Field", "open-s1"),
                Game::new("g5", "DFH Stadium", "open-s1"),
            ],
            players: vec![Player::new("p1", "Zen"), Player::new("p2", "Jstn")],
            player_settings: vec![
                setting("g1", "p1", 1, "Fennec", 110.0),
                setting("g2", "p1", 1, "Fennec", 109.0),
                setting("g3", "p1", 2, "Fennec", 110.0),
                setting("g4", "p1", 5, "Octane", 110.0),
                setting("g5", "p1", 5, "Fennec", 110.0),
                // orphans: unknown game, unknown player
                setting("g-missing", "p1", 9, "Dominus", 110.0),
                setting("g1", "p-missing", 1, "Breakout", 90.0),
            ],
            player_stats: vec![
                PlayerStat {
                    id: GameId::from("g1"),
                    player_id: PlayerId::from("p1"),
                    metrics: [("goals".to_string(), 2.0)].into_iter().collect(),
                },
                PlayerStat {
                    id: GameId::from("g1"),
                    player_id: PlayerId::from("p2"),
                    metrics: Default::default(),
                },
                PlayerStat {
                    id: GameId::from("g2"),
                    player_id: PlayerId::from("p1"),
                    metrics: Default::default(),
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::tables;
    use super::*;
    use crate::hierarchy::{GroupHierarchyIndex, LeafGroupResolver};
    use crate::models::GroupId;

    #[test]
    fn test_player_by_name() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        assert_eq!(graph.player_by_name("Zen").unwrap().id.as_str(), "p1");
        assert_eq!(
            graph.player_by_name("Nobody").unwrap_err(),
            JoinError::UnknownPlayer("Nobody".to_string())
        );
    }

    #[test]
    fn test_settings_with_player_keeps_orphan_game_rows() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        // g-missing has no game, but this join does not touch games
        let rows = graph.settings_with_player("Zen").unwrap();
        assert_eq!(rows.len(), 6);
        assert!(rows.iter().all(|r| r.player.name == "Zen"));
    }

    #[test]
    fn test_games_with_settings_drops_unmatched() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        let rows = graph.games_with_settings("Zen").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.game.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3", "g4", "g5"]);
    }

    #[test]
    fn test_known_player_without_data_is_empty() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        assert!(graph.settings_with_player("Jstn").unwrap().is_empty());
        assert!(graph.games_with_settings("Jstn").unwrap().is_empty());
    }

    #[test]
    fn test_unknown_player_is_an_error() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        assert!(matches!(
            graph.games_with_settings("Ghost"),
            Err(JoinError::UnknownPlayer(_))
        ));
        assert!(graph.stats_with_player("Ghost").is_err());
    }

    #[test]
    fn test_games_with_settings_within_leaves() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);
        let index = GroupHierarchyIndex::build(&tables.groups).unwrap();
        let leaves = LeafGroupResolver::new(&index).resolve(&[GroupId::from("major")]);

        let rows = graph.games_with_settings_within("Zen", &leaves).unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.game.id.as_str()).collect();
        assert_eq!(ids, vec!["g1", "g2", "g3"]);
    }

    #[test]
    fn test_stats_with_player() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);

        let rows = graph.stats_with_player("Zen").unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].stat.metrics.get("goals"), Some(&2.0));
    }

    #[test]
    fn test_games_scoped() {
        let tables = tables();
        let graph = EntityJoinGraph::new(&tables);
        let index = GroupHierarchyIndex::build(&tables.groups).unwrap();
        let leaves = LeafGroupResolver::new(&index).resolve(&[GroupId::from("open")]);

        assert_eq!(graph.games(None).len(), 5);
        assert_eq!(graph.games(Some(&leaves)).len(), 2);
    }
}
