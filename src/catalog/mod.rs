//! Named player statistics.
//!
//! Each metric composes a join from [`EntityJoinGraph`] with a reduction
//! from [`crate::calculate`]. Metrics are pure: the same tables and
//! selection always give the same answer, and nothing is cached between
//! calls.

use chrono::NaiveDateTime;
use serde::Serialize;
use thiserror::Error;

use crate::calculate::{self, AggregateError};
use crate::hierarchy::ResolvedLeafSet;
use crate::join::{EntityJoinGraph, GameSettingPlayerRow, JoinError};
use crate::models::{CameraSettings, GameId, PlayerSetting, Tables};

/// Decimal places used when camera values are shown to people.
pub const DISPLAY_DECIMALS: i32 = 2;

/// Errors surfaced by catalog metrics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error(transparent)]
    Join(#[from] JoinError),

    #[error(transparent)]
    Aggregate(#[from] AggregateError),
}

/// Which player a metric is about, optionally scoped to a set of series.
#[derive(Debug, Clone, Copy)]
pub struct Selection<'q> {
    pub player: &'q str,
    pub within: Option<&'q ResolvedLeafSet>,
}

impl<'q> Selection<'q> {
    pub fn player(name: &'q str) -> Self {
        Self {
            player: name,
            within: None,
        }
    }

    /// Restrict to games played in `leaves`.
    pub fn within(mut self, leaves: &'q ResolvedLeafSet) -> Self {
        self.within = Some(leaves);
        self
    }
}

/// Games played per map.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MapCount {
    pub map_name: String,
    pub games: usize,
}

/// One game's camera settings, as recorded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CameraHistoryEntry {
    pub game_id: GameId,
    pub date: NaiveDateTime,
    #[serde(flatten)]
    pub camera: CameraSettings,
}

/// Headline numbers for the player settings page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlayerSummary {
    pub player: String,
    pub distinct_camera_settings: usize,
    /// Percent of series with a camera change, `None` with no series
    pub camera_change_pct: Option<f64>,
    /// Percent of series with a car change, `None` with no series
    pub car_change_pct: Option<f64>,
    pub most_used_car: String,
    pub distinct_cars: usize,
    pub latest_activity: NaiveDateTime,
    pub recorded_games: usize,
}

/// Metric entry points over one snapshot.
#[derive(Debug)]
pub struct StatisticsCatalog<'a> {
    graph: EntityJoinGraph<'a>,
}

impl<'a> StatisticsCatalog<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        Self {
            graph: EntityJoinGraph::new(tables),
        }
    }

    /// Player display names, ascending.
    pub fn player_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .graph
            .tables()
            .players
            .iter()
            .map(|p| p.name.clone())
            .collect();
        names.sort();
        names
    }

    /// Games per map, most played first, then by name.
    pub fn map_histogram(&self, within: Option<&ResolvedLeafSet>) -> Vec<MapCount> {
        let games = self.graph.games(within);
        let mut counts: Vec<MapCount> = calculate::frequencies(&games, |g| g.map_name.clone())
            .into_iter()
            .map(|(map_name, games)| MapCount { map_name, games })
            .collect();
        counts.sort_by(|a, b| {
            b.games
                .cmp(&a.games)
                .then_with(|| a.map_name.cmp(&b.map_name))
        });
        counts
    }

    /// Number of distinct camera configurations the player has used.
    pub fn distinct_camera_settings(&self, sel: Selection<'_>) -> Result<usize, CatalogError> {
        let settings = self.settings(sel)?;
        Ok(calculate::distinct_count(&settings, |s| s.camera.key()))
    }

    /// Fraction of the player's series with more than one camera setup.
    pub fn camera_change_rate(&self, sel: Selection<'_>) -> Result<Option<f64>, CatalogError> {
        let rows = self.series_rows(sel)?;
        Ok(calculate::mid_series_change_rate(
            &rows,
            |r| r.game.group_id.clone(),
            |r| r.setting.camera.key(),
        ))
    }

    /// Fraction of the player's series with more than one car.
    pub fn car_change_rate(&self, sel: Selection<'_>) -> Result<Option<f64>, CatalogError> {
        let rows = self.series_rows(sel)?;
        Ok(calculate::mid_series_change_rate(
            &rows,
            |r| r.game.group_id.clone(),
            |r| r.setting.car_name.clone(),
        ))
    }

    /// The car the player used in the most games.
    pub fn most_used_car(&self, sel: Selection<'_>) -> Result<String, CatalogError> {
        let settings = self.settings(sel)?;
        Ok(calculate::most_frequent(&settings, |s| s.car_name.clone())?)
    }

    pub fn distinct_cars(&self, sel: Selection<'_>) -> Result<usize, CatalogError> {
        let settings = self.settings(sel)?;
        Ok(calculate::distinct_count(&settings, |s| s.car_name.clone()))
    }

    /// Timestamp of the player's most recent recorded game.
    pub fn latest_activity(&self, sel: Selection<'_>) -> Result<NaiveDateTime, CatalogError> {
        let settings = self.settings(sel)?;
        Ok(calculate::latest(&settings, |s| s.date)?)
    }

    /// Most recent distinct camera setups, rounded for display.
    ///
    /// Rows are taken newest first; rounding happens before de-duplication
    /// so setups that differ only past the displayed precision collapse.
    pub fn recent_camera_settings(
        &self,
        sel: Selection<'_>,
        limit: usize,
    ) -> Result<Vec<CameraSettings>, CatalogError> {
        let mut settings = self.settings(sel)?;
        settings.sort_by(|a, b| b.date.cmp(&a.date));

        let mut seen = std::collections::HashSet::new();
        Ok(settings
            .iter()
            .map(|s| s.camera.rounded(DISPLAY_DECIMALS))
            .filter(|c| seen.insert(c.key()))
            .take(limit)
            .collect())
    }

    /// Every recorded camera setup with its game, newest first.
    pub fn camera_history(
        &self,
        sel: Selection<'_>,
    ) -> Result<Vec<CameraHistoryEntry>, CatalogError> {
        let mut settings = self.settings(sel)?;
        settings.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(settings
            .into_iter()
            .map(|s| CameraHistoryEntry {
                game_id: s.id.clone(),
                date: s.date,
                camera: s.camera,
            })
            .collect())
    }

    /// Distinct games with a stats row for the player.
    pub fn recorded_games(&self, sel: Selection<'_>) -> Result<usize, CatalogError> {
        let mut rows = self.graph.stats_with_player(sel.player)?;
        if let Some(leaves) = sel.within {
            rows.retain(|r| {
                self.graph
                    .game(&r.stat.id)
                    .is_some_and(|g| leaves.contains(&g.group_id))
            });
        }
        Ok(calculate::distinct_count(&rows, |r| r.stat.id.clone()))
    }

    /// All headline metrics at once.
    ///
    /// Fails with an empty-input error when the player has no settings rows
    /// in scope, since there is no most used car or latest activity.
    pub fn player_summary(&self, sel: Selection<'_>) -> Result<PlayerSummary, CatalogError> {
        Ok(PlayerSummary {
            player: sel.player.to_string(),
            distinct_camera_settings: self.distinct_camera_settings(sel)?,
            camera_change_pct: self.camera_change_rate(sel)?.map(|r| r * 100.0),
            car_change_pct: self.car_change_rate(sel)?.map(|r| r * 100.0),
            most_used_car: self.most_used_car(sel)?,
            distinct_cars: self.distinct_cars(sel)?,
            latest_activity: self.latest_activity(sel)?,
            recorded_games: self.recorded_games(sel)?,
        })
    }

    /// Settings rows in scope. Unscoped selections do not require a
    /// matching game; scoped ones do, since scope is decided by the game's
    /// group.
    fn settings(&self, sel: Selection<'_>) -> Result<Vec<&'a PlayerSetting>, CatalogError> {
        let settings: Vec<&'a PlayerSetting> = match sel.within {
            None => self
                .graph
                .settings_with_player(sel.player)?
                .into_iter()
                .map(|r| r.setting)
                .collect(),
            Some(leaves) => self
                .graph
                .games_with_settings_within(sel.player, leaves)?
                .into_iter()
                .map(|r| r.setting)
                .collect(),
        };
        Ok(settings)
    }

    fn series_rows(
        &self,
        sel: Selection<'_>,
    ) -> Result<Vec<GameSettingPlayerRow<'a>>, CatalogError> {
        let rows = match sel.within {
            None => self.graph.games_with_settings(sel.player)?,
            Some(leaves) => self.graph.games_with_settings_within(sel.player, leaves)?,
        };
        Ok(rows)
    }
}
