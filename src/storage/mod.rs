//! Snapshot storage.
//!
//! The statistics engine reads a directory of Parquet files, one per
//! source table. Files are produced upstream; this module only reads them.

mod parquet;

pub use self::parquet::*;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while reading or writing snapshots.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] ::parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Table {table} has no column {column}")]
    MissingColumn { table: &'static str, column: String },

    #[error("Table {table} column {column} is null at row {row}")]
    NullValue {
        table: &'static str,
        column: String,
        row: usize,
    },

    #[error("Table {table} column {column} has an invalid value at row {row}")]
    InvalidValue {
        table: &'static str,
        column: String,
        row: usize,
    },
}

/// File names of the snapshot tables, relative to the data directory.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableFiles {
    #[serde(default = "default_games_file")]
    pub games: String,

    #[serde(default = "default_groups_file")]
    pub groups: String,

    #[serde(default = "default_players_file")]
    pub players: String,

    #[serde(default = "default_player_settings_file")]
    pub player_settings: String,

    #[serde(default = "default_player_stats_file")]
    pub player_stats: String,
}

fn default_games_file() -> String {
    TableType::Games.default_filename().to_string()
}

fn default_groups_file() -> String {
    TableType::Groups.default_filename().to_string()
}

fn default_players_file() -> String {
    TableType::Players.default_filename().to_string()
}

fn default_player_settings_file() -> String {
    TableType::PlayerSettings.default_filename().to_string()
}

fn default_player_stats_file() -> String {
    TableType::PlayerStats.default_filename().to_string()
}

impl Default for TableFiles {
    fn default() -> Self {
        Self {
            games: default_games_file(),
            groups: default_groups_file(),
            players: default_players_file(),
            player_settings: default_player_settings_file(),
            player_stats: default_player_stats_file(),
        }
    }
}

impl TableFiles {
    pub fn filename(&self, table: TableType) -> &str {
        match table {
            TableType::Games => &self.games,
            TableType::Groups => &self.groups,
            TableType::Players => &self.players,
            TableType::PlayerSettings => &self.player_settings,
            TableType::PlayerStats => &self.player_stats,
        }
    }
}

/// Configuration for snapshot paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
    pub files: TableFiles,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self {
            data_dir,
            files: TableFiles::default(),
        }
    }

    pub fn with_files(mut self, files: TableFiles) -> Self {
        self.files = files;
        self
    }

    pub fn table_path(&self, table: TableType) -> PathBuf {
        self.data_dir.join(self.files.filename(table))
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_config_paths() {
        let config = StorageConfig::new(PathBuf::from("/data"));

        assert_eq!(
            config.table_path(TableType::Games),
            PathBuf::from("/data/games.parquet")
        );
        assert_eq!(
            config.table_path(TableType::PlayerSettings),
            PathBuf::from("/data/player_settings.parquet")
        );
    }

    #[test]
    fn test_storage_config_custom_files() {
        let files = TableFiles {
            groups: "groups_v2.parquet".to_string(),
            ..Default::default()
        };
        let config = StorageConfig::new(PathBuf::from("/data")).with_files(files);

        assert_eq!(
            config.table_path(TableType::Groups),
            PathBuf::from("/data/groups_v2.parquet")
        );
        assert_eq!(
            config.table_path(TableType::Players),
            PathBuf::from("/data/players.parquet")
        );
    }

    #[test]
    fn test_storage_config_default() {
        let config = StorageConfig::default();
        assert_eq!(config.data_dir, PathBuf::from("./data"));
    }
}
