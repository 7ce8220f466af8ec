//! Parquet snapshot tables.
//!
//! Columns are cast to the types below on read, so upstream files may use
//! wider or narrower numeric types, large strings, or zoned timestamps.

use std::fs::File;

use arrow::array::{ArrayRef, AsArray};
use arrow::compute::cast;
use arrow::datatypes::{DataType, Float64Type, TimeUnit, TimestampMillisecondType};
use arrow::record_batch::RecordBatch;
use chrono::DateTime;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::{debug, info, warn};

use super::{StorageConfig, StorageError};
use crate::models::{
    CameraSettings, Game, GroupEdge, Player, PlayerSetting, PlayerStat, Tables, CAMERA_COLUMNS,
};

/// Snapshot table types.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableType {
    Games,
    Groups,
    Players,
    PlayerSettings,
    PlayerStats,
}

impl TableType {
    pub fn name(&self) -> &'static str {
        match self {
            TableType::Games => "games",
            TableType::Groups => "groups",
            TableType::Players => "players",
            TableType::PlayerSettings => "player_settings",
            TableType::PlayerStats => "player_stats",
        }
    }

    /// Filename used when the config does not override it.
    pub fn default_filename(&self) -> &'static str {
        match self {
            TableType::Games => "games.parquet",
            TableType::Groups => "groups.parquet",
            TableType::Players => "players.parquet",
            TableType::PlayerSettings => "player_settings.parquet",
            TableType::PlayerStats => "player_stats.parquet",
        }
    }
}

/// Reads a full [`Tables`] snapshot from Parquet files.
pub struct SnapshotReader {
    config: StorageConfig,
}

impl SnapshotReader {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    /// Check if a table file exists.
    pub fn exists(&self, table: TableType) -> bool {
        self.config.table_path(table).exists()
    }

    /// Load every table. The stats table is optional; the others must exist.
    pub fn load(&self) -> Result<Tables, StorageError> {
        let tables = Tables {
            games: self.read_games()?,
            groups: self.read_groups()?,
            players: self.read_players()?,
            player_settings: self.read_player_settings()?,
            player_stats: self.read_player_stats()?,
        };

        info!(
            "Loaded {} rows from {:?}: {} games, {} group edges, {} players, {} settings rows, {} stats rows",
            tables.row_count(),
            self.config.data_dir,
            tables.games.len(),
            tables.groups.len(),
            tables.players.len(),
            tables.player_settings.len(),
            tables.player_stats.len()
        );
        Ok(tables)
    }

    pub fn read_games(&self) -> Result<Vec<Game>, StorageError> {
        let table = TableType::Games;
        let mut games = Vec::new();

        for batch in self.read_batches(table)? {
            let ids = required(table, "id", strings(&batch, table, "id")?)?;
            let maps = required(table, "map_name", strings(&batch, table, "map_name")?)?;
            let groups = required(table, "group_id", strings(&batch, table, "group_id")?)?;

            for ((id, map_name), group_id) in ids.into_iter().zip(maps).zip(groups) {
                games.push(Game::new(id, map_name, group_id));
            }
        }
        Ok(games)
    }

    pub fn read_groups(&self) -> Result<Vec<GroupEdge>, StorageError> {
        let table = TableType::Groups;
        let mut edges = Vec::new();

        for batch in self.read_batches(table)? {
            let parents = required(
                table,
                "parent_group",
                strings(&batch, table, "parent_group")?,
            )?;
            let children = strings(&batch, table, "child_group")?;

            for (parent, child) in parents.into_iter().zip(children) {
                edges.push(GroupEdge {
                    parent_group: parent.into(),
                    child_group: child.map(Into::into),
                });
            }
        }
        Ok(edges)
    }

    pub fn read_players(&self) -> Result<Vec<Player>, StorageError> {
        let table = TableType::Players;
        let mut players = Vec::new();

        for batch in self.read_batches(table)? {
            let ids = required(table, "id", strings(&batch, table, "id")?)?;
            let names = required(table, "name", strings(&batch, table, "name")?)?;

            for (id, name) in ids.into_iter().zip(names) {
                players.push(Player::new(id, name));
            }
        }
        Ok(players)
    }

    pub fn read_player_settings(&self) -> Result<Vec<PlayerSetting>, StorageError> {
        let table = TableType::PlayerSettings;
        let mut settings = Vec::new();

        for batch in self.read_batches(table)? {
            let ids = required(table, "id", strings(&batch, table, "id")?)?;
            let players = required(table, "player_id", strings(&batch, table, "player_id")?)?;
            let dates = required(table, "date", timestamps(&batch, table, "date")?)?;
            let cars = required(table, "car_name", strings(&batch, table, "car_name")?)?;

            let mut camera_columns = Vec::with_capacity(CAMERA_COLUMNS.len());
            for column in CAMERA_COLUMNS {
                camera_columns.push(required(table, column, floats(&batch, table, column)?)?);
            }

            for (row, (((id, player_id), millis), car_name)) in ids
                .into_iter()
                .zip(players)
                .zip(dates)
                .zip(cars)
                .enumerate()
            {
                let date = DateTime::from_timestamp_millis(millis)
                    .ok_or_else(|| StorageError::InvalidValue {
                        table: table.name(),
                        column: "date".to_string(),
                        row,
                    })?
                    .naive_utc();

                let mut values = [0.0; 8];
                for (slot, column) in values.iter_mut().zip(&camera_columns) {
                    *slot = column[row];
                }

                settings.push(PlayerSetting {
                    id: id.into(),
                    player_id: player_id.into(),
                    date,
                    car_name,
                    camera: CameraSettings::from_values(values),
                });
            }
        }
        Ok(settings)
    }

    /// Every numeric column other than the keys becomes a metric.
    pub fn read_player_stats(&self) -> Result<Vec<PlayerStat>, StorageError> {
        let table = TableType::PlayerStats;
        if !self.exists(table) {
            warn!(
                "No {} table at {:?}, continuing without stats",
                table.name(),
                self.config.table_path(table)
            );
            return Ok(Vec::new());
        }

        let mut stats = Vec::new();
        for batch in self.read_batches(table)? {
            let ids = required(table, "id", strings(&batch, table, "id")?)?;
            let players = required(table, "player_id", strings(&batch, table, "player_id")?)?;

            let schema = batch.schema();
            let mut metric_columns = Vec::new();
            for field in schema.fields() {
                let name = field.name();
                if name != "id" && name != "player_id" && field.data_type().is_numeric() {
                    metric_columns.push((name.clone(), floats(&batch, table, name)?));
                }
            }

            for (row, (id, player_id)) in ids.into_iter().zip(players).enumerate() {
                let metrics = metric_columns
                    .iter()
                    .filter_map(|(name, values)| values[row].map(|v| (name.clone(), v)))
                    .collect();
                stats.push(PlayerStat {
                    id: id.into(),
                    player_id: player_id.into(),
                    metrics,
                });
            }
        }
        Ok(stats)
    }

    /// Read all record batches from one table file.
    pub fn read_batches(&self, table: TableType) -> Result<Vec<RecordBatch>, StorageError> {
        let path = self.config.table_path(table);

        if !path.exists() {
            return Err(StorageError::PathNotFound(path));
        }

        let file = File::open(&path)?;
        let reader = ParquetRecordBatchReaderBuilder::try_new(file)?.build()?;
        let batches = reader.collect::<Result<Vec<_>, _>>()?;

        debug!("Read {} batches from {:?}", batches.len(), path);
        Ok(batches)
    }
}

fn column_as(
    batch: &RecordBatch,
    table: TableType,
    name: &str,
    to: &DataType,
) -> Result<ArrayRef, StorageError> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| StorageError::MissingColumn {
            table: table.name(),
            column: name.to_string(),
        })?;
    Ok(cast(column, to)?)
}

fn strings(
    batch: &RecordBatch,
    table: TableType,
    name: &str,
) -> Result<Vec<Option<String>>, StorageError> {
    let array = column_as(batch, table, name, &DataType::Utf8)?;
    Ok(array
        .as_string::<i32>()
        .iter()
        .map(|v| v.map(str::to_string))
        .collect())
}

fn floats(
    batch: &RecordBatch,
    table: TableType,
    name: &str,
) -> Result<Vec<Option<f64>>, StorageError> {
    let array = column_as(batch, table, name, &DataType::Float64)?;
    Ok(array.as_primitive::<Float64Type>().iter().collect())
}

fn timestamps(
    batch: &RecordBatch,
    table: TableType,
    name: &str,
) -> Result<Vec<Option<i64>>, StorageError> {
    let array = column_as(
        batch,
        table,
        name,
        &DataType::Timestamp(TimeUnit::Millisecond, None),
    )?;
    Ok(array
        .as_primitive::<TimestampMillisecondType>()
        .iter()
        .collect())
}

/// Reject nulls in a column the model requires.
fn required<T>(
    table: TableType,
    column: &str,
    values: Vec<Option<T>>,
) -> Result<Vec<T>, StorageError> {
    values
        .into_iter()
        .enumerate()
        .map(|(row, v)| {
            v.ok_or_else(|| StorageError::NullValue {
                table: table.name(),
                column: column.to_string(),
                row,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::fs;
    use std::path::Path;
    use std::sync::Arc;

    use arrow::array::{Float64Array, StringArray, TimestampMillisecondArray};
    use arrow::datatypes::{Field, Schema};
    use chrono::NaiveDate;
    use parquet::arrow::ArrowWriter;
    use parquet::basic::Compression;
    use parquet::file::properties::WriterProperties;
    use tempfile::TempDir;

    use super::*;
    use crate::models::GameId;

    fn games_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("map_name", DataType::Utf8, false),
            Field::new("group_id", DataType::Utf8, false),
        ])
    }

    fn groups_schema() -> Schema {
        Schema::new(vec![
            Field::new("parent_group", DataType::Utf8, false),
            Field::new("child_group", DataType::Utf8, true),
        ])
    }

    fn players_schema() -> Schema {
        Schema::new(vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("name", DataType::Utf8, false),
        ])
    }

    fn player_settings_schema() -> Schema {
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("player_id", DataType::Utf8, false),
            Field::new(
                "date",
                DataType::Timestamp(TimeUnit::Millisecond, None),
                false,
            ),
            Field::new("car_name", DataType::Utf8, false),
        ];
        fields.extend(
            CAMERA_COLUMNS
                .iter()
                .map(|c| Field::new(*c, DataType::Float64, false)),
        );
        Schema::new(fields)
    }

    /// Stats have a fixed key and one float column per metric.
    fn player_stats_schema(metrics: &[&str]) -> Schema {
        let mut fields = vec![
            Field::new("id", DataType::Utf8, false),
            Field::new("player_id", DataType::Utf8, false),
        ];
        fields.extend(
            metrics
                .iter()
                .map(|m| Field::new(*m, DataType::Float64, true)),
        );
        Schema::new(fields)
    }

    /// Writes fixture tables in the layout the reader expects.
    struct SnapshotWriter {
        config: StorageConfig,
    }

    impl SnapshotWriter {
        fn new(config: StorageConfig) -> Self {
            Self { config }
        }

        /// Write every table of `tables`.
        fn write_all(&self, tables: &Tables) -> Result<(), StorageError> {
            self.write_games(&tables.games)?;
            self.write_groups(&tables.groups)?;
            self.write_players(&tables.players)?;
            self.write_player_settings(&tables.player_settings)?;
            self.write_player_stats(&tables.player_stats)?;
            Ok(())
        }

        fn write_games(&self, games: &[Game]) -> Result<(), StorageError> {
            let schema = Arc::new(games_schema());

            let ids: Vec<&str> = games.iter().map(|g| g.id.as_str()).collect();
            let maps: Vec<&str> = games.iter().map(|g| g.map_name.as_str()).collect();
            let groups: Vec<&str> = games.iter().map(|g| g.group_id.as_str()).collect();

            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(ids)) as ArrayRef,
                    Arc::new(StringArray::from(maps)) as ArrayRef,
                    Arc::new(StringArray::from(groups)) as ArrayRef,
                ],
            )?;

            self.write_batch(TableType::Games, &schema, &batch)
        }

        fn write_groups(&self, edges: &[GroupEdge]) -> Result<(), StorageError> {
            let schema = Arc::new(groups_schema());

            let parents: Vec<&str> = edges.iter().map(|e| e.parent_group.as_str()).collect();
            let children: Vec<Option<&str>> = edges
                .iter()
                .map(|e| e.child_group.as_ref().map(|c| c.as_str()))
                .collect();

            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(parents)) as ArrayRef,
                    Arc::new(StringArray::from(children)) as ArrayRef,
                ],
            )?;

            self.write_batch(TableType::Groups, &schema, &batch)
        }

        fn write_players(&self, players: &[Player]) -> Result<(), StorageError> {
            let schema = Arc::new(players_schema());

            let ids: Vec<&str> = players.iter().map(|p| p.id.as_str()).collect();
            let names: Vec<&str> = players.iter().map(|p| p.name.as_str()).collect();

            let batch = RecordBatch::try_new(
                schema.clone(),
                vec![
                    Arc::new(StringArray::from(ids)) as ArrayRef,
                    Arc::new(StringArray::from(names)) as ArrayRef,
                ],
            )?;

            self.write_batch(TableType::Players, &schema, &batch)
        }

        fn write_player_settings(&self, settings: &[PlayerSetting]) -> Result<(), StorageError> {
            let schema = Arc::new(player_settings_schema());

            let ids: Vec<&str> = settings.iter().map(|s| s.id.as_str()).collect();
            let players: Vec<&str> = settings.iter().map(|s| s.player_id.as_str()).collect();
            let dates: Vec<i64> = settings
                .iter()
                .map(|s| s.date.and_utc().timestamp_millis())
                .collect();
            let cars: Vec<&str> = settings.iter().map(|s| s.car_name.as_str()).collect();

            let mut columns = vec![
                Arc::new(StringArray::from(ids)) as ArrayRef,
                Arc::new(StringArray::from(players)) as ArrayRef,
                Arc::new(TimestampMillisecondArray::from(dates)) as ArrayRef,
                Arc::new(StringArray::from(cars)) as ArrayRef,
            ];
            for i in 0..CAMERA_COLUMNS.len() {
                let values: Vec<f64> = settings.iter().map(|s| s.camera.values()[i]).collect();
                columns.push(Arc::new(Float64Array::from(values)) as ArrayRef);
            }

            let batch = RecordBatch::try_new(schema.clone(), columns)?;
            self.write_batch(TableType::PlayerSettings, &schema, &batch)
        }

        /// Metric columns are the union of all metric names, sorted; missing
        /// values are written as nulls.
        fn write_player_stats(&self, stats: &[PlayerStat]) -> Result<(), StorageError> {
            let metrics: BTreeSet<&str> = stats
                .iter()
                .flat_map(|s| s.metrics.keys().map(String::as_str))
                .collect();
            let metrics: Vec<&str> = metrics.into_iter().collect();
            let schema = Arc::new(player_stats_schema(&metrics));

            let ids: Vec<&str> = stats.iter().map(|s| s.id.as_str()).collect();
            let players: Vec<&str> = stats.iter().map(|s| s.player_id.as_str()).collect();

            let mut columns = vec![
                Arc::new(StringArray::from(ids)) as ArrayRef,
                Arc::new(StringArray::from(players)) as ArrayRef,
            ];
            for metric in &metrics {
                let values: Vec<Option<f64>> = stats
                    .iter()
                    .map(|s| s.metrics.get(*metric).copied())
                    .collect();
                columns.push(Arc::new(Float64Array::from(values)) as ArrayRef);
            }

            let batch = RecordBatch::try_new(schema.clone(), columns)?;
            self.write_batch(TableType::PlayerStats, &schema, &batch)
        }

        /// Write a record batch to the table's file, replacing it.
        fn write_batch(
            &self,
            table: TableType,
            schema: &Arc<Schema>,
            batch: &RecordBatch,
        ) -> Result<(), StorageError> {
            let path = self.config.table_path(table);
            ensure_parent(&path)?;

            let file = File::create(&path)?;
            let props = WriterProperties::builder()
                .set_compression(Compression::SNAPPY)
                .build();

            let mut writer = ArrowWriter::try_new(file, schema.clone(), Some(props))?;
            writer.write(batch)?;
            writer.close()?;

            info!("Wrote {} {} rows to {:?}", batch.num_rows(), table.name(), path);
            Ok(())
        }
    }

    fn ensure_parent(path: &Path) -> Result<(), StorageError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }

    fn test_config(temp_dir: &TempDir) -> StorageConfig {
        StorageConfig::new(temp_dir.path().to_path_buf())
    }

    fn sample_tables() -> Tables {
        let date = NaiveDate::from_ymd_opt(2024, 6, 15)
            .unwrap()
            .and_hms_milli_opt(20, 31, 5, 250)
            .unwrap();

        Tables {
            games: vec![Game::new("g1", "DFH Stadium", "worlds-final")],
            groups: vec![
                GroupEdge::new("worlds", "worlds-final"),
                GroupEdge::childless("worlds-final"),
            ],
            players: vec![Player::new("p1", "Zen")],
            player_settings: vec![PlayerSetting {
                id: GameId::from("g1"),
                player_id: "p1".into(),
                date,
                car_name: "Fennec".to_string(),
                camera: CameraSettings {
                    fov: 110.0,
                    height: 100.0,
                    pitch: -3.0,
                    distance: 270.0,
                    stiffness: 0.5,
                    swivel_speed: 5.3,
                    transition_speed: 1.2,
                    steering_sensitivity: 1.4,
                },
            }],
            player_stats: vec![PlayerStat {
                id: "g1".into(),
                player_id: "p1".into(),
                metrics: [("goals".to_string(), 3.0), ("saves".to_string(), 1.0)]
                    .into_iter()
                    .collect(),
            }],
        }
    }

    #[test]
    fn test_table_type_filename() {
        assert_eq!(TableType::Games.default_filename(), "games.parquet");
        assert_eq!(
            TableType::PlayerSettings.default_filename(),
            "player_settings.parquet"
        );
    }

    #[test]
    fn test_write_and_load_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let tables = sample_tables();

        SnapshotWriter::new(config.clone()).write_all(&tables).unwrap();
        let loaded = SnapshotReader::new(config).load().unwrap();

        assert_eq!(loaded.games, tables.games);
        assert_eq!(loaded.groups, tables.groups);
        assert_eq!(loaded.players, tables.players);
        assert_eq!(loaded.player_settings, tables.player_settings);
        assert_eq!(loaded.player_stats, tables.player_stats);
    }

    #[test]
    fn test_missing_stats_table_is_tolerated() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);
        let tables = sample_tables();

        let writer = SnapshotWriter::new(config.clone());
        writer.write_games(&tables.games).unwrap();
        writer.write_groups(&tables.groups).unwrap();
        writer.write_players(&tables.players).unwrap();
        writer.write_player_settings(&tables.player_settings).unwrap();

        let loaded = SnapshotReader::new(config).load().unwrap();
        assert!(loaded.player_stats.is_empty());
        assert_eq!(loaded.player_settings.len(), 1);
    }

    #[test]
    fn test_missing_required_table() {
        let temp_dir = TempDir::new().unwrap();
        let reader = SnapshotReader::new(test_config(&temp_dir));

        assert!(!reader.exists(TableType::Games));
        assert!(matches!(
            reader.read_games(),
            Err(StorageError::PathNotFound(_))
        ));
    }

    #[test]
    fn test_missing_column() {
        let temp_dir = TempDir::new().unwrap();
        let config = test_config(&temp_dir);

        // A players file written under the games name lacks map_name
        let files = super::super::TableFiles {
            games: "players.parquet".to_string(),
            ..Default::default()
        };
        SnapshotWriter::new(config.clone())
            .write_players(&[Player::new("p1", "Zen")])
            .unwrap();

        let reader = SnapshotReader::new(config.with_files(files));
        match reader.read_games() {
            Err(StorageError::MissingColumn { table, column }) => {
                assert_eq!(table, "games");
                assert_eq!(column, "map_name");
            }
            other => panic!("expected missing column, got {:?}", other),
        }
    }
}
