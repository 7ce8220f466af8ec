//! Player, per-game settings and per-game stats models.

use std::collections::BTreeMap;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::{GameId, PlayerId};

/// A player as listed in the players table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,

    /// Display name, unique across the table
    pub name: String,
}

impl Player {
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Camera configuration recorded for one player in one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraSettings {
    pub fov: f64,
    pub height: f64,
    pub pitch: f64,
    pub distance: f64,
    pub stiffness: f64,
    pub swivel_speed: f64,
    pub transition_speed: f64,
    pub steering_sensitivity: f64,
}

/// Column names of the camera tuple, in table order.
pub const CAMERA_COLUMNS: [&str; 8] = [
    "fov",
    "height",
    "pitch",
    "distance",
    "stiffness",
    "swivel_speed",
    "transition_speed",
    "steering_sensitivity",
];

impl CameraSettings {
    /// Field values in [`CAMERA_COLUMNS`] order.
    pub fn values(&self) -> [f64; 8] {
        [
            self.fov,
            self.height,
            self.pitch,
            self.distance,
            self.stiffness,
            self.swivel_speed,
            self.transition_speed,
            self.steering_sensitivity,
        ]
    }

    /// Build from values in [`CAMERA_COLUMNS`] order.
    pub fn from_values(v: [f64; 8]) -> Self {
        Self {
            fov: v[0],
            height: v[1],
            pitch: v[2],
            distance: v[3],
            stiffness: v[4],
            swivel_speed: v[5],
            transition_speed: v[6],
            steering_sensitivity: v[7],
        }
    }

    /// Exact, hashable identity of the tuple.
    pub fn key(&self) -> CameraKey {
        CameraKey(self.values().map(canonical_bits))
    }

    /// Copy with every field rounded to `decimals` places, for display.
    pub fn rounded(&self, decimals: i32) -> Self {
        let scale = 10f64.powi(decimals);
        Self::from_values(self.values().map(|v| (v * scale).round() / scale))
    }
}

/// Bit-pattern identity of a [`CameraSettings`] tuple.
///
/// Two tuples share a key iff every field is bitwise equal, except that
/// `-0.0` and `0.0` are folded together and all NaNs compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CameraKey([u64; 8]);

fn canonical_bits(v: f64) -> u64 {
    if v == 0.0 {
        0.0f64.to_bits()
    } else if v.is_nan() {
        f64::NAN.to_bits()
    } else {
        v.to_bits()
    }
}

/// Settings row: one per game per player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSetting {
    /// Game id
    pub id: GameId,

    pub player_id: PlayerId,

    /// When the game was played
    pub date: NaiveDateTime,

    pub car_name: String,

    #[serde(flatten)]
    pub camera: CameraSettings,
}

/// Per-game performance metrics. Carried through joins without
/// interpretation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerStat {
    /// Game id
    pub id: GameId,

    pub player_id: PlayerId,

    #[serde(default)]
    pub metrics: BTreeMap<String, f64>,
}
