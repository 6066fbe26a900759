//! Frame Record Model: the detections reported for a single video frame.
//!
//! Every field is optional on the wire. An absent key and an explicit `null`
//! both decode to the field's empty value, so `{}` is a valid (empty) frame.
//! Detection values are carried as reported; nothing here judges whether a
//! box or a confidence is plausible.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::payload::nullable;

/// Team id recorded for players the producer did not assign to a team.
pub const UNASSIGNED_TEAM: i64 = -1;

// ---------------------------------------------------------------------------
// Geometry
// ---------------------------------------------------------------------------

/// Axis-aligned box in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    #[serde(default, deserialize_with = "nullable")]
    pub x: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub y: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub width: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub height: f64,
}

/// A point, either in frame pixels or on the tactical map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    #[serde(default, deserialize_with = "nullable")]
    pub x: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub y: f64,
}

// ---------------------------------------------------------------------------
// Detections
// ---------------------------------------------------------------------------

/// One detected player.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerDetection {
    #[serde(
        default,
        rename = "bbox",
        alias = "boundingBox",
        deserialize_with = "nullable"
    )]
    pub bounding_box: BoundingBox,
    #[serde(default, deserialize_with = "nullable")]
    pub class_id: i64,
    /// Nominally in `[0, 1]`; not enforced.
    #[serde(default, deserialize_with = "nullable")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<i64>,
    /// Player position projected onto the tactical map.
    #[serde(
        default,
        rename = "tacMapPosition",
        alias = "mappedPosition",
        skip_serializing_if = "Option::is_none"
    )]
    pub mapped_position: Option<Position>,
}

/// One detected pitch keypoint (e.g. "Center circle").
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct KeypointDetection {
    #[serde(default, deserialize_with = "nullable")]
    pub label: String,
    #[serde(default, deserialize_with = "nullable")]
    pub x: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub y: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub confidence: f64,
}

/// One detected ball candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BallDetection {
    #[serde(default, deserialize_with = "nullable")]
    pub x: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub y: f64,
    #[serde(default, deserialize_with = "nullable")]
    pub confidence: f64,
}

// ---------------------------------------------------------------------------
// Frame record
// ---------------------------------------------------------------------------

/// All detections reported for a single frame.
///
/// `frame_number` is producer-supplied and is not checked for ordering or
/// uniqueness. `timestamp` is opaque and kept verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRecord {
    #[serde(default, deserialize_with = "nullable")]
    pub frame_number: i64,
    #[serde(default, skip_serializing_if = "serde_json::Value::is_null")]
    pub timestamp: serde_json::Value,
    /// Per-frame echo of the session's video source, when the producer sends it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_source: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub players: Vec<PlayerDetection>,
    #[serde(default, deserialize_with = "nullable")]
    pub keypoints: Vec<KeypointDetection>,
    #[serde(default, deserialize_with = "nullable")]
    pub balls: Vec<BallDetection>,
}

impl FrameRecord {
    /// Whether at least one ball candidate was detected in this frame.
    pub fn has_ball(&self) -> bool {
        !self.balls.is_empty()
    }

    /// Number of players per team id. Players without a team count under
    /// [`UNASSIGNED_TEAM`].
    pub fn team_counts(&self) -> BTreeMap<i64, usize> {
        let mut counts = BTreeMap::new();
        for player in &self.players {
            *counts
                .entry(player.team_id.unwrap_or(UNASSIGNED_TEAM))
                .or_insert(0) += 1;
        }
        counts
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
