//! Statistics Aggregator: summary metrics over a session's frames (pure logic).

use serde::{Deserialize, Serialize};

use crate::frame::FrameRecord;

/// Summary metrics computed once, at completion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatistics {
    /// Mean number of players per frame; `0` for an empty session.
    pub avg_players: f64,
    /// Mean number of keypoints per frame; `0` for an empty session.
    pub avg_keypoints: f64,
    /// Number of frames with at least one ball detection.
    pub frames_with_ball: u64,
    /// Number of frames aggregated.
    pub total_frames: u64,
}

/// Compute [`SessionStatistics`] over `frames`.
///
/// The result does not depend on frame order.
pub fn compute(frames: &[FrameRecord]) -> SessionStatistics {
    if frames.is_empty() {
        return SessionStatistics::default();
    }

    let count = frames.len() as f64;
    let total_players: usize = frames.iter().map(|f| f.players.len()).sum();
    let total_keypoints: usize = frames.iter().map(|f| f.keypoints.len()).sum();
    let frames_with_ball = frames.iter().filter(|f| f.has_ball()).count() as u64;

    SessionStatistics {
        avg_players: total_players as f64 / count,
        avg_keypoints: total_keypoints as f64 / count,
        frames_with_ball,
        total_frames: frames.len() as u64,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{BallDetection, KeypointDetection, PlayerDetection};

    fn frame(players: usize, keypoints: usize, balls: usize) -> FrameRecord {
        FrameRecord {
            players: vec![PlayerDetection::default(); players],
            keypoints: vec![KeypointDetection::default(); keypoints],
            balls: vec![BallDetection::default(); balls],
            ..Default::default()
        }
    }

    #[test]
    fn empty_session_is_all_zero() {
        let stats = compute(&[]);
        assert_eq!(stats.avg_players, 0.0);
        assert_eq!(stats.avg_keypoints, 0.0);
        assert_eq!(stats.frames_with_ball, 0);
        assert_eq!(stats.total_frames, 0);
    }

    #[test]
    fn three_frame_match() {
        let frames = [frame(2, 1, 0), frame(2, 1, 1), frame(2, 1, 0)];
        let stats = compute(&frames);
        assert_eq!(stats.avg_players, 2.0);
        assert_eq!(stats.avg_keypoints, 1.0);
        assert_eq!(stats.frames_with_ball, 1);
        assert_eq!(stats.total_frames, 3);
    }

    #[test]
    fn averages_are_fractional() {
        let stats = compute(&[frame(1, 0, 0), frame(2, 3, 0)]);
        assert_eq!(stats.avg_players, 1.5);
        assert_eq!(stats.avg_keypoints, 1.5);
    }

    #[test]
    fn multiple_balls_count_the_frame_once() {
        let stats = compute(&[frame(0, 0, 3)]);
        assert_eq!(stats.frames_with_ball, 1);
    }

    #[test]
    fn order_does_not_matter() {
        let forward = [frame(4, 2, 1), frame(0, 0, 0), frame(1, 5, 2)];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(compute(&forward), compute(&reversed));
    }

    #[test]
    fn serializes_with_wire_names() {
        let json = serde_json::to_value(compute(&[frame(1, 1, 1)])).unwrap();
        assert_eq!(json["avgPlayers"], 1.0);
        assert_eq!(json["avgKeypoints"], 1.0);
        assert_eq!(json["framesWithBall"], 1);
        assert_eq!(json["totalFrames"], 1);
    }
}
