//! Pure reshaping of scoring responses into display-ready structures.

use crate::models::{Dimension, DimensionDetail, LeaderboardRow};
use indexmap::IndexMap;
use serde::Serialize;

/// One bar of a per-agent score chart
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub name: String,
    pub score: f64,
}

/// One line of the explainability panel
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetailItem {
    pub dimension: String,
    /// Score on a 0 to 10 scale
    pub score: f64,
    pub justification: String,
}

/// One stacked segment of a heatmap bar
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatmapSegment {
    pub dimension: Dimension,
    pub score: f64,
}

/// One agent's stacked bar in the heatmap
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HeatmapRow {
    pub agent_id: String,
    /// Always the four leaderboard dimensions, in `Dimension::ALL` order
    pub segments: [HeatmapSegment; 4],
}

impl HeatmapRow {
    /// Length of the whole stacked bar
    pub fn total(&self) -> f64 {
        self.segments.iter().map(|s| s.score).sum()
    }
}

/// Chart series for one agent's scores, in the order the service sent them
pub fn chart_series(scores: &IndexMap<String, f64>) -> Vec<ChartPoint> {
    scores
        .iter()
        .map(|(name, score)| ChartPoint {
            name: name.clone(),
            score: *score,
        })
        .collect()
}

/// Per-dimension justifications, in the order the service sent them
pub fn detail_items(details: &IndexMap<String, DimensionDetail>) -> Vec<DetailItem> {
    details
        .iter()
        .map(|(dimension, detail)| DetailItem {
            dimension: dimension.clone(),
            score: detail.score,
            justification: detail.justification.clone(),
        })
        .collect()
}

/// Heatmap matrix: one row per leaderboard entry, leaderboard order kept
pub fn heatmap_matrix(leaderboard: &[LeaderboardRow]) -> Vec<HeatmapRow> {
    leaderboard
        .iter()
        .map(|row| HeatmapRow {
            agent_id: row.agent_id.clone(),
            segments: Dimension::ALL.map(|dimension| HeatmapSegment {
                dimension,
                score: row.score(dimension),
            }),
        })
        .collect()
}
