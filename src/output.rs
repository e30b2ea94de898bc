use crate::aggregate::{self, HeatmapRow};
use crate::models::{
    BatchResult, Dimension, Evaluation, EvaluationResult, LeaderboardRow, ResultsMap,
};
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::io::Write;

/// Characters per 1.0 of score in text bars
const BAR_WIDTH: usize = 20;

/// Output format options
#[derive(Debug, Clone, Copy, ValueEnum, Serialize, Deserialize)]
pub enum OutputFormat {
    Plain,
    Json,
}

/// Print single-item evaluation results in the specified format
pub fn write_results(
    out: &mut impl Write,
    results: &ResultsMap,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Plain => write_results_plain(out, results),
        OutputFormat::Json => write_json(out, results),
    }
}

/// Print a batch leaderboard in the specified format
pub fn write_batch(
    out: &mut impl Write,
    batch: &BatchResult,
    format: OutputFormat,
) -> Result<()> {
    match format {
        OutputFormat::Plain => write_batch_plain(out, batch),
        OutputFormat::Json => {
            #[derive(Serialize)]
            struct BatchView<'a> {
                leaderboard: &'a [LeaderboardRow],
                heatmap: Vec<HeatmapRow>,
            }
            write_json(
                out,
                &BatchView {
                    leaderboard: &batch.leaderboard,
                    heatmap: aggregate::heatmap_matrix(&batch.leaderboard),
                },
            )
        }
    }
}

fn write_json<T: Serialize + ?Sized>(out: &mut impl Write, value: &T) -> Result<()> {
    let json =
        serde_json::to_string_pretty(value).context("Failed to serialize results to JSON")?;
    writeln!(out, "{}", json)?;
    Ok(())
}

fn write_results_plain(out: &mut impl Write, results: &ResultsMap) -> Result<()> {
    if results.is_empty() {
        writeln!(out, "No evaluation results.")?;
        return Ok(());
    }

    let failed = results.values().filter(|r| r.is_error()).count();
    writeln!(out, "Evaluation Results")?;
    writeln!(out, "==================")?;
    writeln!(out, "{} agents evaluated, {} failed", results.len(), failed)?;
    for (agent_id, result) in results {
        writeln!(out)?;
        writeln!(out, "=== {} ===", agent_id)?;
        match result {
            EvaluationResult::Failed { error } => writeln!(out, "Error: {}", error)?,
            EvaluationResult::Scored(evaluation) => write_evaluation_plain(out, evaluation)?,
        }
    }
    Ok(())
}

fn write_evaluation_plain(out: &mut impl Write, evaluation: &Evaluation) -> Result<()> {
    writeln!(out, "Scores:")?;
    for point in aggregate::chart_series(&evaluation.scores) {
        writeln!(out, "  {:<22} {:.3} {}", point.name, point.score, bar(point.score, '#'))?;
    }

    let details = aggregate::detail_items(&evaluation.details);
    if !details.is_empty() {
        writeln!(out, "Explainability (per-dimension):")?;
        for item in details {
            writeln!(out, "  • {}: score {}/10", item.dimension, item.score)?;
            if !item.justification.is_empty() {
                writeln!(out, "    {}", item.justification)?;
            }
        }
    }

    writeln!(out, "Combined explanation:")?;
    writeln!(out, "{}", evaluation.explanation)?;
    Ok(())
}

fn write_batch_plain(out: &mut impl Write, batch: &BatchResult) -> Result<()> {
    writeln!(out, "Leaderboard")?;
    writeln!(out, "-----------")?;
    if batch.leaderboard.is_empty() {
        writeln!(out, "No agents were ranked.")?;
        return Ok(());
    }

    write!(out, "{:<16}", "Agent ID")?;
    for dimension in Dimension::ALL {
        write!(out, " {:>22}", dimension.label())?;
    }
    writeln!(out)?;
    writeln!(out, "{}", "-".repeat(16 + 23 * Dimension::ALL.len()))?;

    for row in &batch.leaderboard {
        write!(out, "{:<16}", row.agent_id)?;
        for dimension in Dimension::ALL {
            write!(out, " {:>22.2}", row.score(dimension))?;
        }
        writeln!(out)?;
    }

    writeln!(out)?;
    writeln!(out, "Heatmap (Strengths & Weaknesses)")?;
    writeln!(out, "--------------------------------")?;
    for row in aggregate::heatmap_matrix(&batch.leaderboard) {
        let stacked: String = row
            .segments
            .iter()
            .map(|segment| bar(segment.score, segment_glyph(segment.dimension)))
            .collect();
        writeln!(out, "{:<16} {} {:.2}", row.agent_id, stacked, row.total())?;
    }
    let legend: Vec<String> = Dimension::ALL
        .iter()
        .map(|d| format!("{}={}", segment_glyph(*d), d.label()))
        .collect();
    writeln!(out, "Legend: {}", legend.join(", "))?;
    Ok(())
}

fn segment_glyph(dimension: Dimension) -> char {
    match dimension {
        Dimension::InstructionFollowing => 'I',
        Dimension::Coherence => 'C',
        Dimension::AssumptionControl => 'A',
        Dimension::Hallucination => 'H',
    }
}

/// Text bar proportional to a 0..1 score
fn bar(score: f64, glyph: char) -> String {
    let cells = (score.clamp(0.0, 1.0) * BAR_WIDTH as f64).round() as usize;
    std::iter::repeat_n(glyph, cells).collect()
}
