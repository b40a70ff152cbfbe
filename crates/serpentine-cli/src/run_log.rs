use std::{
    fs::File,
    io::{BufWriter, Write as _},
    path::Path,
};

use anyhow::Context as _;
use serpentine_engine::DeathCause;
use serpentine_training::{
    genetic::{Agent, GenerationSummary},
    trainer::BenchmarkReport,
};
use tracing::warn;

use crate::util;

const CSV_HEADER: [&str; 11] = [
    "generation",
    "best_fitness",
    "mean_fitness",
    "best_ticks",
    "mean_ticks",
    "best_fruits",
    "mean_fruits",
    "deaths_wall",
    "deaths_self",
    "deaths_stall",
    "deaths_timeout",
];

/// Per-generation CSV and JSON-lines writers.
///
/// A sink that cannot be opened or written is reported and then disabled;
/// training carries on without it.
#[derive(Debug)]
pub struct RunLog {
    csv: Option<csv::Writer<File>>,
    json: Option<BufWriter<File>>,
}

impl RunLog {
    pub fn create(csv_path: &Path, json_path: &Path) -> Self {
        let csv = open_csv(csv_path)
            .inspect_err(|err| warn!("run log CSV disabled: {err:#}"))
            .ok();
        let json = open_json(json_path)
            .inspect_err(|err| warn!("run log JSON disabled: {err:#}"))
            .ok();
        Self { csv, json }
    }

    /// Appends `summary` to both sinks.
    pub fn record(&mut self, summary: &GenerationSummary) {
        if let Some(writer) = &mut self.csv {
            if let Err(err) = write_csv_row(writer, summary) {
                warn!("failed to write CSV row: {err:#}");
            }
        }
        if let Some(writer) = &mut self.json {
            if let Err(err) = write_json_line(writer, summary) {
                warn!("failed to write JSON line: {err:#}");
            }
        }
    }
}

fn open_csv(path: &Path) -> anyhow::Result<csv::Writer<File>> {
    util::create_parent_dir(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create CSV file: {}", path.display()))?;
    writer.write_record(CSV_HEADER)?;
    writer.flush()?;
    Ok(writer)
}

fn open_json(path: &Path) -> anyhow::Result<BufWriter<File>> {
    util::create_parent_dir(path)?;
    let file = File::create(path)
        .with_context(|| format!("Failed to create JSON lines file: {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_csv_row(
    writer: &mut csv::Writer<File>,
    summary: &GenerationSummary,
) -> anyhow::Result<()> {
    writer.write_record(csv_row(summary))?;
    writer.flush()?;
    Ok(())
}

fn write_json_line(
    writer: &mut BufWriter<File>,
    summary: &GenerationSummary,
) -> anyhow::Result<()> {
    serde_json::to_writer(&mut *writer, summary)?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn csv_row(summary: &GenerationSummary) -> [String; 11] {
    let deaths = &summary.death_counts;
    [
        summary.generation.to_string(),
        format!("{:.2}", summary.best_fitness),
        format!("{:.2}", summary.mean_fitness),
        summary.best_ticks.to_string(),
        format!("{:.2}", summary.mean_ticks),
        summary.best_fruits.to_string(),
        format!("{:.2}", summary.mean_fruits),
        deaths.wall.to_string(),
        deaths.self_collision.to_string(),
        deaths.stall.to_string(),
        deaths.timeout.to_string(),
    ]
}

pub fn summary_line(summary: &GenerationSummary) -> String {
    let deaths = &summary.death_counts;
    format!(
        "Gen {:4} | Best: {:8.1} | Mean: {:8.1} | Ticks: {:4} | Fruits: {} | Deaths: W={} S={} St={} T={}",
        summary.generation,
        summary.best_fitness,
        summary.mean_fitness,
        summary.best_ticks,
        summary.best_fruits,
        deaths.wall,
        deaths.self_collision,
        deaths.stall,
        deaths.timeout,
    )
}

pub fn benchmark_line(report: &BenchmarkReport) -> String {
    format!(
        "  [Benchmark] Gen {}: Avg Ticks={:.1}, Avg Fruits={:.2}",
        report.generation,
        report.ticks_mean(),
        report.fruits_mean(),
    )
}

pub fn agent_line(rank: usize, agent: &Agent) -> String {
    let (ticks, fruits, death) = agent
        .stats()
        .map_or((0, 0, DeathCause::None), |s| (s.ticks, s.fruits, s.death));
    format!(
        "  #{rank}: Fitness={:.1}, Ticks={ticks}, Fruits={fruits}, Death={death}",
        agent.fitness(),
    )
}

#[cfg(test)]
mod tests {
    use serpentine_engine::DeathCauseCounts;

    use super::*;

    fn summary() -> GenerationSummary {
        GenerationSummary {
            generation: 12,
            best_fitness: 195.0,
            mean_fitness: -120.456,
            best_ticks: 195,
            mean_ticks: 40.5,
            best_fruits: 0,
            mean_fruits: 0.0,
            death_counts: DeathCauseCounts {
                wall: 180,
                timeout: 20,
                ..DeathCauseCounts::new()
            },
        }
    }

    #[test]
    fn test_csv_row() {
        assert_eq!(
            csv_row(&summary()).join(","),
            "12,195.00,-120.46,195,40.50,0,0.00,180,0,0,20"
        );
    }

    #[test]
    fn test_summary_line() {
        assert_eq!(
            summary_line(&summary()),
            "Gen   12 | Best:    195.0 | Mean:   -120.5 | Ticks:  195 | Fruits: 0 | Deaths: W=180 S=0 St=0 T=20"
        );
    }

    #[test]
    fn test_sinks_write_rows() {
        let dir = std::env::temp_dir().join(format!("serpentine-run-log-{}", std::process::id()));
        let csv_path = dir.join("run.csv");
        let json_path = dir.join("nested/run.jsonl");
        {
            let mut log = RunLog::create(&csv_path, &json_path);
            log.record(&summary());
            log.record(&summary());
        }
        let csv_text = std::fs::read_to_string(&csv_path).unwrap();
        let lines = csv_text.lines().collect::<Vec<_>>();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], CSV_HEADER.join(","));

        let json_text = std::fs::read_to_string(&json_path).unwrap();
        let first: serde_json::Value =
            serde_json::from_str(json_text.lines().next().unwrap()).unwrap();
        assert_eq!(first["generation"], 12);
        assert_eq!(first["death_counts"]["wall"], 180);
        assert_eq!(first["death_counts"]["self"], 0);

        std::fs::remove_dir_all(dir).unwrap();
    }
}
