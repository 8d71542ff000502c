use std::ffi::OsStr;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

use csv::Writer;
use serde::Serialize;

use crate::error::EpinetError;
use crate::simulation::Simulation;
use crate::state::{Day, NodeState};
use crate::statistics::StatisticsSeries;

pub const STATISTICS_REPORT: &str = "statistics.csv";
pub const NODES_REPORT: &str = "nodes.csv";

/// Where reports go and whether existing files may be replaced.
#[derive(Clone, Debug)]
pub struct ReportOptions {
    pub file_prefix: String,
    pub output_dir: PathBuf,
    pub overwrite: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        ReportOptions {
            file_prefix: String::new(),
            output_dir: PathBuf::from("."),
            overwrite: false,
        }
    }
}

impl ReportOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_prefix(&mut self, file_prefix: impl Into<String>) -> &mut Self {
        self.file_prefix = file_prefix.into();
        self
    }

    pub fn directory(&mut self, directory: impl Into<PathBuf>) -> &mut Self {
        self.output_dir = directory.into();
        self
    }

    pub fn overwrite(&mut self, overwrite: bool) -> &mut Self {
        self.overwrite = overwrite;
        self
    }

    /// The full path of the report called `name`.
    #[must_use]
    pub fn path_for(&self, name: &str) -> PathBuf {
        self.output_dir.join(format!("{}{name}", self.file_prefix))
    }
}

#[derive(Serialize)]
struct StatisticsRow {
    day: Day,
    susceptible: usize,
    infected: usize,
    recovered: usize,
    deceased: usize,
}

#[derive(Serialize)]
struct NodeRow {
    id: usize,
    state: NodeState,
    age: f64,
    health: f64,
    mobility: f64,
    degree: usize,
}

// Checks that the path is a CSV, creates its parent directories and opens it for writing.
// An existing file is only replaced when `overwrite` is set.
fn generate_validate_filepath(path: &Path, overwrite: bool) -> Result<File, EpinetError> {
    match path.extension().and_then(OsStr::to_str) {
        Some("csv") => {
            if let Some(parent) = path.parent() {
                create_dir_all(parent)?;
            }
            if !overwrite && path.exists() {
                return Err(EpinetError::ReportError(format!(
                    "{} already exists; set overwrite to replace it",
                    path.display()
                )));
            }
            Ok(File::create(path)?)
        }
        _ => Err(EpinetError::ReportError(
            "Report output files must be CSVs at this time".to_string(),
        )),
    }
}

/// Writes one row per day: `day, susceptible, infected, recovered, deceased`.
///
/// # Errors
///
/// Returns an `EpinetError` if the path is not a `.csv`, already exists without
/// `overwrite`, or cannot be written.
pub fn write_statistics(
    series: &StatisticsSeries,
    path: &Path,
    overwrite: bool,
) -> Result<(), EpinetError> {
    let mut writer = Writer::from_writer(generate_validate_filepath(path, overwrite)?);
    for counts in series.iter() {
        writer.serialize(StatisticsRow {
            day: counts.day,
            susceptible: counts.susceptible,
            infected: counts.infected,
            recovered: counts.recovered,
            deceased: counts.deceased,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes one row per node: `id, state, age, health, mobility, degree`.
///
/// # Errors
///
/// Same as [`write_statistics`].
pub fn write_nodes(simulation: &Simulation, path: &Path, overwrite: bool) -> Result<(), EpinetError> {
    let mut writer = Writer::from_writer(generate_validate_filepath(path, overwrite)?);
    for view in simulation.node_views() {
        writer.serialize(NodeRow {
            id: view.id.index(),
            state: view.state,
            age: view.attributes.age,
            health: view.attributes.health,
            mobility: view.attributes.mobility,
            degree: view.degree,
        })?;
    }
    writer.flush()?;
    Ok(())
}

/// Writes both reports under `options` and returns their paths.
///
/// # Errors
///
/// Returns the first error from [`write_statistics`] or [`write_nodes`].
pub fn write_reports(
    simulation: &Simulation,
    options: &ReportOptions,
) -> Result<(PathBuf, PathBuf), EpinetError> {
    let statistics_path = options.path_for(STATISTICS_REPORT);
    write_statistics(simulation.statistics(), &statistics_path, options.overwrite)?;
    let nodes_path = options.path_for(NODES_REPORT);
    write_nodes(simulation, &nodes_path, options.overwrite)?;
    Ok((statistics_path, nodes_path))
}

#[cfg(test)]
mod test {
    use std::fs;

    use serde::Deserialize;
    use tempfile::tempdir;

    use super::*;
    use crate::parameters::SimulationBuilder;

    #[derive(Deserialize)]
    struct StatisticsRecord {
        day: Day,
        susceptible: usize,
        infected: usize,
        recovered: usize,
        deceased: usize,
    }

    fn simulation() -> Simulation {
        let mut simulation = SimulationBuilder::default()
            .network_size(50)
            .network_param(2)
            .initial_infected_percent(0.1)
            .build()
            .unwrap();
        simulation.advance_days(3).unwrap();
        simulation
    }

    #[test]
    fn statistics_rows_per_day() {
        let simulation = simulation();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("stats.csv");
        write_statistics(simulation.statistics(), &path, false).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let rows: Vec<StatisticsRecord> = reader.deserialize().map(Result::unwrap).collect();
        assert_eq!(rows.len(), 4);
        for (day, row) in rows.iter().enumerate() {
            assert_eq!(row.day as usize, day);
            assert_eq!(row.susceptible + row.infected + row.recovered + row.deceased, 50);
        }
    }

    #[test]
    fn node_table_header_and_rows() {
        let simulation = simulation();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("nodes.csv");
        write_nodes(&simulation, &path, false).unwrap();

        let mut reader = csv::Reader::from_path(&path).unwrap();
        let headers = reader.headers().unwrap().clone();
        assert_eq!(
            headers.iter().collect::<Vec<_>>(),
            ["id", "state", "age", "health", "mobility", "degree"]
        );
        assert_eq!(reader.records().count(), 50);
    }

    #[test]
    fn directory_creation_writing_works() {
        let simulation = simulation();
        let temp_dir = tempdir().unwrap();
        let mut options = ReportOptions::new();
        options
            .directory(temp_dir.path().join("test-temp"))
            .file_prefix("run1_");
        let (statistics_path, nodes_path) = write_reports(&simulation, &options).unwrap();
        assert_eq!(
            statistics_path,
            temp_dir.path().join("test-temp").join("run1_statistics.csv")
        );
        assert!(statistics_path.exists());
        assert!(nodes_path.exists());
    }

    #[test]
    fn respects_overwrite_false() {
        let simulation = simulation();
        let temp_dir = tempdir().unwrap();
        let path = temp_dir.path().join("stats.csv");
        fs::write(&path, "keep").unwrap();

        let err = write_statistics(simulation.statistics(), &path, false).unwrap_err();
        assert!(matches!(err, EpinetError::ReportError(_)));
        assert_eq!(fs::read_to_string(&path).unwrap(), "keep");

        write_statistics(simulation.statistics(), &path, true).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("day,"));
    }

    #[test]
    fn only_csvs_allowed() {
        let temp_dir = tempdir().unwrap();
        let result = generate_validate_filepath(&temp_dir.path().join("sample_report.tsv"), true);
        match result {
            Err(EpinetError::ReportError(msg)) => {
                assert_eq!(msg, "Report output files must be CSVs at this time");
            }
            _ => panic!("expected a report error"),
        }
    }
}
