//! Capturing a simulation between days and restoring it later.
//!
//! A snapshot holds everything needed to continue a run. Random streams are not stored:
//! they are re-derived from the seed at the start of every day, so a restored simulation
//! draws exactly what the uninterrupted run would have drawn.
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use bincode::config;
use serde::{Deserialize, Serialize};

use crate::error::EpinetError;
use crate::network::Network;
use crate::parameters::Parameters;
use crate::random::RandomSource;
use crate::simulation::Simulation;
use crate::state::{Day, NodeRecord};
use crate::statistics::{DailyCounts, StatisticsSeries};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SimulationSnapshot {
    pub parameters: Parameters,
    pub network: Network,
    pub records: Vec<NodeRecord>,
    pub statistics: StatisticsSeries,
    pub current_day: Day,
}

impl SimulationSnapshot {
    /// Writes the snapshot as JSON, creating parent directories as needed.
    ///
    /// # Errors
    ///
    /// Returns an `EpinetError` if the file cannot be created or written.
    pub fn save_json(&self, path: &Path) -> Result<(), EpinetError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// # Errors
    ///
    /// Returns an `EpinetError` if the file cannot be read or is not a valid snapshot.
    pub fn load_json(path: &Path) -> Result<Self, EpinetError> {
        let reader = BufReader::new(File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    /// Encodes the snapshot in the compact binary form.
    ///
    /// # Errors
    ///
    /// Returns `EpinetError::EncodeError` if encoding fails.
    pub fn to_bytes(&self) -> Result<Vec<u8>, EpinetError> {
        Ok(bincode::serde::encode_to_vec(self, config::standard())?)
    }

    /// # Errors
    ///
    /// Returns `EpinetError::DecodeError` if `bytes` is not an encoded snapshot.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, EpinetError> {
        let (snapshot, _) = bincode::serde::decode_from_slice(bytes, config::standard())?;
        Ok(snapshot)
    }

    fn check_consistency(&self) -> Result<(), EpinetError> {
        let node_count = self.network.node_count();
        if self.records.len() != node_count {
            return Err(EpinetError::InvalidState(format!(
                "snapshot has {} node records for {node_count} nodes",
                self.records.len()
            )));
        }
        if self.statistics.is_empty() {
            if self.current_day != 0 {
                return Err(EpinetError::InvalidState(format!(
                    "snapshot on day {} has no statistics",
                    self.current_day
                )));
            }
            return Ok(());
        }
        if self.statistics.len() != self.current_day as usize + 1 {
            return Err(EpinetError::InvalidState(format!(
                "snapshot on day {} has {} days of statistics",
                self.current_day,
                self.statistics.len()
            )));
        }
        if self.statistics.latest() != Some(DailyCounts::tally(self.current_day, &self.records)) {
            return Err(EpinetError::InvalidState(
                "snapshot statistics do not match its node records".to_string(),
            ));
        }
        Ok(())
    }
}

impl Simulation {
    /// Captures the current state. Only meaningful between days, which is the only time
    /// the caller can observe a simulation.
    #[must_use]
    pub fn snapshot(&self) -> SimulationSnapshot {
        SimulationSnapshot {
            parameters: self.parameters.clone(),
            network: self.network.clone(),
            records: self.records.clone(),
            statistics: self.statistics.clone(),
            current_day: self.current_day,
        }
    }

    /// Rebuilds a simulation that continues exactly as the one `snapshot` was taken from.
    ///
    /// # Errors
    ///
    /// Returns a configuration error if the stored parameters are invalid, and
    /// `EpinetError::InvalidState` if the records, statistics and clock disagree.
    pub fn restore(snapshot: SimulationSnapshot) -> Result<Self, EpinetError> {
        snapshot.parameters.validate()?;
        snapshot.check_consistency()?;

        let SimulationSnapshot {
            parameters,
            network,
            records,
            statistics,
            current_day,
        } = snapshot;
        // Infection days are never cleared, so the latest one is the last infection.
        let last_infection_day = records
            .iter()
            .filter_map(|record| record.infection_day)
            .max()
            .unwrap_or(0);
        let mut random = RandomSource::new(parameters.seed);
        random.reseed_for_day(current_day);

        Ok(Simulation {
            initialized: !statistics.is_empty(),
            parameters,
            network,
            records,
            statistics,
            current_day,
            last_infection_day,
            random,
        })
    }
}
