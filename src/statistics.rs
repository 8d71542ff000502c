use serde::{Deserialize, Serialize};

use crate::state::{Day, NodeRecord, NodeState};

/// Population counts per state for a single day.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyCounts {
    pub day: Day,
    pub susceptible: usize,
    pub infected: usize,
    pub recovered: usize,
    pub deceased: usize,
}

impl DailyCounts {
    /// Tallies the states of `records`.
    pub fn tally<'a>(day: Day, records: impl IntoIterator<Item = &'a NodeRecord>) -> Self {
        let mut counts = DailyCounts {
            day,
            ..DailyCounts::default()
        };
        for record in records {
            match record.state {
                NodeState::Susceptible => counts.susceptible += 1,
                NodeState::Infected => counts.infected += 1,
                NodeState::Recovered => counts.recovered += 1,
                NodeState::Deceased => counts.deceased += 1,
            }
        }
        counts
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.susceptible + self.infected + self.recovered + self.deceased
    }
}

/// The day-by-day time series of population counts, day 0 included.
///
/// The five columns are kept aligned: they can only grow together through [`push`](Self::push).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "SeriesColumns", into = "SeriesColumns")]
pub struct StatisticsSeries {
    day: Vec<Day>,
    susceptible: Vec<usize>,
    infected: Vec<usize>,
    recovered: Vec<usize>,
    deceased: Vec<usize>,
}

impl StatisticsSeries {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, counts: DailyCounts) {
        self.day.push(counts.day);
        self.susceptible.push(counts.susceptible);
        self.infected.push(counts.infected);
        self.recovered.push(counts.recovered);
        self.deceased.push(counts.deceased);
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::default();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.day.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.day.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<DailyCounts> {
        Some(DailyCounts {
            day: *self.day.get(index)?,
            susceptible: self.susceptible[index],
            infected: self.infected[index],
            recovered: self.recovered[index],
            deceased: self.deceased[index],
        })
    }

    #[must_use]
    pub fn latest(&self) -> Option<DailyCounts> {
        self.len().checked_sub(1).and_then(|index| self.get(index))
    }

    pub fn iter(&self) -> impl Iterator<Item = DailyCounts> + '_ {
        (0..self.len()).filter_map(|index| self.get(index))
    }

    #[must_use]
    pub fn days(&self) -> &[Day] {
        &self.day
    }

    #[must_use]
    pub fn susceptible(&self) -> &[usize] {
        &self.susceptible
    }

    #[must_use]
    pub fn infected(&self) -> &[usize] {
        &self.infected
    }

    #[must_use]
    pub fn recovered(&self) -> &[usize] {
        &self.recovered
    }

    #[must_use]
    pub fn deceased(&self) -> &[usize] {
        &self.deceased
    }
}

// Wire form of the series. Deserialization rejects columns of unequal length.
#[derive(Serialize, Deserialize)]
struct SeriesColumns {
    day: Vec<Day>,
    susceptible: Vec<usize>,
    infected: Vec<usize>,
    recovered: Vec<usize>,
    deceased: Vec<usize>,
}

impl From<StatisticsSeries> for SeriesColumns {
    fn from(series: StatisticsSeries) -> Self {
        SeriesColumns {
            day: series.day,
            susceptible: series.susceptible,
            infected: series.infected,
            recovered: series.recovered,
            deceased: series.deceased,
        }
    }
}

impl TryFrom<SeriesColumns> for StatisticsSeries {
    type Error = String;

    fn try_from(columns: SeriesColumns) -> Result<Self, Self::Error> {
        let len = columns.day.len();
        if [
            columns.susceptible.len(),
            columns.infected.len(),
            columns.recovered.len(),
            columns.deceased.len(),
        ]
        .iter()
        .any(|&l| l != len)
        {
            return Err("statistics columns have unequal lengths".to_string());
        }
        Ok(StatisticsSeries {
            day: columns.day,
            susceptible: columns.susceptible,
            infected: columns.infected,
            recovered: columns.recovered,
            deceased: columns.deceased,
        })
    }
}
