//! Balance feed: raw generation, load and price series into simulation steps.

use std::{fs::File, io::BufReader, path::Path};

use chrono::{DateTime, TimeDelta, Utc};
use serde::Deserialize;

use crate::{
    core::step::TimeStep,
    prelude::*,
    quantity::{energy::MegawattHours, price::MegawattHourRate},
};

/// Single row of the input series, energies over the whole step.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BalanceRow {
    pub timestamp: DateTime<Utc>,
    pub generation: MegawattHours,
    pub load: MegawattHours,
    pub price: MegawattHourRate,
}

impl BalanceRow {
    pub fn into_step(self, resolution: TimeDelta) -> Result<TimeStep> {
        TimeStep::builder()
            .timestamp(self.timestamp)
            .duration(resolution)
            .price(self.price)
            .generation(self.generation)
            .load(self.load)
            .build()
    }
}

/// Read a JSON array of balance rows.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn read_steps(path: &Path, resolution: TimeDelta) -> Result<Vec<TimeStep>> {
    let file = File::open(path).with_context(|| format!("failed to open `{}`", path.display()))?;
    let rows: Vec<BalanceRow> = serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("failed to parse `{}`", path.display()))?;
    let steps = into_steps(rows, resolution)?;
    info!(n_steps = steps.len(), "read the balance series");
    Ok(steps)
}

pub fn into_steps(
    rows: impl IntoIterator<Item = BalanceRow>,
    resolution: TimeDelta,
) -> Result<Vec<TimeStep>> {
    rows.into_iter().map(|row| row.into_step(resolution)).collect()
}
