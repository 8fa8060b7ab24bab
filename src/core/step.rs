use bon::bon;
use chrono::{DateTime, TimeDelta, Utc};
use itertools::Itertools;

use crate::{
    prelude::*,
    quantity::{Zero, energy::MegawattHours, price::MegawattHourRate, time::Hours},
};

/// Single simulation step: the net imbalance and the clearing price over `[timestamp, timestamp + duration)`.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct TimeStep {
    pub timestamp: DateTime<Utc>,
    pub duration: TimeDelta,
    pub price: MegawattHourRate,
    pub generation: MegawattHours,
    pub load: MegawattHours,

    /// `max(0, generation − load)`.
    pub surplus: MegawattHours,

    /// `max(0, load − generation)`.
    pub deficit: MegawattHours,
}

#[bon]
impl TimeStep {
    #[builder]
    pub fn new(
        timestamp: DateTime<Utc>,
        #[builder(default = TimeDelta::hours(1))] duration: TimeDelta,
        price: MegawattHourRate,
        generation: MegawattHours,
        load: MegawattHours,
    ) -> Result<Self> {
        ensure!(duration > TimeDelta::zero(), "non-positive step duration at {timestamp}");
        ensure!(price.is_finite(), "invalid price at {timestamp}: {price}");
        if !generation.is_finite() || generation < MegawattHours::ZERO {
            bail!("invalid generation at {timestamp}: {generation}");
        }
        if !load.is_finite() || load < MegawattHours::ZERO {
            bail!("invalid load at {timestamp}: {load}");
        }
        Ok(Self {
            timestamp,
            duration,
            price,
            generation,
            load,
            surplus: (generation - load).non_negative(),
            deficit: (load - generation).non_negative(),
        })
    }
}

impl TimeStep {
    pub fn end(&self) -> DateTime<Utc> {
        self.timestamp + self.duration
    }

    pub fn hours(&self) -> Hours {
        self.duration.into()
    }

    pub fn is_surplus(&self) -> bool {
        self.surplus > MegawattHours::EPSILON
    }
}

/// Check that the steps form a strictly increasing, gapless, duplicate-free series.
pub fn ensure_contiguous(steps: &[TimeStep]) -> Result {
    for (previous, next) in steps.iter().tuple_windows() {
        if next.timestamp == previous.timestamp {
            bail!("duplicate step at {}", next.timestamp);
        }
        if next.timestamp < previous.timestamp {
            bail!("unordered steps: {} follows {}", next.timestamp, previous.timestamp);
        }
        if next.timestamp != previous.end() {
            bail!("gap between {} and {}", previous.end(), next.timestamp);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn step(hour: u32) -> TimeStep {
        TimeStep::builder()
            .timestamp(Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap())
            .price(MegawattHourRate(100.0))
            .generation(MegawattHours(3.0))
            .load(MegawattHours(1.0))
            .build()
            .unwrap()
    }

    #[test]
    fn splits_imbalance() {
        let step = step(0);
        assert_eq!(step.surplus, MegawattHours(2.0));
        assert_eq!(step.deficit, MegawattHours::ZERO);
        assert!(step.is_surplus());
    }

    #[test]
    fn rejects_negative_load() {
        let result = TimeStep::builder()
            .timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap())
            .price(MegawattHourRate(100.0))
            .generation(MegawattHours(1.0))
            .load(MegawattHours(-1.0))
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn contiguous_ok() {
        assert!(ensure_contiguous(&[step(0), step(1), step(2)]).is_ok());
    }

    #[test]
    fn duplicate_is_fatal() {
        assert!(ensure_contiguous(&[step(0), step(0)]).is_err());
    }

    #[test]
    fn gap_is_fatal() {
        assert!(ensure_contiguous(&[step(0), step(2)]).is_err());
    }

    #[test]
    fn unordered_is_fatal() {
        assert!(ensure_contiguous(&[step(1), step(0)]).is_err());
    }
}
