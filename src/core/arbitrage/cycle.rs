use chrono::NaiveDate;

use crate::quantity::{Zero, energy::MegawattHours};

/// Energy pending discharge and the cycles completed during the current local day.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct CycleTracker {
    allow_carry_over: bool,
    day: Option<NaiveDate>,
    pending: MegawattHours,
    completed_today: usize,
}

impl CycleTracker {
    pub const fn new(allow_carry_over: bool, seed: MegawattHours) -> Self {
        Self { allow_carry_over, day: None, pending: seed, completed_today: 0 }
    }

    pub const fn pending(&self) -> MegawattHours {
        self.pending
    }

    pub const fn completed_today(&self) -> usize {
        self.completed_today
    }

    /// Enter the step's local day, resetting the daily counters on a day change.
    pub fn enter(&mut self, day: NaiveDate) {
        if self.day.is_some_and(|current| current != day) {
            self.completed_today = 0;
            if !self.allow_carry_over {
                self.pending = MegawattHours::ZERO;
            }
        }
        self.day = Some(day);
    }

    pub fn charged(&mut self, stored: MegawattHours) {
        self.pending += stored;
    }

    /// Account for drawn energy, completing a cycle when an arbitrage discharge empties the pending energy.
    pub fn discharged(&mut self, drawn: MegawattHours, is_arbitrage: bool) {
        if drawn <= MegawattHours::ZERO {
            return;
        }
        let had_pending = self.pending > MegawattHours::EPSILON;
        self.pending = (self.pending - drawn).non_negative();
        if self.pending <= MegawattHours::EPSILON {
            self.pending = MegawattHours::ZERO;
            if had_pending && is_arbitrage {
                self.completed_today += 1;
            }
        }
    }
}
