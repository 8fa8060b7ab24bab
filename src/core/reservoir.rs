use serde::Serialize;

use crate::{
    core::{flow::Flow, parameters::ReservoirLimits, retention::Retention},
    quantity::{Zero, energy::MegawattHours, time::Hours},
};

/// What a reservoir can take or give over the current step.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Availability {
    /// Capacity minus the previous state-of-charge.
    pub headroom: MegawattHours,

    /// State-of-charge left after this step's self-discharge.
    pub available: MegawattHours,

    /// Stored (import) and drawn (export) energy limits.
    pub rate_caps: Flow<MegawattHours>,
}

/// One transition of a reservoir.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ReservoirState {
    pub soc_prev: MegawattHours,
    pub soc_raw: MegawattHours,
    pub soc_clamped: MegawattHours,
    pub capacity: MegawattHours,
    pub retention: Retention,
}

impl ReservoirState {
    /// Seed state before the first step.
    pub fn seed(capacity: MegawattHours, soc: MegawattHours) -> Self {
        let soc = soc.clamp(MegawattHours::ZERO, capacity);
        Self { soc_prev: soc, soc_raw: soc, soc_clamped: soc, capacity, retention: Retention::FULL }
    }

    /// Apply the decay and the net flow to the clamped state-of-charge.
    pub fn next(&self, retention: Retention, flow: Flow<MegawattHours>) -> Self {
        let soc_prev = self.soc_clamped;
        let soc_raw = soc_prev * retention.0 + flow.import - flow.export;
        Self {
            soc_prev,
            soc_raw,
            soc_clamped: soc_raw.clamp(MegawattHours::ZERO, self.capacity),
            capacity: self.capacity,
            retention,
        }
    }

    /// Energy clipped by the upper bound.
    pub fn clipped(&self) -> MegawattHours {
        (self.soc_raw - self.soc_clamped).non_negative()
    }

    pub fn idle_loss(&self) -> MegawattHours {
        MegawattHours(self.retention.loss_of(self.soc_prev.0))
    }

    /// State-of-charge relative to the capacity, `0.0..=1.0`.
    pub fn fill(&self) -> f64 {
        self.soc_clamped.fraction_of(self.capacity)
    }
}

/// Outcome of a single reservoir transition.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Transition {
    pub state: ReservoirState,

    /// Clipped charge available for redirection, only in surplus steps.
    pub spill: MegawattHours,

    pub idle_loss: MegawattHours,
}

/// Capacity-bounded virtual store with self-discharge.
#[must_use]
#[derive(Copy, Clone, Debug)]
pub struct Reservoir {
    pub limits: ReservoirLimits,
    pub state: ReservoirState,
}

impl Reservoir {
    pub fn new(limits: ReservoirLimits, seed: MegawattHours) -> Self {
        Self { limits, state: ReservoirState::seed(limits.capacity, seed) }
    }

    pub const fn soc(&self) -> MegawattHours {
        self.state.soc_clamped
    }

    pub fn availability(&self, retention: Retention, duration: Hours) -> Availability {
        let soc = self.soc();
        Availability {
            headroom: (self.limits.capacity - soc).non_negative(),
            available: soc * retention.0,
            rate_caps: self.limits.rate_caps(duration),
        }
    }

    /// Apply the step's charge (import) and discharge (export).
    pub fn apply(
        &mut self,
        retention: Retention,
        flow: Flow<MegawattHours>,
        is_surplus: bool,
    ) -> Transition {
        self.state = self.state.next(retention, flow);
        Transition {
            state: self.state,
            spill: if is_surplus { self.state.clipped() } else { MegawattHours::ZERO },
            idle_loss: self.state.idle_loss(),
        }
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn reservoir(capacity: f64, soc: f64) -> Reservoir {
        let limits = ReservoirLimits {
            capacity: MegawattHours(capacity),
            charge_rate: 1.0,
            discharge_rate: 1.0,
        };
        Reservoir::new(limits, MegawattHours(soc))
    }

    fn charge(energy: f64) -> Flow<MegawattHours> {
        Flow { import: MegawattHours(energy), export: MegawattHours::ZERO }
    }

    /// Verify the clipped charge becomes spill in a surplus step.
    #[test]
    fn spill_on_overflow() {
        let mut reservoir = reservoir(10.0, 9.8);
        let transition = reservoir.apply(Retention::FULL, charge(1.0), true);
        assert_abs_diff_eq!(transition.state.soc_raw.0, 10.8, epsilon = 1e-12);
        assert_abs_diff_eq!(transition.state.soc_clamped.0, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(transition.spill.0, 0.8, epsilon = 1e-12);
        assert_abs_diff_eq!(reservoir.soc().0, 10.0, epsilon = 1e-9);
    }

    /// Verify clipping outside a surplus step is just lost headroom.
    #[test]
    fn no_spill_in_deficit() {
        let mut reservoir = reservoir(10.0, 9.8);
        let transition = reservoir.apply(Retention::FULL, charge(1.0), false);
        assert_abs_diff_eq!(transition.state.soc_clamped.0, 10.0, epsilon = 1e-9);
        assert_eq!(transition.spill, MegawattHours::ZERO);
    }

    /// Verify clamping at the floor.
    #[test]
    fn underflow() {
        let mut reservoir = reservoir(10.0, 1.0);
        let flow = Flow { import: MegawattHours::ZERO, export: MegawattHours(2.0) };
        let transition = reservoir.apply(Retention::FULL, flow, false);
        assert_abs_diff_eq!(transition.state.soc_raw.0, -1.0, epsilon = 1e-9);
        assert_eq!(transition.state.soc_clamped, MegawattHours::ZERO);
    }

    #[test]
    fn idle_loss() {
        let mut reservoir = reservoir(10.0, 5.0);
        let transition = reservoir.apply(Retention(0.9), Flow::ZERO, false);
        assert_abs_diff_eq!(transition.idle_loss.0, 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(transition.state.soc_clamped.0, 4.5, epsilon = 1e-12);
    }

    #[test]
    fn seed_is_clamped() {
        assert_eq!(reservoir(10.0, 12.0).soc(), MegawattHours(10.0));
        assert_eq!(reservoir(10.0, -1.0).soc(), MegawattHours::ZERO);
    }

    #[test]
    fn zero_capacity() {
        let mut reservoir = reservoir(0.0, 0.0);
        let availability = reservoir.availability(Retention::FULL, Hours(1.0));
        assert_eq!(availability.headroom, MegawattHours::ZERO);
        assert_eq!(availability.rate_caps, Flow::ZERO);
        let transition = reservoir.apply(Retention::FULL, Flow::ZERO, true);
        assert_abs_diff_eq!(transition.state.fill(), 0.0, epsilon = 1e-9);
    }

    #[test]
    fn availability_after_decay() {
        let reservoir = reservoir(10.0, 4.0);
        let availability = reservoir.availability(Retention(0.5), Hours(1.0));
        assert_abs_diff_eq!(availability.headroom.0, 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(availability.available.0, 2.0, epsilon = 1e-9);
    }
}
