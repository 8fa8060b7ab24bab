use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    core::{
        arbitrage::{
            Action,
            ArbitrageParameters,
            PricePair,
            Reason,
            Role,
            cycle::CycleTracker,
        },
        dispatch::Dispatch,
        parameters::Efficiency,
        reservoir::Availability,
        settlement::Settlement,
    },
    quantity::{Zero, energy::MegawattHours, price::MegawattHourRate, proportions::Percent},
};

/// Everything the scheduler needs to know about the current step.
#[must_use]
pub struct HourContext<'a> {
    pub day: NaiveDate,
    pub role: Option<(Role, &'a PricePair)>,

    /// Arbitrage reservoir at the start of the step.
    pub arbi: Availability,

    /// Arbitrage reservoir state-of-charge relative to its capacity, `0.0..=1.0`.
    pub fill: f64,

    /// Passive broker contribution to the arbitrage reservoir.
    pub passive: Dispatch,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ArbitrageOutcome {
    pub action: Action,
    pub reason: Option<Reason>,
    pub pair_rank: Option<usize>,

    /// Threshold of the live re-check, including the state-of-charge bonus.
    pub threshold: Option<MegawattHourRate>,

    /// Arbitrage-driven flows, on top of the passive ones.
    pub dispatch: Dispatch,

    /// Stored energy taken from the OZE spill.
    pub from_spill: MegawattHours,

    /// Stored energy charged from the grid.
    pub from_grid: MegawattHours,

    /// Delivered energy covering the load.
    pub to_load: MegawattHours,

    /// Delivered energy exported to the grid.
    pub to_grid: MegawattHours,

    /// Energy pending discharge after the step.
    pub pending: MegawattHours,

    pub cycles_today: usize,

    /// The step's discharge emptied the pending energy.
    pub completes_cycle: bool,
}

impl ArbitrageOutcome {
    const fn idle(reason: Reason) -> Self {
        Self {
            action: Action::Idle,
            reason: Some(reason),
            pair_rank: None,
            threshold: None,
            dispatch: Dispatch::ZERO,
            from_spill: MegawattHours::ZERO,
            from_grid: MegawattHours::ZERO,
            to_load: MegawattHours::ZERO,
            to_grid: MegawattHours::ZERO,
            pending: MegawattHours::ZERO,
            cycles_today: 0,
            completes_cycle: false,
        }
    }
}

/// Per-hour arbitrage execution, interleaved with the state-of-charge recurrence.
#[must_use]
pub struct Scheduler {
    parameters: ArbitrageParameters,
    efficiency: Efficiency,
    tracker: CycleTracker,
}

impl Scheduler {
    pub const fn new(
        parameters: ArbitrageParameters,
        efficiency: Efficiency,
        seed: MegawattHours,
    ) -> Self {
        Self { tracker: CycleTracker::new(parameters.allow_carry_over, seed), parameters, efficiency }
    }

    /// Decide and size the arbitrage flow of the step, booking its grid side in the settlement.
    pub fn execute(
        &mut self,
        context: &HourContext<'_>,
        settlement: &mut Settlement,
    ) -> ArbitrageOutcome {
        self.tracker.enter(context.day);
        self.tracker.charged(context.passive.internal.import);
        self.tracker.discharged(context.passive.internal.export, false);

        let mut outcome = match context.role {
            None => ArbitrageOutcome::idle(Reason::Unpaired),
            Some((_, pair)) if !pair.admitted => ArbitrageOutcome {
                pair_rank: Some(pair.rank),
                ..ArbitrageOutcome::idle(Reason::UnqualifiedPair)
            },
            Some((role, pair)) => {
                let threshold = self.effective_threshold(pair, role, context.fill);
                let outcome = if pair.spread < threshold {
                    ArbitrageOutcome::idle(Reason::BelowThreshold)
                } else if role == Role::Low {
                    self.charge(context, settlement)
                } else {
                    // Surplus-driven export goes first:
                    settlement.release_returned();
                    self.discharge(context, settlement)
                };
                ArbitrageOutcome { pair_rank: Some(pair.rank), threshold: Some(threshold), ..outcome }
            }
        };

        let completed_before = self.tracker.completed_today();
        self.tracker.charged(outcome.dispatch.internal.import);
        self.tracker.discharged(outcome.dispatch.internal.export, true);
        outcome.pending = self.tracker.pending();
        outcome.cycles_today = self.tracker.completed_today();
        outcome.completes_cycle = outcome.cycles_today > completed_before;
        outcome
    }

    fn effective_threshold(&self, pair: &PricePair, role: Role, fill: f64) -> MegawattHourRate {
        if pair.is_free {
            return MegawattHourRate::ZERO;
        }
        let base = if pair.forced_fill { MegawattHourRate::ZERO } else { pair.threshold };
        let soc = Percent::from_proportion(fill);
        let bonus = match role {
            Role::Low if soc <= self.parameters.low_soc_threshold => self.parameters.bonuses.low_soc,
            Role::High if soc >= self.parameters.high_soc_threshold => {
                self.parameters.bonuses.high_soc
            }
            _ => MegawattHourRate::ZERO,
        };
        (base + bonus).max(MegawattHourRate::ZERO)
    }

    /// Top up the passive charge from the OZE spill, then from the grid.
    fn charge(&self, context: &HourContext<'_>, settlement: &mut Settlement) -> ArbitrageOutcome {
        let charging = self.efficiency.charging;
        let passive = context.passive.internal.import;

        let rate_room = (context.arbi.rate_caps.import - passive).non_negative();
        if rate_room <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::ZeroRateCap);
        }
        let headroom = (context.arbi.headroom - passive).non_negative();
        if headroom <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::NoHeadroom);
        }

        let mut room = rate_room.min(headroom);
        let from_spill = settlement.take_returned(room / charging) * charging;
        room = (room - from_spill).non_negative();
        let from_grid = room.min(settlement.headroom().import * charging);
        settlement.arbitrage.import += from_grid / charging;

        let stored = from_spill + from_grid;
        if stored <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::NoEnergy);
        }
        ArbitrageOutcome {
            action: Action::Charge,
            reason: None,
            dispatch: Dispatch::charge(stored, self.efficiency),
            from_spill,
            from_grid,
            ..ArbitrageOutcome::idle(Reason::NoEnergy)
        }
    }

    /// Discharge beyond the passive flow: to the unmet load when allowed, otherwise to the grid.
    fn discharge(&self, context: &HourContext<'_>, settlement: &mut Settlement) -> ArbitrageOutcome {
        let passive = context.passive.internal;

        let rate_room = (context.arbi.rate_caps.export - passive.export).non_negative();
        if rate_room <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::ZeroRateCap);
        }
        let mut energy = (context.arbi.available + passive.import - passive.export).non_negative();
        if self.parameters.force_order {
            energy = energy.min(self.tracker.pending());
        }
        if energy <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::NoEnergy);
        }

        let deliverable = rate_room.min(energy) * self.efficiency.discharging;
        let to_load = if self.parameters.discharge_to_load {
            settlement.cover_load(deliverable)
        } else {
            MegawattHours::ZERO
        };
        let to_grid = (deliverable - to_load).min(settlement.headroom().export).non_negative();
        settlement.arbitrage.export += to_grid;

        let delivered = to_load + to_grid;
        if delivered <= MegawattHours::EPSILON {
            return ArbitrageOutcome::idle(Reason::NoHeadroom);
        }
        ArbitrageOutcome {
            action: Action::Discharge,
            reason: None,
            dispatch: Dispatch::deliver(delivered, self.efficiency),
            to_load,
            to_grid,
            ..ArbitrageOutcome::idle(Reason::NoEnergy)
        }
    }
}
