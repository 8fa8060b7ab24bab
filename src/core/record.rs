use chrono::{DateTime, Utc};
use enumset::EnumSet;
use serde::Serialize;

use crate::{
    core::{
        arbitrage::ArbitrageOutcome,
        dispatch::Dispatch,
        flow::Flow,
        reservoir::{ReservoirState, Transition},
        settlement::{Binding, Settlement},
        summary::StoreSummary,
    },
    quantity::{
        cost::Cost,
        energy::MegawattHours,
        price::MegawattHourRate,
        time::Hours,
    },
};

/// Reservoir part of the output record.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct ReservoirRecord {
    #[serde(flatten)]
    pub state: ReservoirState,

    /// State-of-charge relative to the reservoir's own capacity.
    pub fill: f64,

    /// Passive and arbitrage flows together.
    pub dispatch: Dispatch,

    pub rate_caps: Flow<MegawattHours>,
    pub efficiency_loss: MegawattHours,
    pub idle_loss: MegawattHours,
    pub spill: MegawattHours,
}

impl ReservoirRecord {
    pub fn new(transition: Transition, dispatch: Dispatch, rate_caps: Flow<MegawattHours>) -> Self {
        Self {
            state: transition.state,
            fill: transition.state.fill(),
            dispatch,
            rate_caps,
            efficiency_loss: dispatch.efficiency_loss(),
            idle_loss: transition.idle_loss,
            spill: transition.spill,
        }
    }
}

/// Spot valuation of the step's grid exchange, positive when earning.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct CashFlow {
    pub total: Cost,

    /// Arbitrage charging from and discharging to the grid, plus the load covered by the
    /// arbitrage discharge valued as avoided import.
    pub arbitrage: Cost,
}

impl CashFlow {
    pub fn new(
        settlement: &Settlement,
        arbitrage: &ArbitrageOutcome,
        price: MegawattHourRate,
    ) -> Self {
        let grid = settlement.grid();
        let arbitrage_export = settlement.arbitrage.export + arbitrage.to_load;
        Self {
            total: grid.export * price - grid.import * price,
            arbitrage: arbitrage_export * price - settlement.arbitrage.import * price,
        }
    }
}

/// Simulated operating record of a single step.
#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlowRecord {
    pub timestamp: DateTime<Utc>,
    pub duration: Hours,
    pub price: MegawattHourRate,
    pub generation: MegawattHours,
    pub load: MegawattHours,
    pub surplus: MegawattHours,
    pub deficit: MegawattHours,
    pub oze: ReservoirRecord,
    pub arbi: ReservoirRecord,
    pub arbitrage: ArbitrageOutcome,
    pub settlement: Settlement,
    pub bindings: EnumSet<Binding>,
    pub store: StoreSummary,
    pub cash_flow: CashFlow,
}

impl FlowRecord {
    /// Energy delivered by both reservoirs to the AC side.
    pub fn delivered(&self) -> MegawattHours {
        self.oze.dispatch.external.export + self.arbi.dispatch.external.export
    }

    /// Energy consumed by both reservoirs from the AC side.
    pub fn consumed(&self) -> MegawattHours {
        self.oze.dispatch.external.import + self.arbi.dispatch.external.import
    }

    /// Energy conservation residual, zero for a consistent step.
    ///
    /// `generation + delivered + import + unserved = load + consumed + export + curtailment`
    pub fn imbalance(&self) -> MegawattHours {
        let grid = self.settlement.grid();
        (self.generation + self.delivered() + grid.import + self.settlement.unserved)
            - (self.load + self.consumed() + grid.export + self.settlement.curtailment)
    }
}
