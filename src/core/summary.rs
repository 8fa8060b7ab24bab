use serde::Serialize;

use crate::{
    core::{
        arbitrage::Action,
        dispatch::Dispatch,
        flow::Flow,
        record::{FlowRecord, ReservoirRecord},
    },
    quantity::{Zero, cost::Cost, energy::MegawattHours},
};

/// Both reservoirs merged into one store.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Serialize)]
pub struct StoreSummary {
    pub soc: MegawattHours,
    pub capacity: MegawattHours,

    /// Total state-of-charge relative to the total capacity.
    pub fill: f64,

    /// OZE state-of-charge relative to the total capacity.
    pub oze_fill_of_total: f64,

    /// ARBI state-of-charge relative to the total capacity.
    pub arbi_fill_of_total: f64,

    pub dispatch: Dispatch,
    pub efficiency_loss: MegawattHours,
    pub idle_loss: MegawattHours,
}

impl StoreSummary {
    pub fn aggregate(oze: &ReservoirRecord, arbi: &ReservoirRecord) -> Self {
        let soc = oze.state.soc_clamped + arbi.state.soc_clamped;
        let capacity = oze.state.capacity + arbi.state.capacity;
        let mut dispatch = oze.dispatch;
        dispatch += arbi.dispatch;
        Self {
            soc,
            capacity,
            fill: soc.fraction_of(capacity),
            oze_fill_of_total: oze.state.soc_clamped.fraction_of(capacity),
            arbi_fill_of_total: arbi.state.soc_clamped.fraction_of(capacity),
            dispatch,
            efficiency_loss: oze.efficiency_loss + arbi.efficiency_loss,
            idle_loss: oze.idle_loss + arbi.idle_loss,
        }
    }
}

/// Totals over the whole run.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub n_steps: usize,
    pub generation: MegawattHours,
    pub load: MegawattHours,
    pub grid: Flow<MegawattHours>,

    /// Grid side of the arbitrage only.
    pub arbitrage_grid: Flow<MegawattHours>,

    pub curtailment: MegawattHours,
    pub unserved: MegawattHours,

    /// Stored (import) and drawn (export) energy of both reservoirs.
    pub store: Flow<MegawattHours>,

    pub spill: MegawattHours,
    pub efficiency_loss: MegawattHours,
    pub idle_loss: MegawattHours,
    pub n_charging_steps: usize,
    pub n_discharging_steps: usize,
    pub n_cycles: usize,
    pub final_oze_soc: MegawattHours,
    pub final_arbi_soc: MegawattHours,
    pub cash_flow: Cost,
    pub arbitrage_cash_flow: Cost,
}

impl<'a> FromIterator<&'a FlowRecord> for RunSummary {
    fn from_iter<I: IntoIterator<Item = &'a FlowRecord>>(records: I) -> Self {
        let mut summary = Self::default();
        for record in records {
            summary.n_steps += 1;
            summary.generation += record.generation;
            summary.load += record.load;
            summary.grid += record.settlement.grid();
            summary.arbitrage_grid += record.settlement.arbitrage;
            summary.curtailment += record.settlement.curtailment;
            summary.unserved += record.settlement.unserved;
            summary.store += record.store.dispatch.internal;
            summary.spill += record.oze.spill + record.arbi.spill;
            summary.efficiency_loss += record.store.efficiency_loss;
            summary.idle_loss += record.store.idle_loss;
            summary.cash_flow += record.cash_flow.total;
            summary.arbitrage_cash_flow += record.cash_flow.arbitrage;

            match record.arbitrage.action {
                Action::Charge => summary.n_charging_steps += 1,
                Action::Discharge => summary.n_discharging_steps += 1,
                Action::Idle => {}
            }

            if record.arbitrage.completes_cycle {
                summary.n_cycles += 1;
            }

            summary.final_oze_soc = record.oze.state.soc_clamped;
            summary.final_arbi_soc = record.arbi.state.soc_clamped;
        }
        summary
    }
}

impl RunSummary {
    pub fn has_unserved(&self) -> bool {
        self.unserved > MegawattHours::ZERO
    }
}
