//! Post-step invariant checks.

use crate::{
    core::record::{FlowRecord, ReservoirRecord},
    prelude::*,
    quantity::{Zero, energy::MegawattHours},
};

const TOLERANCE: MegawattHours = MegawattHours::TOLERANCE;

/// Check the physical invariants of a single record.
pub fn ensure_consistent(record: &FlowRecord) -> Result {
    ensure_reservoir("OZE", &record.oze)?;
    ensure_reservoir("ARBI", &record.arbi)?;

    let grid = record.settlement.grid();
    for (name, energy) in [
        ("import", grid.import),
        ("export", grid.export),
        ("curtailment", record.settlement.curtailment),
        ("unserved", record.settlement.unserved),
    ] {
        ensure!(energy.is_finite(), "{name} is not finite: {energy}");
        ensure!(energy >= -TOLERANCE, "negative {name}: {energy}");
    }
    ensure!(
        grid.import <= record.settlement.caps.import + TOLERANCE,
        "grid import {} exceeds the PCC cap {}",
        grid.import,
        record.settlement.caps.import,
    );
    ensure!(
        grid.export <= record.settlement.caps.export + TOLERANCE,
        "grid export {} exceeds the PCC cap {}",
        grid.export,
        record.settlement.caps.export,
    );

    let imbalance = record.imbalance();
    ensure!(imbalance.abs() <= TOLERANCE, "energy is not conserved: residual {imbalance:?}");
    Ok(())
}

fn ensure_reservoir(name: &str, record: &ReservoirRecord) -> Result {
    let state = &record.state;
    ensure!(state.soc_clamped.is_finite(), "{name} state-of-charge is not finite");
    ensure!(
        state.soc_clamped >= -TOLERANCE && state.soc_clamped <= state.capacity + TOLERANCE,
        "{name} state-of-charge {} is out of `[0, {}]`",
        state.soc_clamped,
        state.capacity,
    );
    ensure!(
        state.soc_raw >= -TOLERANCE,
        "{name} was discharged below zero: {}",
        state.soc_raw,
    );

    let internal = record.dispatch.internal;
    ensure!(
        internal.import >= MegawattHours::ZERO && internal.export >= MegawattHours::ZERO,
        "{name} has a negative flow: {internal:?}",
    );
    ensure!(
        internal.import <= record.rate_caps.import + TOLERANCE,
        "{name} charge {} exceeds the rate cap {}",
        internal.import,
        record.rate_caps.import,
    );
    ensure!(
        internal.export <= record.rate_caps.export + TOLERANCE,
        "{name} discharge {} exceeds the rate cap {}",
        internal.export,
        record.rate_caps.export,
    );
    Ok(())
}
