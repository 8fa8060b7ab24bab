use crate::{
    core::{
        dispatch::Dispatch,
        flow::Flow,
        parameters::Efficiency,
        reservoir::Availability,
        settlement::Settlement,
        step::TimeStep,
    },
    quantity::{Zero, energy::MegawattHours},
};

/// Passive split of the step's imbalance between the reservoirs and the grid.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct Allocation {
    pub oze: Dispatch,

    /// Passive contribution only, the arbitrage flows come on top.
    pub arbi: Dispatch,

    pub settlement: Settlement,
}

#[must_use]
#[derive(Copy, Clone, bon::Builder)]
pub struct Broker {
    efficiency: Efficiency,

    /// Whether the arbitrage reservoir may cover the load.
    discharge_to_load: bool,
}

impl Broker {
    pub fn allocate(
        &self,
        step: &TimeStep,
        oze: &Availability,
        arbi: &Availability,
        pcc_caps: Flow<MegawattHours>,
    ) -> Allocation {
        let mut allocation = Allocation {
            oze: Dispatch::ZERO,
            arbi: Dispatch::ZERO,
            settlement: Settlement::new(pcc_caps),
        };
        if step.surplus > MegawattHours::ZERO {
            self.allocate_surplus(&mut allocation, step.surplus, oze, arbi);
        } else if step.deficit > MegawattHours::ZERO {
            self.allocate_deficit(&mut allocation, step.deficit, oze, arbi);
        }
        allocation
    }

    /// OZE first regardless of its headroom, then ARBI within its headroom, then the grid.
    fn allocate_surplus(
        &self,
        allocation: &mut Allocation,
        surplus: MegawattHours,
        oze: &Availability,
        arbi: &Availability,
    ) {
        let charging = self.efficiency.charging;

        allocation.oze = Dispatch::charge(oze.rate_caps.import.min(surplus * charging), self.efficiency);
        let remaining = (surplus - allocation.oze.external.import).non_negative();

        let arbi_charge =
            arbi.rate_caps.import.min(arbi.headroom).min((remaining * charging).non_negative());
        allocation.arbi = Dispatch::charge(arbi_charge, self.efficiency);

        let residual = (remaining - allocation.arbi.external.import).non_negative();
        allocation.settlement.export_surplus(residual);
    }

    /// OZE first, then ARBI when allowed, then the grid.
    fn allocate_deficit(
        &self,
        allocation: &mut Allocation,
        deficit: MegawattHours,
        oze: &Availability,
        arbi: &Availability,
    ) {
        let discharging = self.efficiency.discharging;

        let oze_delivered = deficit.min(oze.rate_caps.export.min(oze.available) * discharging);
        allocation.oze = Dispatch::deliver(oze_delivered, self.efficiency);
        let mut remaining = (deficit - oze_delivered).non_negative();

        if self.discharge_to_load {
            let arbi_delivered =
                remaining.min(arbi.rate_caps.export.min(arbi.available) * discharging);
            allocation.arbi = Dispatch::deliver(arbi_delivered, self.efficiency);
            remaining = (remaining - arbi_delivered).non_negative();
        }

        allocation.settlement.import_for_load(remaining);
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::quantity::price::MegawattHourRate;

    const EFFICIENCY: Efficiency = Efficiency { charging: 0.9, discharging: 0.9 };

    fn step(generation: f64, load: f64) -> TimeStep {
        TimeStep::builder()
            .timestamp(Utc.with_ymd_and_hms(2025, 5, 1, 12, 0, 0).unwrap())
            .price(MegawattHourRate(300.0))
            .generation(MegawattHours(generation))
            .load(MegawattHours(load))
            .build()
            .unwrap()
    }

    fn availability(headroom: f64, available: f64, rate_cap: f64) -> Availability {
        Availability {
            headroom: MegawattHours(headroom),
            available: MegawattHours(available),
            rate_caps: Flow { import: MegawattHours(rate_cap), export: MegawattHours(rate_cap) },
        }
    }

    fn caps(import: f64, export: f64) -> Flow<MegawattHours> {
        Flow { import: MegawattHours(import), export: MegawattHours(export) }
    }

    fn broker(discharge_to_load: bool) -> Broker {
        Broker::builder().efficiency(EFFICIENCY).discharge_to_load(discharge_to_load).build()
    }

    /// Capacity 10, η = 0.9, surplus 5: everything goes into OZE.
    #[test]
    fn surplus_into_oze() {
        let allocation = broker(false).allocate(
            &step(5.0, 0.0),
            &availability(10.0, 0.0, 10.0),
            &availability(0.0, 0.0, 0.0),
            caps(5.0, 5.0),
        );
        assert_abs_diff_eq!(allocation.oze.internal.import.0, 4.5, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.oze.external.import.0, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.oze.efficiency_loss().0, 0.5, epsilon = 1e-12);
        assert_eq!(allocation.arbi, Dispatch::ZERO);
        assert_eq!(allocation.settlement.grid(), Flow::ZERO);
    }

    /// Surplus overflows the OZE rate cap into ARBI, then export, then curtailment.
    #[test]
    fn surplus_cascade() {
        let allocation = broker(false).allocate(
            &step(10.0, 0.0),
            &availability(10.0, 0.0, 1.8),
            &availability(0.9, 0.0, 5.0),
            caps(5.0, 5.0),
        );
        assert_abs_diff_eq!(allocation.oze.external.import.0, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.arbi.internal.import.0, 0.9, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.arbi.external.import.0, 1.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.settlement.passive.export.0, 5.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.settlement.curtailment.0, 2.0, epsilon = 1e-9);
    }

    /// OZE is not limited by its headroom, the overflow becomes its spill.
    #[test]
    fn oze_ignores_headroom() {
        let allocation = broker(false).allocate(
            &step(5.0, 0.0),
            &availability(0.2, 9.8, 10.0),
            &availability(0.0, 0.0, 0.0),
            caps(5.0, 5.0),
        );
        assert_abs_diff_eq!(allocation.oze.internal.import.0, 4.5, epsilon = 1e-9);
    }

    #[test]
    fn deficit_without_arbi() {
        let allocation = broker(false).allocate(
            &step(0.0, 3.0),
            &availability(8.0, 2.0, 5.0),
            &availability(0.0, 5.0, 5.0),
            caps(5.0, 5.0),
        );
        assert_abs_diff_eq!(allocation.oze.external.export.0, 1.8, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.oze.internal.export.0, 2.0, epsilon = 1e-9);
        assert_eq!(allocation.arbi, Dispatch::ZERO);
        assert_abs_diff_eq!(allocation.settlement.passive.import.0, 1.2, epsilon = 1e-9);
    }

    #[test]
    fn deficit_with_arbi_to_load() {
        let allocation = broker(true).allocate(
            &step(0.0, 3.0),
            &availability(8.0, 2.0, 5.0),
            &availability(0.0, 5.0, 5.0),
            caps(0.5, 5.0),
        );
        assert_abs_diff_eq!(allocation.arbi.external.export.0, 1.2, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.settlement.passive.import.0, 0.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.settlement.unserved.0, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn unserved_over_import_cap() {
        let allocation = broker(false).allocate(
            &step(0.0, 3.0),
            &availability(10.0, 0.0, 5.0),
            &availability(10.0, 0.0, 5.0),
            caps(2.0, 5.0),
        );
        assert_abs_diff_eq!(allocation.settlement.passive.import.0, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(allocation.settlement.unserved.0, 1.0, epsilon = 1e-9);
    }

    #[test]
    fn balanced_step_is_idle() {
        let allocation = broker(true).allocate(
            &step(2.0, 2.0),
            &availability(10.0, 5.0, 5.0),
            &availability(10.0, 5.0, 5.0),
            caps(2.0, 5.0),
        );
        assert_eq!(allocation.oze, Dispatch::ZERO);
        assert_eq!(allocation.arbi, Dispatch::ZERO);
        assert_eq!(allocation.settlement.grid(), Flow::ZERO);
    }
}
