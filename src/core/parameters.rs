use bon::bon;

use crate::{
    core::flow::Flow,
    fmt::FormattedPercentage,
    prelude::*,
    quantity::{
        Zero,
        energy::MegawattHours,
        power::Megawatts,
        proportions::Percent,
        time::Hours,
    },
};

/// Conversion efficiencies between the AC side and the stored energy.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Efficiency {
    /// Charging efficiency, `(0, 1]`.
    pub charging: f64,

    /// Discharging efficiency, `(0, 1]`.
    pub discharging: f64,
}

#[bon]
impl Efficiency {
    #[builder]
    pub fn new(charging: f64, discharging: f64) -> Result<Self> {
        if !charging.is_finite() || charging <= 0.0 || charging > 1.0 {
            bail!("invalid charging efficiency: {charging}");
        }
        if !discharging.is_finite() || discharging <= 0.0 || discharging > 1.0 {
            bail!("invalid discharging efficiency: {discharging}");
        }
        Ok(Self { charging, discharging })
    }
}

impl Efficiency {
    #[cfg(test)]
    pub const IDEAL: Self = Self { charging: 1.0, discharging: 1.0 };

    pub const fn round_trip(&self) -> f64 {
        self.charging * self.discharging
    }
}

/// Capacity and c-rates of a single reservoir.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ReservoirLimits {
    pub capacity: MegawattHours,

    /// Capacity fraction per hour.
    pub charge_rate: f64,

    /// Capacity fraction per hour.
    pub discharge_rate: f64,
}

impl ReservoirLimits {
    /// Maximum stored and drawn energy over the step.
    pub fn rate_caps(&self, duration: Hours) -> Flow<MegawattHours> {
        Flow {
            import: self.capacity * (self.charge_rate * duration.0),
            export: self.capacity * (self.discharge_rate * duration.0),
        }
    }
}

/// Contracted power at the point of common coupling.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PccLimits {
    pub import: Megawatts,
    pub export: Megawatts,
}

impl PccLimits {
    pub fn caps(&self, duration: Hours) -> Flow<MegawattHours> {
        Flow { import: self.import * duration, export: self.export * duration }
    }
}

/// Physical parameter snapshot, constant for the whole run.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct StaticParameters {
    pub efficiency: Efficiency,
    pub oze: ReservoirLimits,
    pub arbi: ReservoirLimits,

    /// Monthly self-discharge rate, `[0, 1)`.
    pub monthly_self_discharge: f64,

    pub pcc: PccLimits,
}

#[bon]
impl StaticParameters {
    #[builder]
    pub fn new(
        efficiency: Efficiency,
        total_capacity: MegawattHours,
        arbi_share: Percent,
        charge_rate: f64,
        discharge_rate: f64,
        monthly_self_discharge: f64,
        pcc_import: Megawatts,
        pcc_export: Megawatts,
    ) -> Result<Self> {
        if !total_capacity.is_finite() || total_capacity < MegawattHours::ZERO {
            bail!("invalid total capacity: {total_capacity}");
        }
        if !arbi_share.is_finite() || arbi_share < Percent::ZERO || arbi_share > Percent(100.0) {
            bail!("invalid arbitrage capacity share: {arbi_share}");
        }
        if !charge_rate.is_finite() || charge_rate < 0.0 {
            bail!("invalid charging c-rate: {charge_rate}");
        }
        if !discharge_rate.is_finite() || discharge_rate < 0.0 {
            bail!("invalid discharging c-rate: {discharge_rate}");
        }
        if !(0.0..1.0).contains(&monthly_self_discharge) {
            bail!("invalid monthly self-discharge rate: {monthly_self_discharge}");
        }
        for (name, power) in [("import", pcc_import), ("export", pcc_export)] {
            if !power.is_finite() || power < Megawatts::ZERO {
                bail!("invalid PCC {name} power: {power}");
            }
        }

        let arbi_capacity = total_capacity * arbi_share.to_proportion();
        let oze_capacity = (total_capacity - arbi_capacity).non_negative();
        let this = Self {
            efficiency,
            oze: ReservoirLimits { capacity: oze_capacity, charge_rate, discharge_rate },
            arbi: ReservoirLimits { capacity: arbi_capacity, charge_rate, discharge_rate },
            monthly_self_discharge,
            pcc: PccLimits { import: pcc_import, export: pcc_export },
        };
        info!(
            total = ?this.total_capacity(),
            oze = ?this.oze.capacity,
            arbi = ?this.arbi.capacity,
            round_trip = ?FormattedPercentage(efficiency.round_trip()),
            "capacity split",
        );
        Ok(this)
    }
}

impl StaticParameters {
    pub fn total_capacity(&self) -> MegawattHours {
        self.oze.capacity + self.arbi.capacity
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    fn parameters(
        total_capacity: MegawattHours,
        arbi_share: Percent,
        monthly_self_discharge: f64,
    ) -> Result<StaticParameters> {
        StaticParameters::builder()
            .efficiency(Efficiency::IDEAL)
            .total_capacity(total_capacity)
            .arbi_share(arbi_share)
            .charge_rate(0.5)
            .discharge_rate(0.25)
            .monthly_self_discharge(monthly_self_discharge)
            .pcc_import(Megawatts(2.0))
            .pcc_export(Megawatts(3.0))
            .build()
    }

    #[test]
    fn capacity_split() -> Result {
        let parameters = parameters(MegawattHours(10.0), Percent(40.0), 0.0)?;
        assert_abs_diff_eq!(parameters.arbi.capacity.0, 4.0, epsilon = 1e-9);
        assert_abs_diff_eq!(parameters.oze.capacity.0, 6.0, epsilon = 1e-9);
        assert_abs_diff_eq!(parameters.total_capacity().0, 10.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn rate_caps_scale_with_duration() -> Result {
        let parameters = parameters(MegawattHours(10.0), Percent(40.0), 0.0)?;
        let caps = parameters.oze.rate_caps(Hours(0.5));
        assert_abs_diff_eq!(caps.import.0, 1.5, epsilon = 1e-9);
        assert_abs_diff_eq!(caps.export.0, 0.75, epsilon = 1e-9);
        let pcc = parameters.pcc.caps(Hours(1.0));
        assert_abs_diff_eq!(pcc.import.0, 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(pcc.export.0, 3.0, epsilon = 1e-9);
        Ok(())
    }

    #[test]
    fn zero_efficiency_is_fatal() {
        assert!(Efficiency::builder().charging(0.0).discharging(0.9).build().is_err());
        assert!(Efficiency::builder().charging(0.9).discharging(f64::NAN).build().is_err());
        assert!(Efficiency::builder().charging(1.1).discharging(0.9).build().is_err());
    }

    #[test]
    fn negative_capacity_is_fatal() {
        assert!(parameters(MegawattHours(-1.0), Percent(40.0), 0.0).is_err());
    }

    #[test]
    fn share_out_of_range_is_fatal() {
        assert!(parameters(MegawattHours(10.0), Percent(120.0), 0.0).is_err());
    }

    #[test]
    fn full_self_discharge_is_fatal() {
        assert!(parameters(MegawattHours(10.0), Percent(40.0), 1.0).is_err());
    }
}
