use bon::bon;

use crate::{
    core::arbitrage::HourSet,
    prelude::*,
    quantity::{price::MegawattHourRate, proportions::Percent},
};

/// Threshold adjustments, added to the base minimum profit when their condition holds.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct Bonuses {
    /// The low hour is one of the charge bonus hours.
    pub charge_window: MegawattHourRate,

    /// The high hour is one of the discharge bonus hours.
    pub discharge_window: MegawattHourRate,

    /// Charging while the state-of-charge is at or below the low threshold.
    pub low_soc: MegawattHourRate,

    /// Discharging while the state-of-charge is at or above the high threshold.
    pub high_soc: MegawattHourRate,
}

#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct BonusHours {
    pub charge: HourSet,
    pub discharge: HourSet,

    /// Charging in these hours is always admitted.
    pub free_charge: HourSet,

    /// Discharging in these hours is always admitted.
    pub free_discharge: HourSet,
}

#[must_use]
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ArbitrageParameters {
    pub base_min_profit: MegawattHourRate,
    pub cycles_per_day: usize,
    pub bonuses: Bonuses,
    pub low_soc_threshold: Percent,
    pub high_soc_threshold: Percent,
    pub hours: BonusHours,

    /// Let the arbitrage reservoir cover the load.
    pub discharge_to_load: bool,

    /// Only discharge energy charged earlier within the current cycle window.
    pub force_order: bool,

    /// Keep the energy pending discharge over the day boundary.
    pub allow_carry_over: bool,
}

#[bon]
impl ArbitrageParameters {
    #[builder]
    pub fn new(
        base_min_profit: MegawattHourRate,
        cycles_per_day: usize,
        #[builder(default)] bonuses: Bonuses,
        #[builder(default = Percent(0.0))] low_soc_threshold: Percent,
        #[builder(default = Percent(100.0))] high_soc_threshold: Percent,
        #[builder(default)] hours: BonusHours,
        #[builder(default)] discharge_to_load: bool,
        #[builder(default)] force_order: bool,
        #[builder(default = true)] allow_carry_over: bool,
    ) -> Result<Self> {
        ensure!(base_min_profit.is_finite(), "invalid base minimum profit: {base_min_profit}");
        for (name, bonus) in [
            ("charge window", bonuses.charge_window),
            ("discharge window", bonuses.discharge_window),
            ("low state-of-charge", bonuses.low_soc),
            ("high state-of-charge", bonuses.high_soc),
        ] {
            ensure!(bonus.is_finite(), "invalid {name} bonus: {bonus}");
        }
        for (name, threshold) in [("low", low_soc_threshold), ("high", high_soc_threshold)] {
            if !threshold.is_finite() || threshold.0 < 0.0 || threshold.0 > 100.0 {
                bail!("invalid {name} state-of-charge threshold: {threshold}");
            }
        }
        Ok(Self {
            base_min_profit,
            cycles_per_day,
            bonuses,
            low_soc_threshold,
            high_soc_threshold,
            hours,
            discharge_to_load,
            force_order,
            allow_carry_over,
        })
    }
}
