//! TOML parameter snapshot.

use std::path::Path;

use chrono::TimeDelta;
use chrono_tz::Tz;
use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};

use crate::{
    core::{
        arbitrage::{
            ArbitrageParameters,
            HourSet,
            parameters::{BonusHours, Bonuses},
        },
        engine::Seed,
        parameters::{Efficiency, StaticParameters},
    },
    prelude::*,
    quantity::{
        Zero,
        energy::MegawattHours,
        power::Megawatts,
        price::MegawattHourRate,
        proportions::Percent,
    },
};

/// Days per month used to compound a daily self-discharge rate.
const DAYS_PER_MONTH: f64 = 30.0;

#[must_use]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub storage: StorageConfig,
    pub pcc: PccConfig,
    pub arbitrage: ArbitrageConfig,

    #[serde(default)]
    pub calendar: CalendarConfig,

    #[serde(default)]
    pub seed: SeedConfig,
}

#[must_use]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    pub total_capacity: MegawattHours,

    /// Part of the total capacity dedicated to the arbitrage.
    pub arbi_share: Percent,

    pub charging_efficiency: f64,
    pub discharging_efficiency: f64,

    /// Capacity fraction per hour, for both directions unless overridden.
    pub c_rate: Option<f64>,

    /// Alternative to `c_rate`: hours to charge an empty reservoir.
    pub hours_to_full: Option<f64>,

    pub discharge_c_rate: Option<f64>,

    pub monthly_self_discharge: Option<f64>,

    /// Alternative to `monthly_self_discharge`.
    pub daily_self_discharge: Option<f64>,
}

impl StorageConfig {
    fn charge_rate(&self) -> Result<f64> {
        match (self.c_rate, self.hours_to_full) {
            (Some(c_rate), None) => Ok(c_rate),
            (None, Some(hours)) => {
                ensure!(hours.is_finite() && hours > 0.0, "invalid hours to full: {hours}");
                Ok(1.0 / hours)
            }
            (Some(_), Some(_)) => bail!("`c_rate` and `hours_to_full` are mutually exclusive"),
            (None, None) => bail!("either `c_rate` or `hours_to_full` is required"),
        }
    }

    fn monthly_self_discharge(&self) -> Result<f64> {
        match (self.monthly_self_discharge, self.daily_self_discharge) {
            (Some(monthly), None) => Ok(monthly),
            (None, Some(daily)) => {
                ensure!((0.0..1.0).contains(&daily), "invalid daily self-discharge rate: {daily}");
                Ok(1.0 - (1.0 - daily).powf(DAYS_PER_MONTH))
            }
            (Some(_), Some(_)) => {
                bail!("`monthly_self_discharge` and `daily_self_discharge` are mutually exclusive")
            }
            (None, None) => Ok(0.0),
        }
    }
}

/// Point of common coupling.
#[must_use]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PccConfig {
    pub contracted_power: Megawatts,
    pub import_power: Option<Megawatts>,
    pub export_power: Option<Megawatts>,
}

#[must_use]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArbitrageConfig {
    pub base_min_profit: MegawattHourRate,
    pub cycles_per_day: usize,

    #[serde(default)]
    pub charge_window_bonus: MegawattHourRate,

    #[serde(default)]
    pub discharge_window_bonus: MegawattHourRate,

    #[serde(default)]
    pub low_soc_bonus: MegawattHourRate,

    #[serde(default)]
    pub high_soc_bonus: MegawattHourRate,

    pub low_soc_threshold: Option<Percent>,
    pub high_soc_threshold: Option<Percent>,

    #[serde(default)]
    pub charge_bonus_hours: HourSet,

    #[serde(default)]
    pub discharge_bonus_hours: HourSet,

    #[serde(default)]
    pub free_charge_hours: HourSet,

    #[serde(default)]
    pub free_discharge_hours: HourSet,

    #[serde(default)]
    pub discharge_to_load: bool,

    #[serde(default)]
    pub force_order: bool,

    pub allow_carry_over: Option<bool>,
}

#[must_use]
#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalendarConfig {
    #[serde(default = "CalendarConfig::default_time_zone")]
    pub time_zone: Tz,

    /// Step duration of the balance series.
    #[serde_as(as = "DurationSeconds<i64>")]
    #[serde(default = "CalendarConfig::default_resolution")]
    pub resolution: TimeDelta,
}

impl CalendarConfig {
    const fn default_time_zone() -> Tz {
        chrono_tz::Europe::Warsaw
    }

    const fn default_resolution() -> TimeDelta {
        TimeDelta::hours(1)
    }
}

impl Default for CalendarConfig {
    fn default() -> Self {
        Self { time_zone: Self::default_time_zone(), resolution: Self::default_resolution() }
    }
}

#[must_use]
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedConfig {
    #[serde(default)]
    pub oze: MegawattHours,

    #[serde(default)]
    pub arbi: MegawattHours,
}

impl Config {
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read `{}`", path.display()))?;
        Self::from_toml(&content).with_context(|| format!("invalid configuration `{}`", path.display()))
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let this: Self = toml::from_str(content)?;
        ensure!(this.calendar.resolution > TimeDelta::zero(), "non-positive resolution");
        Ok(this)
    }

    pub fn static_parameters(&self) -> Result<StaticParameters> {
        let storage = &self.storage;
        let efficiency = Efficiency::builder()
            .charging(storage.charging_efficiency)
            .discharging(storage.discharging_efficiency)
            .build()?;
        let charge_rate = storage.charge_rate()?;
        StaticParameters::builder()
            .efficiency(efficiency)
            .total_capacity(storage.total_capacity)
            .arbi_share(storage.arbi_share)
            .charge_rate(charge_rate)
            .discharge_rate(storage.discharge_c_rate.unwrap_or(charge_rate))
            .monthly_self_discharge(storage.monthly_self_discharge()?)
            .pcc_import(self.pcc.import_power.unwrap_or(self.pcc.contracted_power))
            .pcc_export(self.pcc.export_power.unwrap_or(self.pcc.contracted_power))
            .build()
    }

    pub fn arbitrage_parameters(&self) -> Result<ArbitrageParameters> {
        let arbitrage = &self.arbitrage;
        ArbitrageParameters::builder()
            .base_min_profit(arbitrage.base_min_profit)
            .cycles_per_day(arbitrage.cycles_per_day)
            .bonuses(Bonuses {
                charge_window: arbitrage.charge_window_bonus,
                discharge_window: arbitrage.discharge_window_bonus,
                low_soc: arbitrage.low_soc_bonus,
                high_soc: arbitrage.high_soc_bonus,
            })
            .low_soc_threshold(arbitrage.low_soc_threshold.unwrap_or(Percent::ZERO))
            .high_soc_threshold(arbitrage.high_soc_threshold.unwrap_or(Percent(100.0)))
            .hours(BonusHours {
                charge: arbitrage.charge_bonus_hours,
                discharge: arbitrage.discharge_bonus_hours,
                free_charge: arbitrage.free_charge_hours,
                free_discharge: arbitrage.free_discharge_hours,
            })
            .discharge_to_load(arbitrage.discharge_to_load)
            .force_order(arbitrage.force_order)
            .allow_carry_over(arbitrage.allow_carry_over.unwrap_or(true))
            .build()
    }

    pub fn seed(&self) -> Result<Seed> {
        for (name, soc) in [("OZE", self.seed.oze), ("ARBI", self.seed.arbi)] {
            if !soc.is_finite() || soc < MegawattHours::ZERO {
                bail!("invalid {name} seed: {soc}");
            }
        }
        Ok(Seed { oze: self.seed.oze, arbi: self.seed.arbi })
    }
}
