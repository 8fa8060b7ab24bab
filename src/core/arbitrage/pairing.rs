use std::cmp::Reverse;

use chrono::{DateTime, NaiveDate, Timelike, Utc};
use chrono_tz::Tz;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    core::{arbitrage::ArbitrageParameters, step::TimeStep},
    prelude::*,
    quantity::{Zero, price::MegawattHourRate},
};

/// End of a price pair that a step plays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Role {
    /// Cheap end, charging.
    Low,

    /// Expensive end, discharging.
    High,
}

#[must_use]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PricePair {
    /// Local calendar day.
    pub day: NaiveDate,

    /// 1-based position in the day's pairing.
    pub rank: usize,

    pub low: DateTime<Utc>,
    pub high: DateTime<Utc>,
    pub price_low: MegawattHourRate,
    pub price_high: MegawattHourRate,
    pub spread: MegawattHourRate,

    /// Base threshold including the time-window bonuses.
    pub threshold: MegawattHourRate,

    /// One of the ends falls into a free hour, the pair is always admitted.
    pub is_free: bool,

    pub qualifies: bool,
    pub admitted: bool,

    /// Admitted without qualifying, to reach the daily cycle cap.
    pub forced_fill: bool,
}

/// Pairs of the whole horizon and each step's role in them.
#[must_use]
pub struct DailyPlan {
    pub pairs: Vec<PricePair>,
    roles: Vec<Option<(Role, usize)>>,
}

impl DailyPlan {
    /// Pair the hours of every local calendar day.
    ///
    /// Steps must be ordered, so that every day is a contiguous run.
    #[instrument(skip_all)]
    pub fn new(steps: &[TimeStep], parameters: &ArbitrageParameters, time_zone: Tz) -> Self {
        let mut pairs = Vec::new();
        let mut roles = vec![None; steps.len()];

        let days = steps
            .iter()
            .enumerate()
            .chunk_by(|(_, step)| step.timestamp.with_timezone(&time_zone).date_naive());
        for (day, day_steps) in &days {
            let day_steps = day_steps.collect_vec();
            for (pair, low_index, high_index) in pair_day(day, &day_steps, parameters, time_zone) {
                roles[low_index] = Some((Role::Low, pairs.len()));
                roles[high_index] = Some((Role::High, pairs.len()));
                pairs.push(pair);
            }
        }

        info!(
            n_pairs = pairs.len(),
            n_admitted = pairs.iter().filter(|pair| pair.admitted).count(),
            n_forced = pairs.iter().filter(|pair| pair.forced_fill).count(),
            "paired",
        );
        Self { pairs, roles }
    }

    pub fn role(&self, index: usize) -> Option<(Role, &PricePair)> {
        self.roles
            .get(index)
            .copied()
            .flatten()
            .map(|(role, pair_index)| (role, &self.pairs[pair_index]))
    }
}

/// Pair the day's hours and admit the pairs.
///
/// Returns the pairs in rank order along with the step indices of their ends.
pub fn pair_day(
    day: NaiveDate,
    steps: &[(usize, &TimeStep)],
    parameters: &ArbitrageParameters,
    time_zone: Tz,
) -> Vec<(PricePair, usize, usize)> {
    let ascending = steps
        .iter()
        .copied()
        .sorted_by_key(|(_, step)| (step.price, step.timestamp))
        .collect_vec();
    let n_pairs = ascending.len() / 2;
    let lows = &ascending[..n_pairs];
    let highs = ascending[ascending.len() - n_pairs..]
        .iter()
        .copied()
        .sorted_by_key(|(_, step)| (Reverse(step.price), step.timestamp))
        .collect_vec();

    let local_hour = |step: &TimeStep| step.timestamp.with_timezone(&time_zone).hour();
    let hours = parameters.hours;
    let (mut pairs, ends): (Vec<_>, Vec<_>) = lows
        .iter()
        .zip(highs)
        .enumerate()
        .map(|(i, (&(low_index, low), (high_index, high)))| {
            let (low_hour, high_hour) = (local_hour(low), local_hour(high));
            let is_free =
                hours.free_charge.contains(low_hour) || hours.free_discharge.contains(high_hour);
            let threshold = if is_free {
                MegawattHourRate::ZERO
            } else {
                let mut threshold = parameters.base_min_profit;
                if hours.charge.contains(low_hour) {
                    threshold += parameters.bonuses.charge_window;
                }
                if hours.discharge.contains(high_hour) {
                    threshold += parameters.bonuses.discharge_window;
                }
                threshold.max(MegawattHourRate::ZERO)
            };
            let spread = high.price - low.price;
            let pair = PricePair {
                day,
                rank: i + 1,
                low: low.timestamp,
                high: high.timestamp,
                price_low: low.price,
                price_high: high.price,
                spread,
                threshold,
                is_free,
                qualifies: spread >= threshold,
                admitted: false,
                forced_fill: false,
            };
            (pair, (low_index, high_index))
        })
        .unzip();

    admit(&mut pairs, parameters.cycles_per_day);
    pairs.into_iter().zip(ends).map(|(pair, (low, high))| (pair, low, high)).collect()
}

/// Admit the pairs under the daily cycle cap.
///
/// Free pairs are always admitted. Qualifying pairs take the remaining slots by descending spread,
/// and the still-free slots are forced-filled with the best non-qualifying pairs.
fn admit(pairs: &mut [PricePair], cycles_per_day: usize) {
    let by_spread = (0..pairs.len())
        .sorted_by_key(|&i| (Reverse(pairs[i].spread), pairs[i].rank))
        .collect_vec();
    let mut slots = cycles_per_day;

    for &i in &by_spread {
        if pairs[i].is_free {
            pairs[i].admitted = true;
            slots = slots.saturating_sub(1);
        }
    }
    for &i in &by_spread {
        if slots > 0 && !pairs[i].admitted && pairs[i].qualifies {
            pairs[i].admitted = true;
            slots -= 1;
        }
    }
    for &i in &by_spread {
        if slots > 0 && !pairs[i].admitted {
            pairs[i].admitted = true;
            pairs[i].forced_fill = true;
            slots -= 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use crate::{
        core::arbitrage::{HourSet, parameters::BonusHours},
        quantity::energy::MegawattHours,
    };

    fn steps(prices: &[f64]) -> Vec<TimeStep> {
        prices
            .iter()
            .zip(0..)
            .map(|(price, hour)| {
                TimeStep::builder()
                    .timestamp(Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap())
                    .price(MegawattHourRate(*price))
                    .generation(MegawattHours::ZERO)
                    .load(MegawattHours::ZERO)
                    .build()
                    .unwrap()
            })
            .collect()
    }

    fn parameters(base_min_profit: f64, cycles_per_day: usize) -> ArbitrageParameters {
        ArbitrageParameters::builder()
            .base_min_profit(MegawattHourRate(base_min_profit))
            .cycles_per_day(cycles_per_day)
            .build()
            .unwrap()
    }

    fn hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, hour, 0, 0).unwrap()
    }

    #[test]
    fn pairs_lowest_with_highest() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(50.0, 1), Tz::UTC);
        assert_eq!(plan.pairs.len(), 2);

        let first = &plan.pairs[0];
        assert_eq!((first.low, first.high), (hour(0), hour(1)));
        assert_eq!(first.spread, MegawattHourRate(80.0));

        let second = &plan.pairs[1];
        assert_eq!((second.low, second.high), (hour(2), hour(3)));
        assert_eq!(second.spread, MegawattHourRate(60.0));
    }

    /// With one cycle a day, only the best qualifying pair is admitted.
    #[test]
    fn cycle_cap_limits_admission() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(50.0, 1), Tz::UTC);
        assert!(plan.pairs[0].admitted);
        assert!(!plan.pairs[0].forced_fill);
        assert!(!plan.pairs[1].admitted);
    }

    #[test]
    fn second_cycle_admits_second_pair() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(50.0, 2), Tz::UTC);
        assert!(plan.pairs.iter().all(|pair| pair.admitted));
    }

    /// The second pair does not qualify and is admitted by the forced fill only.
    #[test]
    fn forced_fill() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(70.0, 2), Tz::UTC);
        assert!(plan.pairs[0].qualifies);
        assert!(!plan.pairs[0].forced_fill);
        assert!(!plan.pairs[1].qualifies);
        assert!(plan.pairs[1].admitted);
        assert!(plan.pairs[1].forced_fill);

        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(70.0, 1), Tz::UTC);
        assert!(!plan.pairs[1].admitted);
    }

    #[test]
    fn no_cycles_no_admission() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters(0.0, 0), Tz::UTC);
        assert!(plan.pairs.iter().all(|pair| !pair.admitted));
    }

    #[test]
    fn roles() {
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0, 50.0]), &parameters(50.0, 1), Tz::UTC);
        assert!(matches!(plan.role(0), Some((Role::Low, pair)) if pair.rank == 1));
        assert!(matches!(plan.role(1), Some((Role::High, pair)) if pair.rank == 1));
        assert!(matches!(plan.role(3), Some((Role::High, pair)) if pair.rank == 2));
        assert!(plan.role(4).is_none(), "the median hour stays unpaired");
        assert!(plan.role(5).is_none());
    }

    /// Equal prices never pair an hour with itself.
    #[test]
    fn flat_prices() {
        let plan = DailyPlan::new(&steps(&[50.0; 4]), &parameters(0.0, 2), Tz::UTC);
        assert_eq!(plan.pairs.len(), 2);
        assert_eq!((plan.pairs[0].low, plan.pairs[0].high), (hour(0), hour(2)));
        assert_eq!((plan.pairs[1].low, plan.pairs[1].high), (hour(1), hour(3)));
        assert!(plan.pairs.iter().all(|pair| pair.spread == MegawattHourRate::ZERO));
    }

    /// The pairing only depends on the day's prices, not on the input order.
    #[test]
    fn order_independent() {
        let steps = steps(&[30.0, 10.0, 90.0, 20.0, 80.0, 40.0]);
        let parameters = parameters(25.0, 2);
        let day = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let forward = steps.iter().enumerate().collect_vec();
        let backward = forward.iter().rev().copied().collect_vec();
        let pairs = |input: &[(usize, &TimeStep)]| {
            pair_day(day, input, &parameters, Tz::UTC)
                .into_iter()
                .map(|(pair, _, _)| pair)
                .collect_vec()
        };
        assert_eq!(pairs(&forward), pairs(&backward));
    }

    #[test]
    fn window_bonuses() -> Result {
        let mut parameters = parameters(50.0, 1);
        parameters.bonuses.charge_window = MegawattHourRate(15.0);
        parameters.bonuses.discharge_window = MegawattHourRate(-100.0);
        parameters.hours = BonusHours {
            charge: HourSet::try_from_hours([0])?,
            discharge: HourSet::try_from_hours([3])?,
            ..BonusHours::default()
        };
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters, Tz::UTC);
        assert_eq!(plan.pairs[0].threshold, MegawattHourRate(65.0));
        assert_eq!(plan.pairs[1].threshold, MegawattHourRate::ZERO);
        Ok(())
    }

    #[test]
    fn free_hours_are_always_admitted() -> Result {
        let mut parameters = parameters(1000.0, 0);
        parameters.hours.free_discharge = HourSet::try_from_hours([3])?;
        let plan = DailyPlan::new(&steps(&[10.0, 90.0, 20.0, 80.0]), &parameters, Tz::UTC);
        assert!(!plan.pairs[0].admitted);
        assert!(plan.pairs[1].is_free);
        assert!(plan.pairs[1].admitted);
        assert!(!plan.pairs[1].forced_fill);
        Ok(())
    }

    /// Days are split by the local calendar.
    #[test]
    fn local_days() {
        // 22:00 and 23:00 UTC are already the next day in Warsaw during the winter:
        let steps = steps(&[10.0, 90.0, 20.0, 80.0, 15.0, 95.0, 25.0, 85.0]);
        let steps = steps
            .into_iter()
            .zip(18..)
            .map(|(step, hour)| TimeStep { timestamp: hour_of(hour), ..step })
            .collect_vec();
        let plan = DailyPlan::new(&steps, &parameters(0.0, 4), chrono_tz::Europe::Warsaw);
        let days = plan.pairs.iter().map(|pair| pair.day).dedup().collect_vec();
        assert_eq!(days.len(), 2);
        assert_eq!(plan.pairs.iter().filter(|pair| pair.day == days[0]).count(), 2);
        assert_eq!(plan.pairs.iter().filter(|pair| pair.day == days[1]).count(), 1);
    }

    fn hour_of(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + chrono::TimeDelta::hours(hour.into())
    }
}
