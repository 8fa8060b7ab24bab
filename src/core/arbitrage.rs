//! Daily low/high price pairing and the per-hour arbitrage execution.

mod cycle;
pub mod hours;
pub mod pairing;
pub mod parameters;
pub mod reason;
pub mod scheduler;

pub use self::{
    hours::HourSet,
    pairing::{DailyPlan, PricePair, Role},
    parameters::ArbitrageParameters,
    reason::{Action, Reason},
    scheduler::{ArbitrageOutcome, Scheduler},
};
