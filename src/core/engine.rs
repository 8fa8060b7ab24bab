use chrono_tz::Tz;

use crate::{
    core::{
        arbitrage::{
            ArbitrageParameters,
            DailyPlan,
            PricePair,
            Role,
            Scheduler,
            scheduler::HourContext,
        },
        balance,
        broker::Broker,
        parameters::StaticParameters,
        record::{CashFlow, FlowRecord, ReservoirRecord},
        reservoir::Reservoir,
        retention::Retention,
        step::{TimeStep, ensure_contiguous},
        summary::{RunSummary, StoreSummary},
    },
    prelude::*,
    quantity::{Zero, energy::MegawattHours},
};

/// Initial state-of-charge of the reservoirs, clamped to their capacities.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Seed {
    pub oze: MegawattHours,
    pub arbi: MegawattHours,
}

#[must_use]
pub struct Simulation {
    pub pairs: Vec<PricePair>,
    pub records: Vec<FlowRecord>,
}

impl Simulation {
    pub fn summary(&self) -> RunSummary {
        self.records.iter().collect()
    }
}

/// Hourly dispatch of the two-reservoir store over a balance series.
#[must_use]
#[derive(Debug, bon::Builder)]
pub struct Engine {
    parameters: StaticParameters,
    arbitrage: ArbitrageParameters,

    /// Zone of the local calendar: days, hours, and month lengths.
    #[builder(default = chrono_tz::Europe::Warsaw)]
    time_zone: Tz,

    #[builder(default)]
    seed: Seed,
}

impl Engine {
    /// Simulate the series, which must be ordered and gapless.
    ///
    /// The run is deterministic: same input, same records.
    #[instrument(skip_all, fields(n_steps = steps.len()))]
    pub fn run(&self, steps: &[TimeStep]) -> Result<Simulation> {
        ensure_contiguous(steps)?;
        let plan = DailyPlan::new(steps, &self.arbitrage, self.time_zone);

        let mut recurrence = Recurrence::new(self);
        let records = steps
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let record = recurrence.step(step, plan.role(index));
                balance::ensure_consistent(&record)
                    .with_context(|| format!("inconsistent step at {}", step.timestamp))?;
                Ok(record)
            })
            .collect::<Result<Vec<_>>>()?;

        let simulation = Simulation { pairs: plan.pairs, records };
        let summary = simulation.summary();
        info!(
            n_cycles = summary.n_cycles,
            grid = ?summary.grid,
            curtailment = ?summary.curtailment,
            unserved = ?summary.unserved,
            cash_flow = ?summary.cash_flow,
            "simulated",
        );
        Ok(simulation)
    }
}

/// Mutable state carried from one step to the next.
struct Recurrence<'a> {
    parameters: &'a StaticParameters,
    time_zone: Tz,
    broker: Broker,
    scheduler: Scheduler,
    oze: Reservoir,
    arbi: Reservoir,
}

impl<'a> Recurrence<'a> {
    fn new(engine: &'a Engine) -> Self {
        let parameters = &engine.parameters;
        let oze = Reservoir::new(parameters.oze, engine.seed.oze);
        let arbi = Reservoir::new(parameters.arbi, engine.seed.arbi);
        Self {
            parameters,
            time_zone: engine.time_zone,
            broker: Broker::builder()
                .efficiency(parameters.efficiency)
                .discharge_to_load(engine.arbitrage.discharge_to_load)
                .build(),
            scheduler: Scheduler::new(engine.arbitrage, parameters.efficiency, arbi.soc()),
            oze,
            arbi,
        }
    }

    fn step(&mut self, step: &TimeStep, role: Option<(Role, &PricePair)>) -> FlowRecord {
        let efficiency = self.parameters.efficiency;
        let day = step.timestamp.with_timezone(&self.time_zone).date_naive();
        let duration = step.hours();
        let retention = Retention::for_step(self.parameters.monthly_self_discharge, day, duration);

        let oze_availability = self.oze.availability(retention, duration);
        let arbi_availability = self.arbi.availability(retention, duration);
        let arbi_fill = self.arbi.state.fill();

        let mut allocation = self.broker.allocate(
            step,
            &oze_availability,
            &arbi_availability,
            self.parameters.pcc.caps(duration),
        );

        let oze = self.oze.apply(retention, allocation.oze.internal, step.is_surplus());
        let (oze_dispatch, returned) = allocation.oze.clip_charge(oze.spill, efficiency);
        allocation.settlement.returned = returned;

        let context = HourContext {
            day,
            role,
            arbi: arbi_availability,
            fill: arbi_fill,
            passive: allocation.arbi,
        };
        let outcome = self.scheduler.execute(&context, &mut allocation.settlement);
        allocation.settlement.release_returned();

        let mut arbi_dispatch = allocation.arbi;
        arbi_dispatch += outcome.dispatch;
        let arbi = self.arbi.apply(retention, arbi_dispatch.internal, step.is_surplus());

        let oze = ReservoirRecord::new(oze, oze_dispatch, oze_availability.rate_caps);
        let arbi = ReservoirRecord::new(arbi, arbi_dispatch, arbi_availability.rate_caps);
        let settlement = allocation.settlement;
        trace!(
            timestamp = ?step.timestamp,
            oze = ?oze.state.soc_clamped,
            arbi = ?arbi.state.soc_clamped,
            action = ?outcome.action,
            reason = ?outcome.reason,
            grid = ?settlement.grid(),
            "step",
        );

        FlowRecord {
            timestamp: step.timestamp,
            duration,
            price: step.price,
            generation: step.generation,
            load: step.load,
            surplus: step.surplus,
            deficit: step.deficit,
            store: StoreSummary::aggregate(&oze, &arbi),
            oze,
            arbi,
            arbitrage: outcome,
            bindings: settlement.bindings(),
            cash_flow: CashFlow::new(&settlement, &outcome, step.price),
            settlement,
        }
    }
}

impl Seed {
    pub fn total(&self) -> MegawattHours {
        self.oze + self.arbi
    }

    pub fn is_empty(&self) -> bool {
        self.total() <= MegawattHours::ZERO
    }
}
