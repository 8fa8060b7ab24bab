use crate::{cli::InputArgs, core::arbitrage::DailyPlan, prelude::*, tables::build_pairs_table};

#[instrument(skip_all)]
pub fn pairs(args: &InputArgs) -> Result {
    let (config, steps) = args.load()?;
    let plan = DailyPlan::new(&steps, &config.arbitrage_parameters()?, config.calendar.time_zone);
    println!("{}", build_pairs_table(&plan.pairs, config.calendar.time_zone));
    Ok(())
}
