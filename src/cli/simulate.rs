use std::{
    fs::File,
    io::{BufWriter, Write, stdout},
    path::Path,
};

use crate::{
    cli::SimulateArgs,
    core::{engine::Engine, record::FlowRecord},
    prelude::*,
    tables::{build_pairs_table, build_records_table, build_summary_table},
};

#[instrument(skip_all)]
pub fn simulate(args: &SimulateArgs) -> Result {
    let (config, steps) = args.input.load()?;
    let time_zone = config.calendar.time_zone;
    let seed = config.seed()?;
    if !seed.is_empty() {
        info!(oze = ?seed.oze, arbi = ?seed.arbi, "seeding");
    }

    let simulation = Engine::builder()
        .parameters(config.static_parameters()?)
        .arbitrage(config.arbitrage_parameters()?)
        .time_zone(time_zone)
        .seed(seed)
        .build()
        .run(&steps)?;

    match args.output.as_deref() {
        Some(path) if path == Path::new("-") => write_records(stdout().lock(), &simulation.records)?,
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("failed to create `{}`", path.display()))?;
            write_records(file, &simulation.records)?;
            info!(path = %path.display(), "written the records");
        }
        None => {}
    }

    if args.show_steps {
        println!("{}", build_records_table(&simulation.records, time_zone));
    }
    println!("{}", build_pairs_table(&simulation.pairs, time_zone));

    let summary = simulation.summary();
    if summary.has_unserved() {
        warn!(unserved = ?summary.unserved, "load was left unserved");
    }
    println!("{}", build_summary_table(&summary));
    Ok(())
}

/// Write the records as JSON lines.
fn write_records(writer: impl Write, records: &[FlowRecord]) -> Result {
    let mut writer = BufWriter::new(writer);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}
