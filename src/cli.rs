mod pairs;
mod simulate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use self::{pairs::pairs, simulate::simulate};
use crate::{config::Config, core::step::TimeStep, feed, prelude::*};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: run the hourly dispatch and arbitrage simulation.
    #[clap(name = "simulate")]
    Simulate(Box<SimulateArgs>),

    /// Inspect the daily price pairing without simulating.
    #[clap(name = "pairs")]
    Pairs(Box<InputArgs>),
}

#[must_use]
#[derive(Parser)]
pub struct InputArgs {
    /// Parameter snapshot in TOML.
    #[clap(long = "config", env = "CONFIG", default_value = "magazyn.toml")]
    pub config: PathBuf,

    /// Balance series: JSON array of `{timestamp, generation, load, price}` rows.
    #[clap(long = "input", env = "INPUT")]
    pub input: PathBuf,
}

impl InputArgs {
    pub fn load(&self) -> Result<(Config, Vec<TimeStep>)> {
        let config = Config::from_file(&self.config)?;
        let steps = feed::read_steps(&self.input, config.calendar.resolution)?;
        Ok((config, steps))
    }
}

#[must_use]
#[derive(Parser)]
pub struct SimulateArgs {
    #[clap(flatten)]
    pub input: InputArgs,

    /// Write the flow records as JSON lines, `-` for the standard output.
    #[clap(long = "output", env = "OUTPUT")]
    pub output: Option<PathBuf>,

    /// Print the per-step table.
    #[clap(long = "show-steps", env = "SHOW_STEPS")]
    pub show_steps: bool,
}
