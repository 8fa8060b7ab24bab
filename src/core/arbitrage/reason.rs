use std::fmt::{Display, Formatter};

use comfy_table::Color;
use serde::Serialize;

/// What the arbitrage reservoir did in the step, on top of the passive broker flows.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    Idle,
    Charge,
    Discharge,
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Charge => write!(f, "Charge"),
            Self::Discharge => write!(f, "Discharge"),
        }
    }
}

impl Action {
    pub const fn color(self) -> Color {
        match self {
            Self::Charge => Color::Green,
            Self::Discharge => Color::Blue,
            Self::Idle => Color::Reset,
        }
    }
}

/// Why an hour produced no arbitrage flow.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Reason {
    /// The hour is not an end of any pair, for example the median hour of an odd day.
    Unpaired,

    /// The hour's pair was not admitted.
    UnqualifiedPair,

    /// The live state-of-charge bonus raised the threshold above the spread.
    BelowThreshold,

    /// No room: reservoir headroom for charging, PCC export headroom for discharging.
    NoHeadroom,

    /// Nothing to charge from or nothing to discharge.
    NoEnergy,

    /// The rate cap is zero or already used up by the passive flows.
    ZeroRateCap,
}

impl Display for Reason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unpaired => write!(f, "Unpaired"),
            Self::UnqualifiedPair => write!(f, "Unqualified"),
            Self::BelowThreshold => write!(f, "Below threshold"),
            Self::NoHeadroom => write!(f, "No headroom"),
            Self::NoEnergy => write!(f, "No energy"),
            Self::ZeroRateCap => write!(f, "Zero rate cap"),
        }
    }
}
