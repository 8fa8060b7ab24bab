use derive_more::AddAssign;
use serde::Serialize;

use crate::{
    core::{flow::Flow, parameters::Efficiency},
    quantity::{Zero, energy::MegawattHours},
};

/// Energy moved into or out of a reservoir, seen from both sides of the converter.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, AddAssign, Serialize)]
pub struct Dispatch {
    /// Stored (import) and drawn (export) energy inside the reservoir.
    pub internal: Flow<MegawattHours>,

    /// Consumed (import) and delivered (export) energy on the AC side.
    pub external: Flow<MegawattHours>,
}

impl Zero for Dispatch {
    const ZERO: Self = Self { internal: Flow::ZERO, external: Flow::ZERO };
}

impl Dispatch {
    /// Store `stored` energy, consuming `stored / η_ch` from the AC side.
    pub fn charge(stored: MegawattHours, efficiency: Efficiency) -> Self {
        Self {
            internal: Flow { import: stored, export: MegawattHours::ZERO },
            external: Flow { import: stored / efficiency.charging, export: MegawattHours::ZERO },
        }
    }

    /// Deliver `delivered` energy to the AC side.
    pub fn deliver(delivered: MegawattHours, efficiency: Efficiency) -> Self {
        Self {
            internal: Flow { import: MegawattHours::ZERO, export: delivered / efficiency.discharging },
            external: Flow { import: MegawattHours::ZERO, export: delivered },
        }
    }

    /// Conversion loss on both directions.
    pub fn efficiency_loss(&self) -> MegawattHours {
        ((self.external.import - self.internal.import)
            + (self.internal.export - self.external.export))
            .non_negative()
    }

    /// Give back the part of the charge that did not fit into the reservoir.
    ///
    /// Returns the reduced dispatch and the AC-side energy that was not actually consumed.
    pub fn clip_charge(self, clipped: MegawattHours, efficiency: Efficiency) -> (Self, MegawattHours) {
        let clipped = clipped.min(self.internal.import);
        let stored = self.internal.import - clipped;
        let kept = Self {
            internal: Flow { import: stored, export: self.internal.export },
            external: Flow { import: stored / efficiency.charging, export: self.external.export },
        };
        (kept, self.external.import - kept.external.import)
    }
}
