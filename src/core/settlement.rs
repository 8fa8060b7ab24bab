use std::fmt::{Display, Formatter};

use comfy_table::Color;
use enumset::{EnumSet, EnumSetType};
use serde::{Deserialize, Serialize};

use crate::{
    core::flow::Flow,
    quantity::{Zero, energy::MegawattHours},
};

/// Limit that was hit during the step.
#[derive(Debug, EnumSetType, Deserialize, Serialize)]
#[enumset(serialize_repr = "list")]
#[serde(rename_all = "snake_case")]
pub enum Binding {
    /// Grid import reached the PCC import cap.
    ImportCap,

    /// Grid export reached the PCC export cap.
    ExportCap,

    /// Surplus was thrown away.
    Curtailment,

    /// Load was left uncovered.
    Unserved,
}

impl Display for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ImportCap => write!(f, "Import cap"),
            Self::ExportCap => write!(f, "Export cap"),
            Self::Curtailment => write!(f, "Curtailed"),
            Self::Unserved => write!(f, "Unserved"),
        }
    }
}

impl Binding {
    pub const fn color(self) -> Color {
        match self {
            Self::ImportCap | Self::ExportCap => Color::DarkYellow,
            Self::Curtailment | Self::Unserved => Color::Red,
        }
    }
}

/// Grid side of the step at the point of common coupling.
#[must_use]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Settlement {
    pub caps: Flow<MegawattHours>,

    /// Import serving the load and export of the surplus.
    pub passive: Flow<MegawattHours>,

    /// Import charging the arbitrage reservoir and its export to the grid.
    pub arbitrage: Flow<MegawattHours>,

    pub curtailment: MegawattHours,
    pub unserved: MegawattHours,

    /// AC-side surplus that a reservoir gave back and that has not been routed yet.
    #[serde(skip)]
    pub returned: MegawattHours,
}

impl Settlement {
    pub fn new(caps: Flow<MegawattHours>) -> Self {
        Self {
            caps,
            passive: Flow::ZERO,
            arbitrage: Flow::ZERO,
            curtailment: MegawattHours::ZERO,
            unserved: MegawattHours::ZERO,
            returned: MegawattHours::ZERO,
        }
    }

    pub fn grid(&self) -> Flow<MegawattHours> {
        self.passive + self.arbitrage
    }

    /// Remaining import and export room under the PCC caps.
    pub fn headroom(&self) -> Flow<MegawattHours> {
        (self.caps - self.grid()).non_negative()
    }

    /// Export the surplus as far as the cap allows and curtail the rest.
    pub fn export_surplus(&mut self, surplus: MegawattHours) {
        let exported = surplus.min(self.headroom().export);
        self.passive.export += exported;
        self.curtailment += (surplus - exported).non_negative();
    }

    /// Import for the load as far as the cap allows, the rest stays unserved.
    pub fn import_for_load(&mut self, demand: MegawattHours) {
        let imported = demand.min(self.headroom().import);
        self.passive.import += imported;
        self.unserved += (demand - imported).non_negative();
    }

    /// Cover still-unmet load with `energy`, unserved load first, then the grid import.
    ///
    /// Returns the energy actually taken.
    pub fn cover_load(&mut self, energy: MegawattHours) -> MegawattHours {
        let from_unserved = energy.min(self.unserved);
        self.unserved -= from_unserved;
        let from_import = (energy - from_unserved).min(self.passive.import);
        self.passive.import -= from_import;
        from_unserved + from_import
    }

    /// Take up to `limit` of the returned surplus.
    pub fn take_returned(&mut self, limit: MegawattHours) -> MegawattHours {
        let taken = self.returned.min(limit.non_negative());
        self.returned -= taken;
        taken
    }

    /// Route the remaining returned surplus to the grid.
    pub fn release_returned(&mut self) {
        let returned = self.take_returned(self.returned);
        if returned > MegawattHours::ZERO {
            self.export_surplus(returned);
        }
    }

    pub fn bindings(&self) -> EnumSet<Binding> {
        let mut bindings = EnumSet::empty();
        let headroom = self.headroom();
        if self.caps.import > MegawattHours::ZERO
            && headroom.import <= MegawattHours::EPSILON
            && self.grid().import > MegawattHours::ZERO
        {
            bindings |= Binding::ImportCap;
        }
        if self.caps.export > MegawattHours::ZERO
            && headroom.export <= MegawattHours::EPSILON
            && self.grid().export > MegawattHours::ZERO
        {
            bindings |= Binding::ExportCap;
        }
        if self.curtailment > MegawattHours::EPSILON {
            bindings |= Binding::Curtailment;
        }
        if self.unserved > MegawattHours::EPSILON {
            bindings |= Binding::Unserved;
        }
        bindings
    }
}
