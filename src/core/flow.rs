use std::ops::Mul;

use derive_more::{Add, AddAssign, Sub};
use serde::Serialize;

use crate::quantity::{Zero, energy::MegawattHours};

/// Generic bidirectional energy flow.
#[must_use]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Add, Sub, AddAssign, Serialize)]
pub struct Flow<T> {
    /// Importing from the grid or charging a reservoir.
    pub import: T,

    /// Exporting to the grid or discharging a reservoir.
    pub export: T,
}

impl<T: Zero> Zero for Flow<T> {
    const ZERO: Self = Self { import: T::ZERO, export: T::ZERO };
}

impl Flow<MegawattHours> {
    /// Clip the floating-point noise below zero on both directions.
    pub fn non_negative(self) -> Self {
        Self { import: self.import.non_negative(), export: self.export.non_negative() }
    }
}

impl<T: Mul<Rhs>, Rhs: Copy> Mul<Rhs> for Flow<T> {
    type Output = Flow<<T as Mul<Rhs>>::Output>;

    fn mul(self, rhs: Rhs) -> Self::Output {
        Flow { import: self.import * rhs, export: self.export * rhs }
    }
}
