use std::ops::Mul;

use crate::quantity::{energy::MegawattHours, time::Hours};

quantity!(Megawatts, suffix: "MW", precision: 2);

impl Mul<Hours> for Megawatts {
    type Output = MegawattHours;

    fn mul(self, rhs: Hours) -> Self::Output {
        MegawattHours(self.0 * rhs.0)
    }
}
