use std::ops::Mul;

use crate::quantity::{cost::Cost, price::MegawattHourRate};

quantity!(MegawattHours, suffix: "MWh", precision: 3);

impl MegawattHours {
    /// Energy tolerance for the balance checks.
    pub const TOLERANCE: Self = Self(1e-6);

    /// Smallest energy treated as an actual flow.
    pub const EPSILON: Self = Self(1e-9);

    /// Share of `self` in the `whole`, or zero when the whole is empty.
    pub fn fraction_of(self, whole: Self) -> f64 {
        if whole.0 > 0.0 { self.0 / whole.0 } else { 0.0 }
    }
}

impl Mul<MegawattHourRate> for MegawattHours {
    type Output = Cost;

    fn mul(self, rhs: MegawattHourRate) -> Self::Output {
        Cost(self.0 * rhs.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::quantity::Zero;

    #[test]
    fn fraction_of_empty_whole() {
        assert_eq!(MegawattHours(1.0).fraction_of(MegawattHours::ZERO), 0.0);
    }

    #[test]
    fn ordering_and_clamp() {
        let energy = MegawattHours(10.8).clamp(MegawattHours::ZERO, MegawattHours(10.0));
        assert_eq!(energy, MegawattHours(10.0));
        assert!(MegawattHours(-0.1) < MegawattHours::ZERO);
        assert_eq!(MegawattHours(-1e-12).non_negative(), MegawattHours::ZERO);
    }

    #[test]
    fn display() {
        assert_eq!(MegawattHours(4.5).to_string(), "4.500 MWh");
    }
}
