quantity!(Percent, suffix: "%", precision: 1);

impl Percent {
    /// Convert the percentage into `0.0..=1.0`.
    pub const fn to_proportion(self) -> f64 {
        0.01 * self.0
    }

    pub const fn from_proportion(proportion: f64) -> Self {
        Self(100.0 * proportion)
    }
}
