use std::fmt::{Debug, Formatter};

use serde::{Deserialize, Serialize};

use crate::prelude::*;

/// Set of local hours of the day, `0..24`.
#[must_use]
#[derive(Copy, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(try_from = "Vec<u32>", into = "Vec<u32>")]
pub struct HourSet(u32);

impl HourSet {
    pub fn try_from_hours(hours: impl IntoIterator<Item = u32>) -> Result<Self> {
        let mut mask = 0;
        for hour in hours {
            ensure!(hour < 24, "hour out of range: {hour}");
            mask |= 1 << hour;
        }
        Ok(Self(mask))
    }

    pub const fn contains(self, hour: u32) -> bool {
        hour < 24 && self.0 & (1 << hour) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..24).filter(move |hour| self.contains(*hour))
    }
}

impl TryFrom<Vec<u32>> for HourSet {
    type Error = Error;

    fn try_from(hours: Vec<u32>) -> Result<Self> {
        Self::try_from_hours(hours)
    }
}

impl From<HourSet> for Vec<u32> {
    fn from(hours: HourSet) -> Self {
        hours.iter().collect()
    }
}

impl Debug for HourSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership() -> Result {
        let hours = HourSet::try_from_hours([0, 7, 23])?;
        assert!(hours.contains(0));
        assert!(hours.contains(7));
        assert!(hours.contains(23));
        assert!(!hours.contains(8));
        assert!(!hours.contains(24));
        assert_eq!(hours.iter().collect::<Vec<_>>(), vec![0, 7, 23]);
        Ok(())
    }

    #[test]
    fn out_of_range() {
        assert!(HourSet::try_from_hours([24]).is_err());
    }

    #[test]
    fn deserialize() -> Result {
        let hours: HourSet = serde_json::from_str("[1, 2, 3]")?;
        assert_eq!(hours, HourSet::try_from_hours(1..=3)?);
        assert!(serde_json::from_str::<HourSet>("[42]").is_err());
        Ok(())
    }
}
