//! Screen identifiers for the tab bar.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ScreenId {
    #[default]
    Devices, // 1
    Trips, // 2
}

impl ScreenId {
    /// Tab-bar order.
    pub const ALL: [ScreenId; 2] = [Self::Devices, Self::Trips];

    pub fn number(self) -> u8 {
        match self {
            Self::Devices => 1,
            Self::Trips => 2,
        }
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    /// Next screen in tab order (wraps around).
    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    pub fn prev(self) -> Self {
        let idx = Self::ALL.iter().position(|&s| s == self).unwrap_or(0);
        Self::ALL[(idx + Self::ALL.len() - 1) % Self::ALL.len()]
    }

    /// Translation key of the tab label.
    pub fn label_key(self) -> &'static str {
        match self {
            Self::Devices => "deviceTitle",
            Self::Trips => "reportTrips",
        }
    }
}

impl fmt::Display for ScreenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Devices => f.write_str("Devices"),
            Self::Trips => f.write_str("Trips"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_keys_and_cycling() {
        assert_eq!(ScreenId::from_number(2), Some(ScreenId::Trips));
        assert_eq!(ScreenId::from_number(3), None);
        assert_eq!(ScreenId::Devices.next(), ScreenId::Trips);
        assert_eq!(ScreenId::Trips.next(), ScreenId::Devices);
        assert_eq!(ScreenId::Devices.prev(), ScreenId::Trips);
    }
}
