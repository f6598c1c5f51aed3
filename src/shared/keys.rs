use std::fmt;
use std::str::FromStr;

/// The fixed set of logical property keys this service manages.
///
/// Each key maps 1:1 to a human-readable property-definition name in the
/// remote catalog. The mapping is static configuration, not derived data;
/// requests reference keys by their wire name (`bookable`, `windowDays`, …).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LogicalKey {
    Bookable,
    Recurring,
    Approvers,
    FleetManagers,
    Conflicts,
    WindowDays,
    MaxDurationHours,
    Language,
}

impl LogicalKey {
    /// All keys, in the order used for deterministic iteration.
    pub const ALL: [LogicalKey; 8] = [
        LogicalKey::Bookable,
        LogicalKey::Recurring,
        LogicalKey::Approvers,
        LogicalKey::FleetManagers,
        LogicalKey::Conflicts,
        LogicalKey::WindowDays,
        LogicalKey::MaxDurationHours,
        LogicalKey::Language,
    ];

    /// The key as it appears in request payloads.
    pub fn wire_name(&self) -> &'static str {
        match self {
            LogicalKey::Bookable => "bookable",
            LogicalKey::Recurring => "recurring",
            LogicalKey::Approvers => "approvers",
            LogicalKey::FleetManagers => "fleetManagers",
            LogicalKey::Conflicts => "conflicts",
            LogicalKey::WindowDays => "windowDays",
            LogicalKey::MaxDurationHours => "maxDurationHours",
            LogicalKey::Language => "language",
        }
    }

    /// The exact property-definition name this key resolves against.
    pub fn definition_name(&self) -> &'static str {
        match self {
            LogicalKey::Bookable => "Enable Equipment Booking",
            LogicalKey::Recurring => "Allow Recurring Bookings",
            LogicalKey::Approvers => "Booking Approvers",
            LogicalKey::FleetManagers => "Fleet Managers",
            LogicalKey::Conflicts => "Allow Double Booking",
            LogicalKey::WindowDays => "Booking Window (Days)",
            LogicalKey::MaxDurationHours => "Maximum Booking Duration (Hours)",
            LogicalKey::Language => "Mailbox Language",
        }
    }
}

impl fmt::Display for LogicalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Error returned when a request names a key outside the fixed set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKey(pub String);

impl fmt::Display for UnknownKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown logical property key: {}", self.0)
    }
}

impl std::error::Error for UnknownKey {}

impl FromStr for LogicalKey {
    type Err = UnknownKey;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        LogicalKey::ALL
            .iter()
            .copied()
            .find(|key| key.wire_name() == s)
            .ok_or_else(|| UnknownKey(s.to_string()))
    }
}
