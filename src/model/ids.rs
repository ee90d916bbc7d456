use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Declares a `u64` newtype identifier that serializes as a bare number and
/// parses from a trimmed decimal string (the form of a `<select>` value).
macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub u64);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::num::ParseIntError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                s.trim().parse().map($name)
            }
        }
    };
}

entity_id!(
    /// Identifier of a [`Project`](super::Project)
    ProjectId
);
entity_id!(
    /// Identifier of a [`TeamMember`](super::TeamMember)
    MemberId
);
entity_id!(
    /// Identifier of a [`Task`](super::Task)
    TaskId
);
entity_id!(
    /// Identifier of a [`Notification`](super::Notification)
    NotificationId
);
entity_id!(
    /// Identifier of a [`DailyReport`](super::DailyReport)
    ReportId
);

/// Next identifier to hand out in each collection.
///
/// Persisted with the snapshot so that an id is never reused, even after the
/// entity that held it has been deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NextIds {
    pub project: u64,
    pub member: u64,
    pub task: u64,
    pub notification: u64,
    pub report: u64,
}

impl Default for NextIds {
    fn default() -> Self {
        NextIds {
            project: 1,
            member: 1,
            task: 1,
            notification: 1,
            report: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_parse_from_select_values() {
        assert_eq!(" 42 ".parse::<ProjectId>().unwrap(), ProjectId(42));
        assert!("".parse::<MemberId>().is_err());
        assert!("abc".parse::<TaskId>().is_err());
    }

    #[test]
    fn ids_serialize_as_bare_numbers() {
        assert_eq!(serde_json::to_string(&TaskId(7)).unwrap(), "7");
        let id: MemberId = serde_json::from_str("3").unwrap();
        assert_eq!(id, MemberId(3));
    }

    #[test]
    fn counters_added_later_default_to_one() {
        let next: NextIds =
            serde_json::from_str(r#"{"project": 4, "member": 4, "task": 9}"#).unwrap();
        assert_eq!(next.task, 9);
        assert_eq!(next.notification, 1);
        assert_eq!(next.report, 1);
    }
}
