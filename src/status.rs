// src/status.rs

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Appointment status. Stored and sent on the wire as the Spanish labels the
/// clinic clients already use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    #[serde(rename = "pendiente")]
    Pending,
    #[serde(rename = "confirmada")]
    Confirmed,
    #[serde(rename = "cancelada")]
    Cancelled,
}

/// Rotation order. `next()` walks this cyclically.
pub const ROTATION: [AppointmentStatus; 3] = [
    AppointmentStatus::Pending,
    AppointmentStatus::Confirmed,
    AppointmentStatus::Cancelled,
];

impl AppointmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pendiente",
            AppointmentStatus::Confirmed => "confirmada",
            AppointmentStatus::Cancelled => "cancelada",
        }
    }

    fn position(self) -> usize {
        match self {
            AppointmentStatus::Pending => 0,
            AppointmentStatus::Confirmed => 1,
            AppointmentStatus::Cancelled => 2,
        }
    }

    /// Cyclic successor: pendiente -> confirmada -> cancelada -> pendiente.
    pub fn next(self) -> Self {
        ROTATION[(self.position() + 1) % ROTATION.len()]
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown appointment status: {0:?}")]
pub struct UnknownStatus(pub String);

impl FromStr for AppointmentStatus {
    type Err = UnknownStatus;

    /// Case-insensitive; the mobile client sends `Pendiente`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        ROTATION
            .into_iter()
            .find(|st| st.as_str() == wanted)
            .ok_or_else(|| UnknownStatus(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn rotates_in_fixed_order() {
        assert_eq!(AppointmentStatus::Pending.next(), AppointmentStatus::Confirmed);
        assert_eq!(AppointmentStatus::Confirmed.next(), AppointmentStatus::Cancelled);
        assert_eq!(AppointmentStatus::Cancelled.next(), AppointmentStatus::Pending);
    }

    #[test]
    fn parses_wire_labels_case_insensitively() {
        assert_eq!("pendiente".parse(), Ok(AppointmentStatus::Pending));
        assert_eq!("Pendiente".parse(), Ok(AppointmentStatus::Pending));
        assert_eq!(" CONFIRMADA ".parse(), Ok(AppointmentStatus::Confirmed));
        assert_eq!("cancelada".parse(), Ok(AppointmentStatus::Cancelled));
    }

    #[test]
    fn rejects_out_of_domain_labels() {
        // "Completada" shows up in old mobile builds; it is not part of the cycle.
        assert!("Completada".parse::<AppointmentStatus>().is_err());
        assert!("".parse::<AppointmentStatus>().is_err());
        assert!("pending".parse::<AppointmentStatus>().is_err());
    }

    #[test]
    fn serializes_as_spanish_label() {
        let json = serde_json::to_string(&AppointmentStatus::Confirmed).unwrap();
        assert_eq!(json, "\"confirmada\"");
    }

    fn any_status() -> impl Strategy<Value = AppointmentStatus> {
        prop::sample::select(ROTATION.to_vec())
    }

    proptest! {
        #[test]
        fn three_rotations_are_identity(st in any_status()) {
            prop_assert_eq!(st.next().next().next(), st);
        }

        #[test]
        fn rotation_never_fixes_a_point(st in any_status()) {
            prop_assert_ne!(st.next(), st);
        }

        #[test]
        fn display_round_trips_through_parse(st in any_status()) {
            prop_assert_eq!(st.to_string().parse::<AppointmentStatus>(), Ok(st));
        }
    }
}
