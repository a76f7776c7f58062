// src/models/status.rs
//! Status and type enums shared by the lab, registry and workflow modules

use serde::{Serialize, Deserialize};

/// Generates a text-backed enum with as_str, from_str, is_valid and Display
macro_rules! define_status_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $variant:ident => $str_val:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        $vis enum $name {
            $( $variant ),+
        }

        impl $name {
            #[inline]
            pub const fn as_str(&self) -> &'static str {
                match self {
                    $( $name::$variant => $str_val ),+
                }
            }

            pub fn from_str(s: &str) -> Option<Self> {
                match s.trim().to_lowercase().as_str() {
                    $( $str_val => Some($name::$variant), )+
                    _ => None,
                }
            }

            #[inline]
            pub fn is_valid(s: &str) -> bool {
                Self::from_str(s).is_some()
            }

            pub const fn all_values() -> &'static [&'static str] {
                &[ $( $str_val ),+ ]
            }

            pub const fn all() -> &'static [$name] {
                &[ $( $name::$variant ),+ ]
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                $name::from_str(s).ok_or_else(|| format!("Invalid {}: '{}'", stringify!($name), s))
            }
        }
    };
}

// ==================== LAB STATUS ====================

define_status_enum! {
    /// Operational status of a lab
    pub enum LabStatus {
        Active => "active",
        Inactive => "inactive",
        Maintenance => "maintenance",
    }
}

impl Default for LabStatus {
    fn default() -> Self {
        LabStatus::Active
    }
}

// ==================== EQUIPMENT TYPE ====================

define_status_enum! {
    /// Kind of an individually tracked equipment unit
    pub enum EquipmentKind {
        Monitor => "monitor",
        Projector => "projector",
        SwitchBoard => "switch_board",
        Fan => "fan",
        Wifi => "wifi",
    }
}

impl EquipmentKind {
    /// Name of the bucket this kind is grouped under in registry listings
    pub const fn bucket(&self) -> &'static str {
        match self {
            EquipmentKind::Monitor => "monitors",
            EquipmentKind::Projector => "projectors",
            EquipmentKind::SwitchBoard => "switch_boards",
            EquipmentKind::Fan => "fans",
            EquipmentKind::Wifi => "wifi",
        }
    }
}

// ==================== APPROVAL ====================

define_status_enum! {
    /// Admin approval of a maintenance request, orthogonal to step progress
    pub enum ApprovalStatus {
        Pending => "pending",
        Approved => "approved",
        Rejected => "rejected",
    }
}

impl Default for ApprovalStatus {
    fn default() -> Self {
        ApprovalStatus::Pending
    }
}

define_status_enum! {
    /// Decision on a dead-stock write-off; absent until decided
    pub enum DeadstockStatus {
        Approved => "approved",
        Rejected => "rejected",
    }
}

// ==================== EQUIPMENT STATUS (numeric) ====================

/// Condition of an equipment unit, stored as a raw integer code.
///
/// `0` is active, `1` is maintenance and every other code reads as damaged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EquipmentStatus {
    Active,
    Maintenance,
    Damaged,
}

impl EquipmentStatus {
    pub const fn decode(code: i64) -> Self {
        match code {
            0 => EquipmentStatus::Active,
            1 => EquipmentStatus::Maintenance,
            _ => EquipmentStatus::Damaged,
        }
    }

    pub const fn encode(&self) -> i64 {
        match self {
            EquipmentStatus::Active => 0,
            EquipmentStatus::Maintenance => 1,
            EquipmentStatus::Damaged => 2,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            EquipmentStatus::Active => "active",
            EquipmentStatus::Maintenance => "maintenance",
            EquipmentStatus::Damaged => "damaged",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(EquipmentStatus::Active),
            "maintenance" => Some(EquipmentStatus::Maintenance),
            "damaged" => Some(EquipmentStatus::Damaged),
            _ => None,
        }
    }
}

impl std::fmt::Display for EquipmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ==================== REQUEST STATUS (derived) ====================

/// Step count at which a request is closed and no longer progresses
pub const TERMINAL_STEP: i64 = 5;

/// Read-only projection of a request's `completed_steps` counter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RequestStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl RequestStatus {
    pub const fn from_steps(completed_steps: i64) -> Self {
        match completed_steps {
            i64::MIN..=1 => RequestStatus::Open,
            2..=3 => RequestStatus::InProgress,
            4 => RequestStatus::Resolved,
            _ => RequestStatus::Closed,
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Open => "open",
            RequestStatus::InProgress => "in-progress",
            RequestStatus::Resolved => "resolved",
            RequestStatus::Closed => "closed",
        }
    }
}
