//! Role Model
//!
//! Administrative roles are carried as identity-provider group names.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use super::category::Department;
use crate::error::ModelError;

/// Administrative role of the acting user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Role {
    SuperAdmin,
    RoadsAdmin,
    ElectricityAdmin,
    SanitationAdmin,
    WaterAdmin,
    SafetyAdmin,
    ParksAdmin,
    /// Departmental fallback for users without a recognised group
    #[default]
    DepartmentAdmin,
}

impl Role {
    /// Resolution order when a user belongs to several groups.
    ///
    /// `DepartmentAdmin` is not a group; it is the fallback when none match.
    pub const PRECEDENCE: [Role; 7] = [
        Role::SuperAdmin,
        Role::RoadsAdmin,
        Role::ElectricityAdmin,
        Role::SanitationAdmin,
        Role::WaterAdmin,
        Role::SafetyAdmin,
        Role::ParksAdmin,
    ];

    /// Group / display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "SuperAdmin",
            Role::RoadsAdmin => "RoadsAdmin",
            Role::ElectricityAdmin => "ElectricityAdmin",
            Role::SanitationAdmin => "SanitationAdmin",
            Role::WaterAdmin => "WaterAdmin",
            Role::SafetyAdmin => "SafetyAdmin",
            Role::ParksAdmin => "ParksAdmin",
            Role::DepartmentAdmin => "DepartmentAdmin",
        }
    }

    /// Department owned by this role, if any
    pub fn department(&self) -> Option<Department> {
        match self {
            Role::RoadsAdmin => Some(Department::RoadsTransportation),
            Role::ElectricityAdmin => Some(Department::StreetlightsElectricity),
            Role::SanitationAdmin => Some(Department::SanitationWaste),
            Role::WaterAdmin => Some(Department::WaterDrainage),
            Role::SafetyAdmin => Some(Department::PublicSafetyHazards),
            Role::ParksAdmin => Some(Department::ParksPublicSpaces),
            Role::SuperAdmin | Role::DepartmentAdmin => None,
        }
    }

    pub fn is_super_admin(&self) -> bool {
        matches!(self, Role::SuperAdmin)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Role {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::PRECEDENCE
            .into_iter()
            .chain(std::iter::once(Role::DepartmentAdmin))
            .find(|r| r.as_str() == s)
            .ok_or_else(|| ModelError::unknown("role", s))
    }
}
