//! Complaint Category Model
//!
//! Categories double as the set of routable departments: a complaint is
//! filed under a category and later assigned to the department of the
//! same name.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ModelError;

/// Complaint category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[serde(rename = "Roads & Transportation")]
    RoadsTransportation,
    #[serde(rename = "Streetlights & Electricity")]
    StreetlightsElectricity,
    #[serde(rename = "Sanitation & Waste")]
    SanitationWaste,
    #[serde(rename = "Water & Drainage")]
    WaterDrainage,
    #[serde(rename = "Public Safety & Hazards")]
    PublicSafetyHazards,
    #[serde(rename = "Parks & Public Spaces")]
    ParksPublicSpaces,
    #[serde(rename = "Miscellaneous")]
    Miscellaneous,
}

/// Department a complaint is routed to (same value set as [`Category`])
pub type Department = Category;

impl Category {
    /// All categories, in dropdown order
    pub const ALL: [Category; 7] = [
        Category::RoadsTransportation,
        Category::StreetlightsElectricity,
        Category::SanitationWaste,
        Category::WaterDrainage,
        Category::PublicSafetyHazards,
        Category::ParksPublicSpaces,
        Category::Miscellaneous,
    ];

    /// Wire / display label
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::RoadsTransportation => "Roads & Transportation",
            Category::StreetlightsElectricity => "Streetlights & Electricity",
            Category::SanitationWaste => "Sanitation & Waste",
            Category::WaterDrainage => "Water & Drainage",
            Category::PublicSafetyHazards => "Public Safety & Hazards",
            Category::ParksPublicSpaces => "Parks & Public Spaces",
            Category::Miscellaneous => "Miscellaneous",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Category {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        Category::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::unknown("category", s))
    }
}
