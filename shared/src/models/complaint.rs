//! Complaint Model
//!
//! A citizen-filed civic issue and its workflow state. Records are owned
//! by the complaints API; the client only ever replaces them wholesale
//! from a fetch.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::str::FromStr;

use super::category::{Category, Department};
use crate::error::ModelError;

// ============================================================================
// Status
// ============================================================================

/// Workflow status
///
/// `Submitted → Acknowledged → Assigned → In Progress → Resolved` in order,
/// with `Rejected` reachable from any non-terminal state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComplaintStatus {
    Submitted,
    Acknowledged,
    Assigned,
    #[serde(rename = "In Progress")]
    InProgress,
    Resolved,
    Rejected,
}

impl ComplaintStatus {
    pub const ALL: [ComplaintStatus; 6] = [
        ComplaintStatus::Submitted,
        ComplaintStatus::Acknowledged,
        ComplaintStatus::Assigned,
        ComplaintStatus::InProgress,
        ComplaintStatus::Resolved,
        ComplaintStatus::Rejected,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComplaintStatus::Submitted => "Submitted",
            ComplaintStatus::Acknowledged => "Acknowledged",
            ComplaintStatus::Assigned => "Assigned",
            ComplaintStatus::InProgress => "In Progress",
            ComplaintStatus::Resolved => "Resolved",
            ComplaintStatus::Rejected => "Rejected",
        }
    }

    /// Position on the forward path; `None` for `Rejected`
    fn stage(&self) -> Option<u8> {
        match self {
            ComplaintStatus::Submitted => Some(0),
            ComplaintStatus::Acknowledged => Some(1),
            ComplaintStatus::Assigned => Some(2),
            ComplaintStatus::InProgress => Some(3),
            ComplaintStatus::Resolved => Some(4),
            ComplaintStatus::Rejected => None,
        }
    }

    /// No transition leaves a terminal status
    pub fn is_terminal(&self) -> bool {
        matches!(self, ComplaintStatus::Resolved | ComplaintStatus::Rejected)
    }

    /// Whether `next` is a legal move from `self`.
    ///
    /// Forward moves may skip stages; staying put is not a transition.
    pub fn can_transition_to(&self, next: ComplaintStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.stage(), next.stage()) {
            (_, None) => true,
            (Some(from), Some(to)) => to > from,
            (None, Some(_)) => false,
        }
    }

    /// Statuses reachable from `self` in one step
    pub fn next_statuses(&self) -> Vec<ComplaintStatus> {
        ComplaintStatus::ALL
            .into_iter()
            .filter(|next| self.can_transition_to(*next))
            .collect()
    }
}

impl std::fmt::Display for ComplaintStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ComplaintStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        ComplaintStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| ModelError::unknown("status", s))
    }
}

// ============================================================================
// Priority
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
        }
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

// ============================================================================
// Complaint
// ============================================================================

/// Complaint record as returned by `GET /complaints`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub complaint_id: String,
    pub category: Category,
    #[serde(default)]
    pub sub_category: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default)]
    pub manual_location: String,
    #[serde(default)]
    pub district: String,
    /// Numeric string; the API is inconsistent about quoting
    #[serde(default, deserialize_with = "string_or_number")]
    pub latitude: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub longitude: Option<String>,
    pub status: ComplaintStatus,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_department: Option<Department>,
    /// Unreadable audit timestamps decode as `None`
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(
        default,
        deserialize_with = "lenient_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
}

impl Complaint {
    /// Parsed `(latitude, longitude)`, or `None` if the complaint cannot be mapped
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        let lat: f64 = self.latitude.as_deref()?.trim().parse().ok()?;
        let lng: f64 = self.longitude.as_deref()?.trim().parse().ok()?;
        let in_range = (-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng);
        in_range.then_some((lat, lng))
    }

    pub fn is_mappable(&self) -> bool {
        self.coordinates().is_some()
    }

    /// Reporter id with everything after the first four characters hidden
    pub fn masked_user_id(&self) -> Option<String> {
        let id = self.user_id.as_deref()?;
        let len = id.chars().count();
        if len <= 4 {
            return Some("*".repeat(len));
        }
        let visible: String = id.chars().take(4).collect();
        Some(format!("{}{}", visible, "*".repeat(len - 4)))
    }

    /// `status = Assigned ⇒ assigned_department.is_some()`
    pub fn assignment_consistent(&self) -> bool {
        self.status != ComplaintStatus::Assigned || self.assigned_department.is_some()
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(f64),
    }

    Ok(match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) if s.trim().is_empty() => None,
        Some(Raw::Text(s)) => Some(s),
        Some(Raw::Number(n)) => Some(n.to_string()),
        None => None,
    })
}

/// RFC 3339, or a zone-less ISO timestamp taken as UTC
fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(t) = DateTime::parse_from_rfc3339(raw) {
        return Some(t.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Other(#[allow(dead_code)] serde::de::IgnoredAny),
    }

    let raw = match Option::<Raw>::deserialize(deserializer)? {
        Some(Raw::Text(s)) if !s.trim().is_empty() => s,
        Some(Raw::Other(_)) => {
            tracing::warn!("Ignoring non-text complaint timestamp");
            return Ok(None);
        }
        _ => return Ok(None),
    };
    let parsed = parse_timestamp(&raw);
    if parsed.is_none() {
        tracing::warn!(value = %raw, "Ignoring unreadable complaint timestamp");
    }
    Ok(parsed)
}
