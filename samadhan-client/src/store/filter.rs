//! Client-side complaint filtering

use shared::{Category, Complaint, ComplaintStatus, ModelError};

/// Dropdown sentinel that disables the category filter
pub const ALL_CATEGORIES: &str = "All Categories";
/// Dropdown sentinel that disables the status filter
pub const ALL_STATUS: &str = "All Status";

/// Either "no constraint" or an exact value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Selection<T> {
    #[default]
    All,
    Only(T),
}

impl<T: PartialEq> Selection<T> {
    pub fn accepts(&self, value: &T) -> bool {
        match self {
            Selection::All => true,
            Selection::Only(expected) => expected == value,
        }
    }
}

/// Filter bar state: search text, category and status
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ComplaintFilter {
    pub search: String,
    pub category: Selection<Category>,
    pub status: Selection<ComplaintStatus>,
}

impl ComplaintFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = search.into();
        self
    }

    pub fn with_category(mut self, category: Category) -> Self {
        self.category = Selection::Only(category);
        self
    }

    pub fn with_status(mut self, status: ComplaintStatus) -> Self {
        self.status = Selection::Only(status);
        self
    }

    /// Set the category from a dropdown label (`"All Categories"` clears it)
    pub fn set_category_label(&mut self, label: &str) -> Result<(), ModelError> {
        self.category = if label.trim() == ALL_CATEGORIES {
            Selection::All
        } else {
            Selection::Only(label.parse()?)
        };
        Ok(())
    }

    /// Set the status from a dropdown label (`"All Status"` clears it)
    pub fn set_status_label(&mut self, label: &str) -> Result<(), ModelError> {
        self.status = if label.trim() == ALL_STATUS {
            Selection::All
        } else {
            Selection::Only(label.parse()?)
        };
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.category == Selection::All
            && self.status == Selection::All
    }

    /// All active constraints hold for `complaint`
    pub fn matches(&self, complaint: &Complaint) -> bool {
        self.matches_search(complaint)
            && self.category.accepts(&complaint.category)
            && self.status.accepts(&complaint.status)
    }

    /// Raw text, lowercased; surrounding spaces are part of the needle
    fn matches_search(&self, complaint: &Complaint) -> bool {
        if self.search.is_empty() {
            return true;
        }
        let needle = self.search.to_lowercase();
        complaint.description.to_lowercase().contains(&needle)
            || complaint.manual_location.to_lowercase().contains(&needle)
    }

    /// Matching complaints, in store order
    pub fn apply(&self, complaints: &[Complaint]) -> Vec<Complaint> {
        complaints
            .iter()
            .filter(|c| self.matches(c))
            .cloned()
            .collect()
    }
}
