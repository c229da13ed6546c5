//! Customer reviews shown on the home page.

use serde::{Deserialize, Serialize};

use capstone_core::ReviewId;

/// A customer review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    /// Reviewer's display name.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    /// Star rating, 1-5.
    pub rating: u8,
    /// Human-readable date as published (e.g. "March 15, 2023").
    pub date: String,
    pub content: String,
}

impl Review {
    /// Rating as filled and empty stars.
    #[must_use]
    pub fn stars(&self) -> String {
        let filled = usize::from(self.rating.min(5));
        format!("{}{}", "★".repeat(filled), "☆".repeat(5 - filled))
    }
}
