//! The set of categories that expenses may be filed under.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, State},
};

use crate::{AppState, Error};

/// The categories used when none are configured.
pub const DEFAULT_CATEGORIES: [&str; 11] = [
    "Food",
    "Bills",
    "Transportation",
    "Health",
    "Entertainment",
    "Shopping",
    "Education",
    "Housing",
    "Savings",
    "Investments",
    "Other",
];

/// The categories that an expense may be assigned to.
///
/// Category names are matched exactly, i.e. the comparison is case-sensitive.
/// The list keeps the order it was configured in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllowedCategories(Arc<[String]>);

impl AllowedCategories {
    /// Create the set of allowed categories.
    ///
    /// Surrounding whitespace is trimmed, blank entries are skipped and
    /// duplicates are removed while keeping the first occurrence.
    ///
    /// # Errors
    /// Returns [Error::NoCategories] if no non-blank categories were given.
    pub fn new<I, S>(categories: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut unique: Vec<String> = Vec::new();

        for category in categories {
            let category = category.as_ref().trim();

            if !category.is_empty() && !unique.iter().any(|existing| existing == category) {
                unique.push(category.to_owned());
            }
        }

        if unique.is_empty() {
            return Err(Error::NoCategories);
        }

        Ok(Self(unique.into()))
    }

    /// Whether `category` is one of the allowed categories.
    pub fn contains(&self, category: &str) -> bool {
        self.0.iter().any(|allowed| allowed == category)
    }

    /// Check that `category` is allowed.
    ///
    /// # Errors
    /// Returns [Error::InvalidCategory] listing the allowed categories if
    /// `category` is not one of them.
    pub fn validate(&self, category: &str) -> Result<(), Error> {
        if self.contains(category) {
            Ok(())
        } else {
            Err(Error::InvalidCategory(self.0.join(", ")))
        }
    }

    /// The allowed categories in their configured order.
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

impl Default for AllowedCategories {
    fn default() -> Self {
        Self(DEFAULT_CATEGORIES.iter().map(|&name| name.to_owned()).collect())
    }
}

impl FromRef<AppState> for AllowedCategories {
    fn from_ref(state: &AppState) -> Self {
        state.categories.clone()
    }
}

/// A route handler that returns the allowed categories as a JSON array.
pub async fn get_categories_endpoint(
    State(categories): State<AllowedCategories>,
) -> Json<Vec<String>> {
    Json(categories.as_slice().to_vec())
}
