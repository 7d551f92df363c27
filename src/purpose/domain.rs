//! Core purpose domain types.

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::PurposeId};

/// The category label shown for transactions without a resolvable purpose.
pub const UNRESOLVED_PURPOSE_LABEL: &str = "Other";

/// A validated, non-empty purpose name.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct PurposeName(String);

impl PurposeName {
    /// Create a purpose name.
    ///
    /// # Errors
    ///
    /// This function will return an [Error::EmptyPurposeName] if `name` is an empty string.
    pub fn new(name: &str) -> Result<Self, Error> {
        let name = name.trim();

        if name.is_empty() {
            Err(Error::EmptyPurposeName)
        } else {
            Ok(Self(name.to_string()))
        }
    }

    /// Create a purpose name without validation.
    ///
    /// The caller should ensure that the string is not empty, e.g. because it
    /// was read back from a column with a non-empty constraint.
    pub fn new_unchecked(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl AsRef<str> for PurposeName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl FromStr for PurposeName {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PurposeName::new(s)
    }
}

impl Display for PurposeName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A user-defined label describing what a transaction was for (e.g. 'Food', 'Rent').
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purpose {
    pub id: PurposeId,
    pub name: PurposeName,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}
