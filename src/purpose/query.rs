//! Searching and paging the purpose list.

use time::Date;

use crate::{
    pagination::{Page, paginate},
    purpose::Purpose,
};

/// Narrows the purpose list. Empty fields are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PurposeQuery {
    /// Case-insensitive substring of the purpose name.
    pub search: Option<String>,
    /// Inclusive lower bound on the creation date (UTC).
    pub created_from: Option<Date>,
    /// Inclusive upper bound on the creation date (UTC).
    pub created_to: Option<Date>,
}

impl PurposeQuery {
    pub fn matches(&self, purpose: &Purpose) -> bool {
        let created_on = purpose.created_at.date();

        let search_matches = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(search) => purpose
                .name
                .as_ref()
                .to_lowercase()
                .contains(&search.to_lowercase()),
        };

        search_matches
            && self.created_from.is_none_or(|from| created_on >= from)
            && self.created_to.is_none_or(|to| created_on <= to)
    }
}

/// Filter `purposes`, sort them newest first and return the requested page.
pub fn query_purposes(
    purposes: &[Purpose],
    query: &PurposeQuery,
    page: u64,
    per_page: u64,
) -> Page<Purpose> {
    let mut matching: Vec<Purpose> = purposes
        .iter()
        .filter(|purpose| query.matches(purpose))
        .cloned()
        .collect();
    matching.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));

    paginate(&matching, page, per_page)
}

#[cfg(test)]
mod tests {
    use time::{
        OffsetDateTime,
        macros::{date, datetime},
    };

    use crate::purpose::{Purpose, PurposeName};

    use super::{PurposeQuery, query_purposes};

    fn purpose(id: i64, name: &str, created_at: OffsetDateTime) -> Purpose {
        Purpose {
            id,
            name: PurposeName::new_unchecked(name),
            created_at,
        }
    }

    fn purposes() -> Vec<Purpose> {
        vec![
            purpose(1, "Rent", datetime!(2024-01-05 10:00 UTC)),
            purpose(2, "Groceries", datetime!(2024-02-10 10:00 UTC)),
            purpose(3, "Car rental", datetime!(2024-03-15 10:00 UTC)),
        ]
    }

    #[test]
    fn empty_query_returns_newest_first() {
        let page = query_purposes(&purposes(), &PurposeQuery::default(), 1, 10);

        let ids: Vec<i64> = page.items.iter().map(|purpose| purpose.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(page.total, 3);
    }

    #[test]
    fn search_is_case_insensitive() {
        let query = PurposeQuery {
            search: Some("RENT".to_owned()),
            ..Default::default()
        };

        let page = query_purposes(&purposes(), &query, 1, 10);

        let ids: Vec<i64> = page.items.iter().map(|purpose| purpose.id).collect();
        assert_eq!(ids, vec![3, 1]);
    }

    #[test]
    fn created_bounds_are_inclusive() {
        let query = PurposeQuery {
            created_from: Some(date!(2024 - 02 - 10)),
            created_to: Some(date!(2024 - 03 - 15)),
            ..Default::default()
        };

        let page = query_purposes(&purposes(), &query, 1, 10);

        let ids: Vec<i64> = page.items.iter().map(|purpose| purpose.id).collect();
        assert_eq!(ids, vec![3, 2]);
    }

    #[test]
    fn pages_after_filtering() {
        let page = query_purposes(&purposes(), &PurposeQuery::default(), 2, 2);

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].id, 1);
        assert_eq!(page.last_page, 2);
    }
}
