//! Shared paging and sorting helpers for list operations.

use pagination::{PageLimits, PageRequest, Paginated};
use serde::Deserialize;

use super::wire_enum::wire_enum;
use crate::domain::ports::{Filter, FindOptions, SortOrder};
use crate::domain::repository::{Entity, Repository};
use crate::domain::{Error, FieldError};

/// Limits used by admin list endpoints.
pub const ADMIN_PAGE_LIMITS: PageLimits = PageLimits::new(20, 100);

wire_enum! {
    /// Sort direction accepted in query strings.
    pub enum SortDirection ("sort direction") {
        Asc => "asc",
        Desc => "desc",
    }
}

impl From<SortDirection> for SortOrder {
    fn from(direction: SortDirection) -> Self {
        match direction {
            SortDirection::Asc => Self::Asc,
            SortDirection::Desc => Self::Desc,
        }
    }
}

/// Page and limit as supplied by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PageQuery {
    /// Validate against `limits`.
    pub fn request(self, limits: PageLimits) -> Result<PageRequest, Error> {
        PageRequest::try_new(self.page, self.limit, limits).map_err(|err| {
            let path = match err {
                pagination::PageRequestError::PageOutOfRange => "page",
                pagination::PageRequestError::LimitOutOfRange { .. } => "limit",
            };
            Error::validation(vec![FieldError::new(path, err.to_string())])
        })
    }
}

/// Count matches, then fetch one sorted page.
pub(crate) async fn find_page<T: Entity>(
    repository: &Repository<T>,
    filter: &Filter,
    sort: (&str, SortOrder),
    request: PageRequest,
) -> Result<Paginated<T>, Error> {
    let total = repository.count(filter).await?;
    let options = FindOptions::sorted(sort.0, sort.1)
        .paged(request.offset(), u64::from(request.limit()));
    let items = repository.find(filter, &options).await?;
    Ok(Paginated::new(items, request, total))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(PageQuery { page: Some(0), limit: None }, "page", "page must be at least 1")]
    #[case(PageQuery { page: None, limit: Some(101) }, "limit", "limit must be between 1 and 100")]
    fn invalid_pages_become_field_errors(
        #[case] query: PageQuery,
        #[case] path: &str,
        #[case] message: &str,
    ) {
        let err = query.request(ADMIN_PAGE_LIMITS).expect_err("invalid page");
        assert_eq!(err.field_errors(), &[FieldError::new(path, message)]);
    }

    #[rstest]
    fn defaults_apply() {
        let request = PageQuery::default()
            .request(PageLimits::new(12, 100))
            .expect("defaults valid");
        assert_eq!((request.page(), request.limit()), (1, 12));
    }
}
