//! Defines the endpoint for listing expenses.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, RawQuery, State},
    http::HeaderName,
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AllowedCategories, AppState, Error,
    db::lock_connection,
    expense::query::{ExpenseQuery, ExpenseQueryParams, query_expenses},
    pagination::{PageInfo, PaginationConfig},
};

/// The header holding the number of expenses that matched the filters.
pub const TOTAL_COUNT_HEADER: HeaderName = HeaderName::from_static("x-total-count");
/// The header holding the number of pages of matching expenses.
pub const TOTAL_PAGES_HEADER: HeaderName = HeaderName::from_static("x-total-pages");
/// The header holding the page number that was returned.
pub const CURRENT_PAGE_HEADER: HeaderName = HeaderName::from_static("x-current-page");

/// The state needed to list expenses.
#[derive(Debug, Clone)]
pub struct ListExpensesState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The categories the category filter may match.
    pub categories: AllowedCategories,
    /// The default and maximum page sizes.
    pub pagination_config: PaginationConfig,
}

impl FromRef<AppState> for ListExpensesState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            categories: state.categories.clone(),
            pagination_config: state.pagination_config.clone(),
        }
    }
}

/// A route handler that returns one page of filtered and sorted expenses as a
/// JSON array.
///
/// The paging metadata is sent in the `X-Total-Count`, `X-Total-Pages` and
/// `X-Current-Page` headers. Invalid query parameters are ignored rather than
/// rejected.
pub async fn get_expenses_endpoint(
    State(state): State<ListExpensesState>,
    RawQuery(query): RawQuery,
) -> Result<Response, Error> {
    let params = ExpenseQueryParams::from_query_string(query.as_deref());
    let query = ExpenseQuery::new(&params, &state.categories, &state.pagination_config);
    tracing::debug!("Listing expenses with {query:?}");

    let page = {
        let connection = lock_connection(&state.db_connection)?;
        query_expenses(&query, &connection)?
    };

    Ok((pagination_headers(page.page_info), Json(page.expenses)).into_response())
}

fn pagination_headers(page_info: PageInfo) -> [(HeaderName, String); 3] {
    [
        (TOTAL_COUNT_HEADER, page_info.total_count.to_string()),
        (TOTAL_PAGES_HEADER, page_info.total_pages.to_string()),
        (CURRENT_PAGE_HEADER, page_info.current_page.to_string()),
    ]
}
