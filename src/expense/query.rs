//! Filtering, sorting and paging of expense listings.
//!
//! Query parameters are never rejected. Values that cannot be parsed or fall
//! outside their allowed range are replaced with defaults, so every request
//! produces a page of results.

use rusqlite::{Connection, ToSql};
use rust_decimal::Decimal;
use time::Date;

use crate::{
    AllowedCategories, Error,
    expense::core::{Expense, amount_sort_key, map_expense_row, parse_date},
    pagination::{PageInfo, Pagination, PaginationConfig},
};

/// The raw, unvalidated query parameters of an expense listing request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseQueryParams {
    /// The field to sort by: `name`, `amount` or `date`.
    pub sort_by: Option<String>,
    /// The sort direction: `asc` or `desc`.
    pub order: Option<String>,
    /// The smallest amount to include.
    pub min_price: Option<String>,
    /// The largest amount to include.
    pub max_price: Option<String>,
    /// The earliest date to include.
    pub start_date: Option<String>,
    /// The latest date to include.
    pub end_date: Option<String>,
    /// The category to include.
    pub category: Option<String>,
    /// The 1-based page number.
    pub page: Option<String>,
    /// The number of expenses per page.
    pub page_size: Option<String>,
}

impl ExpenseQueryParams {
    /// Read the parameters from a URL query string, e.g. `sortBy=amount&page=2`.
    ///
    /// Parameter names are matched case-insensitively. Unknown parameters are
    /// ignored, and if a parameter is repeated the first value is used.
    pub fn from_query_string(query: Option<&str>) -> Self {
        let pairs: Vec<(String, String)> = query
            .and_then(|query| serde_urlencoded::from_str(query).ok())
            .unwrap_or_default();

        let mut params = Self::default();

        for (key, value) in pairs {
            let slot = match key.to_ascii_lowercase().as_str() {
                "sortby" => &mut params.sort_by,
                "order" => &mut params.order,
                "minprice" => &mut params.min_price,
                "maxprice" => &mut params.max_price,
                "startdate" => &mut params.start_date,
                "enddate" => &mut params.end_date,
                "category" => &mut params.category,
                "page" => &mut params.page,
                "pagesize" => &mut params.page_size,
                _ => continue,
            };

            if slot.is_none() {
                *slot = Some(value);
            }
        }

        params
    }
}

/// The field that expenses are sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    /// Sort alphabetically by name.
    Name,
    /// Sort by amount.
    Amount,
    /// Sort by date.
    Date,
}

impl SortKey {
    fn parse(text: &str) -> Option<Self> {
        if text.eq_ignore_ascii_case("name") {
            Some(Self::Name)
        } else if text.eq_ignore_ascii_case("amount") {
            Some(Self::Amount)
        } else if text.eq_ignore_ascii_case("date") {
            Some(Self::Date)
        } else {
            None
        }
    }

    fn column(&self) -> &'static str {
        match self {
            SortKey::Name => "name",
            SortKey::Amount => "amount",
            SortKey::Date => "date",
        }
    }
}

/// The order to sort expenses in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    Descending,
}

impl SortOrder {
    /// Anything other than `desc` sorts in ascending order.
    fn parse(text: Option<&str>) -> Self {
        match text {
            Some(text) if text.eq_ignore_ascii_case("desc") => Self::Descending,
            _ => Self::Ascending,
        }
    }

    fn keyword(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// The filters for an expense listing. Every filter that is set must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExpenseFilter {
    /// Inclusive lower bound on the amount.
    pub min_amount: Option<Decimal>,
    /// Inclusive upper bound on the amount.
    pub max_amount: Option<Decimal>,
    /// Inclusive lower bound on the date.
    pub start_date: Option<Date>,
    /// Inclusive upper bound on the date.
    pub end_date: Option<Date>,
    /// The exact category to match.
    pub category: Option<String>,
}

/// A normalized expense listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpenseQuery {
    /// Which expenses to include.
    pub filter: ExpenseFilter,
    /// The field to sort by.
    pub sort_key: SortKey,
    /// The direction to sort in.
    pub sort_order: SortOrder,
    /// Which page of the results to return.
    pub pagination: Pagination,
}

impl ExpenseQuery {
    /// Normalize the raw request parameters.
    ///
    /// - Unparseable numbers and dates are ignored.
    /// - The category filter is only applied if it is one of `categories`.
    /// - Without a valid `sort_by`, expenses are sorted by date, newest first.
    /// - Page numbers and sizes are coerced as described in [Pagination::new].
    pub fn new(
        params: &ExpenseQueryParams,
        categories: &AllowedCategories,
        pagination_config: &PaginationConfig,
    ) -> Self {
        let filter = ExpenseFilter {
            min_amount: params.min_price.as_deref().and_then(parse_decimal),
            max_amount: params.max_price.as_deref().and_then(parse_decimal),
            start_date: params.start_date.as_deref().and_then(parse_date),
            end_date: params.end_date.as_deref().and_then(parse_date),
            category: params
                .category
                .as_deref()
                .filter(|category| !category.trim().is_empty() && categories.contains(category))
                .map(str::to_owned),
        };

        let (sort_key, sort_order) = match params.sort_by.as_deref().and_then(SortKey::parse) {
            Some(sort_key) => (sort_key, SortOrder::parse(params.order.as_deref())),
            None => (SortKey::Date, SortOrder::Descending),
        };

        let pagination = Pagination::new(
            params.page.as_deref().and_then(parse_integer),
            params.page_size.as_deref().and_then(parse_integer),
            pagination_config,
        );

        Self {
            filter,
            sort_key,
            sort_order,
            pagination,
        }
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    text.trim().parse().ok()
}

fn parse_integer(text: &str) -> Option<i64> {
    text.trim().parse().ok()
}

/// One page of an expense listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpensePage {
    /// The expenses on this page, in sorted order.
    pub expenses: Vec<Expense>,
    /// Where this page sits in the full set of matching expenses.
    pub page_info: PageInfo,
}

/// Get the page of expenses described by `query`.
///
/// Expenses with equal sort keys are ordered by ID in the same direction as
/// the sort, so reversing the sort order reverses the page order exactly.
///
/// # Errors
/// Returns [Error::SqlError] if the query could not be run.
pub fn query_expenses(query: &ExpenseQuery, connection: &Connection) -> Result<ExpensePage, Error> {
    let filter = &query.filter;
    // Stored amounts are sort keys, so bounds are compared as keys too.
    let min_key = filter.min_amount.map(amount_sort_key);
    let max_key = filter.max_amount.map(amount_sort_key);
    let limit = i64::try_from(query.pagination.page_size).unwrap_or(i64::MAX);
    let offset = i64::try_from(query.pagination.offset()).unwrap_or(i64::MAX);

    let mut conditions: Vec<&str> = Vec::new();
    let mut params: Vec<(&str, &dyn ToSql)> = Vec::new();

    if let Some(min_key) = &min_key {
        conditions.push("amount >= :min_amount");
        params.push((":min_amount", min_key));
    }

    if let Some(max_key) = &max_key {
        conditions.push("amount <= :max_amount");
        params.push((":max_amount", max_key));
    }

    if let Some(start_date) = &filter.start_date {
        conditions.push("date >= :start_date");
        params.push((":start_date", start_date));
    }

    if let Some(end_date) = &filter.end_date {
        conditions.push("date <= :end_date");
        params.push((":end_date", end_date));
    }

    if let Some(category) = &filter.category {
        conditions.push("category = :category");
        params.push((":category", category));
    }

    let where_clause = if conditions.is_empty() {
        String::new()
    } else {
        format!("WHERE {}", conditions.join(" AND "))
    };

    let total_count: i64 = connection
        .prepare(&format!("SELECT COUNT(id) FROM expense {where_clause}"))?
        .query_row(params.as_slice(), |row| row.get(0))?;
    let total_count = u64::try_from(total_count).unwrap_or_default();

    let direction = query.sort_order.keyword();
    let select_query = format!(
        "SELECT id, name, amount, date, category FROM expense {where_clause} \
        ORDER BY {} {direction}, id {direction} \
        LIMIT :limit OFFSET :offset",
        query.sort_key.column(),
    );

    params.push((":limit", &limit));
    params.push((":offset", &offset));

    let expenses = connection
        .prepare(&select_query)?
        .query_map(params.as_slice(), map_expense_row)?
        .map(|expense| expense.map_err(Error::from))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ExpensePage {
        expenses,
        page_info: PageInfo::new(total_count, query.pagination),
    })
}
