//! Defines the endpoint for fetching a single expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, Path, State, rejection::PathRejection},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::ExpenseId,
    db::lock_connection,
    expense::core::{Expense, get_expense},
};

/// The state needed to get an expense.
#[derive(Debug, Clone)]
pub struct GetExpenseState {
    /// The database connection for reading expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for GetExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the expense with the ID in the URL path.
///
/// IDs that are not integers cannot refer to an expense, so they are reported
/// as not found.
pub async fn get_expense_endpoint(
    State(state): State<GetExpenseState>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Result<Json<Expense>, Error> {
    let Path(expense_id) = path.map_err(|_| Error::NotFound)?;

    let connection = lock_connection(&state.db_connection)?;
    let expense = get_expense(expense_id, &connection)?;

    Ok(Json(expense))
}
