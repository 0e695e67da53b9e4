//! Defines the endpoint for deleting an expense.

use std::sync::{Arc, Mutex};

use axum::{
    extract::{FromRef, Path, State, rejection::PathRejection},
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    database_id::ExpenseId,
    db::lock_connection,
    expense::core::delete_expense,
};

/// The state needed to delete an expense.
#[derive(Debug, Clone)]
pub struct DeleteExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for DeleteExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler for deleting an expense, responds with `204 No Content` on success.
pub async fn delete_expense_endpoint(
    State(state): State<DeleteExpenseState>,
    path: Result<Path<ExpenseId>, PathRejection>,
) -> Result<StatusCode, Error> {
    let Path(expense_id) = path.map_err(|_| Error::NotFound)?;

    let mut connection = lock_connection(&state.db_connection)?;
    delete_expense(expense_id, &mut connection)?;
    tracing::info!("Deleted expense {expense_id}");

    Ok(StatusCode::NO_CONTENT)
}
