//! Defines the endpoint for replacing an existing expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{
        FromRef, Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::StatusCode,
};
use rusqlite::Connection;

use crate::{
    AllowedCategories, AppState, Error,
    database_id::ExpenseId,
    db::lock_connection,
    expense::core::{ExpenseData, update_expense},
};

/// The state needed to edit an expense.
#[derive(Debug, Clone)]
pub struct EditExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The categories an expense may be assigned to.
    pub categories: AllowedCategories,
}

impl FromRef<AppState> for EditExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            categories: state.categories.clone(),
        }
    }
}

/// A route handler that replaces every field of an expense.
///
/// The ID in the request body must match the ID in the URL path. Responds with
/// `204 No Content` on success.
pub async fn update_expense_endpoint(
    State(state): State<EditExpenseState>,
    path: Result<Path<ExpenseId>, PathRejection>,
    body: Result<Json<ExpenseData>, JsonRejection>,
) -> Result<StatusCode, Error> {
    let Path(expense_id) = path.map_err(|_| Error::NotFound)?;
    let Json(data) = body.map_err(|rejection| Error::InvalidRequestBody(rejection.body_text()))?;

    if data.id != Some(expense_id) {
        return Err(Error::IdMismatch {
            path_id: expense_id,
            body_id: data.id,
        });
    }

    let new_expense = data.validate(&state.categories)?;

    let mut connection = lock_connection(&state.db_connection)?;
    update_expense(expense_id, new_expense, &mut connection)?;
    tracing::info!("Updated expense {expense_id}");

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{
        Json,
        extract::{Path, State},
        http::StatusCode,
    };
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        AllowedCategories, Error,
        expense::core::{ExpenseData, get_expense},
        test_utils::{get_test_connection, insert_expense},
    };

    use super::{EditExpenseState, update_expense_endpoint};

    fn get_state_with_rent() -> EditExpenseState {
        let mut conn = get_test_connection();
        insert_expense(&mut conn, "Rent", dec!(1200), date!(2024 - 01 - 01), "Housing");

        EditExpenseState {
            db_connection: Arc::new(Mutex::new(conn)),
            categories: AllowedCategories::default(),
        }
    }

    fn rent_increase(id: Option<i64>) -> ExpenseData {
        ExpenseData {
            id,
            name: Some("Rent".to_owned()),
            amount: dec!(1250),
            date: date!(2024 - 02 - 01),
            category: "Housing".to_owned(),
        }
    }

    #[tokio::test]
    async fn replaces_expense() {
        let state = get_state_with_rent();

        let result =
            update_expense_endpoint(State(state.clone()), Ok(Path(1)), Ok(Json(rent_increase(Some(1)))))
                .await;

        assert_eq!(result, Ok(StatusCode::NO_CONTENT));
        let connection = state.db_connection.lock().unwrap();
        let got = get_expense(1, &connection).unwrap();
        assert_eq!(got.amount, dec!(1250));
        assert_eq!(got.date, date!(2024 - 02 - 01));
    }

    #[tokio::test]
    async fn rejects_mismatched_ids() {
        let result = update_expense_endpoint(
            State(get_state_with_rent()),
            Ok(Path(1)),
            Ok(Json(rent_increase(Some(2)))),
        )
        .await;

        assert_eq!(
            result,
            Err(Error::IdMismatch {
                path_id: 1,
                body_id: Some(2)
            })
        );
    }

    #[tokio::test]
    async fn rejects_missing_body_id() {
        let result = update_expense_endpoint(
            State(get_state_with_rent()),
            Ok(Path(1)),
            Ok(Json(rent_increase(None))),
        )
        .await;

        assert_eq!(
            result,
            Err(Error::IdMismatch {
                path_id: 1,
                body_id: None
            })
        );
    }

    #[tokio::test]
    async fn missing_expense_is_not_found() {
        let result = update_expense_endpoint(
            State(get_state_with_rent()),
            Ok(Path(3)),
            Ok(Json(rent_increase(Some(3)))),
        )
        .await;

        assert_eq!(result, Err(Error::NotFound));
    }

    #[tokio::test]
    async fn rejects_invalid_replacement() {
        let data = ExpenseData {
            amount: dec!(0),
            ..rent_increase(Some(1))
        };

        let result =
            update_expense_endpoint(State(get_state_with_rent()), Ok(Path(1)), Ok(Json(data))).await;

        assert_eq!(result, Err(Error::InvalidExpense));
    }
}
