//! Defines the endpoint for creating a new expense.

use std::sync::{Arc, Mutex};

use axum::{
    Json,
    extract::{FromRef, State, rejection::JsonRejection},
    http::{StatusCode, header::LOCATION},
    response::{IntoResponse, Response},
};
use rusqlite::Connection;

use crate::{
    AllowedCategories, AppState, Error,
    db::lock_connection,
    endpoints::{self, format_endpoint},
    expense::core::{ExpenseData, create_expense},
};

/// The state needed to create an expense.
#[derive(Debug, Clone)]
pub struct CreateExpenseState {
    /// The database connection for managing expenses.
    pub db_connection: Arc<Mutex<Connection>>,
    /// The categories a new expense may be assigned to.
    pub categories: AllowedCategories,
}

impl FromRef<AppState> for CreateExpenseState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
            categories: state.categories.clone(),
        }
    }
}

/// A route handler for creating a new expense.
///
/// Responds with `201 Created`, the new expense as JSON and its URL in the
/// `Location` header. Any `id` in the request body is ignored.
pub async fn create_expense_endpoint(
    State(state): State<CreateExpenseState>,
    body: Result<Json<ExpenseData>, JsonRejection>,
) -> Result<Response, Error> {
    let Json(data) = body.map_err(|rejection| Error::InvalidRequestBody(rejection.body_text()))?;
    let new_expense = data.validate(&state.categories)?;

    let expense = {
        let mut connection = lock_connection(&state.db_connection)?;
        create_expense(new_expense, &mut connection)?
    };

    tracing::info!("Created expense {}", expense.id);
    let location = format_endpoint(endpoints::EXPENSE, expense.id);

    Ok((StatusCode::CREATED, [(LOCATION, location)], Json(expense)).into_response())
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Json, extract::State, http::StatusCode};
    use rust_decimal_macros::dec;
    use time::macros::date;

    use crate::{
        AllowedCategories, Error,
        expense::core::{Expense, ExpenseData, count_expenses, get_expense},
        test_utils::{get_header, get_test_connection, parse_json_body},
    };

    use super::{CreateExpenseState, create_expense_endpoint};

    fn get_state() -> CreateExpenseState {
        CreateExpenseState {
            db_connection: Arc::new(Mutex::new(get_test_connection())),
            categories: AllowedCategories::default(),
        }
    }

    fn coffee() -> ExpenseData {
        ExpenseData {
            id: Some(99),
            name: Some("Coffee".to_owned()),
            amount: dec!(4.50),
            date: date!(2024 - 01 - 05),
            category: "Food".to_owned(),
        }
    }

    #[tokio::test]
    async fn can_create_expense() {
        let state = get_state();

        let response = create_expense_endpoint(State(state.clone()), Ok(Json(coffee())))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert_eq!(get_header(&response, "location"), "/api/expenses/1");

        let created: Expense = parse_json_body(response).await;
        // The store assigns the ID, not the client.
        assert_eq!(created.id, 1);
        assert_eq!(created.name, "Coffee");

        let connection = state.db_connection.lock().unwrap();
        assert_eq!(get_expense(1, &connection), Ok(created));
    }

    #[tokio::test]
    async fn rejects_negative_amount() {
        let state = get_state();
        let data = ExpenseData {
            amount: dec!(-1),
            ..coffee()
        };

        let result = create_expense_endpoint(State(state.clone()), Ok(Json(data))).await;

        assert_eq!(result.err(), Some(Error::InvalidExpense));
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_expenses(&connection), Ok(0));
    }

    #[tokio::test]
    async fn rejects_blank_name() {
        let data = ExpenseData {
            name: Some("   ".to_owned()),
            ..coffee()
        };

        let result = create_expense_endpoint(State(get_state()), Ok(Json(data))).await;

        assert_eq!(result.err(), Some(Error::InvalidExpense));
    }

    #[tokio::test]
    async fn rejects_unknown_category() {
        let data = ExpenseData {
            category: "Gadgets".to_owned(),
            ..coffee()
        };

        let result = create_expense_endpoint(State(get_state()), Ok(Json(data))).await;

        match result {
            Err(Error::InvalidCategory(allowed)) => {
                assert!(allowed.starts_with("Food, Bills, Transportation"));
                assert!(allowed.ends_with("Investments, Other"));
            }
            Err(other) => panic!("want invalid category error, got {other:?}"),
            Ok(response) => panic!("want invalid category error, got {}", response.status()),
        }
    }
}
