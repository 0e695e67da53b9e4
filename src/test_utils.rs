#![allow(missing_docs)]

use axum::{
    body::Body,
    http::HeaderMap,
    response::Response,
};
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use time::Date;

use crate::{
    AllowedCategories, AppState, Expense, NewExpense, PaginationConfig, create_expense,
    db::initialize,
};

/// An in-memory database with the expense table created.
pub(crate) fn get_test_connection() -> Connection {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    initialize(&connection).expect("Could not initialize database.");
    connection
}

pub(crate) fn get_test_state() -> AppState {
    let connection = Connection::open_in_memory().expect("Could not open database in memory.");
    AppState::new(
        connection,
        AllowedCategories::default(),
        PaginationConfig::default(),
    )
    .expect("Could not create app state.")
}

#[track_caller]
pub(crate) fn insert_expense(
    connection: &mut Connection,
    name: &str,
    amount: Decimal,
    date: Date,
    category: &str,
) -> Expense {
    let new_expense = NewExpense::new(name, amount, date, category, &AllowedCategories::default())
        .expect("Could not create valid expense.");
    create_expense(new_expense, connection).expect("Could not insert expense.")
}

pub(crate) async fn parse_json_body<T: DeserializeOwned>(response: Response<Body>) -> T {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Could not read response body.");

    serde_json::from_slice(&body).expect("Could not parse response body as JSON.")
}

#[track_caller]
pub(crate) fn header_value(headers: &HeaderMap, header_name: &str) -> String {
    headers
        .get(header_name)
        .unwrap_or_else(|| panic!("Headers missing {header_name}"))
        .to_str()
        .expect("Could not convert to str")
        .to_string()
}

#[track_caller]
pub(crate) fn get_header(response: &Response<Body>, header_name: &str) -> String {
    header_value(response.headers(), header_name)
}
