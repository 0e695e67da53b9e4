//! Expense tracker is a web app for keeping track of personal expenses.
//!
//! This library provides a JSON REST API for creating, listing, filtering,
//! sorting, paginating, updating and deleting expenses.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_server::Handle;
use serde::Serialize;
use tokio::signal;

mod app_state;
mod category;
mod database_id;
mod db;
mod endpoints;
mod expense;
mod logging;
mod not_found;
mod pagination;
mod routing;
#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use category::AllowedCategories;
pub use database_id::ExpenseId;
pub use db::initialize as initialize_db;
pub use expense::{Amount, Expense, ExpenseData, NewExpense, create_expense};
pub use logging::{LOG_BODY_LENGTH_LIMIT, MAX_BODY_SIZE, logging_middleware};
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut terminate_signal) => {
                terminate_signal.recv().await;
            }
            Err(error) => {
                tracing::error!("failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The expense had a non-positive amount or a blank name.
    #[error("Invalid expense data")]
    InvalidExpense,

    /// The expense category is not one of the allowed categories.
    ///
    /// The string is the comma separated list of allowed categories.
    #[error("Invalid category. Allowed categories: {0}")]
    InvalidCategory(String),

    /// The expense ID in the URL path did not match the ID in the request body.
    #[error("The expense ID in the path ({path_id}) does not match the ID in the request body")]
    IdMismatch {
        /// The ID taken from the URL path.
        path_id: ExpenseId,
        /// The ID taken from the request body, if there was one.
        body_id: Option<ExpenseId>,
    },

    /// The request body could not be parsed as an expense.
    #[error("Invalid request body: {0}")]
    InvalidRequestBody(String),

    /// The set of allowed categories was empty.
    #[error("at least one expense category must be allowed")]
    NoCategories,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the ID is
    /// correct and that the expense has not been deleted.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("Expense not found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// The JSON body sent to clients when a request fails.
#[derive(Debug, Serialize)]
pub(crate) struct ErrorMessage {
    pub message: String,
}

impl ErrorMessage {
    pub(crate) fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match self {
            Error::InvalidExpense
            | Error::InvalidCategory(_)
            | Error::IdMismatch { .. }
            | Error::InvalidRequestBody(_) => StatusCode::BAD_REQUEST,
            Error::NotFound => StatusCode::NOT_FOUND,
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorMessage::new("An unexpected error occurred")),
                )
                    .into_response();
            }
        };

        (status, Json(ErrorMessage::new(self.to_string()))).into_response()
    }
}
