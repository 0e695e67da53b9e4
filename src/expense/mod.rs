//! Expense management for the expense tracker.
//!
//! This module contains everything related to expenses:
//! - The `Expense` model and the validation of new expenses
//! - Database functions for storing, querying, and managing expenses
//! - The filtering, sorting and paging rules for expense listings
//! - Route handlers for the expense REST API

mod core;
mod create_endpoint;
mod delete_endpoint;
mod edit_endpoint;
mod get_endpoint;
mod list_endpoint;
mod query;

pub use self::core::{
    Amount, Expense, ExpenseData, NewExpense, create_expense, create_expense_table,
};
pub use create_endpoint::create_expense_endpoint;
pub use delete_endpoint::delete_expense_endpoint;
pub use edit_endpoint::update_expense_endpoint;
pub use get_endpoint::get_expense_endpoint;
pub use list_endpoint::get_expenses_endpoint;
