//! Database ID type definitions.

/// Alias for the integer type used for expense IDs.
///
/// IDs are assigned by the database and are never reused, even after the
/// expense they refer to is deleted.
pub type ExpenseId = i64;
