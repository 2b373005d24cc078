//! Request handlers

pub mod accounts;
pub mod health;
pub mod loans;
pub mod payments;
