//! Request handlers

pub mod documents;
pub mod health;
pub mod payments;
