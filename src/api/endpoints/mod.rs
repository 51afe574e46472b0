//! API endpoint handlers, one module per resource.

pub mod dashboard;
pub mod health;
pub mod patients;
pub mod qof;
pub mod recalls;
