//! Structured resume sections owned by each user, and the aggregate the PDF
//! path renders from.

pub mod assembly;
pub mod handlers;
pub mod models;
pub mod sections;
pub mod validation;
