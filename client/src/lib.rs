//! Client-side core for the clinic's budget and payment workflow.
//!
//! The server owns all durable state; this crate computes budget totals
//! before submission, reconciles payment summaries locally, and keeps the
//! local view honest by refetching from the server after every mutation.

pub mod api;
pub mod domain;
pub mod error;
pub mod facade;
pub mod format;
pub mod session;

pub use error::{ClientError, NotFoundError, ValidationError};
pub use facade::ClinicClient;
pub use session::Session;
