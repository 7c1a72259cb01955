//! Data models for formsync.
//!
//! - [`Form`] - a stored submission
//! - [`NewForm`] - a submission before the store assigns identity
//! - [`FormUpdate`] - a partial update (only supplied fields change)

pub mod form;

pub use form::{Form, FormUpdate, NewForm};
