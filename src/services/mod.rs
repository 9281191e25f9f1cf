//! Domain services used by the HTTP routes.
//!
//! Service modules own the request logic so route handlers can stay focused
//! on extracting input and mapping errors to status codes.

pub mod agent;
pub mod files;
