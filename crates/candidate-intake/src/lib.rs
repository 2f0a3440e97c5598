//! Candidate application wizard and intake service.
//!
//! The [`workflows::wizard`] module carries an applicant through the three
//! steps (details, video, review) and assembles the final submission. The
//! [`workflows::intake`] module is the HTTP endpoint that receives it.

pub mod config;
pub mod error;
pub mod telemetry;
pub mod workflows;
