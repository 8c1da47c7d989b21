//! Scripted driver for the document signing flow
//!
//! Reads JSON-lines commands (login, uploads, pointer events, sign, export)
//! and answers each with one JSON response line, so the whole flow can be
//! exercised from a terminal or a test harness without a browser.

pub mod driver;
pub mod error;
pub mod protocol;

pub use driver::{run, run_stdio, Driver};
pub use error::DriverError;
pub use protocol::{Command, PageGeometry, Response};
