//! # droptui library
//!
//! Core of the droptui uploader: file validation, the upload tracker state
//! machine, the HTTP transport and configuration loading.
//!
//! The library is primarily used by the droptui binary, but is also used by the
//! integration tests and benchmarks.

#![forbid(unsafe_code)]

pub mod model;
pub mod services;
pub mod settings;
pub mod utils;
