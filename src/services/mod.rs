//! This module provides functionality for picking, validating and uploading files
//! and for tracking the transfers in flight

pub mod picker;
pub mod task_registry;
pub mod upload_client;
pub mod upload_session;
pub mod validator;
