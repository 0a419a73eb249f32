//! This module provides common objects used throughout the entire application

pub mod action;
pub mod error;
pub mod file_handle;
pub mod state;
pub mod tracker;
pub mod upload_event;
pub mod upload_record;
