//! This module provides functionality for loading the uploader configuration

pub mod upload_config;
