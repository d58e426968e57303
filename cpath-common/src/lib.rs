//! # cpath Common Library
//!
//! Shared code for the career-path services:
//! - Error and result types
//! - Configuration loading and root folder resolution
//! - Database initialization

pub mod config;
pub mod db;
pub mod error;

pub use error::{Error, Result};
