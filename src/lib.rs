//! Library exports for the portfolio backend
//!
//! This module exposes internal components for testing and potential library usage.

pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod form;
pub mod handler;
pub mod merge;
pub mod middleware;
pub mod model;
pub mod route;
pub mod uploader;
