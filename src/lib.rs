//! Advertising Image Generator
//!
//! This library provides the core functionality for the ad-generator-hw
//! service, which turns structured ad briefs into generated, optionally
//! branded images through an asynchronous job queue with polling.

pub mod app_state;
pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;
