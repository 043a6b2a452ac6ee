#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Shared utilities for pages.
//!
//! This crate provides pure helper functions with no logging/tracing dependencies.
//! Logging is done by the core crate where the decisions are made.

pub mod fs;
pub mod path;
