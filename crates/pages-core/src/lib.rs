#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::return_self_not_must_use)]

//! Serve and build a directory of static HTML files as independent pages.

pub mod bundler;
pub mod config;
pub mod dev;
pub mod error;
pub mod pages;

pub use config::{FilePolicy, PagesConfig};
pub use error::Error;
pub use pages::{pages, PagesBuildPlugin, PagesDevPlugin, PagesDir};
