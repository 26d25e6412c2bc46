//! Generate app icon variants and store artwork from fixed pixel pipelines.
//!
//! The [`compositor`] module holds the raster operations; [`variants`] strings
//! them together into the asset jobs that the `asset-gen` binary exposes.

pub mod compositor;
pub mod config;
pub mod draw;
pub mod error;
pub mod font;
pub mod gradient;
pub mod variants;

pub use error::{Error, Result};
