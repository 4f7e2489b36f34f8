//! Configuration loading and schema definitions

mod loader;
mod schema;

pub use loader::{Config, APKTOOL_ENV};
pub use schema::*;
