//! # taskform
//!
//! Command line front end for [`jschema`].
//!
//! `taskform` reads task argument schemas and stored argument files (JSON or
//! TOML), and uses the schema manager to check schemas, print the normalized
//! schema, list form fields and produce argument objects.
//!
//! ## Modules
//!
//! - [`cli`] - argument parsing and command handlers
//! - [`render`] - field tree output
//! - [`session`] - reading and writing schema, data and option files
//!
//! ## Example
//!
//! ```text
//! taskform args task.schema.json --data args.toml --set "threshold=3" --validate
//! ```

/// Argument parsing and command handlers.
pub mod cli;

/// Field tree output.
pub mod render;

/// Schema, data and option files.
pub mod session;

#[macro_use]
extern crate log;

pub use cli::Cli;
