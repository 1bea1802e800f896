//! Database access layer shared by the fordon services

pub mod init;
pub mod migrations;

pub use init::{create_schema, init_database};
