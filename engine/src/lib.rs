//! An embeddable relational query engine: a MySQL-dialect SQL compiler and
//! execution surface over pluggable [`table::Table`] back-ends.

pub mod binder;
pub mod catalog;
pub mod compiler;
pub mod driver;
pub mod schema;
pub mod table;
