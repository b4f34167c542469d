//! Common functionality for macrorep.
#![warn(missing_docs)]
pub mod aggregate;
pub mod array;
pub mod id;
pub mod log;
pub mod realisation;
pub mod report;
pub mod settings;
pub mod store;
pub mod units;

#[cfg(test)]
mod fixture;
