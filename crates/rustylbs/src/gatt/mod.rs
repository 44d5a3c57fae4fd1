//! GATT LED/Button service

pub mod lbs;
pub mod types;

#[cfg(test)]
mod tests;

pub use lbs::{LbsCallbacks, LbsError, LbsResult, LedButtonService};
pub use types::*;
