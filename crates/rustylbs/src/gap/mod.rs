//! Generic Access Profile: addresses, advertising payloads and the
//! bond-aware advertising controller.

pub mod accept_list;
pub mod adv_data;
pub mod advertising;
pub mod constants;
pub mod types;

#[cfg(test)]
mod tests;

pub use accept_list::{AcceptList, AcceptListBuilder};
pub use adv_data::{AdFlags, AdStructure, AdvertisingPayload};
pub use advertising::{AdvState, AdvertisingConfig, AdvertisingController, ScanResponse};
pub use types::*;
