//! Connection lifecycle and link parameter negotiation

pub mod connection;
pub mod manager;
pub mod negotiation;
pub mod units;


pub use connection::{Connection, LinkState};
pub use manager::{ConnState, ConnectionManager};
pub use negotiation::{
    LinkSlot, NegotiationConfig, NegotiationReport, NegotiationStep, ParameterNegotiator,
};
