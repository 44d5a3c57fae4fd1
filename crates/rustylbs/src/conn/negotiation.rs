//! Post-connection link parameter negotiation
//!
//! The controller handles one link-layer procedure at a time, so the PHY,
//! data length and MTU requests are issued in sequence. Each request first
//! takes the connection's `LinkSlot`; the completion event for the previous
//! request gives it back.

use super::connection::Connection;
use crate::gap::constants::{DATA_LEN_MAX_OCTETS, DATA_LEN_MAX_TIME};
use crate::gap::PhyMask;
use crate::host::{BleHost, ConnHandle, DataLengthParams, HostError, HostResult, PhyPreference};
use crossbeam_channel::{bounded, Receiver, Sender};
use log::{debug, info, warn};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Single-slot token for the one outstanding link-layer request.
#[derive(Debug)]
pub struct LinkSlot {
    tx: Sender<()>,
    rx: Receiver<()>,
}

impl LinkSlot {
    pub fn new() -> Self {
        let (tx, rx) = bounded(1);
        // Starts available; `bounded(1)` caps it there.
        let _ = tx.try_send(());
        Self { tx, rx }
    }

    /// Takes the slot, waiting at most `timeout`. Returns `false` on timeout.
    pub fn acquire(&self, timeout: Duration) -> bool {
        self.rx.recv_timeout(timeout).is_ok()
    }

    /// Gives the slot back. Releasing an already free slot is a no-op.
    pub fn release(&self) {
        let _ = self.tx.try_send(());
    }

    pub fn is_free(&self) -> bool {
        !self.rx.is_empty()
    }
}

impl Default for LinkSlot {
    fn default() -> Self {
        Self::new()
    }
}

/// Preferences requested after every connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NegotiationConfig {
    pub phy: PhyPreference,
    pub data_length: DataLengthParams,
    pub mtu: u16,
    /// Bounded wait for the previous request's completion
    pub acquire_timeout: Duration,
}

impl Default for NegotiationConfig {
    fn default() -> Self {
        Self {
            phy: PhyPreference {
                tx: PhyMask::LE_2M,
                rx: PhyMask::LE_2M,
            },
            data_length: DataLengthParams {
                tx_max_len: DATA_LEN_MAX_OCTETS,
                tx_max_time: DATA_LEN_MAX_TIME,
            },
            mtu: 247,
            acquire_timeout: Duration::from_millis(1000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NegotiationStep {
    Phy,
    DataLength,
    Mtu,
}

impl NegotiationStep {
    pub const SEQUENCE: [NegotiationStep; 3] = [
        NegotiationStep::Phy,
        NegotiationStep::DataLength,
        NegotiationStep::Mtu,
    ];
}

impl fmt::Display for NegotiationStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NegotiationStep::Phy => "PHY update",
            NegotiationStep::DataLength => "data length update",
            NegotiationStep::Mtu => "MTU exchange",
        };
        f.write_str(name)
    }
}

/// What happened during one negotiation run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NegotiationReport {
    pub issued: Vec<NegotiationStep>,
    pub timed_out: Vec<NegotiationStep>,
    pub rejected: Vec<(NegotiationStep, HostError)>,
    /// The link went away before the sequence finished
    pub abandoned: bool,
}

pub struct ParameterNegotiator {
    host: Arc<dyn BleHost>,
    config: NegotiationConfig,
}

impl ParameterNegotiator {
    pub fn new(host: Arc<dyn BleHost>, config: NegotiationConfig) -> Self {
        Self { host, config }
    }

    pub fn config(&self) -> &NegotiationConfig {
        &self.config
    }

    /// Runs the PHY, data length, MTU sequence on `conn`.
    ///
    /// Blocks the calling work context for at most one acquire timeout per
    /// step. A timed out wait is logged and the next request is issued
    /// anyway; a rejected request frees the slot itself since no completion
    /// will follow.
    pub fn run(&self, conn: &Connection) -> NegotiationReport {
        let mut report = NegotiationReport::default();

        for step in NegotiationStep::SEQUENCE {
            if !conn.is_alive() {
                report.abandoned = true;
                break;
            }

            if !conn.slot().acquire(self.config.acquire_timeout) {
                warn!(
                    "No completion for previous request within {:?}, issuing {} anyway",
                    self.config.acquire_timeout, step
                );
                report.timed_out.push(step);
            }

            if !conn.is_alive() {
                report.abandoned = true;
                break;
            }

            match self.issue(conn.handle(), step) {
                Ok(()) => {
                    debug!("Requested {} on handle 0x{:04X}", step, conn.handle());
                    report.issued.push(step);
                }
                Err(err) => {
                    warn!("{} request failed: {}", step, err);
                    conn.slot().release();
                    report.rejected.push((step, err));
                }
            }
        }

        if report.abandoned {
            info!("Connection 0x{:04X} dropped during negotiation", conn.handle());
        }
        report
    }

    fn issue(&self, handle: ConnHandle, step: NegotiationStep) -> HostResult<()> {
        match step {
            NegotiationStep::Phy => self.host.update_phy(handle, self.config.phy),
            NegotiationStep::DataLength => {
                self.host.update_data_length(handle, self.config.data_length)
            }
            NegotiationStep::Mtu => self.host.exchange_mtu(handle, self.config.mtu),
        }
    }
}
