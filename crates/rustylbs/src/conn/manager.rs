//! Lifecycle of the single active connection

use super::connection::Connection;
use super::negotiation::{NegotiationReport, ParameterNegotiator};
use super::units::{att_payload_len, interval_to_ms, timeout_to_ms};
use crate::board::LedCapability;
use crate::gap::{AdvertisingController, LeAddress, Phy};
use crate::host::{ConnHandle, ConnParams, DataLengthInfo, HostEvent};
use crate::smp::{SecurityLevel, SecurityManager};
use crate::sync::lock;
use crate::work::{Work, WorkSender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnState {
    Disconnected,
    Connected,
}

/// Owns the active `Connection` and fans host events out to advertising,
/// security and negotiation.
pub struct ConnectionManager {
    advertising: Arc<AdvertisingController>,
    security: Arc<SecurityManager>,
    negotiator: ParameterNegotiator,
    leds: Arc<dyn LedCapability>,
    indicator: u8,
    work: WorkSender,
    current: Mutex<Option<Arc<Connection>>>,
    next_id: AtomicU64,
}

impl ConnectionManager {
    pub fn new(
        advertising: Arc<AdvertisingController>,
        security: Arc<SecurityManager>,
        negotiator: ParameterNegotiator,
        leds: Arc<dyn LedCapability>,
        indicator: u8,
        work: WorkSender,
    ) -> Self {
        Self {
            advertising,
            security,
            negotiator,
            leds,
            indicator,
            work,
            current: Mutex::new(None),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn state(&self) -> ConnState {
        match *lock(&self.current) {
            Some(_) => ConnState::Connected,
            None => ConnState::Disconnected,
        }
    }

    /// The active connection, if any.
    pub fn connection(&self) -> Option<Arc<Connection>> {
        lock(&self.current).clone()
    }

    /// The active connection if it has this handle.
    pub fn lookup(&self, handle: ConnHandle) -> Option<Arc<Connection>> {
        lock(&self.current)
            .as_ref()
            .filter(|conn| conn.handle() == handle)
            .cloned()
    }

    pub fn on_connect(
        &self,
        handle: ConnHandle,
        peer: LeAddress,
        status: u8,
        params: ConnParams,
    ) -> Option<Arc<Connection>> {
        if status != 0 {
            warn!("Connection failed (err 0x{:02X})", status);
            return None;
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let conn = Arc::new(Connection::new(id, handle, peer, params));
        if let Some(stale) = lock(&self.current).replace(conn.clone()) {
            error!(
                "Connection 0x{:04X} still active on new connect, dropping it",
                stale.handle()
            );
            stale.invalidate();
        }

        info!("Connected: {}", peer);
        info!(
            "Connection parameters: interval {:.2} ms, latency {} intervals, timeout {} ms",
            interval_to_ms(params.interval),
            params.latency,
            timeout_to_ms(params.timeout)
        );
        self.leds.set(self.indicator, true);
        self.advertising.on_connected();

        if let Err(err) = self.work.submit(Work::Negotiate(conn.clone())) {
            error!("Cannot queue link negotiation: {}", err);
        }
        Some(conn)
    }

    /// Invalidates the connection and queues an advertising restart.
    /// Unknown or already released handles are ignored.
    pub fn on_disconnect(&self, handle: ConnHandle, reason: u8) {
        let conn = {
            let mut current = lock(&self.current);
            match current.as_ref() {
                Some(conn) if conn.handle() == handle => current.take(),
                _ => None,
            }
        };

        let Some(conn) = conn else {
            debug!("Disconnect for unknown handle 0x{:04X}", handle);
            return;
        };
        if !conn.invalidate() {
            return;
        }

        info!("Disconnected: {} (reason 0x{:02X})", conn.peer(), reason);
        self.leds.set(self.indicator, false);
        self.advertising.on_disconnect();
    }

    /// The host released the previous connection object.
    pub fn on_recycled(&self) {
        debug!("Connection object recycled");
        if lock(&self.current).is_none() {
            self.advertising.request_restart();
        }
    }

    pub fn on_security_changed(&self, handle: ConnHandle, level: SecurityLevel, status: u8) {
        match self.lookup(handle) {
            Some(conn) => self.security.on_security_changed(&conn, level, status),
            None => warn!("Security change for unknown handle 0x{:04X}", handle),
        }
    }

    pub fn on_param_updated(&self, handle: ConnHandle, params: ConnParams) {
        let Some(conn) = self.lookup(handle) else {
            return;
        };
        conn.update_link(|link| link.params = params);
        info!(
            "Connection parameters updated: interval {:.2} ms, latency {} intervals, timeout {} ms",
            interval_to_ms(params.interval),
            params.latency,
            timeout_to_ms(params.timeout)
        );
        conn.slot().release();
    }

    pub fn on_phy_updated(&self, handle: ConnHandle, status: u8, tx: Option<Phy>, rx: Option<Phy>) {
        let Some(conn) = self.lookup(handle) else {
            return;
        };
        match (status, tx, rx) {
            (0, Some(tx), Some(rx)) => {
                conn.update_link(|link| {
                    link.tx_phy = tx;
                    link.rx_phy = rx;
                });
                info!("PHY updated: tx {}, rx {}", tx, rx);
            }
            _ => warn!("PHY update failed (status 0x{:02X})", status),
        }
        conn.slot().release();
    }

    pub fn on_data_length_updated(&self, handle: ConnHandle, info: DataLengthInfo) {
        let Some(conn) = self.lookup(handle) else {
            return;
        };
        conn.update_link(|link| link.data_length = info);
        info!(
            "Data length updated: tx {} bytes / {} us, rx {} bytes / {} us",
            info.tx_max_len, info.tx_max_time, info.rx_max_len, info.rx_max_time
        );
        conn.slot().release();
    }

    pub fn on_mtu_exchanged(&self, handle: ConnHandle, mtu: u16, status: u8) {
        let Some(conn) = self.lookup(handle) else {
            return;
        };
        if status == 0 {
            conn.update_link(|link| link.mtu = mtu);
            info!("MTU exchange done, payload {} bytes", att_payload_len(mtu));
        } else {
            warn!("MTU exchange failed (err 0x{:02X})", status);
        }
        conn.slot().release();
    }

    /// Runs link negotiation for `conn`. Called from the work queue.
    pub fn negotiate(&self, conn: &Connection) -> NegotiationReport {
        self.negotiator.run(conn)
    }

    /// Routes a connection, security or link event. Returns `false` for
    /// events this manager does not handle.
    pub fn handle_event(&self, event: &HostEvent) -> bool {
        match *event {
            HostEvent::Connected {
                handle,
                peer,
                status,
                params,
            } => {
                self.on_connect(handle, peer, status, params);
            }
            HostEvent::Disconnected { handle, reason } => self.on_disconnect(handle, reason),
            HostEvent::Recycled => self.on_recycled(),
            HostEvent::SecurityChanged {
                handle,
                level,
                status,
            } => self.on_security_changed(handle, level, status),
            HostEvent::PasskeyDisplay { handle, passkey } => {
                if let Some(conn) = self.lookup(handle) {
                    self.security.passkey_display(&conn, passkey);
                }
            }
            HostEvent::PairingCancelled { handle } => {
                if let Some(conn) = self.lookup(handle) {
                    self.security.pairing_cancelled(&conn);
                }
            }
            HostEvent::PairingComplete { handle, bonded } => {
                if let Some(conn) = self.lookup(handle) {
                    if let Err(err) = self.security.pairing_complete(&conn, bonded) {
                        error!("Failed to store bond for {}: {}", conn.peer(), err);
                    }
                }
            }
            HostEvent::PairingFailed { handle, reason } => {
                if let Some(conn) = self.lookup(handle) {
                    self.security.pairing_failed(&conn, reason);
                }
            }
            HostEvent::ParamUpdated { handle, params } => self.on_param_updated(handle, params),
            HostEvent::PhyUpdated {
                handle,
                status,
                tx,
                rx,
            } => self.on_phy_updated(handle, status, tx, rx),
            HostEvent::DataLengthUpdated { handle, info } => {
                self.on_data_length_updated(handle, info)
            }
            HostEvent::MtuExchanged {
                handle,
                mtu,
                status,
            } => self.on_mtu_exchanged(handle, mtu, status),
            HostEvent::IndicationConfirmed { .. } | HostEvent::SubscriptionChanged { .. } => {
                return false
            }
        }
        true
    }
}
