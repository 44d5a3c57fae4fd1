//! Bond-aware advertising
//!
//! With no bonds the device advertises openly. Once it has bonds it only
//! accepts connections from peers on the accept list, and advertising stops
//! after the first connection. Restarts after a disconnect go through the
//! work queue.

use super::accept_list::{AcceptList, AcceptListBuilder};
use super::adv_data::{self, AdFlags, AdStructure, AdvertisingPayload};
use super::constants::{ADV_FAST_INT_MAX_2, ADV_FAST_INT_MIN_2, COMPANY_ID_NORDIC};
use crate::conn::units::adv_interval_to_ms;
use crate::error::Result;
use crate::gap::IdentityId;
use crate::gatt::LBS_SERVICE_UUID;
use crate::host::{AdvParams, BleHost};
use crate::smp::BondStore;
use crate::sync::lock;
use crate::work::{Work, WorkSender};
use log::{debug, error, info, warn};
use std::sync::atomic::{AtomicBool, AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdvState {
    Stopped,
    AdvertisingFiltered,
    AdvertisingOpen,
}

/// What goes into the scan response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanResponse {
    /// The LED/Button service UUID
    ServiceUuid,
    /// Company id followed by the button press counter
    ManufacturerData { company_id: u16 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingConfig {
    pub device_name: String,
    /// 0.625 ms units
    pub interval_min: u16,
    /// 0.625 ms units
    pub interval_max: u16,
    pub scan_response: ScanResponse,
}

impl Default for AdvertisingConfig {
    fn default() -> Self {
        Self {
            device_name: "rustylbs".to_string(),
            interval_min: ADV_FAST_INT_MIN_2,
            interval_max: ADV_FAST_INT_MAX_2,
            scan_response: ScanResponse::ServiceUuid,
        }
    }
}

impl AdvertisingConfig {
    pub fn with_manufacturer_data(mut self) -> Self {
        self.scan_response = ScanResponse::ManufacturerData {
            company_id: COMPANY_ID_NORDIC,
        };
        self
    }
}

#[derive(Debug)]
struct AdvSession {
    state: AdvState,
    accept_list: AcceptList,
}

/// Owns the advertising set. Host requests are made by the worker only, and
/// `session` is never held across one: the event thread only flips flags
/// and updates the state.
pub struct AdvertisingController {
    host: Arc<dyn BleHost>,
    builder: AcceptListBuilder,
    config: AdvertisingConfig,
    work: WorkSender,
    session: Mutex<AdvSession>,
    /// Serializes host requests made by `start`, `stop` and pairing mode
    host_io: Mutex<()>,
    restart_queued: AtomicBool,
    connected: AtomicBool,
    pairing_pending: AtomicBool,
    presses: AtomicU16,
}

impl AdvertisingController {
    pub fn new(
        host: Arc<dyn BleHost>,
        bonds: Arc<dyn BondStore>,
        identity: IdentityId,
        config: AdvertisingConfig,
        work: WorkSender,
    ) -> Self {
        Self {
            builder: AcceptListBuilder::new(host.clone(), bonds, identity),
            host,
            config,
            work,
            session: Mutex::new(AdvSession {
                state: AdvState::Stopped,
                accept_list: AcceptList::default(),
            }),
            host_io: Mutex::new(()),
            restart_queued: AtomicBool::new(false),
            connected: AtomicBool::new(false),
            pairing_pending: AtomicBool::new(false),
            presses: AtomicU16::new(0),
        }
    }

    pub fn state(&self) -> AdvState {
        lock(&self.session).state
    }

    /// Accept list of the current session.
    pub fn accept_list(&self) -> AcceptList {
        lock(&self.session).accept_list.clone()
    }

    pub fn press_count(&self) -> u16 {
        self.presses.load(Ordering::Relaxed)
    }

    /// True while a pairing mode request waits for the link to drop.
    pub fn pairing_pending(&self) -> bool {
        self.pairing_pending.load(Ordering::SeqCst)
    }

    /// Starts advertising, filtered if there are bonds and open otherwise.
    /// A pairing request deferred during the last link forces the open path.
    ///
    /// Calling it while advertising is a no-op that returns the current
    /// state, and nothing is started while a link is up. On failure the
    /// controller stays `Stopped` until the next trigger.
    pub fn start(&self) -> Result<AdvState> {
        let _io = lock(&self.host_io);
        self.restart_queued.store(false, Ordering::SeqCst);
        if self.connected.load(Ordering::SeqCst) {
            debug!("Link is up, not advertising");
            return Ok(AdvState::Stopped);
        }
        let current = self.state();
        if current != AdvState::Stopped {
            debug!("Advertising already running ({:?})", current);
            return Ok(current);
        }

        if self.pairing_pending() {
            let state = self.advertise_open_without_filter()?;
            self.pairing_pending.store(false, Ordering::SeqCst);
            return Ok(state);
        }

        let list = self.builder.build_accept_list().map_err(|err| {
            error!("Accept list setup failed, not advertising: {}", err);
            err
        })?;

        if list.is_empty() {
            let params = AdvParams::open(self.config.interval_min, self.config.interval_max);
            self.begin(params, AdvState::AdvertisingOpen, list)
        } else {
            let params = AdvParams::accept_list(self.config.interval_min, self.config.interval_max);
            self.begin(params, AdvState::AdvertisingFiltered, list)
        }
    }

    /// The link dropped: queues a restart. Never touches the host directly.
    pub fn on_disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        self.request_restart();
    }

    /// Queues a restart unless one is already waiting.
    pub fn request_restart(&self) {
        if self.restart_queued.swap(true, Ordering::SeqCst) {
            debug!("Advertising restart already queued");
            return;
        }
        if let Err(err) = self.work.submit(Work::StartAdvertising) {
            self.restart_queued.store(false, Ordering::SeqCst);
            error!("Cannot queue advertising restart: {}", err);
        }
    }

    /// Connectable advertising ends once the link is established.
    pub fn on_connected(&self) {
        self.connected.store(true, Ordering::SeqCst);
        lock(&self.session).state = AdvState::Stopped;
    }

    /// Drops the accept list and advertises openly regardless of bonds, so
    /// a new central can pair. With a link up the request is held until the
    /// next `start()`, since only one peer may be connected.
    pub fn enter_pairing_mode(&self) -> Result<AdvState> {
        let _io = lock(&self.host_io);
        if self.connected.load(Ordering::SeqCst) {
            info!("Pairing mode deferred until the link drops");
            self.pairing_pending.store(true, Ordering::SeqCst);
            return Ok(AdvState::Stopped);
        }
        self.stop_locked()?;
        let state = self.advertise_open_without_filter()?;
        self.pairing_pending.store(false, Ordering::SeqCst);
        Ok(state)
    }

    pub fn stop(&self) -> Result<()> {
        let _io = lock(&self.host_io);
        self.stop_locked()
    }

    /// Counts a button press and refreshes the manufacturer data if it is
    /// being advertised.
    pub fn record_press(&self) -> u16 {
        let count = self.presses.fetch_add(1, Ordering::Relaxed).wrapping_add(1);
        if let ScanResponse::ManufacturerData { .. } = self.config.scan_response {
            if self.state() != AdvState::Stopped {
                match self.payload() {
                    Ok(payload) => {
                        if let Err(err) = self.host.update_advertising_data(&payload.ad, &payload.sd) {
                            warn!("Failed to update advertising data: {}", err);
                        }
                    }
                    Err(err) => warn!("Failed to encode advertising data: {}", err),
                }
            }
        }
        count
    }

    /// Advertising and scan response data for the current press count.
    pub fn payload(&self) -> Result<AdvertisingPayload> {
        let ad = adv_data::encode(&[
            AdStructure::Flags(AdFlags::LE_GENERAL_DISCOVERABLE | AdFlags::BREDR_NOT_SUPPORTED),
            AdStructure::CompleteName(self.config.device_name.clone()),
        ])?;
        let sd = match self.config.scan_response {
            ScanResponse::ServiceUuid => adv_data::encode(&[AdStructure::ServiceUuid128(LBS_SERVICE_UUID)])?,
            ScanResponse::ManufacturerData { company_id } => adv_data::encode(&[AdStructure::ManufacturerData {
                company_id,
                data: self.press_count().to_le_bytes().to_vec(),
            }])?,
        };
        Ok(AdvertisingPayload { ad, sd })
    }

    /// Requires `host_io`.
    fn stop_locked(&self) -> Result<()> {
        if self.state() == AdvState::Stopped {
            return Ok(());
        }
        self.host.stop_advertising().map_err(|err| {
            error!("Cannot stop advertising: {}", err);
            err
        })?;
        lock(&self.session).state = AdvState::Stopped;
        Ok(())
    }

    /// Requires `host_io`.
    fn advertise_open_without_filter(&self) -> Result<AdvState> {
        self.builder.clear()?;
        lock(&self.session).accept_list = AcceptList::default();

        info!("Entering pairing mode");
        let params = AdvParams::open(self.config.interval_min, self.config.interval_max);
        self.begin(params, AdvState::AdvertisingOpen, AcceptList::default())
    }

    /// Requires `host_io`. A connection that lands while the start is in
    /// flight wins: the state stays `Stopped`.
    fn begin(&self, params: AdvParams, next: AdvState, list: AcceptList) -> Result<AdvState> {
        let payload = self.payload()?;
        self.host
            .start_advertising(&params, &payload.ad, &payload.sd)
            .map_err(|err| {
                error!("Advertising failed to start: {}", err);
                err
            })?;

        match next {
            AdvState::AdvertisingFiltered => info!(
                "Advertising to {} bonded peer(s) every {:.1}-{:.1} ms",
                list.len(),
                adv_interval_to_ms(params.interval_min),
                adv_interval_to_ms(params.interval_max)
            ),
            _ => info!(
                "Advertising openly every {:.1}-{:.1} ms",
                adv_interval_to_ms(params.interval_min),
                adv_interval_to_ms(params.interval_max)
            ),
        }
        let mut session = lock(&self.session);
        session.accept_list = list;
        if !self.connected.load(Ordering::SeqCst) {
            session.state = next;
        }
        Ok(session.state)
    }
}
