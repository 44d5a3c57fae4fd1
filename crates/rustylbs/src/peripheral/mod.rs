//! The LED/Button peripheral
//!
//! Wires the bond store, advertising, security, connection handling and the
//! GATT service together, routes host events and button edges, and runs the
//! deferred work those produce.

use crate::board::{ButtonState, LedCapability};
use crate::config::PeripheralConfig;
use crate::conn::{ConnectionManager, ParameterNegotiator};
use crate::error::Result;
use crate::gap::AdvertisingController;
use crate::gatt::{LbsCallbacks, LbsError, LedButtonService};
use crate::host::{BleHost, HostEvent};
use crate::smp::{AuthCallbacks, BondStore, PeerSelector, SecurityManager};
use crate::work::{Work, WorkQueue, WorkSender};
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};


/// Feeds the service from the board: user LED out, user button in.
struct BoardCallbacks {
    leds: Arc<dyn LedCapability>,
    user_led: u8,
    button: Arc<ButtonState>,
}

impl LbsCallbacks for BoardCallbacks {
    fn led_changed(&self, on: bool) {
        self.leds.set(self.user_led, on);
    }

    fn button_state(&self) -> bool {
        self.button.get()
    }
}

pub struct Peripheral {
    config: PeripheralConfig,
    queue: WorkQueue,
    work: WorkSender,
    button: Arc<ButtonState>,
    advertising: Arc<AdvertisingController>,
    security: Arc<SecurityManager>,
    connections: Arc<ConnectionManager>,
    lbs: Arc<LedButtonService>,
}

impl Peripheral {
    /// Builds the peripheral. Nothing is sent to the host until `boot`.
    pub fn new(
        config: PeripheralConfig,
        host: Arc<dyn BleHost>,
        bonds: Arc<dyn BondStore>,
        leds: Arc<dyn LedCapability>,
        display: Arc<dyn AuthCallbacks>,
    ) -> Result<Self> {
        config.validate()?;

        let queue = WorkQueue::new();
        let work = queue.sender();
        let button = Arc::new(ButtonState::default());

        let advertising = Arc::new(AdvertisingController::new(
            host.clone(),
            bonds.clone(),
            config.identity,
            config.advertising.clone(),
            work.clone(),
        ));
        let security = Arc::new(SecurityManager::new(bonds, config.identity).with_display(display));
        let connections = Arc::new(ConnectionManager::new(
            advertising.clone(),
            security.clone(),
            ParameterNegotiator::new(host.clone(), config.negotiation),
            leds.clone(),
            config.leds.con_status,
            work.clone(),
        ));
        let callbacks = Arc::new(BoardCallbacks {
            leds,
            user_led: config.leds.user,
            button: button.clone(),
        });
        let lbs = Arc::new(LedButtonService::new(
            host,
            connections.clone(),
            callbacks,
            config.push_mode,
        ));

        Ok(Self {
            config,
            queue,
            work,
            button,
            advertising,
            security,
            connections,
            lbs,
        })
    }

    /// Queues the first advertising start.
    pub fn boot(&self) {
        info!("Starting {}", self.config.advertising.device_name);
        self.advertising.request_restart();
    }

    pub fn config(&self) -> &PeripheralConfig {
        &self.config
    }

    pub fn advertising(&self) -> &Arc<AdvertisingController> {
        &self.advertising
    }

    pub fn security(&self) -> &Arc<SecurityManager> {
        &self.security
    }

    pub fn connections(&self) -> &Arc<ConnectionManager> {
        &self.connections
    }

    pub fn lbs(&self) -> &Arc<LedButtonService> {
        &self.lbs
    }

    /// Routes a host event. Runs in the host's callback context, so nothing
    /// here calls back into the host.
    pub fn handle_event(&self, event: &HostEvent) {
        if self.connections.handle_event(event) {
            return;
        }
        match *event {
            HostEvent::IndicationConfirmed { handle } => self.lbs.on_indication_confirmed(handle),
            HostEvent::SubscriptionChanged {
                handle,
                attr,
                value,
            } => {
                if let Err(err) = self.lbs.on_subscription_changed(handle, attr, value) {
                    warn!("Subscription change rejected: {}", err);
                }
            }
            _ => {}
        }
    }

    /// Button driver callback: `state` is the level of every button,
    /// `changed` the ones that moved. Only records state and posts work.
    pub fn on_button_change(&self, state: u32, changed: u32) {
        let buttons = self.config.buttons;

        if changed & buttons.user != 0 {
            let pressed = state & buttons.user != 0;
            self.button.set(pressed);
            self.post(Work::PushButton(pressed));
        }

        let released = |mask: Option<u32>| mask.is_some_and(|m| changed & m != 0 && state & m == 0);
        if released(buttons.pairing) {
            self.post(Work::PairingMode);
        }
        if released(buttons.bond_delete) {
            self.post(Work::ForgetBonds(PeerSelector::All));
        }
    }

    /// Executes one unit of deferred work.
    pub fn run_work(&self, work: Work) {
        match work {
            Work::StartAdvertising => {
                if let Err(err) = self.advertising.start() {
                    warn!("Advertising not started: {}", err);
                }
            }
            Work::PairingMode => {
                if let Err(err) = self.advertising.enter_pairing_mode() {
                    warn!("Pairing mode not entered: {}", err);
                }
            }
            Work::ForgetBonds(target) => {
                if let Some(conn) = self.connections.connection() {
                    if target.matches(&conn.peer()) {
                        warn!("Forgetting bond of connected peer {}", conn.peer());
                    }
                }
                if let Err(err) = self.security.forget_peer(self.config.identity, target) {
                    warn!("Cannot delete bonds: {}", err);
                }
            }
            Work::Negotiate(conn) => {
                let report = self.connections.negotiate(&conn);
                debug!("Negotiation finished: {:?}", report);
            }
            Work::PushButton(pressed) => {
                if pressed {
                    self.advertising.record_press();
                }
                match self.lbs.send_button_state(pressed) {
                    Ok(_) => {}
                    Err(LbsError::NotConnected) => debug!("No connection, button state not sent"),
                    Err(err) => warn!("Couldn't send button state: {}", err),
                }
            }
        }
    }

    /// Drains queued work on the calling thread. Returns how many items ran.
    pub fn run_pending(&self) -> usize {
        let mut count = 0;
        while let Some(work) = self.queue.try_next() {
            self.run_work(work);
            count += 1;
        }
        count
    }

    /// Starts the worker thread that executes deferred work in order.
    pub fn spawn_worker(self: &Arc<Self>) -> io::Result<JoinHandle<()>> {
        let peripheral = Arc::clone(self);
        let rx = self.queue.receiver();
        thread::Builder::new()
            .name("lbs-work".into())
            .spawn(move || {
                for work in rx.iter() {
                    peripheral.run_work(work);
                }
            })
    }

    fn post(&self, work: Work) {
        if let Err(err) = self.work.submit(work) {
            warn!("Dropped button work: {}", err);
        }
    }
}
