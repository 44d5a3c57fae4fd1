//! Test doubles for the host and board.

use crate::board::LedCapability;
use crate::gap::LeAddress;
use crate::gatt::LbsCallbacks;
use crate::host::{
    AdvParams, BleHost, ConnHandle, ConnParams, DataLengthParams, HostError, HostEvent, HostResult,
    PhyPreference,
};
use crate::sync::lock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum HostCall {
    StartAdvertising(AdvParams),
    StopAdvertising,
    UpdateAdvertisingData { sd: Vec<u8> },
    AcceptListClear,
    AcceptListAdd(LeAddress),
    UpdatePhy(ConnHandle),
    UpdateDataLength(ConnHandle),
    ExchangeMtu(ConnHandle, u16),
    Notify(ConnHandle, u16, Vec<u8>),
    Indicate(ConnHandle, u16, Vec<u8>),
}

type Hook = Arc<dyn Fn(&HostCall) + Send + Sync>;

/// Records every request and keeps a model of the controller accept list.
#[derive(Default)]
pub(crate) struct MockHost {
    calls: Mutex<Vec<HostCall>>,
    accept_list: Mutex<Vec<LeAddress>>,
    fail_add_at: Mutex<Option<usize>>,
    fail_start: Mutex<Option<HostError>>,
    reject_phy: AtomicBool,
    hook: Mutex<Option<Hook>>,
}

impl MockHost {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> Vec<HostCall> {
        lock(&self.calls).clone()
    }

    pub fn clear_calls(&self) {
        lock(&self.calls).clear();
    }

    pub fn starts(&self) -> Vec<AdvParams> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                HostCall::StartAdvertising(params) => Some(params),
                _ => None,
            })
            .collect()
    }

    /// Link negotiation requests in the order they were issued.
    pub fn link_requests(&self) -> Vec<HostCall> {
        self.calls()
            .into_iter()
            .filter(|call| {
                matches!(
                    call,
                    HostCall::UpdatePhy(_) | HostCall::UpdateDataLength(_) | HostCall::ExchangeMtu(..)
                )
            })
            .collect()
    }

    pub fn controller_accept_list(&self) -> Vec<LeAddress> {
        lock(&self.accept_list).clone()
    }

    /// Makes the `index`th accept list add (0-based) fail.
    pub fn fail_accept_list_add_at(&self, index: usize) {
        *lock(&self.fail_add_at) = Some(index);
    }

    pub fn fail_next_start(&self, err: HostError) {
        *lock(&self.fail_start) = Some(err);
    }

    pub fn reject_phy(&self) {
        self.reject_phy.store(true, Ordering::SeqCst);
    }

    /// Runs `hook` after each recorded call, outside the mock's locks.
    pub fn on_call(&self, hook: impl Fn(&HostCall) + Send + Sync + 'static) {
        *lock(&self.hook) = Some(Arc::new(hook));
    }

    fn record(&self, call: HostCall) {
        lock(&self.calls).push(call.clone());
        let hook = lock(&self.hook).clone();
        if let Some(hook) = hook {
            hook(&call);
        }
    }
}

impl BleHost for MockHost {
    fn start_advertising(&self, params: &AdvParams, _ad: &[u8], _sd: &[u8]) -> HostResult<()> {
        if let Some(err) = lock(&self.fail_start).take() {
            return Err(err);
        }
        self.record(HostCall::StartAdvertising(*params));
        Ok(())
    }

    fn stop_advertising(&self) -> HostResult<()> {
        self.record(HostCall::StopAdvertising);
        Ok(())
    }

    fn update_advertising_data(&self, _ad: &[u8], sd: &[u8]) -> HostResult<()> {
        self.record(HostCall::UpdateAdvertisingData { sd: sd.to_vec() });
        Ok(())
    }

    fn accept_list_clear(&self) -> HostResult<()> {
        lock(&self.accept_list).clear();
        self.record(HostCall::AcceptListClear);
        Ok(())
    }

    fn accept_list_add(&self, addr: &LeAddress) -> HostResult<()> {
        {
            let mut list = lock(&self.accept_list);
            if *lock(&self.fail_add_at) == Some(list.len()) {
                return Err(HostError::Status(0x07));
            }
            list.push(*addr);
        }
        self.record(HostCall::AcceptListAdd(*addr));
        Ok(())
    }

    fn update_phy(&self, handle: ConnHandle, _pref: PhyPreference) -> HostResult<()> {
        if self.reject_phy.load(Ordering::SeqCst) {
            return Err(HostError::Busy);
        }
        self.record(HostCall::UpdatePhy(handle));
        Ok(())
    }

    fn update_data_length(&self, handle: ConnHandle, _params: DataLengthParams) -> HostResult<()> {
        self.record(HostCall::UpdateDataLength(handle));
        Ok(())
    }

    fn exchange_mtu(&self, handle: ConnHandle, mtu: u16) -> HostResult<()> {
        self.record(HostCall::ExchangeMtu(handle, mtu));
        Ok(())
    }

    fn notify(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()> {
        self.record(HostCall::Notify(handle, attr, value.to_vec()));
        Ok(())
    }

    fn indicate(&self, handle: ConnHandle, attr: u16, value: &[u8]) -> HostResult<()> {
        self.record(HostCall::Indicate(handle, attr, value.to_vec()));
        Ok(())
    }
}

/// LED board that remembers every write.
#[derive(Default)]
pub(crate) struct RecordingLeds {
    writes: Mutex<Vec<(u8, bool)>>,
}

impl RecordingLeds {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn writes(&self) -> Vec<(u8, bool)> {
        lock(&self.writes).clone()
    }

    pub fn last(&self, pin: u8) -> Option<bool> {
        lock(&self.writes)
            .iter()
            .rev()
            .find(|(p, _)| *p == pin)
            .map(|(_, on)| *on)
    }
}

impl LedCapability for RecordingLeds {
    fn set(&self, pin: u8, on: bool) {
        lock(&self.writes).push((pin, on));
    }
}

/// Service callbacks with a settable button and recorded LED writes.
#[derive(Default)]
pub(crate) struct RecordingCallbacks {
    pub button: AtomicBool,
    leds: Mutex<Vec<bool>>,
}

impl RecordingCallbacks {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn led_writes(&self) -> Vec<bool> {
        lock(&self.leds).clone()
    }
}

impl LbsCallbacks for RecordingCallbacks {
    fn led_changed(&self, on: bool) {
        lock(&self.leds).push(on);
    }

    fn button_state(&self) -> bool {
        self.button.load(Ordering::SeqCst)
    }
}

pub(crate) fn peer(last: u8) -> LeAddress {
    LeAddress::public([last, 0x11, 0x22, 0x33, 0x44, 0x55])
}

pub(crate) fn connected(handle: ConnHandle, peer: LeAddress) -> HostEvent {
    HostEvent::Connected {
        handle,
        peer,
        status: 0,
        params: ConnParams {
            interval: 24,
            latency: 0,
            timeout: 400,
        },
    }
}
