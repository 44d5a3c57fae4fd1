//! Unit tests for the LED/Button service

use super::*;
use crate::att::AttErrorCode;
use crate::conn::{ConnectionManager, NegotiationConfig, ParameterNegotiator};
use crate::gap::{AdvertisingConfig, AdvertisingController, IdentityId};
use crate::host::ConnParams;
use crate::mock::{peer, HostCall, MockHost, RecordingCallbacks, RecordingLeds};
use crate::smp::{MemoryBondStore, SecurityManager};
use crate::work::WorkQueue;
use std::sync::atomic::Ordering;
use std::sync::Arc;

const HANDLE: u16 = 0x0040;

struct Fixture {
    host: Arc<MockHost>,
    callbacks: Arc<RecordingCallbacks>,
    connections: Arc<ConnectionManager>,
    lbs: LedButtonService,
    _queue: WorkQueue,
}

fn fixture(push_mode: PushMode) -> Fixture {
    let host = MockHost::new();
    let queue = WorkQueue::new();
    let bonds = Arc::new(MemoryBondStore::new());
    let advertising = Arc::new(AdvertisingController::new(
        host.clone(),
        bonds.clone(),
        IdentityId::DEFAULT,
        AdvertisingConfig::default(),
        queue.sender(),
    ));
    let connections = Arc::new(ConnectionManager::new(
        advertising,
        Arc::new(SecurityManager::new(bonds, IdentityId::DEFAULT)),
        ParameterNegotiator::new(host.clone(), NegotiationConfig::default()),
        RecordingLeds::new(),
        1,
        queue.sender(),
    ));
    let callbacks = RecordingCallbacks::new();
    let lbs = LedButtonService::new(host.clone(), connections.clone(), callbacks.clone(), push_mode);
    Fixture {
        host,
        callbacks,
        connections,
        lbs,
        _queue: queue,
    }
}

fn connect(f: &Fixture) {
    f.connections
        .on_connect(HANDLE, peer(1), 0, ConnParams::default())
        .unwrap();
}

fn att_err<T: std::fmt::Debug>(result: LbsResult<T>) -> AttErrorCode {
    match result {
        Err(LbsError::Att(code)) => code,
        other => panic!("expected ATT error, got {:?}", other),
    }
}

#[test]
fn test_led_write_accepts_zero_and_one() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[0x01]).unwrap(), 1);
    assert!(f.lbs.led_state());
    assert_eq!(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[0x00]).unwrap(), 1);
    assert!(!f.lbs.led_state());
    assert_eq!(f.callbacks.led_writes(), vec![true, false]);
}

#[test]
fn test_led_write_checks_length_then_offset_then_value() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    // Length wins over a bad offset and a bad value
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 3, &[0x05, 0x05])),
        AttErrorCode::InvalidAttributeValueLength
    );
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[])),
        AttErrorCode::InvalidAttributeValueLength
    );
    // Offset wins over a bad value
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 1, &[0x05])),
        AttErrorCode::InvalidOffset
    );
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[0x02])),
        AttErrorCode::ValueNotAllowed
    );
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[0xFF])),
        AttErrorCode::ValueNotAllowed
    );

    // Rejected writes leave the LED alone
    assert!(f.callbacks.led_writes().is_empty());
    assert!(!f.lbs.led_state());
}

#[test]
fn test_access_rules() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(
        att_err(f.lbs.read(HANDLE, LBS_LED_VALUE_HANDLE, 0)),
        AttErrorCode::ReadNotPermitted
    );
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_BUTTON_VALUE_HANDLE, 0, &[0x01])),
        AttErrorCode::WriteNotPermitted
    );
    assert_eq!(
        att_err(f.lbs.read(HANDLE, 0x0099, 0)),
        AttErrorCode::InvalidHandle
    );
}

#[test]
fn test_requests_without_link() {
    let f = fixture(PushMode::Notify);

    assert_eq!(
        f.lbs.write(HANDLE, LBS_LED_VALUE_HANDLE, 0, &[0x01]),
        Err(LbsError::NotConnected)
    );
    assert_eq!(
        f.lbs.read(HANDLE, LBS_BUTTON_VALUE_HANDLE, 0),
        Err(LbsError::NotConnected)
    );
    assert_eq!(f.lbs.send_button_state(true), Err(LbsError::NotConnected));
    assert!(f.host.calls().is_empty());
}

#[test]
fn test_button_read_reports_latest_state() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(f.lbs.read(HANDLE, LBS_BUTTON_VALUE_HANDLE, 0).unwrap(), vec![0]);
    f.callbacks.button.store(true, Ordering::SeqCst);
    assert_eq!(f.lbs.read(HANDLE, LBS_BUTTON_VALUE_HANDLE, 0).unwrap(), vec![1]);
    f.callbacks.button.store(false, Ordering::SeqCst);
    assert_eq!(f.lbs.read(HANDLE, LBS_BUTTON_VALUE_HANDLE, 0).unwrap(), vec![0]);

    assert_eq!(
        att_err(f.lbs.read(HANDLE, LBS_BUTTON_VALUE_HANDLE, 1)),
        AttErrorCode::InvalidOffset
    );
}

#[test]
fn test_notify_requires_subscription() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(f.lbs.send_button_state(true), Ok(false));
    assert!(f.host.calls().is_empty());

    f.lbs
        .write(HANDLE, LBS_BUTTON_CCCD_HANDLE, 0, &Cccd::NOTIFY.bits().to_le_bytes())
        .unwrap();
    assert_eq!(
        f.lbs.read(HANDLE, LBS_BUTTON_CCCD_HANDLE, 0).unwrap(),
        vec![0x01, 0x00]
    );

    assert_eq!(f.lbs.send_button_state(true), Ok(true));
    assert_eq!(f.lbs.send_button_state(false), Ok(true));
    assert_eq!(
        f.host.calls(),
        vec![
            HostCall::Notify(HANDLE, LBS_BUTTON_VALUE_HANDLE, vec![1]),
            HostCall::Notify(HANDLE, LBS_BUTTON_VALUE_HANDLE, vec![0]),
        ]
    );
}

#[test]
fn test_cccd_rejects_unsupported_mode() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_BUTTON_CCCD_HANDLE, 0, &[0x02, 0x00])),
        AttErrorCode::CccImproperlyConfigured
    );
    assert_eq!(
        att_err(f.lbs.write(HANDLE, LBS_BUTTON_CCCD_HANDLE, 0, &[0x01])),
        AttErrorCode::InvalidAttributeValueLength
    );
}

#[test]
fn test_one_indication_in_flight() {
    let f = fixture(PushMode::Indicate);
    connect(&f);
    assert!(f
        .lbs
        .characteristics()[0]
        .properties
        .contains(CharacteristicProperty::INDICATE));

    f.lbs
        .on_subscription_changed(HANDLE, LBS_BUTTON_CCCD_HANDLE, Cccd::INDICATE.bits())
        .unwrap();

    assert_eq!(f.lbs.send_button_state(true), Ok(true));
    assert_eq!(f.lbs.send_button_state(false), Err(LbsError::IndicationPending));

    f.lbs.on_indication_confirmed(HANDLE);
    assert_eq!(f.lbs.send_button_state(false), Ok(true));
    assert_eq!(
        f.host.calls(),
        vec![
            HostCall::Indicate(HANDLE, LBS_BUTTON_VALUE_HANDLE, vec![1]),
            HostCall::Indicate(HANDLE, LBS_BUTTON_VALUE_HANDLE, vec![0]),
        ]
    );
}

#[test]
fn test_subscriptions_reset_on_new_connection() {
    let f = fixture(PushMode::Notify);
    connect(&f);
    f.lbs
        .on_subscription_changed(HANDLE, LBS_BUTTON_CCCD_HANDLE, Cccd::NOTIFY.bits())
        .unwrap();
    assert_eq!(f.lbs.send_button_state(true), Ok(true));

    f.connections.on_disconnect(HANDLE, 0x13);
    connect(&f);
    assert_eq!(f.lbs.send_button_state(true), Ok(false));
}

#[test]
fn test_sensor_notifications() {
    let f = fixture(PushMode::Notify);
    connect(&f);

    assert_eq!(f.lbs.send_sensor_value(7), Ok(false));
    f.lbs
        .write(HANDLE, LBS_SENSOR_CCCD_HANDLE, 0, &[0x01, 0x00])
        .unwrap();
    assert_eq!(f.lbs.send_sensor_value(0x0102_0304), Ok(true));
    assert_eq!(
        f.host.calls(),
        vec![HostCall::Notify(
            HANDLE,
            LBS_SENSOR_VALUE_HANDLE,
            vec![0x04, 0x03, 0x02, 0x01]
        )]
    );
}
