//! Unit tests for the accept list and advertising controller

use super::constants::*;
use super::*;
use crate::error::Error;
use crate::gatt::LBS_SERVICE_UUID;
use crate::host::{AdvParams, HostError};
use crate::mock::{peer, HostCall, MockHost};
use crate::smp::MemoryBondStore;
use crate::work::{Work, WorkQueue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

fn controller(
    host: &Arc<MockHost>,
    peers: Vec<LeAddress>,
    config: AdvertisingConfig,
) -> (AdvertisingController, WorkQueue) {
    let queue = WorkQueue::new();
    let bonds = Arc::new(MemoryBondStore::with_bonds(IdentityId::DEFAULT, peers));
    let adv = AdvertisingController::new(
        host.clone(),
        bonds,
        IdentityId::DEFAULT,
        config,
        queue.sender(),
    );
    (adv, queue)
}

#[test]
fn test_accept_list_built_from_bonds() {
    let host = MockHost::new();
    let bonds = Arc::new(MemoryBondStore::with_bonds(
        IdentityId::DEFAULT,
        vec![peer(1), peer(2), peer(3)],
    ));
    let builder = AcceptListBuilder::new(host.clone(), bonds, IdentityId::DEFAULT);

    let list = builder.build_accept_list().unwrap();
    assert_eq!(list.len(), 3);
    assert!(list.contains(&peer(2)));
    assert_eq!(
        host.calls(),
        vec![
            HostCall::AcceptListClear,
            HostCall::AcceptListAdd(peer(1)),
            HostCall::AcceptListAdd(peer(2)),
            HostCall::AcceptListAdd(peer(3)),
        ]
    );
    assert_eq!(host.controller_accept_list(), vec![peer(1), peer(2), peer(3)]);

    // Rebuilding starts over
    let list = builder.build_accept_list().unwrap();
    assert_eq!(list.len(), 3);
    assert_eq!(host.controller_accept_list().len(), 3);
}

#[test]
fn test_accept_list_ignores_other_identities() {
    let host = MockHost::new();
    let bonds = Arc::new(MemoryBondStore::with_bonds(IdentityId(1), vec![peer(1)]));
    let builder = AcceptListBuilder::new(host.clone(), bonds, IdentityId::DEFAULT);

    assert!(builder.build_accept_list().unwrap().is_empty());
}

#[test]
fn test_accept_list_failure_leaves_controller_empty() {
    let host = MockHost::new();
    host.fail_accept_list_add_at(1);
    let bonds = Arc::new(MemoryBondStore::with_bonds(
        IdentityId::DEFAULT,
        vec![peer(1), peer(2), peer(3)],
    ));
    let builder = AcceptListBuilder::new(host.clone(), bonds, IdentityId::DEFAULT);

    let err = builder.build_accept_list().unwrap_err();
    assert!(matches!(err, Error::AcceptList(HostError::Status(_))));
    assert!(host.controller_accept_list().is_empty());
}

#[test]
fn test_start_without_bonds_is_open() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![], AdvertisingConfig::default());

    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingOpen);
    assert_eq!(adv.state(), AdvState::AdvertisingOpen);

    let starts = host.starts();
    assert_eq!(starts.len(), 1);
    assert!(!starts[0].filter_accept_list);
    assert!(!starts[0].one_shot);
    assert!(starts[0].connectable);
}

#[test]
fn test_start_with_bonds_is_filtered_one_shot() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![peer(1), peer(2)], AdvertisingConfig::default());

    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingFiltered);
    assert_eq!(adv.accept_list().peers(), &[peer(1), peer(2)]);
    assert_eq!(
        host.starts(),
        vec![AdvParams::accept_list(ADV_FAST_INT_MIN_2, ADV_FAST_INT_MAX_2)]
    );
}

#[test]
fn test_start_is_idempotent_while_advertising() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![], AdvertisingConfig::default());

    adv.start().unwrap();
    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingOpen);
    assert_eq!(host.starts().len(), 1);
}

#[test]
fn test_start_aborts_on_accept_list_failure() {
    let host = MockHost::new();
    host.fail_accept_list_add_at(0);
    let (adv, _queue) = controller(&host, vec![peer(1)], AdvertisingConfig::default());

    assert!(matches!(adv.start(), Err(Error::AcceptList(_))));
    assert_eq!(adv.state(), AdvState::Stopped);
    assert!(host.starts().is_empty());
}

#[test]
fn test_start_failure_stays_stopped() {
    let host = MockHost::new();
    host.fail_next_start(HostError::Busy);
    let (adv, _queue) = controller(&host, vec![], AdvertisingConfig::default());

    assert!(matches!(adv.start(), Err(Error::Host(HostError::Busy))));
    assert_eq!(adv.state(), AdvState::Stopped);

    // The next trigger retries
    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingOpen);
}

#[test]
fn test_restart_requests_are_coalesced() {
    let host = MockHost::new();
    let (adv, queue) = controller(&host, vec![], AdvertisingConfig::default());

    adv.on_disconnect();
    adv.request_restart();
    adv.request_restart();
    assert_eq!(queue.len(), 1);
    assert!(matches!(queue.try_next(), Some(Work::StartAdvertising)));

    // Running the start clears the flag
    adv.start().unwrap();
    adv.on_connected();
    adv.on_disconnect();
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_connection_stops_advertising() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![peer(1)], AdvertisingConfig::default());

    adv.start().unwrap();
    adv.on_connected();
    assert_eq!(adv.state(), AdvState::Stopped);
}

#[test]
fn test_pairing_mode_drops_filter() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![peer(1)], AdvertisingConfig::default());

    adv.start().unwrap();
    host.clear_calls();

    assert_eq!(adv.enter_pairing_mode().unwrap(), AdvState::AdvertisingOpen);
    assert!(adv.accept_list().is_empty());
    assert!(host.controller_accept_list().is_empty());
    assert_eq!(
        host.calls(),
        vec![
            HostCall::StopAdvertising,
            HostCall::AcceptListClear,
            HostCall::StartAdvertising(AdvParams::open(ADV_FAST_INT_MIN_2, ADV_FAST_INT_MAX_2)),
        ]
    );
}

#[test]
fn test_pairing_mode_waits_for_link_to_drop() {
    let host = MockHost::new();
    let (adv, queue) = controller(&host, vec![peer(1)], AdvertisingConfig::default());

    adv.start().unwrap();
    adv.on_connected();
    host.clear_calls();

    // Only one peer at a time: no open advertising next to a live link
    assert_eq!(adv.enter_pairing_mode().unwrap(), AdvState::Stopped);
    assert!(adv.pairing_pending());
    assert!(host.calls().is_empty());
    assert_eq!(adv.start().unwrap(), AdvState::Stopped);
    assert!(host.starts().is_empty());

    adv.on_disconnect();
    assert!(matches!(queue.try_next(), Some(Work::StartAdvertising)));
    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingOpen);
    assert!(!adv.pairing_pending());
    assert!(host.controller_accept_list().is_empty());
    assert_eq!(
        host.starts(),
        vec![AdvParams::open(ADV_FAST_INT_MIN_2, ADV_FAST_INT_MAX_2)]
    );

    // The session after that filters again
    adv.on_connected();
    adv.on_disconnect();
    assert_eq!(adv.start().unwrap(), AdvState::AdvertisingFiltered);
}

#[test]
fn test_event_thread_not_blocked_by_host_request() {
    let host = MockHost::new();
    let (adv, queue) = controller(&host, vec![], AdvertisingConfig::default());
    let adv = Arc::new(adv);
    let unblocked = Arc::new(AtomicBool::new(false));

    let (done_tx, done_rx) = crossbeam_channel::bounded(1);
    let hook_adv = adv.clone();
    let hook_unblocked = unblocked.clone();
    host.on_call(move |call| {
        if let HostCall::StartAdvertising(_) = call {
            // The connection lands while the start request is still waiting
            // on the controller, as with a real HCI command
            let adv = hook_adv.clone();
            let done = done_tx.clone();
            thread::spawn(move || {
                adv.on_connected();
                adv.request_restart();
                let _ = done.send(());
            });
            let ok = done_rx.recv_timeout(Duration::from_secs(1)).is_ok();
            hook_unblocked.store(ok, Ordering::SeqCst);
        }
    });

    assert_eq!(adv.start().unwrap(), AdvState::Stopped);
    assert!(unblocked.load(Ordering::SeqCst));
    assert_eq!(adv.state(), AdvState::Stopped);
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_stop() {
    let host = MockHost::new();
    let (adv, _queue) = controller(&host, vec![], AdvertisingConfig::default());

    adv.stop().unwrap();
    assert!(host.calls().is_empty());

    adv.start().unwrap();
    adv.stop().unwrap();
    assert_eq!(adv.state(), AdvState::Stopped);
    assert_eq!(host.calls().last(), Some(&HostCall::StopAdvertising));
}

#[test]
fn test_payload_carries_name_and_service() {
    let host = MockHost::new();
    let config = AdvertisingConfig {
        device_name: "Nordic_LBS".into(),
        ..AdvertisingConfig::default()
    };
    let (adv, _queue) = controller(&host, vec![], config);

    let payload = adv.payload().unwrap();
    assert_eq!(&payload.ad[..3], &[0x02, AD_TYPE_FLAGS, 0x06]);
    assert_eq!(payload.ad[3], 11);
    assert_eq!(payload.ad[4], AD_TYPE_COMPLETE_LOCAL_NAME);
    assert_eq!(&payload.ad[5..], b"Nordic_LBS");

    assert_eq!(payload.sd[0], 17);
    assert_eq!(payload.sd[1], AD_TYPE_128BIT_SERVICE_UUID_COMPLETE);
    assert_eq!(&payload.sd[2..], LBS_SERVICE_UUID.as_bytes_le());
}

#[test]
fn test_press_counter_updates_scan_response() {
    let host = MockHost::new();
    let (adv, _queue) = controller(
        &host,
        vec![],
        AdvertisingConfig::default().with_manufacturer_data(),
    );

    // Not advertising: counted but nothing sent
    assert_eq!(adv.record_press(), 1);
    assert!(host.calls().is_empty());

    adv.start().unwrap();
    assert_eq!(adv.record_press(), 2);
    assert_eq!(
        host.calls().last(),
        Some(&HostCall::UpdateAdvertisingData {
            sd: vec![5, AD_TYPE_MANUFACTURER_SPECIFIC, 0x59, 0x00, 0x02, 0x00]
        })
    );
}
