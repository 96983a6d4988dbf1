//! End-to-end scenarios against the demo fleet
//!
//! These tests drive the master facade through complete workflows: scanning,
//! reading process data and writing device configuration over the bus.

use hart_rs::{BusConfig, FrameFormat, HartBus, HartMaster, ResponseStatus};
use std::sync::Arc;

fn demo_master() -> HartMaster {
    HartMaster::new(Arc::new(HartBus::with_demo_fleet(BusConfig::instant())))
}

fn f32_at(payload: &[u8], offset: usize) -> f32 {
    f32::from_be_bytes(payload[offset..offset + 4].try_into().unwrap())
}

fn padded(text: &str, width: usize) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    bytes.resize(width, b' ');
    bytes
}

#[tokio::test]
async fn e2e_scan_demo_fleet() {
    let mut master = demo_master();
    let devices = master.scan().await;
    assert_eq!(devices.len(), 15);
    assert!(devices.windows(2).all(|w| w[0].address < w[1].address));
    assert_eq!(devices[0].model, "VEGAPULS 64");
    assert_eq!(devices[5].manufacturer, "Rosemount");
    assert_eq!(devices[7].model, "InPro 8000");
    assert_eq!(devices[8].manufacturer, "Endress+Hauser");
    assert_eq!(devices[14].model, "SITRANS TH");
}

#[tokio::test]
async fn e2e_flow_loop_current() {
    let master = demo_master();
    let reply = master.request(6, 2, &[]).await.unwrap().unwrap();
    assert_eq!(reply.status(), Some((0, 0)));
    assert_eq!(reply.payload.len(), 9);
    assert_eq!(f32_at(&reply.payload, 0), 4.0);
    assert_eq!(reply.payload[4], 0);
    let percent = f32_at(&reply.payload, 5);
    assert!((0.0..=100.0).contains(&percent), "percent {percent}");
}

#[tokio::test]
async fn e2e_write_and_read_tag_descriptor_date() {
    let master = demo_master();
    let mut data = padded("TANK1", 8);
    data.extend(padded("Level Sensor", 16));
    data.extend([24, 8, 0x07, 0xE9]);

    let reply = master.request(1, 18, &data).await.unwrap().unwrap();
    assert_eq!(reply.status(), Some((0, 0)));
    assert_eq!(reply.payload, data);

    let reply = master.request(1, 13, &[]).await.unwrap().unwrap();
    assert_eq!(reply.payload, data);

    let state = master.bus().with_device(1, |d| d.state.clone()).unwrap();
    assert_eq!(state.tag, "TANK1");
    assert_eq!(state.descriptor, "Level Sensor");
    assert_eq!(
        state.date.to_naive_date(),
        chrono::NaiveDate::from_ymd_opt(2025, 8, 24)
    );
    assert_eq!(state.config_change_counter(), 1);
}

#[tokio::test]
async fn e2e_readdress_then_query() {
    let master = demo_master();
    // Address 0 is free in the demo fleet.
    let reply = master.request(3, 6, &[0]).await.unwrap().unwrap();
    assert_eq!(reply.payload, vec![0]);
    assert!(master.request(3, 0, &[]).await.unwrap().is_none());

    // At address 0 the level transmitter drives the analog loop.
    let reply = master.request(0, 2, &[]).await.unwrap().unwrap();
    let milliamps = f32_at(&reply.payload, 0);
    assert!((3.8..=20.8).contains(&milliamps), "loop current {milliamps}");

    // Moving onto an occupied address is refused.
    let reply = master.request(0, 6, &[4]).await.unwrap().unwrap();
    let (s1, s2) = reply.status().unwrap();
    assert_eq!(ResponseStatus::from_bytes(s1, s2), Some(ResponseStatus::DeviceError));
}

#[tokio::test]
async fn e2e_long_frames_after_scan() {
    let mut master = demo_master();
    master.scan().await;
    master.set_frame_format(FrameFormat::Long);

    let reply = master.request(8, 1, &[]).await.unwrap().unwrap();
    assert!(reply.frame.is_long());
    assert_eq!(reply.payload[0], 57);
    let transparency = f32_at(&reply.payload, 1);
    assert!((0.0..=100.0).contains(&transparency));

    // Serial change keeps long addressing working after a rescan.
    let reply = master.request(8, 19, &[0, 0, 0x42]).await.unwrap().unwrap();
    assert_eq!(reply.payload, vec![0, 0, 0x42]);
    master.scan().await;
    let reply = master.request(8, 16, &[]).await.unwrap().unwrap();
    assert_eq!(reply.payload, vec![0, 0, 0x42]);
    assert_eq!(reply.frame.unique_id(), Some([0x4A, 0x10, 0, 0, 0x42]));
}

#[tokio::test]
async fn e2e_read_all_dynamic_variables() {
    let master = demo_master();
    for address in 1..=15 {
        let reply = master.request(address, 3, &[]).await.unwrap().unwrap();
        assert_eq!(reply.status(), Some((0, 0)), "address {address}");
        assert_eq!(reply.payload.len(), 24, "address {address}");
        assert_eq!(f32_at(&reply.payload, 0), 4.0);
    }
}
