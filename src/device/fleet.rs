//! Demo fleet of fifteen transmitters populating polling addresses 1..=15.

use crate::device::physics::{Archetype, PhModel};
use crate::device::{DeviceState, SlaveDevice};

// Manufacturer ids
pub const MANUFACTURER_VEGA: u8 = 0x3E;
pub const MANUFACTURER_ROSEMOUNT: u8 = 0x1A;
pub const MANUFACTURER_METTLER: u8 = 0x4A;
pub const MANUFACTURER_ENDRESS_HAUSER: u8 = 0x11;
pub const MANUFACTURER_SIEMENS: u8 = 0x2A;

// Device types
pub const DEVICE_TYPE_RADAR: u8 = 0xE9;
pub const DEVICE_TYPE_MAG_FLOW: u8 = 0x32;
pub const DEVICE_TYPE_TURBIDITY: u8 = 0x10;
pub const DEVICE_TYPE_PH: u8 = 0x15;
pub const DEVICE_TYPE_TEMPERATURE: u8 = 0x06;

/// Builds one fleet member at `address`, or `None` for an address the fleet leaves empty.
pub fn demo_device(address: u8) -> Option<SlaveDevice> {
    let device = match address {
        1..=5 => SlaveDevice::of_archetype(
            DeviceState::new(
                address,
                &format!("LVL-00{address}"),
                "VEGAPULS 64",
                "Vega",
                10000 + u32::from(address),
            )
            .with_identity(MANUFACTURER_VEGA, DEVICE_TYPE_RADAR),
            Archetype::Level,
        ),
        6 | 7 => SlaveDevice::of_archetype(
            DeviceState::new(
                address,
                &format!("FLW-00{address}"),
                "8732E",
                "Rosemount",
                20000 + u32::from(address),
            )
            .with_identity(MANUFACTURER_ROSEMOUNT, DEVICE_TYPE_MAG_FLOW),
            Archetype::Flow,
        ),
        8 => SlaveDevice::of_archetype(
            DeviceState::new(address, "TRS-001", "InPro 8000", "Mettler", 30001)
                .with_identity(MANUFACTURER_METTLER, DEVICE_TYPE_TURBIDITY),
            Archetype::Turbidity,
        ),
        9..=11 => SlaveDevice::new(
            DeviceState::new(
                address,
                &format!("PH-00{}", address - 8),
                "Liquiline",
                "Endress+Hauser",
                40000 + u32::from(address),
            )
            .with_identity(MANUFACTURER_ENDRESS_HAUSER, DEVICE_TYPE_PH),
            Box::new(PhModel::new(7.0, 7.0)),
        ),
        12..=15 => SlaveDevice::of_archetype(
            DeviceState::new(
                address,
                &format!("TEMP-00{}", address - 11),
                "SITRANS TH",
                "Siemens",
                50000 + u32::from(address),
            )
            .with_identity(MANUFACTURER_SIEMENS, DEVICE_TYPE_TEMPERATURE),
            Archetype::Temperature,
        ),
        _ => return None,
    };
    Some(device)
}

/// The full demo fleet in address order.
pub fn demo_fleet() -> Vec<SlaveDevice> {
    (1..=15).filter_map(demo_device).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fleet_covers_addresses_one_to_fifteen() {
        let fleet = demo_fleet();
        assert_eq!(fleet.len(), 15);
        for (i, device) in fleet.iter().enumerate() {
            assert_eq!(device.state.polling_address(), i as u8 + 1);
        }
        assert!(demo_device(0).is_none());
    }

    #[test]
    fn test_fleet_archetypes_and_identity() {
        let level = demo_device(1).unwrap();
        assert_eq!(level.archetype(), Archetype::Level);
        assert_eq!(level.state.tag, "LVL-001");
        assert_eq!(level.state.unique_id_hex(), "3EE9002711");

        let flow = demo_device(7).unwrap();
        assert_eq!(flow.archetype(), Archetype::Flow);
        assert_eq!(flow.state.serial_number(), 20007);

        assert_eq!(demo_device(8).unwrap().archetype(), Archetype::Turbidity);
        assert_eq!(demo_device(10).unwrap().state.tag, "PH-002");
        assert_eq!(demo_device(15).unwrap().state.tag, "TEMP-004");
    }
}
