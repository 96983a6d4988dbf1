//! # Simulated HART Multidrop Bus
//!
//! The bus owns the registry of simulated slaves and carries request frames to
//! them. It models the behaviour a master sees on a real loop:
//!
//! - a garbled frame is dropped and nothing comes back (empty reply);
//! - a frame for an address nobody listens on times out (empty reply, after
//!   the turnaround delay);
//! - otherwise the addressed slave answers, framed with the same number of
//!   preambles the request used.
//!
//! Long frames are routed through a unique-identifier directory that the bus
//! keeps in step with the registry. When a command changes a device's polling
//! address (command 6) or serial number (command 19) the registry is re-keyed
//! atomically, so routing never goes stale.
//!
//! ## Locking
//!
//! One mutex guards the registry and directory and is held only for lookups and
//! re-keying. Each device sits behind its own mutex for the duration of a
//! command, so concurrent transactions against one device are serialized. The
//! simulated delay always elapses outside every lock. Lock order is registry
//! before device.

use crate::constants::{
    HART_ADDRESS_MASK_POLLING, HART_ADDRESS_MASK_PRIMARY_MASTER, HART_CMD_WRITE_POLLING_ADDR,
    HART_CMD_WRITE_SERIAL_NUMBER, HART_DEFAULT_PREAMBLES,
};
use crate::device::fleet::demo_fleet;
use crate::device::{ResponseStatus, SlaveDevice};
use crate::error::HartError;
use crate::hart::frame::{decode, HartFrame};
use crate::hart::request::clamp_preambles;
use crate::logging::log_frame;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

/// A device shared between the bus and its callers.
pub type SharedDevice = Arc<Mutex<SlaveDevice>>;

/// Configuration of the simulated bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    /// Turnaround delay applied to every transaction and scan.
    pub delay_ms: u64,
    pub min_address: u8,
    pub max_address: u8,
    /// Preamble count masters should use; clamped to 3..=7.
    pub preambles: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        BusConfig {
            delay_ms: 200,
            min_address: 0,
            max_address: HART_ADDRESS_MASK_POLLING,
            preambles: HART_DEFAULT_PREAMBLES,
        }
    }
}

impl BusConfig {
    /// Configuration without turnaround delay, handy for tests.
    pub fn instant() -> Self {
        BusConfig {
            delay_ms: 0,
            ..Self::default()
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Parses a JSON configuration; missing fields take their defaults.
    ///
    /// `preambles` is clamped to 3..=7 and `max_address` to 15. A window with
    /// `min_address > max_address` is rejected.
    pub fn from_json_str(json: &str) -> Result<Self, HartError> {
        let mut config: BusConfig = serde_json::from_str(json)?;
        config.preambles = clamp_preambles(config.preambles);
        config.max_address = config.max_address.min(HART_ADDRESS_MASK_POLLING);
        if config.min_address > config.max_address {
            return Err(HartError::Other(format!(
                "Empty address window: min_address {} > max_address {}",
                config.min_address, config.max_address
            )));
        }
        Ok(config)
    }

    /// Loads a JSON configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, HartError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }
}

/// One row of a bus scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceSummary {
    pub address: u8,
    pub unique_id: [u8; 5],
    pub serial_hex: String,
    pub model: String,
    pub manufacturer: String,
}

impl DeviceSummary {
    pub fn unique_id_hex(&self) -> String {
        hex::encode_upper(self.unique_id)
    }
}

struct Entry {
    device: SharedDevice,
    unique_id: [u8; 5],
}

#[derive(Default)]
struct Registry {
    devices: BTreeMap<u8, Entry>,
    directory: HashMap<[u8; 5], u8>,
}

impl Registry {
    /// Drops the directory entry for `unique_id` if it still points at `address`.
    ///
    /// Another registered device carrying the same identifier takes the entry over.
    fn forget(&mut self, unique_id: [u8; 5], address: u8) {
        let key = directory_key(unique_id);
        if self.directory.get(&key) != Some(&address) {
            return;
        }
        self.directory.remove(&key);
        if let Some((&other, _)) = self
            .devices
            .iter()
            .find(|(_, entry)| directory_key(entry.unique_id) == key)
        {
            self.directory.insert(key, other);
        }
    }

    fn insert(&mut self, address: u8, entry: Entry) {
        self.directory.insert(directory_key(entry.unique_id), address);
        if let Some(displaced) = self.devices.insert(address, entry) {
            warn!("Device at polling address {address} was replaced");
            self.forget(displaced.unique_id, address);
        }
    }

    /// Polling address holding `unique_id`, other than `address` itself.
    fn holder_of(&self, unique_id: [u8; 5], address: u8) -> Option<u8> {
        self.directory
            .get(&directory_key(unique_id))
            .copied()
            .filter(|&holder| holder != address)
    }

    /// Why a command would break the one-device-per-address or
    /// one-device-per-identifier rule, if it would.
    fn conflict(&self, frame: &HartFrame, address: u8, entry: &Entry) -> Option<String> {
        match frame.command {
            HART_CMD_WRITE_POLLING_ADDR => {
                let new = frame.data.first()? & HART_ADDRESS_MASK_POLLING;
                (new != address && self.devices.contains_key(&new))
                    .then(|| format!("polling address {new} is in use"))
            }
            HART_CMD_WRITE_SERIAL_NUMBER => {
                let serial = frame.data.get(..3)?;
                let [mid, dtype, ..] = entry.unique_id;
                let unique_id = [mid, dtype, serial[0], serial[1], serial[2]];
                self.holder_of(unique_id, address).map(|holder| {
                    format!(
                        "unique id {} is held by polling address {holder}",
                        hex::encode_upper(unique_id)
                    )
                })
            }
            _ => None,
        }
    }
}

/// Unique identifiers compare without the primary-master bit.
fn directory_key(mut unique_id: [u8; 5]) -> [u8; 5] {
    unique_id[0] &= !HART_ADDRESS_MASK_PRIMARY_MASTER;
    unique_id
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

struct Route {
    address: u8,
    device: SharedDevice,
    conflict: Option<String>,
}

/// The simulated multidrop network.
pub struct HartBus {
    config: Mutex<BusConfig>,
    registry: Mutex<Registry>,
}

impl Default for HartBus {
    fn default() -> Self {
        Self::new(BusConfig::default())
    }
}

impl HartBus {
    pub fn new(config: BusConfig) -> Self {
        HartBus {
            config: Mutex::new(config),
            registry: Mutex::new(Registry::default()),
        }
    }

    /// Bus populated with the fifteen-device demo fleet.
    pub fn with_demo_fleet(config: BusConfig) -> Self {
        let bus = Self::new(config);
        for device in demo_fleet() {
            let address = device.state.polling_address();
            bus.register(address, device);
        }
        bus
    }

    pub fn settings(&self) -> BusConfig {
        lock(&self.config).clone()
    }

    pub fn set_delay(&self, delay_ms: u64) {
        lock(&self.config).delay_ms = delay_ms;
    }

    /// Sets the advertised preamble count, clamped to 3..=7.
    pub fn set_preambles(&self, preambles: usize) {
        lock(&self.config).preambles = clamp_preambles(preambles);
    }

    async fn turnaround(&self) {
        let delay = lock(&self.config).delay();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }

    /// Registers `device` at `address & 0x0F`, replacing any previous occupant.
    pub fn register(&self, address: u8, mut device: SlaveDevice) {
        let address = address & HART_ADDRESS_MASK_POLLING;
        device.state.set_polling_address(address);
        let unique_id = device.state.unique_id();
        info!(
            "Registered {} device {} at polling address {address}",
            device.archetype(),
            hex::encode_upper(unique_id)
        );
        lock(&self.registry).insert(
            address,
            Entry {
                device: Arc::new(Mutex::new(device)),
                unique_id,
            },
        );
    }

    pub fn is_address_taken(&self, address: u8) -> bool {
        lock(&self.registry)
            .devices
            .contains_key(&(address & HART_ADDRESS_MASK_POLLING))
    }

    /// Registered polling addresses in ascending order.
    pub fn addresses(&self) -> Vec<u8> {
        lock(&self.registry).devices.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        lock(&self.registry).devices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Shared handle to the device at `address`.
    pub fn device(&self, address: u8) -> Option<SharedDevice> {
        lock(&self.registry)
            .devices
            .get(&(address & HART_ADDRESS_MASK_POLLING))
            .map(|entry| Arc::clone(&entry.device))
    }

    /// Runs `f` against the device at `address` under its lock.
    pub fn with_device<R>(&self, address: u8, f: impl FnOnce(&mut SlaveDevice) -> R) -> Option<R> {
        let device = self.device(address)?;
        let mut guard = lock(&device);
        Some(f(&mut *guard))
    }

    /// Polling address of the device with `unique_id`, master bit ignored.
    pub fn lookup_unique_id(&self, unique_id: [u8; 5]) -> Option<u8> {
        lock(&self.registry)
            .directory
            .get(&directory_key(unique_id))
            .copied()
    }

    /// Moves the device at `old` to `new`, updating its own polling address.
    ///
    /// Returns `false` when `old == new`, i.e. nothing moved.
    pub fn move_device(&self, old: u8, new: u8) -> Result<bool, HartError> {
        let old = old & HART_ADDRESS_MASK_POLLING;
        let new = new & HART_ADDRESS_MASK_POLLING;
        let mut registry = lock(&self.registry);
        if !registry.devices.contains_key(&old) {
            return Err(HartError::NoDevice(old));
        }
        if old == new {
            return Ok(false);
        }
        if registry.devices.contains_key(&new) {
            return Err(HartError::AddressInUse(new));
        }

        let entry = registry.devices.remove(&old).ok_or(HartError::NoDevice(old))?;
        lock(&entry.device).state.set_polling_address(new);
        registry.forget(entry.unique_id, old);
        registry.insert(new, entry);
        info!("Moved device from polling address {old} to {new}");
        Ok(true)
    }

    /// Lists the registered devices within the configured address window,
    /// in ascending address order.
    pub async fn scan(&self) -> Vec<DeviceSummary> {
        let window = {
            let config = lock(&self.config);
            config.min_address..=config.max_address
        };
        let devices: Vec<DeviceSummary> = {
            let registry = lock(&self.registry);
            registry
                .devices
                .iter()
                .filter(|&(&address, _)| window.contains(&address))
                .map(|(&address, entry)| {
                    let device = lock(&entry.device);
                    DeviceSummary {
                        address,
                        unique_id: device.state.unique_id(),
                        serial_hex: device.state.serial_hex(),
                        model: device.state.model.clone(),
                        manufacturer: device.state.manufacturer.clone(),
                    }
                })
                .collect()
        };
        self.turnaround().await;
        debug!("Scan found {} devices", devices.len());
        devices
    }

    fn resolve(&self, frame: &HartFrame, routing_hint: Option<u8>) -> Option<Route> {
        let registry = lock(&self.registry);
        let address = match frame.polling_address() {
            Some(address) => address,
            None => {
                let unique_id = frame.unique_id()?;
                registry
                    .directory
                    .get(&directory_key(unique_id))
                    .copied()
                    .or_else(|| routing_hint.map(|hint| hint & HART_ADDRESS_MASK_POLLING))?
            }
        };
        let entry = registry.devices.get(&address)?;

        Some(Route {
            address,
            device: Arc::clone(&entry.device),
            conflict: registry.conflict(frame, address, entry),
        })
    }

    /// Re-keys the registry when a command changed a device's address or identity.
    ///
    /// Returns `false` when the new address or identifier was claimed by another
    /// device since the request was routed; the device is then restored to its
    /// registered address and identifier.
    fn reconcile(&self, key: u8, device: &SharedDevice, address: u8, unique_id: [u8; 5]) -> bool {
        let mut registry = lock(&self.registry);
        let registered_id = match registry.devices.get(&key) {
            Some(entry) if Arc::ptr_eq(&entry.device, device) => entry.unique_id,
            _ => return true,
        };
        if key == address && registered_id == unique_id {
            return true;
        }

        let address_taken = address != key && registry.devices.contains_key(&address);
        let id_taken = unique_id != registered_id && registry.holder_of(unique_id, key).is_some();
        if address_taken || id_taken {
            let mut device = lock(device);
            device.state.set_polling_address(key);
            let [_, _, s2, s1, s0] = registered_id;
            device
                .state
                .set_serial_number(u32::from_be_bytes([0, s2, s1, s0]));
            warn!("Device at polling address {key} lost a concurrent re-key; change reverted");
            return false;
        }

        if let Some(entry) = registry.devices.remove(&key) {
            registry.forget(entry.unique_id, key);
            registry.insert(
                address,
                Entry {
                    device: entry.device,
                    unique_id,
                },
            );
            info!(
                "Re-keyed device {} from polling address {key} to {address}",
                hex::encode_upper(unique_id)
            );
        }
        true
    }

    /// Carries one request frame to its slave and returns the framed reply.
    ///
    /// Returns an empty vector when the request cannot be decoded or no device
    /// answers. `routing_hint` is consulted only for long frames whose unique
    /// identifier is not in the directory.
    pub async fn transact(&self, request: &[u8], routing_hint: Option<u8>) -> Vec<u8> {
        log_frame("TX", request);
        let Some(frame) = decode(request) else {
            warn!("Dropped undecodable frame ({} bytes)", request.len());
            return Vec::new();
        };
        if !frame.checksum_valid {
            warn!("Request checksum mismatch: {frame}");
        }

        let Some(route) = self.resolve(&frame, routing_hint) else {
            debug!("No device answered: {frame}");
            self.turnaround().await;
            return Vec::new();
        };

        let (response, address, unique_id) = {
            let mut device = lock(&route.device);
            let response = if let Some(reason) = &route.conflict {
                warn!(
                    "Refusing cmd={} for device {}: {reason}",
                    frame.command, route.address
                );
                device.reject(&frame, ResponseStatus::DeviceError)
            } else {
                device.handle(&frame)
            };
            (
                response,
                device.state.polling_address(),
                device.state.unique_id(),
            )
        };
        let response = if self.reconcile(route.address, &route.device, address, unique_id) {
            response
        } else {
            lock(&route.device).reject(&frame, ResponseStatus::DeviceError)
        };

        let reply = response.to_frame(frame.preambles).unwrap_or_else(|e| {
            error!("Failed to frame response: {e}");
            Vec::new()
        });
        self.turnaround().await;
        log_frame("RX", &reply);
        reply
    }
}
