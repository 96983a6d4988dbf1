//! # Process Variable Simulation
//!
//! Each simulated transmitter owns a [`PhysicsModel`] that produces its primary
//! variable (PV) and the secondary, tertiary and quaternary variables (SV, TV,
//! QV). Models are independent strategies; a device composes one rather than
//! specialising a base device.
//!
//! Readings jitter around an archetype baseline using the device's
//! [`NoiseSource`]. Some models keep state between calls: the flow model
//! integrates a totalizer, the level and temperature models derive secondary
//! values from the last primary reading.

use crate::device::noise::NoiseSource;
use std::fmt;
use std::time::Instant;

/// HART engineering unit codes used by the simulated devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum UnitCode {
    Dimensionless = 0,
    CubicMetersPerHour = 19,
    MetersPerSecond = 21,
    DegreesCelsius = 32,
    Hertz = 38,
    MilliAmperes = 39,
    KiloOhms = 40,
    Ohms = 41,
    CubicMeters = 43,
    Meters = 44,
    Percent = 57,
    Ph = 59,
    Unused = 250,
}

impl UnitCode {
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        let unit = match code {
            0 => UnitCode::Dimensionless,
            19 => UnitCode::CubicMetersPerHour,
            21 => UnitCode::MetersPerSecond,
            32 => UnitCode::DegreesCelsius,
            38 => UnitCode::Hertz,
            39 => UnitCode::MilliAmperes,
            40 => UnitCode::KiloOhms,
            41 => UnitCode::Ohms,
            43 => UnitCode::CubicMeters,
            44 => UnitCode::Meters,
            57 => UnitCode::Percent,
            59 => UnitCode::Ph,
            250 => UnitCode::Unused,
            _ => return None,
        };
        Some(unit)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            UnitCode::Dimensionless => "",
            UnitCode::CubicMetersPerHour => "m3/h",
            UnitCode::MetersPerSecond => "m/s",
            UnitCode::DegreesCelsius => "degC",
            UnitCode::Hertz => "Hz",
            UnitCode::MilliAmperes => "mA",
            UnitCode::KiloOhms => "kOhm",
            UnitCode::Ohms => "Ohm",
            UnitCode::CubicMeters => "m3",
            UnitCode::Meters => "m",
            UnitCode::Percent => "%",
            UnitCode::Ph => "pH",
            UnitCode::Unused => "unused",
        }
    }
}

/// A value with its engineering unit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Reading {
    pub value: f64,
    pub unit: UnitCode,
}

impl Reading {
    pub fn new(value: f64, unit: UnitCode) -> Self {
        Reading { value, unit }
    }

    /// Placeholder for a variable slot the device does not use.
    pub fn unused() -> Self {
        Reading::new(0.0, UnitCode::Unused)
    }
}

impl fmt::Display for Reading {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} {}", self.value, self.unit.symbol())
    }
}

/// Device archetypes of the simulated fleet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Archetype {
    Level,
    Flow,
    Ph,
    Temperature,
    Turbidity,
}

impl Archetype {
    /// Physics model with this archetype's defaults for a device at `polling_address`.
    pub fn model(self, polling_address: u8) -> Box<dyn PhysicsModel> {
        match self {
            Archetype::Level => Box::new(LevelModel::new(polling_address)),
            Archetype::Flow => Box::new(FlowModel::new(polling_address)),
            Archetype::Ph => Box::new(PhModel::new(7.0, 7.0)),
            Archetype::Temperature => Box::new(TemperatureModel::new()),
            Archetype::Turbidity => Box::new(TurbidityModel::new()),
        }
    }
}

impl fmt::Display for Archetype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Archetype::Level => "level",
            Archetype::Flow => "flow",
            Archetype::Ph => "pH",
            Archetype::Temperature => "temperature",
            Archetype::Turbidity => "turbidity",
        };
        f.write_str(name)
    }
}

/// Process-variable generation strategy of a simulated device.
pub trait PhysicsModel: Send {
    fn archetype(&self) -> Archetype;

    /// Primary variable and its unit.
    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading;

    /// SV, TV and QV.
    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3];

    /// Default `(lower, upper)` range of the primary variable.
    fn default_range(&self) -> (f64, f64) {
        (0.0, 100.0)
    }

    /// Default variable classes reported by command 8.
    fn variable_classes(&self) -> [u8; 4] {
        [0; 4]
    }
}

/// Radar level transmitter mounted above a tank.
#[derive(Debug, Clone)]
pub struct LevelModel {
    base_level: f64,
    mounting_height: f64,
    tank_height: f64,
    last_level: f64,
}

impl LevelModel {
    pub fn new(polling_address: u8) -> Self {
        let mut base_level = 2.0 + f64::from(polling_address) * 0.5;
        if base_level > 5.5 {
            base_level = 3.5;
        }
        LevelModel {
            base_level,
            mounting_height: 6.5,
            tank_height: 6.0,
            last_level: 0.0,
        }
    }
}

impl PhysicsModel for LevelModel {
    fn archetype(&self) -> Archetype {
        Archetype::Level
    }

    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading {
        let level = (self.base_level + noise.uniform(-0.005, 0.005)).clamp(0.0, self.tank_height);
        self.last_level = level;
        Reading::new(level, UnitCode::Meters)
    }

    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3] {
        // Distance from the flange to the surface follows the last level reading.
        let distance = (self.mounting_height - self.last_level).max(0.0);
        let electronics_temp = 28.0 + noise.uniform(-0.5, 0.5);
        let echo_amplitude = 55.0 + noise.uniform(-2.0, 2.0);
        [
            Reading::new(distance, UnitCode::Meters),
            Reading::new(electronics_temp, UnitCode::DegreesCelsius),
            Reading::new(echo_amplitude, UnitCode::Dimensionless),
        ]
    }

    fn default_range(&self) -> (f64, f64) {
        (0.0, 6.0)
    }

    fn variable_classes(&self) -> [u8; 4] {
        [2, 0, 0, 0]
    }
}

/// Magnetic flow meter with a volume totalizer.
#[derive(Debug, Clone)]
pub struct FlowModel {
    base_flow: f64,
    last_flow: f64,
    totalizer: f64,
    last_update: Instant,
}

impl FlowModel {
    pub fn new(polling_address: u8) -> Self {
        FlowModel {
            base_flow: if polling_address == 7 { 52.0 } else { 55.0 },
            last_flow: 0.0,
            totalizer: 12345.67,
            last_update: Instant::now(),
        }
    }

    /// Accumulated volume in m3.
    pub fn totalizer(&self) -> f64 {
        self.totalizer
    }

    /// Adds `flow (m3/h) * elapsed / 3600` using the last flow reading.
    pub fn integrate(&mut self, elapsed_secs: f64) {
        if self.last_flow > 0.0 && elapsed_secs > 0.0 {
            self.totalizer += self.last_flow * elapsed_secs / 3600.0;
        }
    }
}

impl PhysicsModel for FlowModel {
    fn archetype(&self) -> Archetype {
        Archetype::Flow
    }

    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading {
        self.last_flow = self.base_flow + noise.uniform(-0.5, 0.5);
        Reading::new(self.last_flow, UnitCode::CubicMetersPerHour)
    }

    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3] {
        let now = Instant::now();
        let elapsed = now.duration_since(self.last_update).as_secs_f64();
        self.last_update = now;
        self.integrate(elapsed);

        // DN100 pipe: velocity is flow over a fixed section factor.
        let velocity = self.last_flow / 28.3;
        let coil_frequency = 37.5 + noise.uniform(-0.1, 0.1);
        [
            Reading::new(self.totalizer, UnitCode::CubicMeters),
            Reading::new(velocity, UnitCode::MetersPerSecond),
            Reading::new(coil_frequency, UnitCode::Hertz),
        ]
    }

    fn variable_classes(&self) -> [u8; 4] {
        [1, 0, 0, 0]
    }
}

/// pH analyser with a glass electrode.
#[derive(Debug, Clone)]
pub struct PhModel {
    normal_min: f64,
    normal_max: f64,
}

impl PhModel {
    /// A single value (`min == max`) jitters by ±0.05; a band is sampled
    /// uniformly and jittered by ±0.02.
    pub fn new(normal_min: f64, normal_max: f64) -> Self {
        PhModel {
            normal_min,
            normal_max,
        }
    }
}

impl PhysicsModel for PhModel {
    fn archetype(&self) -> Archetype {
        Archetype::Ph
    }

    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading {
        let value = if self.normal_min == self.normal_max {
            self.normal_min + noise.uniform(-0.05, 0.05)
        } else {
            noise.uniform(self.normal_min, self.normal_max) + noise.uniform(-0.02, 0.02)
        };
        Reading::new(value.clamp(0.0, 14.0), UnitCode::Ph)
    }

    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3] {
        let process_temp = 22.0 + noise.uniform(-0.5, 0.5);
        let glass_impedance = 120_000.0 + noise.uniform(-500.0, 500.0);
        let reference_impedance = 25.0 + noise.uniform(-0.5, 0.5);
        [
            Reading::new(process_temp, UnitCode::DegreesCelsius),
            Reading::new(glass_impedance, UnitCode::KiloOhms),
            Reading::new(reference_impedance, UnitCode::KiloOhms),
        ]
    }

    fn default_range(&self) -> (f64, f64) {
        (0.0, 14.0)
    }
}

/// Pt100 temperature transmitter.
#[derive(Debug, Clone)]
pub struct TemperatureModel {
    base_temp: f64,
    last_temp: f64,
}

impl TemperatureModel {
    pub fn new() -> Self {
        TemperatureModel {
            base_temp: 21.0,
            last_temp: 20.0,
        }
    }
}

impl Default for TemperatureModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsModel for TemperatureModel {
    fn archetype(&self) -> Archetype {
        Archetype::Temperature
    }

    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading {
        self.last_temp = self.base_temp + noise.uniform(-0.2, 0.2);
        Reading::new(self.last_temp, UnitCode::DegreesCelsius)
    }

    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3] {
        let terminal_temp = 25.0 + noise.uniform(-0.1, 0.1);
        let resistance = 100.0 + 0.385 * self.last_temp;
        [
            Reading::new(terminal_temp, UnitCode::DegreesCelsius),
            Reading::new(resistance, UnitCode::Ohms),
            Reading::unused(),
        ]
    }
}

/// Optical transparency (turbidity) sensor.
#[derive(Debug, Clone)]
pub struct TurbidityModel {
    base_transparency: f64,
}

impl TurbidityModel {
    pub fn new() -> Self {
        TurbidityModel {
            base_transparency: 88.0,
        }
    }
}

impl Default for TurbidityModel {
    fn default() -> Self {
        Self::new()
    }
}

impl PhysicsModel for TurbidityModel {
    fn archetype(&self) -> Archetype {
        Archetype::Turbidity
    }

    fn read_primary_variable(&mut self, noise: &mut dyn NoiseSource) -> Reading {
        let value = (self.base_transparency + noise.uniform(-0.5, 0.5)).clamp(0.0, 100.0);
        Reading::new(value, UnitCode::Percent)
    }

    fn read_secondary_variables(&mut self, noise: &mut dyn NoiseSource) -> [Reading; 3] {
        // Photocurrent grows with transparency, ~500 at full scale.
        let photocurrent = 500.0 * (self.base_transparency / 100.0) + noise.uniform(-2.0, 2.0);
        let temp = 20.0 + noise.uniform(-0.5, 0.5);
        [
            Reading::new(photocurrent, UnitCode::MilliAmperes),
            Reading::new(temp, UnitCode::DegreesCelsius),
            Reading::unused(),
        ]
    }
}
