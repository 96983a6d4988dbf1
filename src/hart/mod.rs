//! # HART Link Layer
//!
//! Frame codec, master request builder and the simulated multidrop bus.

pub mod bus;
pub mod frame;
pub mod request;

pub use bus::{BusConfig, DeviceSummary, HartBus, SharedDevice};
pub use frame::{
    checksum, decode, decode_response, encode, long_address, short_address, verify_checksum,
    HartFrame, ParsedResponse, StartDelimiter,
};
pub use request::{clamp_preambles, FrameFormat, RequestBuilder};
