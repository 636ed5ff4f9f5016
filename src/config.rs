//! Application-wide constants and compile-time configuration.
//!
//! Advertising timing, handle sentinels and SoftDevice sizing live here
//! so they can be tuned in one place.

// Advertising

/// Advertising interval (in 0.625 ms units). 160 = 100 ms.
pub const ADV_INTERVAL_MIN: u32 = 160;
pub const ADV_INTERVAL_MAX: u32 = 160;

/// Advertising duration (in 10 ms units). 0 = advertise until stopped.
pub const ADV_DURATION: u16 = 0;

/// Maximum number of advertising events. 0 = no limit.
pub const ADV_MAX_EVENTS: u8 = 0;

/// Payload size of a legacy advertising / scan response packet.
pub const LEGACY_ADV_PAYLOAD_LEN: usize = 31;

// Handles

/// Raw value the stack reports for an attribute that was never registered.
pub const HANDLE_UNASSIGNED: u16 = 0xFFFF;

// SoftDevice sizing (used by the embedded binary)

/// Concurrent peripheral links.
pub const CONN_COUNT: u8 = 1;

/// Connection event length (in 1.25 ms units).
pub const CONN_EVENT_LENGTH: u16 = 24;

/// ATT MTU negotiated up to this size.
pub const ATT_MTU: u16 = 247;

/// Attribute table size reserved in SoftDevice RAM (bytes, multiple of 4).
pub const ATTR_TAB_SIZE: u32 = 1408;

/// Number of advertising sets the SoftDevice allocates.
pub const ADV_SET_COUNT: u8 = 1;
