//! Events delivered by the Bluetooth stack.

use crate::stack::AdvertisingSet;

/// Vendor message id of the system boot event.
pub const EVT_SYSTEM_BOOT_ID: u32 = 0x0001_00a0;
/// Vendor message id of the connection opened event.
pub const EVT_CONNECTION_OPENED_ID: u32 = 0x0006_00a0;
/// Vendor message id of the connection closed event.
pub const EVT_CONNECTION_CLOSED_ID: u32 = 0x0106_00a0;

/// Stack version reported with the boot event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootInfo {
    pub major: u16,
    pub minor: u16,
    pub patch: u16,
}

/// A tagged event record; the tag selects the dispatcher branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Event {
    /// The device started and the radio is ready. No stack command may be
    /// issued before this arrives.
    SystemBoot(BootInfo),
    /// A central connected through one of our advertising sets.
    ConnectionOpened {
        connection: u8,
        advertiser: Option<AdvertisingSet>,
    },
    /// A connection was closed. `reason` is the HCI reason if known.
    ConnectionClosed { connection: u8, reason: Option<u16> },
    /// Anything this application does not handle.
    Other { id: u32 },
}

impl Event {
    pub fn id(&self) -> u32 {
        match self {
            Event::SystemBoot(_) => EVT_SYSTEM_BOOT_ID,
            Event::ConnectionOpened { .. } => EVT_CONNECTION_OPENED_ID,
            Event::ConnectionClosed { .. } => EVT_CONNECTION_CLOSED_ID,
            Event::Other { id } => *id,
        }
    }
}

/// Connection id for a stack connection handle.
///
/// `None` when the link is already gone or the handle does not fit the
/// event's 8-bit field. Handle 0 is a real connection.
pub fn connection_id(handle: Option<u16>) -> Option<u8> {
    handle.and_then(|h| u8::try_from(h).ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connection_id_keeps_handle_zero() {
        assert_eq!(connection_id(Some(0)), Some(0));
        assert_eq!(connection_id(Some(7)), Some(7));
        assert_eq!(connection_id(None), None);
        assert_eq!(connection_id(Some(0x0100)), None);
    }

    #[test]
    fn ids_follow_variant() {
        assert_eq!(Event::SystemBoot(BootInfo::default()).id(), EVT_SYSTEM_BOOT_ID);
        assert_eq!(
            Event::ConnectionClosed {
                connection: 1,
                reason: None
            }
            .id(),
            EVT_CONNECTION_CLOSED_ID
        );
        assert_eq!(Event::Other { id: 0x0203_00a0 }.id(), 0x0203_00a0);
    }
}
