//! GATT database description.
//!
//! The database is declared as two constant tables in [`table`]:
//!
//! 1. **Services** - kind, advertisement flag and UUID.
//! 2. **Characteristics** - owning service, access properties, security,
//!    flags, UUID and initial value.
//!
//! [`db::initialize`] registers both tables with the Bluetooth stack in a
//! single session at boot and returns the assigned handles.

pub mod db;
pub mod table;
pub mod uuid;

pub use db::{initialize, GattDatabase};
pub use table::{CharacteristicIndex, ServiceIndex, CHARACTERISTICS, SERVICES};
pub use uuid::Uuid;

/// Primary or secondary service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceKind {
    Primary,
    Secondary,
}

/// Characteristic access properties (bit flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Properties(u16);

impl Properties {
    pub const NONE: Properties = Properties(0);
    pub const BROADCAST: Properties = Properties(0x0001);
    pub const READ: Properties = Properties(0x0002);
    pub const WRITE_NO_RESPONSE: Properties = Properties(0x0004);
    pub const WRITE: Properties = Properties(0x0008);
    pub const NOTIFY: Properties = Properties(0x0010);
    pub const INDICATE: Properties = Properties(0x0020);
    pub const EXTENDED_PROPERTIES: Properties = Properties(0x0080);
    /// Extended-property bit only; never implies `BROADCAST`.
    pub const RELIABLE_WRITE: Properties = Properties(0x0100);

    pub const fn union(self, other: Properties) -> Properties {
        Properties(self.0 | other.0)
    }

    pub const fn contains(self, other: Properties) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

/// Security required to access a characteristic value (bit flags).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Security(u16);

impl Security {
    pub const NONE: Security = Security(0);
    pub const ENCRYPTED_READ: Security = Security(0x0001);
    pub const BONDED_READ: Security = Security(0x0002);
    pub const AUTHENTICATED_READ: Security = Security(0x0004);
    pub const ENCRYPTED_WRITE: Security = Security(0x0008);
    pub const BONDED_WRITE: Security = Security(0x0010);
    pub const AUTHENTICATED_WRITE: Security = Security(0x0020);
    pub const ENCRYPTED_NOTIFY: Security = Security(0x0040);
    pub const BONDED_NOTIFY: Security = Security(0x0080);
    pub const AUTHENTICATED_NOTIFY: Security = Security(0x0100);

    pub const fn union(self, other: Security) -> Security {
        Security(self.0 | other.0)
    }

    pub const fn contains(self, other: Security) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u16 {
        self.0
    }
}

/// Characteristic behaviour flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharFlags(u8);

impl CharFlags {
    pub const NONE: CharFlags = CharFlags(0);
    /// Do not add a CCCD automatically for notify/indicate characteristics.
    pub const NO_AUTO_CCCD: CharFlags = CharFlags(0x01);

    pub const fn contains(self, other: CharFlags) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn bits(self) -> u8 {
        self.0
    }
}

/// How the stack stores a characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ValueKind {
    /// Every write must carry exactly `max_len` bytes.
    FixedLength,
    /// Writes may carry up to `max_len` bytes.
    VariableLength,
    /// The application answers reads and writes itself.
    UserManaged,
}

/// One row of the service table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceDecl {
    pub name: &'static str,
    pub kind: ServiceKind,
    /// Include this service's UUID in advertising data.
    pub advertised: bool,
    pub uuid: Uuid,
}

/// One row of the characteristic table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicDecl {
    pub name: &'static str,
    pub service: ServiceIndex,
    pub properties: Properties,
    pub security: Security,
    pub flags: CharFlags,
    pub uuid: Uuid,
    pub value_kind: ValueKind,
    pub max_len: u16,
    /// Initial value; its length is the current length at registration.
    pub value: &'static [u8],
}

impl CharacteristicDecl {
    /// Current value length as the stack expects it.
    pub fn value_len(&self) -> u16 {
        // Table construction asserts value.len() <= max_len: u16.
        self.value.len() as u16
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reliable_write_is_independent_of_broadcast() {
        let props = Properties::WRITE.union(Properties::RELIABLE_WRITE);
        assert!(props.contains(Properties::RELIABLE_WRITE));
        assert!(props.contains(Properties::WRITE));
        assert!(!props.contains(Properties::BROADCAST));
        assert!(!Properties::BROADCAST.contains(Properties::RELIABLE_WRITE));
        assert_eq!(Properties::RELIABLE_WRITE.bits(), 0x0100);
    }

    #[test]
    fn properties_bits_do_not_overlap() {
        let all = [
            Properties::BROADCAST,
            Properties::READ,
            Properties::WRITE_NO_RESPONSE,
            Properties::WRITE,
            Properties::NOTIFY,
            Properties::INDICATE,
            Properties::EXTENDED_PROPERTIES,
            Properties::RELIABLE_WRITE,
        ];
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert_eq!(a.bits() & b.bits(), 0);
            }
        }
    }
}
