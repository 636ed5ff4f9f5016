//! Bluetooth UUIDs as they appear in the attribute table.
//!
//! Bytes are stored little-endian (on-air order), so `0x1800` is
//! `[0x00, 0x18]`.

use crate::error::Error;

/// Length of a Bluetooth SIG assigned (16-bit) UUID.
pub const UUID_16_LEN: usize = 2;

/// Length of a vendor-specific UUID.
pub const UUID_128_LEN: usize = 16;

/// A 16-bit or 128-bit UUID. The variant selects the stack registration call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Uuid {
    Short([u8; UUID_16_LEN]),
    Long([u8; UUID_128_LEN]),
}

impl Uuid {
    /// SIG assigned number, e.g. `Uuid::short(0x2A00)`.
    pub const fn short(uuid: u16) -> Self {
        Uuid::Short(uuid.to_le_bytes())
    }

    /// Vendor UUID from little-endian bytes.
    pub const fn long(bytes: [u8; UUID_128_LEN]) -> Self {
        Uuid::Long(bytes)
    }

    /// Parse raw little-endian bytes. Only 2 and 16 byte inputs are valid.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        if let Ok(short) = <[u8; UUID_16_LEN]>::try_from(bytes) {
            return Ok(Uuid::Short(short));
        }
        if let Ok(long) = <[u8; UUID_128_LEN]>::try_from(bytes) {
            return Ok(Uuid::Long(long));
        }
        Err(Error::InvalidParameter)
    }

    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Uuid::Short(b) => b,
            Uuid::Long(b) => b,
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_short(&self) -> bool {
        matches!(self, Uuid::Short(_))
    }

    /// The 16-bit assigned number, if this is a short UUID.
    pub fn as_u16(&self) -> Option<u16> {
        match self {
            Uuid::Short(b) => Some(u16::from_le_bytes(*b)),
            Uuid::Long(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_uuid_is_little_endian() {
        let uuid = Uuid::short(0x1800);
        assert_eq!(uuid.as_bytes(), &[0x00, 0x18]);
        assert_eq!(uuid.as_u16(), Some(0x1800));
        assert!(uuid.is_short());
    }

    #[test]
    fn from_bytes_accepts_16_and_128_bit() {
        assert_eq!(Uuid::from_bytes(&[0x0A, 0x18]), Ok(Uuid::short(0x180A)));

        let raw = [0xAAu8; 16];
        let uuid = Uuid::from_bytes(&raw).unwrap();
        assert_eq!(uuid, Uuid::long(raw));
        assert_eq!(uuid.len(), UUID_128_LEN);
        assert_eq!(uuid.as_u16(), None);
    }

    #[test]
    fn from_bytes_rejects_other_lengths() {
        for len in [0usize, 1, 3, 4, 15, 17, 32] {
            let raw = [0u8; 32];
            assert_eq!(
                Uuid::from_bytes(&raw[..len]),
                Err(Error::InvalidParameter),
                "length {} must be rejected",
                len
            );
        }
    }
}
