//! Legacy advertising payload derived from the attribute table.
//!
//! Advertising packet: Flags, then the complete lists of advertised 16-bit
//! and 128-bit service UUIDs. Scan response: the device name as Complete
//! Local Name, or Shortened Local Name when it does not fit.

use heapless::Vec;

use crate::config::LEGACY_ADV_PAYLOAD_LEN;
use crate::error::Error;
use crate::gatt::table::{advertised_services, DEVICE_NAME};
use crate::gatt::Uuid;

pub const AD_TYPE_FLAGS: u8 = 0x01;
pub const AD_TYPE_COMPLETE_UUID16: u8 = 0x03;
pub const AD_TYPE_COMPLETE_UUID128: u8 = 0x07;
pub const AD_TYPE_SHORTENED_LOCAL_NAME: u8 = 0x08;
pub const AD_TYPE_COMPLETE_LOCAL_NAME: u8 = 0x09;

/// LE General Discoverable | BR/EDR Not Supported.
pub const FLAGS_GENERAL_DISCOVERABLE: u8 = 0x06;

/// One legacy advertising packet payload.
pub type Payload = Vec<u8, LEGACY_ADV_PAYLOAD_LEN>;

/// Advertising data and scan response data for one advertising set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdvertisingData {
    pub adv: Payload,
    pub scan_response: Payload,
}

impl AdvertisingData {
    /// Payload for this device's table.
    pub fn for_device() -> Result<Self, Error> {
        Self::build(advertised_services().map(|s| &s.uuid), DEVICE_NAME)
    }

    /// Payload advertising `services` under `name`.
    pub fn build<'a, I>(services: I, name: &[u8]) -> Result<Self, Error>
    where
        I: Iterator<Item = &'a Uuid> + Clone,
    {
        let mut adv = Payload::new();
        push_ad(&mut adv, AD_TYPE_FLAGS, &[FLAGS_GENERAL_DISCOVERABLE])?;
        push_uuid_list(&mut adv, AD_TYPE_COMPLETE_UUID16, services.clone().filter(|u| u.is_short()))?;
        push_uuid_list(&mut adv, AD_TYPE_COMPLETE_UUID128, services.filter(|u| !u.is_short()))?;

        let mut scan_response = Payload::new();
        push_name(&mut scan_response, name)?;

        Ok(Self { adv, scan_response })
    }
}

/// Append one `[len][type][data]` structure.
fn push_ad(buf: &mut Payload, ad_type: u8, data: &[u8]) -> Result<(), Error> {
    if buf.len() + 2 + data.len() > buf.capacity() {
        return Err(Error::AdvertisingDataOverflow);
    }
    buf.extend_from_slice(&[data.len() as u8 + 1, ad_type])
        .map_err(|_| Error::AdvertisingDataOverflow)?;
    buf.extend_from_slice(data)
        .map_err(|_| Error::AdvertisingDataOverflow)
}

fn push_uuid_list<'a>(buf: &mut Payload, ad_type: u8, uuids: impl Iterator<Item = &'a Uuid>) -> Result<(), Error> {
    let mut data: Vec<u8, LEGACY_ADV_PAYLOAD_LEN> = Vec::new();
    for uuid in uuids {
        data.extend_from_slice(uuid.as_bytes())
            .map_err(|_| Error::AdvertisingDataOverflow)?;
    }
    if data.is_empty() {
        return Ok(());
    }
    push_ad(buf, ad_type, &data)
}

/// Name goes in whole if it fits, otherwise truncated as a shortened name.
fn push_name(buf: &mut Payload, name: &[u8]) -> Result<(), Error> {
    let room = buf.capacity().saturating_sub(buf.len() + 2);
    if name.len() <= room {
        push_ad(buf, AD_TYPE_COMPLETE_LOCAL_NAME, name)
    } else {
        push_ad(buf, AD_TYPE_SHORTENED_LOCAL_NAME, &name[..room])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gatt::table::DYNAMIC_SERVICE_UUID;

    #[test]
    fn device_payload_advertises_dynamic_service() {
        let data = AdvertisingData::for_device().unwrap();

        assert_eq!(&data.adv[..3], &[0x02, AD_TYPE_FLAGS, FLAGS_GENERAL_DISCOVERABLE]);
        assert_eq!(data.adv[3], 17);
        assert_eq!(data.adv[4], AD_TYPE_COMPLETE_UUID128);
        assert_eq!(&data.adv[5..21], DYNAMIC_SERVICE_UUID.as_bytes());
        assert_eq!(data.adv.len(), 21);
    }

    #[test]
    fn device_name_goes_in_scan_response() {
        let data = AdvertisingData::for_device().unwrap();
        assert_eq!(data.scan_response[0] as usize, DEVICE_NAME.len() + 1);
        assert_eq!(data.scan_response[1], AD_TYPE_COMPLETE_LOCAL_NAME);
        assert_eq!(&data.scan_response[2..], b"Dynamic Gatt");
    }

    #[test]
    fn short_uuids_are_grouped_in_one_list() {
        let services = [Uuid::short(0x180F), Uuid::short(0x1812)];
        let data = AdvertisingData::build(services.iter(), b"x").unwrap();
        assert_eq!(
            &data.adv[..],
            &[0x02, 0x01, 0x06, 0x05, AD_TYPE_COMPLETE_UUID16, 0x0F, 0x18, 0x12, 0x18]
        );
    }

    #[test]
    fn no_advertised_services_leaves_only_flags() {
        let data = AdvertisingData::build(core::iter::empty(), b"").unwrap();
        assert_eq!(&data.adv[..], &[0x02, 0x01, 0x06]);
        assert_eq!(&data.scan_response[..], &[0x01, AD_TYPE_COMPLETE_LOCAL_NAME]);
    }

    #[test]
    fn two_long_uuids_overflow_legacy_packet() {
        let services = [Uuid::long([1; 16]), Uuid::long([2; 16])];
        assert_eq!(
            AdvertisingData::build(services.iter(), b"x"),
            Err(Error::AdvertisingDataOverflow)
        );
    }

    #[test]
    fn long_name_is_shortened() {
        let name = [b'N'; 40];
        let data = AdvertisingData::build(core::iter::empty(), &name).unwrap();
        assert_eq!(data.scan_response.len(), LEGACY_ADV_PAYLOAD_LEN);
        assert_eq!(data.scan_response[0], 30);
        assert_eq!(data.scan_response[1], AD_TYPE_SHORTENED_LOCAL_NAME);
    }

    #[test]
    fn full_buffer_rejects_more_structures() {
        let mut buf = Payload::new();
        push_ad(&mut buf, AD_TYPE_SHORTENED_LOCAL_NAME, &[b'N'; 29]).unwrap();
        assert_eq!(buf.len(), LEGACY_ADV_PAYLOAD_LEN);

        assert_eq!(push_ad(&mut buf, AD_TYPE_FLAGS, &[]), Err(Error::AdvertisingDataOverflow));
        assert_eq!(push_name(&mut buf, b"x"), Err(Error::AdvertisingDataOverflow));
        assert_eq!(buf.len(), LEGACY_ADV_PAYLOAD_LEN);
        assert_eq!(buf[0], 30);
    }
}
