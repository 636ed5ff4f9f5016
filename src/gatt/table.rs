//! The attribute table exposed by this device.
//!
//! Order matters: services and characteristics are registered in the
//! order listed here.

use super::{CharFlags, CharacteristicDecl, Properties, Security, ServiceDecl, ServiceKind, Uuid, ValueKind};

pub const SERVICES_COUNT: usize = 3;
pub const CHARACTERISTICS_COUNT: usize = 5;

/// Named position in [`SERVICES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ServiceIndex {
    GenericAccess,
    DeviceInformation,
    DynamicService,
}

impl ServiceIndex {
    pub const ALL: [ServiceIndex; SERVICES_COUNT] = [
        ServiceIndex::GenericAccess,
        ServiceIndex::DeviceInformation,
        ServiceIndex::DynamicService,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn decl(self) -> &'static ServiceDecl {
        &SERVICES[self.index()]
    }
}

/// Named position in [`CHARACTERISTICS`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CharacteristicIndex {
    DeviceName,
    Appearance,
    ManufacturerName,
    SystemId,
    DynamicChar,
}

impl CharacteristicIndex {
    pub const ALL: [CharacteristicIndex; CHARACTERISTICS_COUNT] = [
        CharacteristicIndex::DeviceName,
        CharacteristicIndex::Appearance,
        CharacteristicIndex::ManufacturerName,
        CharacteristicIndex::SystemId,
        CharacteristicIndex::DynamicChar,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn decl(self) -> &'static CharacteristicDecl {
        &CHARACTERISTICS[self.index()]
    }
}

// Services

/// Dynamic service: 0a41a396-dc2b-4699-b58b-4a8386c2b2c1
pub const DYNAMIC_SERVICE_UUID: Uuid = Uuid::long([
    0xc1, 0xb2, 0xc2, 0x86, 0x83, 0x4a, 0x8b, 0xb5, 0x99, 0x46, 0x2b, 0xdc, 0x96, 0xa3, 0x41, 0x0a,
]);

pub const SERVICES: [ServiceDecl; SERVICES_COUNT] = [
    ServiceDecl {
        name: "Generic Access",
        kind: ServiceKind::Primary,
        advertised: false,
        uuid: Uuid::short(0x1800),
    },
    ServiceDecl {
        name: "Device Information",
        kind: ServiceKind::Primary,
        advertised: false,
        uuid: Uuid::short(0x180A),
    },
    ServiceDecl {
        name: "Dynamic Service",
        kind: ServiceKind::Primary,
        advertised: true,
        uuid: DYNAMIC_SERVICE_UUID,
    },
];

// Characteristics

/// Dynamic characteristic: bb6cb196-443b-40d0-a4c3-3680f3a13c72
pub const DYNAMIC_CHAR_UUID: Uuid = Uuid::long([
    0x72, 0x3c, 0xa1, 0xf3, 0x80, 0x36, 0xc3, 0xa4, 0xd0, 0x40, 0x3b, 0x44, 0x96, 0xb1, 0x6c, 0xbb,
]);

// Stored without a NUL terminator: max_len is the visible length (12), not 13.
pub const DEVICE_NAME: &[u8] = b"Dynamic Gatt";
pub const MANUFACTURER_NAME: &[u8] = b"Silicon Labs";

/// Generic appearance, unknown category.
const APPEARANCE: &[u8] = &[0x00, 0x00];
const SYSTEM_ID: &[u8] = &[0x00; 8];
const DYNAMIC_CHAR_VALUE: &[u8] = &[0x00; 2];

/// Unsecured, flagless, fixed-length characteristic sized to its initial value.
const fn fixed(
    name: &'static str,
    service: ServiceIndex,
    properties: Properties,
    uuid: Uuid,
    value: &'static [u8],
) -> CharacteristicDecl {
    CharacteristicDecl {
        name,
        service,
        properties,
        security: Security::NONE,
        flags: CharFlags::NONE,
        uuid,
        value_kind: ValueKind::FixedLength,
        max_len: value.len() as u16,
        value,
    }
}

pub const CHARACTERISTICS: [CharacteristicDecl; CHARACTERISTICS_COUNT] = [
    fixed(
        "Device Name",
        ServiceIndex::GenericAccess,
        Properties::READ.union(Properties::WRITE),
        Uuid::short(0x2A00),
        DEVICE_NAME,
    ),
    fixed(
        "Appearance",
        ServiceIndex::GenericAccess,
        Properties::READ,
        Uuid::short(0x2A01),
        APPEARANCE,
    ),
    fixed(
        "Manufacturer Name String",
        ServiceIndex::DeviceInformation,
        Properties::READ,
        Uuid::short(0x2A29),
        MANUFACTURER_NAME,
    ),
    fixed(
        "System ID",
        ServiceIndex::DeviceInformation,
        Properties::READ,
        Uuid::short(0x2A23),
        SYSTEM_ID,
    ),
    fixed(
        "Dynamic Characteristic",
        ServiceIndex::DynamicService,
        Properties::READ,
        DYNAMIC_CHAR_UUID,
        DYNAMIC_CHAR_VALUE,
    ),
];

const _: () = {
    let mut i = 0;
    while i < CHARACTERISTICS_COUNT {
        let c = &CHARACTERISTICS[i];
        assert!(c.value.len() <= c.max_len as usize);
        assert!(c.value.len() <= u16::MAX as usize);
        i += 1;
    }
};

/// Services flagged for inclusion in advertising data, in table order.
pub fn advertised_services() -> impl Iterator<Item = &'static ServiceDecl> + Clone {
    SERVICES.iter().filter(|s| s.advertised)
}
