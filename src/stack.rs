//! Command interface to the Bluetooth stack.
//!
//! The application never talks to the radio itself. Everything it needs
//! (GATT database editing and advertising control) goes through
//! [`BtStack`], which the firmware implements on top of the SoftDevice and
//! the tests implement with a recording mock.

use crate::error::Status;
use crate::gatt::{CharFlags, Properties, Security, ServiceKind, Uuid, ValueKind};

/// GATT database editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Session(pub u16);

/// Attribute handle of a registered service declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ServiceHandle(pub u16);

/// Attribute handle of a registered characteristic value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicHandle(pub u16);

/// Advertising set allocated by the stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvertisingSet(pub u8);

/// Everything about a characteristic except its UUID and owning service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CharacteristicParams<'a> {
    pub properties: Properties,
    pub security: Security,
    pub flags: CharFlags,
    pub value_kind: ValueKind,
    pub max_len: u16,
    pub value: &'a [u8],
}

/// Advertising timing. Intervals in 0.625 ms units, duration in 10 ms units;
/// a duration or event count of 0 means unlimited.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AdvTiming {
    pub interval_min: u32,
    pub interval_max: u32,
    pub duration: u16,
    pub max_events: u8,
}

/// Discoverability of an advertising set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DiscoverableMode {
    NonDiscoverable,
    LimitedDiscoverable,
    GeneralDiscoverable,
}

/// Whether centrals may connect to / scan an advertising set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConnectableMode {
    NonConnectable,
    ConnectableScannable,
    Scannable,
}

/// Bluetooth stack commands used by this application.
///
/// Every command either succeeds or returns the stack's raw status.
pub trait BtStack {
    fn gattdb_new_session(&mut self) -> Result<Session, Status>;

    fn gattdb_add_service(
        &mut self,
        session: Session,
        kind: ServiceKind,
        advertised: bool,
        uuid: &Uuid,
    ) -> Result<ServiceHandle, Status>;

    fn gattdb_add_uuid16_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 2],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status>;

    fn gattdb_add_uuid128_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 16],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status>;

    /// Make a service and its characteristics visible once committed.
    fn gattdb_start_service(&mut self, session: Session, service: ServiceHandle) -> Result<(), Status>;

    fn gattdb_commit(&mut self, session: Session) -> Result<(), Status>;

    fn advertiser_create_set(&mut self) -> Result<AdvertisingSet, Status>;

    fn advertiser_set_timing(&mut self, set: AdvertisingSet, timing: &AdvTiming) -> Result<(), Status>;

    fn advertiser_start(
        &mut self,
        set: AdvertisingSet,
        discoverable: DiscoverableMode,
        connectable: ConnectableMode,
    ) -> Result<(), Status>;
}
