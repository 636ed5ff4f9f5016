//! SoftDevice S140 implementation of the stack command interface.
//!
//! GATT database commands map onto `sd_ble_gatts_*` calls. The SoftDevice
//! owns the Generic Access service itself, so registering 0x1800 resolves
//! to the built-in service and its Device Name / Appearance characteristics
//! are set through the GAP API instead.
//!
//! Advertising commands only record the request; the BLE task picks it up
//! with [`SoftdeviceStack::take_advertising`] and runs the connectable
//! advertisement, since that is an async procedure on this stack.

use core::mem;

use defmt::{debug, info, warn};
use dynamic_gatt::config::{ADV_SET_COUNT, HANDLE_UNASSIGNED};
use dynamic_gatt::error::Status;
use dynamic_gatt::gatt::{CharacteristicIndex, GattDatabase, Properties, Security, ServiceKind, Uuid, ValueKind};
use dynamic_gatt::stack::{
    AdvTiming, AdvertisingSet, BtStack, CharacteristicHandle, CharacteristicParams, ConnectableMode, DiscoverableMode,
    ServiceHandle, Session,
};
use nrf_softdevice::ble::gatt_server::{self, WriteOp};
use nrf_softdevice::ble::{peripheral, Connection, SecurityMode, Uuid as SdUuid};
use nrf_softdevice::raw;

/// Handle of the SoftDevice's built-in GAP service declaration.
const GAP_SERVICE_HANDLE: u16 = 0x0001;
/// Value handles of the built-in Device Name and Appearance characteristics.
const GAP_DEVICE_NAME_HANDLE: u16 = 0x0003;
const GAP_APPEARANCE_HANDLE: u16 = 0x0005;

const UUID_GENERIC_ACCESS: u16 = 0x1800;
const UUID_DEVICE_NAME: u16 = 0x2A00;
const UUID_APPEARANCE: u16 = 0x2A01;

fn convert(ret: u32) -> Result<(), Status> {
    if ret == raw::NRF_SUCCESS {
        Ok(())
    } else {
        Err(Status(ret))
    }
}

/// A connectable advertisement waiting to be started by the BLE task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdvRequest {
    pub set: AdvertisingSet,
    pub timing: AdvTiming,
}

impl AdvRequest {
    /// SoftDevice advertising parameters. The SoftDevice takes a single
    /// interval, so the minimum is used.
    pub fn config(&self) -> peripheral::Config {
        peripheral::Config {
            interval: self.timing.interval_min,
            timeout: (self.timing.duration != 0).then_some(self.timing.duration),
            max_events: (self.timing.max_events != 0).then_some(self.timing.max_events),
            ..Default::default()
        }
    }
}

/// Stack command state kept between calls.
pub struct SoftdeviceStack {
    session: Option<Session>,
    next_session: u16,
    sets_allocated: u8,
    timing: Option<AdvTiming>,
    pending: Option<AdvRequest>,
}

impl SoftdeviceStack {
    /// Must only be created after `Softdevice::enable`.
    pub fn new() -> Self {
        Self {
            session: None,
            next_session: 1,
            sets_allocated: 0,
            timing: None,
            pending: None,
        }
    }

    /// Advertisement requested by the last `advertiser_start`, if not yet taken.
    pub fn take_advertising(&mut self) -> Option<AdvRequest> {
        self.pending.take()
    }

    fn check_session(&self, session: Session) -> Result<(), Status> {
        match self.session {
            Some(open) if open == session => Ok(()),
            _ => Err(Status(raw::NRF_ERROR_INVALID_STATE)),
        }
    }

    fn add_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: SdUuid,
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status> {
        self.check_session(session)?;

        let init_len = u16::try_from(params.value.len()).map_err(|_| Status(raw::NRF_ERROR_INVALID_LENGTH))?;
        if init_len > params.max_len {
            return Err(Status(raw::NRF_ERROR_INVALID_LENGTH));
        }

        let props = params.properties;
        let readable = props.contains(Properties::READ);
        let writable = props.contains(Properties::WRITE) || props.contains(Properties::WRITE_NO_RESPONSE);

        let mut attr_md: raw::ble_gatts_attr_md_t = unsafe { mem::zeroed() };
        attr_md.read_perm = if readable {
            read_security(params.security).into_raw()
        } else {
            SecurityMode::NoAccess.into_raw()
        };
        attr_md.write_perm = if writable {
            write_security(params.security).into_raw()
        } else {
            SecurityMode::NoAccess.into_raw()
        };
        attr_md.set_vloc(raw::BLE_GATTS_VLOC_STACK as u8);
        attr_md.set_vlen((params.value_kind == ValueKind::VariableLength).into());
        if params.value_kind == ValueKind::UserManaged {
            attr_md.set_rd_auth(1);
            attr_md.set_wr_auth(1);
        }

        // The SoftDevice adds a CCCD to every notify/indicate characteristic;
        // only its write permission can be chosen.
        let mut cccd_md: raw::ble_gatts_attr_md_t = unsafe { mem::zeroed() };
        cccd_md.read_perm = SecurityMode::Open.into_raw();
        cccd_md.write_perm = notify_security(params.security).into_raw();
        cccd_md.set_vloc(raw::BLE_GATTS_VLOC_STACK as u8);

        let mut char_md: raw::ble_gatts_char_md_t = unsafe { mem::zeroed() };
        char_md.char_props.set_broadcast(props.contains(Properties::BROADCAST).into());
        char_md.char_props.set_read(readable.into());
        char_md.char_props.set_write_wo_resp(props.contains(Properties::WRITE_NO_RESPONSE).into());
        char_md.char_props.set_write(props.contains(Properties::WRITE).into());
        char_md.char_props.set_notify(props.contains(Properties::NOTIFY).into());
        char_md.char_props.set_indicate(props.contains(Properties::INDICATE).into());
        char_md
            .char_ext_props
            .set_reliable_wr(props.contains(Properties::RELIABLE_WRITE).into());
        if props.contains(Properties::NOTIFY) || props.contains(Properties::INDICATE) {
            char_md.p_cccd_md = &cccd_md;
        }

        let mut attr: raw::ble_gatts_attr_t = unsafe { mem::zeroed() };
        attr.p_uuid = unsafe { uuid.as_raw_ptr() };
        attr.p_attr_md = &attr_md as _;
        attr.init_len = init_len;
        attr.max_len = params.max_len;
        // Copied into the stack's attribute table (VLOC_STACK).
        attr.p_value = params.value.as_ptr() as *mut _;

        let mut handles: raw::ble_gatts_char_handles_t = unsafe { mem::zeroed() };
        let ret =
            unsafe { raw::sd_ble_gatts_characteristic_add(service.0, &mut char_md as _, &mut attr as _, &mut handles as _) };
        convert(ret)?;

        Ok(CharacteristicHandle(handles.value_handle))
    }

    /// Device Name and Appearance under the built-in GAP service.
    fn set_gap_characteristic(&mut self, uuid: u16, params: &CharacteristicParams<'_>) -> Result<CharacteristicHandle, Status> {
        match uuid {
            UUID_DEVICE_NAME => {
                let write_perm = if params.properties.contains(Properties::WRITE) {
                    write_security(params.security).into_raw()
                } else {
                    SecurityMode::NoAccess.into_raw()
                };
                let len = u16::try_from(params.value.len()).map_err(|_| Status(raw::NRF_ERROR_INVALID_LENGTH))?;
                let ret = unsafe { raw::sd_ble_gap_device_name_set(&write_perm as _, params.value.as_ptr(), len) };
                convert(ret)?;
                Ok(CharacteristicHandle(GAP_DEVICE_NAME_HANDLE))
            }
            UUID_APPEARANCE => {
                let appearance = match params.value {
                    [lo, hi] => u16::from_le_bytes([*lo, *hi]),
                    _ => return Err(Status(raw::NRF_ERROR_INVALID_LENGTH)),
                };
                let ret = unsafe { raw::sd_ble_gap_appearance_set(appearance) };
                convert(ret)?;
                Ok(CharacteristicHandle(GAP_APPEARANCE_HANDLE))
            }
            _ => {
                warn!("GAP service has no characteristic {:#x}", uuid);
                Err(Status(raw::NRF_ERROR_NOT_SUPPORTED))
            }
        }
    }
}

impl Default for SoftdeviceStack {
    fn default() -> Self {
        Self::new()
    }
}

impl BtStack for SoftdeviceStack {
    fn gattdb_new_session(&mut self) -> Result<Session, Status> {
        if self.session.is_some() {
            return Err(Status(raw::NRF_ERROR_BUSY));
        }
        let session = Session(self.next_session);
        self.next_session = self.next_session.wrapping_add(1);
        self.session = Some(session);
        Ok(session)
    }

    fn gattdb_add_service(
        &mut self,
        session: Session,
        kind: ServiceKind,
        _advertised: bool,
        uuid: &Uuid,
    ) -> Result<ServiceHandle, Status> {
        self.check_session(session)?;

        if uuid.as_u16() == Some(UUID_GENERIC_ACCESS) {
            debug!("Generic Access maps to the built-in GAP service");
            return Ok(ServiceHandle(GAP_SERVICE_HANDLE));
        }

        let srvc_type = match kind {
            ServiceKind::Primary => raw::BLE_GATTS_SRVC_TYPE_PRIMARY,
            ServiceKind::Secondary => raw::BLE_GATTS_SRVC_TYPE_SECONDARY,
        };
        let sd_uuid = match uuid {
            Uuid::Short(b) => SdUuid::new_16(u16::from_le_bytes(*b)),
            Uuid::Long(b) => SdUuid::new_128(b),
        };

        let mut handle: u16 = HANDLE_UNASSIGNED;
        let ret = unsafe { raw::sd_ble_gatts_service_add(srvc_type as u8, sd_uuid.as_raw_ptr(), &mut handle as _) };
        convert(ret)?;
        Ok(ServiceHandle(handle))
    }

    fn gattdb_add_uuid16_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 2],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status> {
        let uuid = u16::from_le_bytes(uuid);
        if service.0 == GAP_SERVICE_HANDLE {
            self.check_session(session)?;
            return self.set_gap_characteristic(uuid, params);
        }
        self.add_characteristic(session, service, SdUuid::new_16(uuid), params)
    }

    fn gattdb_add_uuid128_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 16],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status> {
        if service.0 == GAP_SERVICE_HANDLE {
            return Err(Status(raw::NRF_ERROR_NOT_SUPPORTED));
        }
        self.add_characteristic(session, service, SdUuid::new_128(&uuid), params)
    }

    fn gattdb_start_service(&mut self, session: Session, _service: ServiceHandle) -> Result<(), Status> {
        // Services are live as soon as the SoftDevice accepts them.
        self.check_session(session)
    }

    fn gattdb_commit(&mut self, session: Session) -> Result<(), Status> {
        self.check_session(session)?;
        self.session = None;
        Ok(())
    }

    fn advertiser_create_set(&mut self) -> Result<AdvertisingSet, Status> {
        if self.sets_allocated >= ADV_SET_COUNT {
            return Err(Status(raw::NRF_ERROR_NO_MEM));
        }
        let set = AdvertisingSet(self.sets_allocated);
        self.sets_allocated += 1;
        Ok(set)
    }

    fn advertiser_set_timing(&mut self, set: AdvertisingSet, timing: &AdvTiming) -> Result<(), Status> {
        if set.0 >= self.sets_allocated {
            return Err(Status(raw::BLE_ERROR_INVALID_ADV_HANDLE));
        }
        if timing.interval_min > timing.interval_max {
            return Err(Status(raw::NRF_ERROR_INVALID_PARAM));
        }
        self.timing = Some(*timing);
        Ok(())
    }

    fn advertiser_start(
        &mut self,
        set: AdvertisingSet,
        discoverable: DiscoverableMode,
        connectable: ConnectableMode,
    ) -> Result<(), Status> {
        if set.0 >= self.sets_allocated {
            return Err(Status(raw::BLE_ERROR_INVALID_ADV_HANDLE));
        }
        // The advertisement payload always carries the general discoverable flag.
        if discoverable != DiscoverableMode::GeneralDiscoverable || connectable != ConnectableMode::ConnectableScannable {
            return Err(Status(raw::NRF_ERROR_NOT_SUPPORTED));
        }
        let timing = self.timing.ok_or(Status(raw::NRF_ERROR_INVALID_STATE))?;
        self.pending = Some(AdvRequest { set, timing });
        Ok(())
    }
}

fn read_security(security: Security) -> SecurityMode {
    if security.contains(Security::AUTHENTICATED_READ) {
        SecurityMode::Mitm
    } else if security.contains(Security::BONDED_READ) || security.contains(Security::ENCRYPTED_READ) {
        SecurityMode::JustWorks
    } else {
        SecurityMode::Open
    }
}

fn write_security(security: Security) -> SecurityMode {
    if security.contains(Security::AUTHENTICATED_WRITE) {
        SecurityMode::Mitm
    } else if security.contains(Security::BONDED_WRITE) || security.contains(Security::ENCRYPTED_WRITE) {
        SecurityMode::JustWorks
    } else {
        SecurityMode::Open
    }
}

fn notify_security(security: Security) -> SecurityMode {
    if security.contains(Security::AUTHENTICATED_NOTIFY) {
        SecurityMode::Mitm
    } else if security.contains(Security::BONDED_NOTIFY) || security.contains(Security::ENCRYPTED_NOTIFY) {
        SecurityMode::JustWorks
    } else {
        SecurityMode::Open
    }
}

/// GATT server over the registered database.
///
/// Values live in the SoftDevice attribute table, so reads and writes are
/// served by the stack; writes are only reported.
pub struct DynamicServer {
    database: GattDatabase,
}

impl DynamicServer {
    pub fn new(database: GattDatabase) -> Self {
        Self { database }
    }
}

impl gatt_server::Server for DynamicServer {
    type Event = CharacteristicIndex;

    fn on_write(&self, _conn: &Connection, handle: u16, _op: WriteOp, offset: usize, data: &[u8]) -> Option<Self::Event> {
        let written = self.database.find_characteristic(CharacteristicHandle(handle));
        match written {
            Some(idx) => info!("{} written: {} bytes at {}", idx.decl().name, data.len(), offset),
            None => debug!("write to unknown handle {}", handle),
        }
        written
    }
}
