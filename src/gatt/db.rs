//! Boot-time registration of the attribute table.
//!
//! [`initialize`] opens a session, adds every service, then every
//! characteristic under its service's handle, starts the services and
//! commits. The first failing command aborts the whole pass and no
//! [`GattDatabase`] is produced, so handles only ever exist fully assigned.

use super::table::{CharacteristicIndex, ServiceIndex, CHARACTERISTICS, CHARACTERISTICS_COUNT, SERVICES, SERVICES_COUNT};
use super::{CharacteristicDecl, Uuid};
use crate::config::HANDLE_UNASSIGNED;
use crate::error::{Command, Error, StatusExt};
use crate::stack::{BtStack, CharacteristicHandle, CharacteristicParams, ServiceHandle, Session};

/// A committed GATT database and the handles the stack assigned to it.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct GattDatabase {
    session: Session,
    services: [ServiceHandle; SERVICES_COUNT],
    characteristics: [CharacteristicHandle; CHARACTERISTICS_COUNT],
}

impl GattDatabase {
    pub fn session(&self) -> Session {
        self.session
    }

    pub fn service_handle(&self, service: ServiceIndex) -> ServiceHandle {
        self.services[service.index()]
    }

    pub fn characteristic_handle(&self, characteristic: CharacteristicIndex) -> CharacteristicHandle {
        self.characteristics[characteristic.index()]
    }

    pub fn service_handles(&self) -> &[ServiceHandle] {
        &self.services
    }

    pub fn characteristic_handles(&self) -> &[CharacteristicHandle] {
        &self.characteristics
    }

    /// Look up which characteristic owns a value handle.
    pub fn find_characteristic(&self, handle: CharacteristicHandle) -> Option<CharacteristicIndex> {
        CharacteristicIndex::ALL
            .iter()
            .copied()
            .find(|idx| self.characteristic_handle(*idx) == handle)
    }
}

/// Register one service with the stack.
pub fn add_service<S: BtStack>(stack: &mut S, session: Session, service: ServiceIndex) -> Result<ServiceHandle, Error> {
    let decl = service.decl();
    let handle = stack
        .gattdb_add_service(session, decl.kind, decl.advertised, &decl.uuid)
        .context(Command::AddService)?;
    debug!("service {} -> handle {}", decl.name, handle.0);
    Ok(handle)
}

/// Register one characteristic under an already registered service,
/// using the 16-bit or 128-bit command according to its UUID.
pub fn add_characteristic<S: BtStack>(
    stack: &mut S,
    session: Session,
    service: ServiceHandle,
    decl: &CharacteristicDecl,
) -> Result<CharacteristicHandle, Error> {
    let params = CharacteristicParams {
        properties: decl.properties,
        security: decl.security,
        flags: decl.flags,
        value_kind: decl.value_kind,
        max_len: decl.max_len,
        value: decl.value,
    };

    let handle = match decl.uuid {
        Uuid::Short(uuid) => stack.gattdb_add_uuid16_characteristic(session, service, uuid, &params),
        Uuid::Long(uuid) => stack.gattdb_add_uuid128_characteristic(session, service, uuid, &params),
    }
    .context(Command::AddCharacteristic)?;

    debug!("characteristic {} -> handle {}", decl.name, handle.0);
    Ok(handle)
}

/// Build the device's GATT database in a fresh session.
pub fn initialize<S: BtStack>(stack: &mut S) -> Result<GattDatabase, Error> {
    let session = stack.gattdb_new_session().context(Command::NewSession)?;
    debug!("gattdb session {} opened", session.0);

    // Sentinels never escape: any failure returns before the value is built.
    let mut services = [ServiceHandle(HANDLE_UNASSIGNED); SERVICES_COUNT];
    for idx in ServiceIndex::ALL {
        services[idx.index()] = add_service(stack, session, idx)?;
    }

    let mut characteristics = [CharacteristicHandle(HANDLE_UNASSIGNED); CHARACTERISTICS_COUNT];
    for (slot, decl) in characteristics.iter_mut().zip(CHARACTERISTICS.iter()) {
        *slot = add_characteristic(stack, session, services[decl.service.index()], decl)?;
    }

    for (decl, handle) in SERVICES.iter().zip(services.iter()) {
        stack
            .gattdb_start_service(session, *handle)
            .context(Command::StartService)?;
        trace!("service {} started", decl.name);
    }

    stack.gattdb_commit(session).context(Command::Commit)?;
    info!(
        "GATT database committed: {} services, {} characteristics",
        SERVICES_COUNT,
        CHARACTERISTICS_COUNT
    );

    Ok(GattDatabase {
        session,
        services,
        characteristics,
    })
}
