//! Common test utilities for host tests.
//!
//! [`RecordingStack`] implements [`BtStack`] by logging every command it
//! receives and handing out handles the way a real attribute table grows:
//! one handle per service declaration, two per characteristic (declaration
//! and value). Any command can be made to fail with [`RecordingStack::fail_on`].

#![allow(dead_code)]

use dynamic_gatt::error::{Command, Status};
use dynamic_gatt::event::BootInfo;
use dynamic_gatt::gatt::{CharFlags, Properties, Security, ServiceKind, Uuid, ValueKind};
use dynamic_gatt::stack::{
    AdvTiming, AdvertisingSet, BtStack, CharacteristicHandle, CharacteristicParams, ConnectableMode, DiscoverableMode,
    ServiceHandle, Session,
};
use dynamic_gatt::Event;

/// Characteristic parameters as received, with the value copied out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedParams {
    pub properties: Properties,
    pub security: Security,
    pub flags: CharFlags,
    pub value_kind: ValueKind,
    pub max_len: u16,
    pub value: Vec<u8>,
}

impl From<&CharacteristicParams<'_>> for RecordedParams {
    fn from(p: &CharacteristicParams<'_>) -> Self {
        Self {
            properties: p.properties,
            security: p.security,
            flags: p.flags,
            value_kind: p.value_kind,
            max_len: p.max_len,
            value: p.value.to_vec(),
        }
    }
}

/// One command issued to the stack.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    NewSession,
    AddService {
        session: Session,
        kind: ServiceKind,
        advertised: bool,
        uuid: Uuid,
    },
    AddUuid16Characteristic {
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 2],
        params: RecordedParams,
    },
    AddUuid128Characteristic {
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 16],
        params: RecordedParams,
    },
    StartService {
        session: Session,
        service: ServiceHandle,
    },
    Commit {
        session: Session,
    },
    CreateAdvertisingSet,
    SetAdvertisingTiming {
        set: AdvertisingSet,
        timing: AdvTiming,
    },
    StartAdvertising {
        set: AdvertisingSet,
        discoverable: DiscoverableMode,
        connectable: ConnectableMode,
    },
}

impl Call {
    pub fn command(&self) -> Command {
        match self {
            Call::NewSession => Command::NewSession,
            Call::AddService { .. } => Command::AddService,
            Call::AddUuid16Characteristic { .. } | Call::AddUuid128Characteristic { .. } => Command::AddCharacteristic,
            Call::StartService { .. } => Command::StartService,
            Call::Commit { .. } => Command::Commit,
            Call::CreateAdvertisingSet => Command::CreateAdvertisingSet,
            Call::SetAdvertisingTiming { .. } => Command::SetAdvertisingTiming,
            Call::StartAdvertising { .. } => Command::StartAdvertising,
        }
    }

    /// Owning service of a characteristic registration.
    pub fn characteristic_service(&self) -> Option<ServiceHandle> {
        match self {
            Call::AddUuid16Characteristic { service, .. } | Call::AddUuid128Characteristic { service, .. } => {
                Some(*service)
            }
            _ => None,
        }
    }
}

struct Fault {
    command: Command,
    /// 1-based occurrence of `command` that fails.
    nth: usize,
    status: Status,
}

pub const SESSION: Session = Session(1);
pub const ADVERTISING_SET: AdvertisingSet = AdvertisingSet(0);
pub const FIRST_HANDLE: u16 = 1;

pub struct RecordingStack {
    pub calls: Vec<Call>,
    next_handle: u16,
    fault: Option<Fault>,
}

impl RecordingStack {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            next_handle: FIRST_HANDLE,
            fault: None,
        }
    }

    /// Make the `nth` (1-based) issue of `command` return `status`.
    pub fn fail_on(mut self, command: Command, nth: usize, status: Status) -> Self {
        self.fault = Some(Fault { command, nth, status });
        self
    }

    pub fn commands(&self) -> Vec<Command> {
        self.calls.iter().map(Call::command).collect()
    }

    pub fn count(&self, command: Command) -> usize {
        self.calls.iter().filter(|c| c.command() == command).count()
    }

    pub fn clear(&mut self) {
        self.calls.clear();
    }

    /// Record `call` and report the injected failure if it is due.
    fn record(&mut self, call: Call) -> Result<(), Status> {
        let command = call.command();
        self.calls.push(call);
        match &self.fault {
            Some(f) if f.command == command && self.count(command) == f.nth => Err(f.status),
            _ => Ok(()),
        }
    }

    fn allocate(&mut self, count: u16) -> u16 {
        let first = self.next_handle;
        self.next_handle += count;
        first
    }
}

impl Default for RecordingStack {
    fn default() -> Self {
        Self::new()
    }
}

impl BtStack for RecordingStack {
    fn gattdb_new_session(&mut self) -> Result<Session, Status> {
        self.record(Call::NewSession)?;
        Ok(SESSION)
    }

    fn gattdb_add_service(
        &mut self,
        session: Session,
        kind: ServiceKind,
        advertised: bool,
        uuid: &Uuid,
    ) -> Result<ServiceHandle, Status> {
        self.record(Call::AddService {
            session,
            kind,
            advertised,
            uuid: *uuid,
        })?;
        Ok(ServiceHandle(self.allocate(1)))
    }

    fn gattdb_add_uuid16_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 2],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status> {
        self.record(Call::AddUuid16Characteristic {
            session,
            service,
            uuid,
            params: params.into(),
        })?;
        // Declaration first, value handle second.
        Ok(CharacteristicHandle(self.allocate(2) + 1))
    }

    fn gattdb_add_uuid128_characteristic(
        &mut self,
        session: Session,
        service: ServiceHandle,
        uuid: [u8; 16],
        params: &CharacteristicParams<'_>,
    ) -> Result<CharacteristicHandle, Status> {
        self.record(Call::AddUuid128Characteristic {
            session,
            service,
            uuid,
            params: params.into(),
        })?;
        Ok(CharacteristicHandle(self.allocate(2) + 1))
    }

    fn gattdb_start_service(&mut self, session: Session, service: ServiceHandle) -> Result<(), Status> {
        self.record(Call::StartService { session, service })
    }

    fn gattdb_commit(&mut self, session: Session) -> Result<(), Status> {
        self.record(Call::Commit { session })
    }

    fn advertiser_create_set(&mut self) -> Result<AdvertisingSet, Status> {
        self.record(Call::CreateAdvertisingSet)?;
        Ok(ADVERTISING_SET)
    }

    fn advertiser_set_timing(&mut self, set: AdvertisingSet, timing: &AdvTiming) -> Result<(), Status> {
        self.record(Call::SetAdvertisingTiming { set, timing: *timing })
    }

    fn advertiser_start(
        &mut self,
        set: AdvertisingSet,
        discoverable: DiscoverableMode,
        connectable: ConnectableMode,
    ) -> Result<(), Status> {
        self.record(Call::StartAdvertising {
            set,
            discoverable,
            connectable,
        })
    }
}

// Event helpers

pub fn boot() -> Event {
    Event::SystemBoot(BootInfo {
        major: 7,
        minor: 3,
        patch: 0,
    })
}

pub fn opened(connection: u8) -> Event {
    Event::ConnectionOpened {
        connection,
        advertiser: Some(ADVERTISING_SET),
    }
}

pub fn closed(connection: u8) -> Event {
    Event::ConnectionClosed {
        connection,
        reason: Some(0x13),
    }
}
