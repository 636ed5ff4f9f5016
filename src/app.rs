//! Application context and Bluetooth event dispatcher.
//!
//! State transitions:
//!
//! ```text
//! Uninitialized --boot--> Advertising --opened--> Connected
//!                             ^                      |
//!                             +-------closed---------+
//! ```
//!
//! Any command failure is returned to the caller, which is expected to
//! halt; the state only advances once every command of a transition
//! succeeded.

use crate::config::{ADV_DURATION, ADV_INTERVAL_MAX, ADV_INTERVAL_MIN, ADV_MAX_EVENTS};
use crate::error::{Command, Error, StatusExt};
use crate::event::{BootInfo, Event};
use crate::gatt::{self, GattDatabase};
use crate::stack::{AdvTiming, AdvertisingSet, BtStack, ConnectableMode, DiscoverableMode};

/// Advertising timing used for the initial start and every restart.
pub const ADV_TIMING: AdvTiming = AdvTiming {
    interval_min: ADV_INTERVAL_MIN,
    interval_max: ADV_INTERVAL_MAX,
    duration: ADV_DURATION,
    max_events: ADV_MAX_EVENTS,
};

pub const ADV_DISCOVERABLE: DiscoverableMode = DiscoverableMode::GeneralDiscoverable;
pub const ADV_CONNECTABLE: ConnectableMode = ConnectableMode::ConnectableScannable;

/// Lifecycle of the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AppState {
    /// Waiting for the boot event.
    Uninitialized,
    Advertising,
    Connected,
}

/// Everything the application keeps between events.
pub struct App {
    state: AppState,
    advertising_set: Option<AdvertisingSet>,
    database: Option<GattDatabase>,
    connection: Option<u8>,
}

impl App {
    pub const fn new() -> Self {
        Self {
            state: AppState::Uninitialized,
            advertising_set: None,
            database: None,
            connection: None,
        }
    }

    pub fn state(&self) -> AppState {
        self.state
    }

    pub fn advertising_set(&self) -> Option<AdvertisingSet> {
        self.advertising_set
    }

    pub fn database(&self) -> Option<&GattDatabase> {
        self.database.as_ref()
    }

    /// Handle of the open connection, if any.
    pub fn connection(&self) -> Option<u8> {
        self.connection
    }

    /// Bluetooth stack event handler.
    pub fn on_event<S: BtStack>(&mut self, stack: &mut S, event: &Event) -> Result<(), Error> {
        match *event {
            Event::SystemBoot(info) => self.on_boot(stack, info),
            Event::ConnectionOpened { connection, .. } => {
                self.on_connection_opened(connection);
                Ok(())
            }
            Event::ConnectionClosed { connection, reason } => self.on_connection_closed(stack, connection, reason),
            Event::Other { id } => {
                trace!("unhandled event {:#x}", id);
                Ok(())
            }
        }
    }

    fn on_boot<S: BtStack>(&mut self, stack: &mut S, info: BootInfo) -> Result<(), Error> {
        if self.state != AppState::Uninitialized {
            warn!("boot event in state {}", self.state);
            return Err(Error::AlreadyInitialized);
        }
        info!("Bluetooth stack booted: v{}.{}.{}", info.major, info.minor, info.patch);

        // Nothing is kept unless the whole sequence succeeds.
        let database = gatt::initialize(stack)?;
        let set = stack.advertiser_create_set().context(Command::CreateAdvertisingSet)?;
        stack
            .advertiser_set_timing(set, &ADV_TIMING)
            .context(Command::SetAdvertisingTiming)?;
        self.start_advertising(stack, set)?;

        self.database = Some(database);
        self.advertising_set = Some(set);
        info!("advertising started (set {})", set.0);
        Ok(())
    }

    fn on_connection_opened(&mut self, connection: u8) {
        if self.advertising_set.is_none() {
            warn!("connection {} opened before boot, ignored", connection);
            return;
        }
        info!("connection {} opened", connection);
        self.connection = Some(connection);
        if self.state == AppState::Advertising {
            self.state = AppState::Connected;
        }
    }

    fn on_connection_closed<S: BtStack>(
        &mut self,
        stack: &mut S,
        connection: u8,
        reason: Option<u16>,
    ) -> Result<(), Error> {
        info!("connection {} closed (reason {})", connection, reason);
        let set = self.advertising_set.ok_or(Error::AdvertisingSetUnset)?;
        if self.connection == Some(connection) {
            self.connection = None;
        }
        self.start_advertising(stack, set)?;
        debug!("advertising restarted");
        Ok(())
    }

    fn start_advertising<S: BtStack>(&mut self, stack: &mut S, set: AdvertisingSet) -> Result<(), Error> {
        stack
            .advertiser_start(set, ADV_DISCOVERABLE, ADV_CONNECTABLE)
            .context(Command::StartAdvertising)?;
        self.state = AppState::Advertising;
        Ok(())
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
