//! Unified error type for dynamic-gatt.
//!
//! We avoid `alloc` - all error variants carry only fixed-size data.
//! Implements `defmt::Format` (feature `defmt`) for efficient on-target logging.

use core::fmt;

/// Raw non-success status code returned by a Bluetooth stack command.
///
/// The value is whatever the stack reports; it is carried through for
/// logging and never interpreted here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Status(pub u32);

impl Status {
    /// Generic "invalid parameter" code.
    pub const INVALID_PARAMETER: Status = Status(0x0021);
    /// Handle or session is not known to the stack.
    pub const INVALID_HANDLE: Status = Status(0x000C);
    /// Operation not valid in the current state.
    pub const INVALID_STATE: Status = Status(0x0002);
    /// Out of attribute table / advertising set memory.
    pub const NO_MORE_RESOURCE: Status = Status(0x0045);
}

/// Stack command that produced a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    NewSession,
    AddService,
    AddCharacteristic,
    StartService,
    Commit,
    CreateAdvertisingSet,
    SetAdvertisingTiming,
    StartAdvertising,
}

/// Top-level error type used across the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Locally rejected input (a UUID that is neither 16 nor 128 bits).
    InvalidParameter,

    /// A stack command returned a non-success status.
    Stack { command: Command, status: Status },

    /// A second boot event arrived after the database was built.
    AlreadyInitialized,

    /// Advertising was requested before an advertising set exists.
    AdvertisingSetUnset,

    /// Flags and service UUID lists do not fit a legacy advertising packet.
    AdvertisingDataOverflow,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidParameter => f.write_str("invalid parameter"),
            Error::Stack { command, status } => {
                write!(f, "{:?} failed with status 0x{:04x}", command, status.0)
            }
            Error::AlreadyInitialized => f.write_str("GATT database already initialized"),
            Error::AdvertisingSetUnset => f.write_str("no advertising set"),
            Error::AdvertisingDataOverflow => f.write_str("advertising data too long"),
        }
    }
}

/// Attach the issuing command to a raw stack result.
pub trait StatusExt<T> {
    fn context(self, command: Command) -> Result<T, Error>;
}

impl<T> StatusExt<T> for Result<T, Status> {
    fn context(self, command: Command) -> Result<T, Error> {
        self.map_err(|status| Error::Stack { command, status })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::ToString;

    #[test]
    fn context_wraps_status_with_command() {
        let raw: Result<u16, Status> = Err(Status(0x0181));
        assert_eq!(
            raw.context(Command::AddService),
            Err(Error::Stack {
                command: Command::AddService,
                status: Status(0x0181),
            })
        );
    }

    #[test]
    fn context_passes_success_through() {
        let raw: Result<u16, Status> = Ok(7);
        assert_eq!(raw.context(Command::Commit), Ok(7));
    }

    #[test]
    fn display_names_command_and_status() {
        let err = Error::Stack {
            command: Command::StartAdvertising,
            status: Status(0x0c),
        };
        assert_eq!(err.to_string(), "StartAdvertising failed with status 0x000c");
        assert_eq!(Error::InvalidParameter.to_string(), "invalid parameter");
    }
}
