use core::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InputRead,
    InvalidIdentifier,
    InvalidConfig,
    Storage,
    UpdateFailed,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InputRead => write!(f, "Failed to read input pin"),
            Error::InvalidIdentifier => write!(f, "Identifier outside the standard CAN range"),
            Error::InvalidConfig => write!(f, "Invalid node configuration"),
            Error::Storage => write!(f, "Persistent storage error"),
            Error::UpdateFailed => write!(f, "Update procedure failed"),
        }
    }
}

impl core::error::Error for Error {}

pub type Result<T> = core::result::Result<T, Error>;
