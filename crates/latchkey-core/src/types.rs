use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::{FRAME_END, FRAME_START};
use crate::error::{Error, Result};

/// Credential code read from a badge.
///
/// A code is the text captured between the LF and CR delimiters of a reader
/// frame. It is never empty and never contains either delimiter. Once built
/// it is immutable.
///
/// # Examples
///
/// ```
/// use latchkey_core::CredentialCode;
///
/// let code = CredentialCode::new("12345").unwrap();
/// assert_eq!(code.as_str(), "12345");
///
/// assert!(CredentialCode::new("").is_err());
/// assert!(CredentialCode::new("12\r45").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CredentialCode(String);

impl CredentialCode {
    /// Create a credential code, rejecting empty text and frame delimiters.
    pub fn new(code: impl Into<String>) -> Result<Self> {
        let code = code.into();
        if code.is_empty() {
            return Err(Error::InvalidCredentialCode(
                "code must not be empty".to_string(),
            ));
        }
        if code
            .bytes()
            .any(|b| b == FRAME_START || b == FRAME_END)
        {
            return Err(Error::InvalidCredentialCode(format!(
                "code contains a frame delimiter: {:?}",
                code
            )));
        }
        Ok(Self(code))
    }

    /// Get the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the code and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for CredentialCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CredentialCode {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CredentialCode {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<CredentialCode> for String {
    fn from(code: CredentialCode) -> Self {
        code.0
    }
}

/// Physical state of the door strike.
///
/// The controller always starts in [`DoorState::Locked`]; see
/// `DoorController::new` in the `latchkey-door` crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DoorState {
    /// Strike engaged.
    #[default]
    Locked,

    /// Strike released.
    Unlocked,
}

impl DoorState {
    /// Check if the door is locked.
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked)
    }
}

impl fmt::Display for DoorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "Locked"),
            Self::Unlocked => write!(f, "Unlocked"),
        }
    }
}

/// Status indicator on the reader panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    /// Green LED, lit while an accepted badge holds the door open.
    Granted,

    /// Red LED, lit while the door is idle and locked.
    Denied,
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Granted => write!(f, "granted"),
            Self::Denied => write!(f, "denied"),
        }
    }
}
