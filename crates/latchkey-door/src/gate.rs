//! Badge validation in front of the credential store.

use std::fmt;

use tracing::{debug, warn};

use latchkey_core::CredentialCode;
use latchkey_storage::CredentialStore;

/// Why a code was accepted or rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Registered, assigned to a user and enabled.
    Granted,

    /// Not registered.
    UnknownCode,

    /// Registered but no user holds it.
    NoIdentity,

    /// Registered and assigned, but disabled.
    Disabled,

    /// The store could not answer. Treated as a rejection.
    StoreFault,
}

impl Verdict {
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Granted => "granted",
            Self::UnknownCode => "unknown code",
            Self::NoIdentity => "no user assigned",
            Self::Disabled => "disabled",
            Self::StoreFault => "store unavailable",
        };
        f.write_str(text)
    }
}

/// Decides whether a decoded code opens the door.
///
/// The gate fails closed: a store error never grants access and never
/// reaches the caller as an error.
#[derive(Debug, Clone)]
pub struct CredentialGate<S> {
    store: S,
}

impl<S: CredentialStore> CredentialGate<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Look the code up and classify the result.
    pub async fn check(&self, code: &CredentialCode) -> Verdict {
        let verdict = match self.store.lookup(code).await {
            Ok(None) => Verdict::UnknownCode,
            Ok(Some(record)) if !record.identity_present => Verdict::NoIdentity,
            Ok(Some(record)) if !record.enabled => Verdict::Disabled,
            Ok(Some(_)) => Verdict::Granted,
            Err(e) => {
                warn!(code = %code, error = %e, "Credential store fault, rejecting code");
                Verdict::StoreFault
            }
        };

        debug!(code = %code, %verdict, "Checked credential");
        verdict
    }

    /// `true` only for a registered, assigned, enabled code.
    pub async fn validate(&self, code: &CredentialCode) -> bool {
        self.check(code).await.is_granted()
    }
}
