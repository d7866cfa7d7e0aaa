//! Call context passed to guarded methods

/// Who is calling, and through which path.
///
/// The trusted flag is private and has no public constructor or setter.
/// Contexts built by callers are always untrusted; only the trusted path
/// (`run_trusted`) mints a trusted one, so a forged flag cannot arrive from
/// outside this crate.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallContext {
    identity: Option<String>,
    trusted: bool,
}

impl CallContext {
    /// Context for an unauthenticated caller.
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Context for an authenticated caller.
    pub fn authenticated(identity: impl Into<String>) -> Self {
        CallContext {
            identity: Some(identity.into()),
            trusted: false,
        }
    }

    /// Context minted for the trusted path. Carries no identity.
    pub(crate) fn trusted() -> Self {
        CallContext {
            identity: None,
            trusted: true,
        }
    }

    /// The caller identity, if authenticated.
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Whether this call arrived through the trusted path.
    pub fn is_trusted(&self) -> bool {
        self.trusted
    }
}
