//! Export capability tokens.

use std::{borrow::Borrow, fmt};

use uuid::Uuid;

/// An opaque token naming one exported surface.
///
/// A handle is minted once per export request and never reused. Clients pass the string form
/// between each other out of band (D-Bus, a pipe, an environment variable); it carries no
/// semantic content and must not be guessable, so it is backed by a freshly generated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExportHandle(String);

impl ExportHandle {
    /// Mints a new handle.
    pub(crate) fn generate() -> Self {
        Self(Uuid::new_v4().hyphenated().to_string())
    }

    /// Wraps a client supplied handle string.
    ///
    /// The string is not validated. An arbitrary string is simply a key that will not match
    /// any export record.
    pub(crate) fn from_wire(raw: String) -> Self {
        Self(raw)
    }

    /// The wire form of the handle.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExportHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ExportHandle {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for ExportHandle {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::ExportHandle;

    /// Every minted handle must be distinct from every other.
    #[test]
    fn handles_are_unique() {
        let handles: HashSet<ExportHandle> = (0..512).map(|_| ExportHandle::generate()).collect();
        assert_eq!(handles.len(), 512);
    }

    #[test]
    fn wire_form_round_trips() {
        let handle = ExportHandle::generate();
        assert_eq!(ExportHandle::from_wire(handle.to_string()), handle);
        assert_eq!(handle.as_str(), handle.to_string());
    }
}
