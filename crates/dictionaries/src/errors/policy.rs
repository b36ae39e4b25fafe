use super::DictionaryError;

/// How an adapter treats a failed sub-call.
///
/// Adapters that issue a single request use [`SubCallPolicy::Fatal`]. Adapters
/// that assemble their list from several requests (one per instrument class)
/// may tolerate a partial outage instead.
///
/// # Behavior Summary
///
/// | Error | `Fatal` | `Tolerate` |
/// |-------|---------|------------|
/// | non-2xx status | abort | abort |
/// | transport failure | abort | log, empty subset |
/// | unparseable body | abort | log, empty subset |
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum SubCallPolicy {
    /// Any failure aborts the whole fetch.
    #[default]
    Fatal,

    /// Transport and parse failures contribute an empty subset.
    Tolerate,
}

impl SubCallPolicy {
    /// Returns true when `error` should be logged and replaced by an empty subset.
    pub fn absorbs(&self, error: &DictionaryError) -> bool {
        match self {
            Self::Fatal => false,
            Self::Tolerate => matches!(
                error,
                DictionaryError::Request { .. } | DictionaryError::Parse { .. }
            ),
        }
    }
}
