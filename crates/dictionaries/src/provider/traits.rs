//! Dictionary source trait definition.

use async_trait::async_trait;

use crate::errors::{DictionaryError, SubCallPolicy};
use crate::models::{Dictionary, DictionaryParams, Instrument};

/// Trait for dictionary sources.
///
/// Implement this trait to add support for a new instrument-list source.
/// A source performs its network reads and maps the payload into canonical
/// [`Instrument`] records; it has no other side effects.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use ppp_dictionaries::provider::DictionarySource;
///
/// struct MySource;
///
/// #[async_trait]
/// impl DictionarySource for MySource {
///     fn id(&self) -> &'static str {
///         "MY_SOURCE"
///     }
///
///     fn dictionary(&self) -> Dictionary {
///         Dictionary::Binance
///     }
///
///     async fn fetch(&self, params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError> {
///         Ok(Vec::new())
///     }
/// }
/// ```
#[async_trait]
pub trait DictionarySource: Send + Sync {
    /// Unique identifier for this source, used in logs and error messages.
    fn id(&self) -> &'static str;

    /// The dictionary this source serves.
    fn dictionary(&self) -> Dictionary;

    /// How failed sub-calls are treated. Default is [`SubCallPolicy::Fatal`].
    fn sub_call_policy(&self) -> SubCallPolicy {
        SubCallPolicy::Fatal
    }

    /// Checks operator input before any network call.
    fn validate_params(&self, params: &DictionaryParams) -> Result<(), DictionaryError> {
        let _ = params;
        Ok(())
    }

    /// Fetch the instrument list and map it to canonical records.
    async fn fetch(&self, params: &DictionaryParams) -> Result<Vec<Instrument>, DictionaryError>;
}
