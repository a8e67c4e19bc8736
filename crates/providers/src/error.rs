//! Error types for provider invocation.

use thiserror::Error;

/// Terminal invocation failures.
///
/// Individual credential failures are not errors at this level; the
/// invoker absorbs them and keeps going. Only full exhaustion surfaces.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The config list was empty or contained no supported kind.
    #[error("no usable provider configuration")]
    NoProviderAvailable,

    /// Every credential of every supported config failed.
    #[error("all providers failed after {attempts} attempt(s): {last}")]
    AllFailed { attempts: usize, last: String },
}
