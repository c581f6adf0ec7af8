use std::collections::HashMap;

#[cfg(test)]
use mockall::automock;

use crate::Result;
use crate::ServiceInstance;

/// Callbacks the registry delivers to the application/RPC layer.
///
/// Invoked synchronously on the dispatch path, so implementations must not
/// perform long blocking work. Duplicate delivery is possible (a change
/// racing its own rearm fires again); every method must tolerate idempotent
/// application. Returned errors are logged at the callback boundary and
/// never propagate into the dispatch path.
#[cfg_attr(test, automock)]
pub trait ImportedListener: Send + Sync + 'static {
    /// A remote instance appeared.
    fn add(
        &self,
        instance: ServiceInstance,
    ) -> Result<()>;

    /// A remote instance's payload was replaced.
    fn change(
        &self,
        previous: ServiceInstance,
        current: ServiceInstance,
    ) -> Result<()>;

    /// A remote instance disappeared.
    fn delete(
        &self,
        instance: ServiceInstance,
    ) -> Result<()>;
}

/// External status computation; the registry only publishes what it reports.
#[cfg_attr(test, automock)]
pub trait StatusSource: Send + Sync + 'static {
    fn snapshot(&self) -> HashMap<String, String>;
}
