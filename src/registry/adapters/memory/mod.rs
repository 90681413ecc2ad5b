//! In-memory factories for tests and local wiring.
//!
//! These factories build entities from templates held in memory. They count
//! every creation attempt and can be told to fail, to stall, or to reject
//! their configuration, which makes breaker and lifecycle behaviour
//! observable without real backends.

mod resource;
mod tool;

pub use resource::InMemoryResourceFactory;
pub use tool::InMemoryToolFactory;

use crate::registry::ports::{CreationContext, EntityConfig, FactoryError, FactoryResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

#[derive(Debug, Default)]
struct FactoryBehaviour {
    creations: AtomicUsize,
    failing: AtomicBool,
    rejecting_config: AtomicBool,
    delay: Option<Duration>,
    required_keys: Vec<String>,
}

impl FactoryBehaviour {
    async fn before_create(&self, ctx: &CreationContext) -> FactoryResult<()> {
        self.creations.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::select! {
                () = ctx.cancellation_token().cancelled() => {
                    return Err(FactoryError::Unavailable(format!(
                        "creation of '{}' was cancelled",
                        ctx.identifier()
                    )));
                }
                () = tokio::time::sleep(delay) => {}
            }
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(FactoryError::Unavailable(format!(
                "'{}' is configured to fail",
                ctx.identifier()
            )));
        }
        Ok(())
    }

    fn validate(&self, config: &EntityConfig) -> FactoryResult<()> {
        if self.rejecting_config.load(Ordering::SeqCst) {
            return Err(FactoryError::InvalidConfig("configuration rejected".to_owned()));
        }
        let missing: Vec<&str> = self
            .required_keys
            .iter()
            .map(String::as_str)
            .filter(|key| config.get(key).is_none())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(FactoryError::InvalidConfig(format!(
                "missing required keys: {}",
                missing.join(", ")
            )))
        }
    }

    fn creations(&self) -> usize {
        self.creations.load(Ordering::SeqCst)
    }

    fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    fn set_rejecting_config(&self, rejecting: bool) {
        self.rejecting_config.store(rejecting, Ordering::SeqCst);
    }
}
