//! Shared fixtures for registry unit tests.

use crate::registry::{
    adapters::{InMemoryToolFactory, Tool},
    domain::FactoryDescriptor,
};
use chrono::{DateTime, Local, TimeDelta, Utc};
use mockable::Clock;
use std::sync::Mutex;

/// Clock that only moves when told to.
#[derive(Debug)]
pub(super) struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    pub(super) fn new() -> Self {
        let start = DateTime::from_timestamp(1_767_225_600, 0).expect("valid start timestamp");
        Self {
            now: Mutex::new(start),
        }
    }

    pub(super) fn advance(&self, by: TimeDelta) {
        let mut now = self.now.lock().expect("clock lock");
        *now += by;
    }
}

impl Clock for ManualClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.now.lock().expect("clock lock")
    }
}

/// Descriptor for a tool factory with the minimum valid metadata.
pub(super) fn tool_descriptor(name: &str) -> FactoryDescriptor {
    FactoryDescriptor::new(name, name, "Test tool", "1.0.0").with_capabilities(["tools"])
}

/// Factory whose tools have no handler and therefore fail entity validation.
pub(super) fn handlerless_factory(name: &str) -> InMemoryToolFactory {
    InMemoryToolFactory::new(tool_descriptor(name), Tool::new(name, "Test tool"))
}
