//! Domain types for component liveness tracking.
//!
//! A *component* is identified by its environment, system and component
//! name. Each running instance of it reports liveness as a `RunningUnit`
//! carrying its own server id.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::UnitError;

/// Identifier of a single running instance within a component.
pub type ServerId = String;

// ── ComponentKey ───────────────────────────────────────────────────

/// Identity of a monitored component.
///
/// Equality and hashing cover all three fields, so the key unites every
/// server of the same component regardless of where it runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ComponentKey {
    environment: String,
    system: String,
    component: String,
}

impl ComponentKey {
    pub fn new(
        environment: impl Into<String>,
        system: impl Into<String>,
        component: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            system: system.into(),
            component: component.into(),
        }
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn system(&self) -> &str {
        &self.system
    }

    pub fn component(&self) -> &str {
        &self.component
    }
}

impl fmt::Display for ComponentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.environment, self.system, self.component)
    }
}

impl From<&RunningUnit> for ComponentKey {
    fn from(unit: &RunningUnit) -> Self {
        Self::new(&unit.environment, &unit.system, &unit.component)
    }
}

// ── RunningUnit ────────────────────────────────────────────────────

/// A single liveness report, as received from a running instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunningUnit {
    pub environment: String,
    pub system: String,
    pub component: String,
    /// Server (host, pod, container) the instance runs on.
    pub server: ServerId,
}

impl RunningUnit {
    pub fn new(
        environment: impl Into<String>,
        system: impl Into<String>,
        component: impl Into<String>,
        server: impl Into<String>,
    ) -> Self {
        Self {
            environment: environment.into(),
            system: system.into(),
            component: component.into(),
            server: server.into(),
        }
    }

    /// The component this unit belongs to.
    pub fn component_key(&self) -> ComponentKey {
        ComponentKey::from(self)
    }

    /// Reject units with blank identifying fields.
    pub fn validate(&self) -> Result<(), UnitError> {
        let fields = [
            ("environment", &self.environment),
            ("system", &self.system),
            ("component", &self.component),
            ("server", &self.server),
        ];
        for (name, value) in fields {
            if value.trim().is_empty() {
                return Err(UnitError::MissingField(name));
            }
        }
        Ok(())
    }
}
