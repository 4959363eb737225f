//! Fathom Event Core - Dynamic event scheduling and difficulty pacing engine
//!
//! Data-driven round event engine: content documents define a catalog of
//! event prefabs and a weighted, gated tree of event sets; each round the
//! [`scheduler::EventManager`] selects a branch of that tree with a seeded
//! generator, materializes event instances, and activates them against an
//! intensity estimate of the current world state. The engine owns no world:
//! the session controller feeds it read-only [`world::WorldSnapshot`] views
//! and executes the commands instances emit through an
//! [`event::EventOutbox`].

pub mod content;
pub mod error;
pub mod event;
pub mod eventset;
pub mod intensity;
pub mod scheduler;
pub mod world;

pub use crate::content::{ContentCatalog, ContentElement, EventPrefab};
pub use crate::error::{EventCoreError, Result};
pub use crate::event::{Event, EventOutbox};
pub use crate::eventset::EventSet;
pub use crate::intensity::IntensityEstimator;
pub use crate::scheduler::EventManager;
pub use crate::world::{Level, LevelData, Location, SessionKind, WorldSnapshot};
