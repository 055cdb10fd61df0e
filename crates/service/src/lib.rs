//! Event-driven storage service.
//!
//! A frontend publishes [`StorageEvent`]s on an [`EventBus`]; the
//! [`StorageService`]'s handlers fan each one out across the registered
//! storage adapters and fold the results into an observable
//! [`StorageState`]. Passive subscribers watch every publish go through its
//! loading/terminal lifecycle without taking part in the work.

mod bus;
pub mod error;
mod event;
mod service;
mod state;

pub use crate::bus::{BusEvent, EventBus, Notification, Status};
pub use crate::event::{StorageEvent, StorageEventKind};
pub use crate::service::StorageService;
pub use crate::state::StorageState;
