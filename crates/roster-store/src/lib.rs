//! Entity stores for the Roster client.
//!
//! Each store is a service object owning an in-memory cache of one entity
//! kind plus loading/error flags. Stores are constructed once per session
//! around a shared gateway and handed to the screens that need them.
//!
//! Cache discipline: the local collection is mutated only after the backend
//! acknowledges a write, and always with the row the backend returned. A
//! failed call records its message in the store's error slot, clears the
//! loading flag and leaves the cache untouched.

mod auth;
mod contract;
mod person;
mod status;
mod template;
mod theme;

pub mod error;

pub use auth::{AuthStore, DEV_USER_EMAIL, DEV_USER_NAME, development_user};
pub use contract::ContractStore;
pub use error::{Result, StoreError};
pub use person::PersonStore;
pub use status::Status;
pub use template::TemplateStore;
pub use theme::ThemeStore;

#[cfg(any(test, feature = "testing"))]
pub mod memory;
