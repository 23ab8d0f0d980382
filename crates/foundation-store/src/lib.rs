//! # foundation-store
//!
//! Typed key/value storage with change watches.
//!
//! Two stores share one selector and notification model:
//!
//! - [`VolatileStore`] keeps values in memory for the life of the process.
//! - [`PersistentStore`] writes [`DynamicValue`]s through a primitive-only
//!   [`PropertyStore`] backend, recording a type tag next to every value so
//!   reads return exactly the variant that was written.
//!
//! Keys are addressed with a [`Selector`]: an exact key or a regex pattern.
//! Watching a selector makes every matching `set`/`remove` notify the
//! store's subscribed listeners synchronously with a [`ChangeEvent`].
//!
//! ## Quick Start
//!
//! ```
//! use foundation_store::{ChangeKind, DynamicValue, MemoryProperties, PersistentStore, Selector};
//! use std::sync::mpsc;
//!
//! let mut store = PersistentStore::new(MemoryProperties::new());
//!
//! let (tx, rx) = mpsc::channel();
//! store.watch(Selector::pattern("^user\\.").unwrap());
//! store.subscribe(move |event| {
//!     let _ = tx.send((event.kind, event.key.clone()));
//! });
//!
//! store.set("user.age", 36).unwrap();
//! assert_eq!(store.get("user.age").unwrap().into_one(), Some(DynamicValue::Int(36)));
//! assert_eq!(rx.try_recv().unwrap(), (ChangeKind::Set, "user.age".to_string()));
//! ```
//!
//! ## Backends
//!
//! | Backend | Feature flag | Use case |
//! |---------|-------------|----------|
//! | [`MemoryProperties`] | *(always available)* | Testing, prototyping |
//! | `SqliteProperties` | `sqlite` | Desktop, mobile, CLI |
//! | `RedbProperties` | `redb` | Pure-Rust hosts without C deps |

extern crate alloc;

mod codec;
mod error;
mod lookup;
mod memory;
mod persistent;
#[cfg(feature = "redb")]
mod redb;
mod selector;
#[cfg(feature = "sqlite")]
mod sqlite;
mod tag;
mod traits;
mod value;
mod volatile;
mod watch;

pub use error::StoreError;
pub use lookup::{Entry, Lookup};
pub use memory::{MemoryError, MemoryProperties};
pub use persistent::{PersistentConfig, PersistentStore, PersistentStoreBuilder, StoreResult};
#[cfg(feature = "redb")]
pub use redb::{RedbError, RedbProperties};
pub use selector::Selector;
#[cfg(feature = "sqlite")]
pub use sqlite::{JournalMode, SqliteConfig, SqliteError, SqliteProperties};
pub use tag::{TypeTag, UnknownTag, DEFAULT_TAG_SUFFIX};
pub use traits::*;
pub use value::{DynamicValue, Primitive, ValueError};
pub use volatile::VolatileStore;
pub use watch::{ChangeEvent, ChangeKind, ListenerId, WatchBus};
