//! Named event hooks for uno applications.
//!
//! Listeners are attached to an event name and run synchronously, in the
//! order they were attached, every time the name is emitted. A failing
//! listener stops the emission and the error reaches the emitter.
//!
//! ```rust
//! use uno_events::EventBus;
//! use std::sync::Arc;
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! let bus = EventBus::new();
//! let seen = Arc::new(AtomicUsize::new(0));
//! let counter = seen.clone();
//!
//! bus.on("user.created", move |args| {
//!     let id = args.get::<u64>(0).copied().unwrap_or_default();
//!     counter.fetch_add(id as usize, Ordering::SeqCst);
//!     Ok(())
//! });
//!
//! bus.emit("user.created", &[&7u64]).unwrap();
//! assert_eq!(seen.load(Ordering::SeqCst), 7);
//! ```

#![warn(clippy::all)]

mod bus;
mod error;

pub use bus::*;
pub use error::*;
