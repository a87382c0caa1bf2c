//! **Shalloc:** the shared allocation registry.
//!
//! This crate keeps track of every live allocation made by a memory space (host memory, device
//! memory, and so on). Each allocation gets a record carrying an intrusive reference count, linked
//! into a circular list anchored at the space's root. When the last reference is released, the
//! record is unlinked and handed to the deallocator of its space, exactly once.
//!
//! No OS mutex is involved: structural edits to a list are serialized by a spin lock on the root's
//! successor link, and count changes are plain atomic arithmetic. Copying or dropping a handle to
//! a record which stays alive never takes the lock.
//!
//! ```
//! use std::sync::Arc;
//! use shalloc::{Record, Root};
//!
//! let root = Root::new("HostSpace");
//! let rec = shalloc::construct(&root, std::ptr::null_mut(), 0, Arc::new(|_: Box<Record>| {}));
//!
//! unsafe {
//!     shalloc::increment(rec);
//!     assert!(shalloc::is_sane(rec.get()));
//!     assert!(shalloc::decrement(rec).is_none());
//! }
//!
//! assert!(root.is_empty());
//! ```

#![cfg_attr(not(test), no_std)]
#![warn(missing_docs)]

extern crate alloc;

#[macro_use]
mod write;

mod lock;
mod ptr;
mod record;
mod root;
mod sync;
mod sys;
pub mod fail;
pub mod sanity;

pub use crate::record::{construct, decrement, increment, Dealloc, Record, RecordRef};
pub use crate::root::Root;
pub use crate::sanity::{is_sane, validate, Insanity};
