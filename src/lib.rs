//! This crate implements the meta service of a content-addressed distributed
//! file store.
//!
//! # Data model
//!
//! The service keeps one logical document, the *catalog*: a map of file
//! names to ordered chunk fingerprints, a map of fingerprints to replica
//! sets, and a map of storage-node identifiers to membership state. The
//! catalog is the single source of truth; storage nodes themselves hold
//! only content-addressed blobs and are otherwise stateless from the meta
//! service's point of view.
//!
//! # Persistence
//!
//! The catalog is a single JSON document, rewritten in full on every
//! mutation and swapped into place with a temp-file-then-rename, so a
//! reader never observes a partial write. There is no journal: at this
//! scale a full-document snapshot is simpler and cheap enough. See
//! [`catalog::store`] for details.
//!
//! # Membership
//!
//! Storage nodes are expected to heartbeat periodically. Liveness is a
//! soft-state view, reconverged by a sweep that runs at the start of every
//! request handler rather than on a background timer — there is no
//! consumer of liveness that needs a fresher view than "as of the last
//! request". See [`catalog::membership`].
//!
//! # Placement
//!
//! Replica selection and repair live in [`placement`]; they operate purely
//! on in-memory sets and never touch storage-node data directly — the meta
//! service only ever updates its *belief* about where a chunk's replicas
//! should live.

pub mod config;
pub mod error;
pub mod catalog;
pub mod placement;
pub mod healthcheck;
pub mod api;
pub mod server;
pub mod tools;
