//! # digcoll-retriever
//!
//! A retrieval service for digital collections: it resolves opaque
//! identifiers to concrete assets (TIFF image masters, JPEGs, PDFs, OCR
//! records, descriptive metadata), derives missing image formats from the
//! formats a storage backend does provide, applies bounded resize/scale/crop
//! transforms, and caches transformed results.
//!
//! # Architecture
//!
//! A request flows through four layers, each oblivious to the ones above it:
//!
//! ```text
//! identifier ─→ registry   (which backend family owns this namespace?)
//!           ─→ derive     (native master, or the fallback chain)
//!           ─→ transform  (sanitize parameters, resize/scale/crop, encode)
//!           ─→ cache      (sliding-TTL store of encoded results)
//! ```
//!
//! The pivotal contract sits in [`storage`]: every backend operation returns
//! `Result`, and two error variants are control signals rather than
//! failures. `Omitted` means "not provided natively here, derive it from
//! another kind"; `Unsupported` means "never, including via derivation".
//! The derivative resolver consumes Omitted and nothing else; conflating the
//! two would silently break fallback correctness, so they are separate
//! variants with separate tests.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | Layered TOML + environment configuration |
//! | [`error`] | Service error taxonomy, JSON rendering, status codes |
//! | [`storage`] | Backend contract and the concrete backend families |
//! | [`registry`] | Ordered backend descriptors and identifier resolution |
//! | [`derive`] | Derivative resolution along the fixed fallback chains |
//! | [`transform`] | Parameter sanitization and raster execution |
//! | [`capability`] | Static per-family capability reporting for `/stat` |
//! | [`cache`] | Optional sliding-TTL result cache |
//! | [`retrieve`] | Per-request pipeline gluing the above together |
//! | [`server`] | axum state, router, and the thin HTTP handlers |
//!
//! # Statelessness
//!
//! Backends are constructed per request and discarded; the cache is the only
//! shared resource, and last-write-wins on a key is acceptable there. No
//! retrieval suspends cooperatively: the HTTP layer moves each request onto
//! the blocking pool and the core stays synchronous.

pub mod cache;
pub mod capability;
pub mod config;
pub mod derive;
pub mod error;
pub mod registry;
pub mod retrieve;
pub mod server;
pub mod storage;
pub mod transform;
