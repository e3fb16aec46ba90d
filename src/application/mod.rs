// SPDX-License-Identifier: MPL-2.0
//! Application layer - ports between the loading pipeline and the outside world.
//!
//! - [`port`]: Trait definitions (interfaces) for dependency inversion
//!
//! # Dependency Rule
//!
//! - Application layer depends on domain layer (uses domain types)
//! - Infrastructure layer implements application layer ports
//! - The `media` pipeline only talks to ports, never to adapters directly

pub mod port;
