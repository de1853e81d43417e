//! # gearz-host: Reference Host Integration for GEARZ
//!
//! Glue between a tick-based simulation and the game-agnostic
//! `gearz-core` engine.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │               Host simulation            │
//! │  ┌────────────────────────────────────┐  │
//! │  │            gearz-host              │  │
//! │  │  hooks ──► events ──► TickDriver   │  │
//! │  │                        │    │      │  │
//! │  │             components ┘    ▼      │  │
//! │  │                  ┌──────────────┐  │  │
//! │  │   WorldSnapshot ─►  gearz-core  │  │  │
//! │  │                  └──────────────┘  │  │
//! │  └────────────────────────────────────┘  │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - `config`: host profiles and settings layered over the engine config
//! - `components`: per-agent evaluation bookkeeping
//! - `events`: host events that touch the caches
//! - `hooks`: constructors the host calls from its own systems
//! - `systems`: event application, scheduler dispatch, gear evaluation
//! - `telemetry`: tracing subscriber setup
//! - `world`: the world snapshot and a seeded synthetic world generator

#![deny(clippy::unwrap_used)]
#![deny(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod components;
pub mod config;
pub mod events;
pub mod hooks;
pub mod systems;
pub mod telemetry;
pub mod world;

pub use config::{HostConfig, HostProfile, LogFormat};
pub use events::HostEvent;
pub use systems::{DriverStats, TickDriver, TickReport};
pub use world::{WorldGen, WorldSnapshot};
