//! # Kisan Sathi Core
//!
//! Runtime-agnostic logic for the daily tip and tomorrow-plan flow: data
//! models, the key-value store abstraction, the local tip cache, the
//! day-keyed plan store, and the plan orchestrator.
//!
//! This crate contains no tokio, sqlx, or HTTP client dependencies.
//! Storage, generation, and speech are reached through traits that the
//! `kisan-sathi` app crate (or a test) implements.
//!
//! ```text
//! ┌────────────┐   ┌────────────┐
//! │  TipCache  │   │ PlanStore  │
//! └─────┬──────┘   └─────┬──────┘
//!       └───────┬────────┘
//!               ▼
//!      ┌──────────────────┐     ┌───────────────┐
//!      │ PlanOrchestrator │────▶│ PlanGenerator │
//!      └────────┬─────────┘     └───────────────┘
//!               ▼
//!      ┌──────────────────┐
//!      │ SpeechController │
//!      └──────────────────┘
//! ```

pub mod clock;
pub mod generation;
pub mod models;
pub mod orchestrator;
pub mod plan;
pub mod speech;
pub mod store;
pub mod tips;
