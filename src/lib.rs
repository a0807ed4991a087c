//! # Kisan Sathi
//!
//! Daily farming tips and tomorrow plans for Nepali farmers.
//!
//! This crate is the native side of the tip/plan flow: it persists the
//! client-local caches in SQLite, talks to the proxy endpoints over HTTP,
//! speaks plans through an external text-to-speech program, and serves
//! the two proxy functions that forward prompts to an AI gateway. The
//! runtime-agnostic logic lives in [`kisan_sathi_core`].
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐   ┌────────────┐
//! │ CLI (kisan)  │──▶│ PlanOrchestrator │──▶│ HttpGenerator│──▶│   proxy    │──▶ AI gateway
//! │  PlanCard    │   │ TipCache/PlanStore│  └──────────────┘   │ /tip /plan │
//! └──────────────┘   └────────┬─────────┘                      └────────────┘
//!                             ▼
//!                      ┌────────────┐
//!                      │  SQLite kv │
//!                      └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! kisan init                                   # create the local store
//! kisan serve                                  # run the proxy
//! kisan tip ask --crop rice --stage flowering --save
//! kisan plan generate --crop rice --stage flowering
//! kisan plan watch                             # refreshes every 5 minutes
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`db`] | Database connection |
//! | [`migrate`] | Key-value schema |
//! | [`sqlite_store`] | SQLite `KvStore` |
//! | [`gateway`] | AI gateway client |
//! | [`prompts`] | Tip and plan prompts |
//! | [`server`] | Proxy HTTP server |
//! | [`client`] | Proxy HTTP client |
//! | [`speech`] | Command-line speech engine |
//! | [`card`] | Periodically refreshed plan card |
//! | [`app`] | Wiring |

pub mod app;
pub mod card;
pub mod client;
pub mod config;
pub mod db;
pub mod gateway;
pub mod migrate;
pub mod plan_cmd;
pub mod prompts;
pub mod server;
pub mod speech;
pub mod sqlite_store;
pub mod tip_cmd;
