//! # Magazine Search
//!
//! Keyword search over a collection of PDF magazine issues.
//!
//! Magazine and issue metadata live in a remote realtime database; the PDFs
//! live in an object-storage bucket. A search either downloads each PDF on
//! demand and scans it in memory, or scans a local cache of PDFs that is
//! periodically synced from storage.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌──────────────┐   ┌─────────────┐
//! │ Metadata     │   │ Object       │   │ Local cache │
//! │ store (REST) │   │ storage      │◀──│ (sync)      │
//! └──────┬───────┘   └──────┬───────┘   └──────┬──────┘
//!        └───────────┬──────┴──────────────────┘
//!                    ▼
//!            ┌───────────────┐   ┌─────────┐   ┌────────┐
//!            │ CorpusProvider│──▶│ Matcher │──▶│ Ranker │
//!            └───────────────┘   └─────────┘   └───┬────┘
//!                                                  ▼
//!                                   ┌──────────┐ ┌──────────┐
//!                                   │   CLI    │ │   HTTP   │
//!                                   │(magsearch│ │  (axum)  │
//!                                   └──────────┘ └──────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! magsearch search "technology" --limit 5   # ranked search, fetched on demand
//! magsearch sync                            # fill the local cache
//! magsearch search "science" --mode line    # line search over the cache
//! magsearch serve                           # start the HTTP API
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and credential overlay |
//! | [`error`] | Error taxonomy |
//! | [`models`] | Core data types and response bodies |
//! | [`traits`] | Collaborator seams |
//! | [`metadata`] | Realtime-database metadata store |
//! | [`storage`] | Object-storage downloads |
//! | [`extract`] | PDF text extraction |
//! | [`cache`] | Local PDF cache and sync |
//! | [`corpus`] | Remote and cached corpus providers |
//! | [`matcher`] | Page and line matching |
//! | [`ranker`] | Proximity confidence |
//! | [`search`] | Search orchestration |
//! | [`server`] | HTTP API |

pub mod cache;
pub mod config;
pub mod corpus;
pub mod error;
pub mod extract;
pub mod matcher;
pub mod metadata;
pub mod models;
pub mod ranker;
pub mod search;
pub mod server;
pub mod storage;
pub mod traits;
