//! # Core Application Logic
//!
//! This module contains Jotter's UI-agnostic pieces.
//! It knows nothing about terminals, widgets, or key codes.
//!
//! ```text
//!                    ┌─────────────────────────┐
//!                    │         CORE            │
//!                    │  (this module)          │
//!                    │                         │
//!                    │  • Theme resolution     │
//!                    │  • Preferences store    │
//!                    │  • Bootstrap sequence   │
//!                    │  • Config               │
//!                    └───────────┬─────────────┘
//!                                │
//!            ┌───────────────────┴───────────────────┐
//!            ▼                                       ▼
//!     ┌────────────┐                          ┌────────────┐
//!     │    TUI     │                          │  Storage   │
//!     │   Shell    │                          │  (notes)   │
//!     │ (ratatui)  │                          │            │
//!     └────────────┘                          └────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`action`]: Messages from background tasks to the UI thread
//! - [`bootstrap`]: One-shot storage initialization before the UI renders
//! - [`config`]: Layered startup configuration
//! - [`preferences`]: Runtime settings and the preferences-panel toggle
//! - [`theme`]: The built-in themes and the id → theme resolver

pub mod action;
pub mod bootstrap;
pub mod config;
pub mod preferences;
pub mod theme;
