//! Core of a single-creature virtual pet.
//!
//! ```text
//!   user action / tick ──▶ PetService ──▶ sim (rules) ──▶ PetStore.save
//!                                              │
//!                                              ▼
//!                                        AlertMonitor ──▶ AlertSink
//! ```
//!
//! Every driver (foreground [`driver::Ticker`], background [`driver::Driver`],
//! resume catch-up) goes through [`service::PetService`], which reloads the
//! stored pet before each mutation and runs the one shared rate table.

pub mod alerts;
pub mod clock;
pub mod config;
pub mod driver;
pub mod error;
pub mod model;
pub mod service;
pub mod sim;
pub mod storage;
