//! Service integrations for external APIs and clients.
//!
//! This module contains implementations for the services used by handoff-bot:
//! - Code-hosting services (e.g., GitHub)
//! - Ticketing services (e.g., Jira)
//!
//! Each service module defines both generic traits and concrete implementations,
//! allowing for extensibility and easy testing.

pub mod hosting;
pub mod tickets;
