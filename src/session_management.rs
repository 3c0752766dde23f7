//! Session establishment.
//!
//! Turns a freshly started container into one with a usable remote-shell
//! connection string, tolerating the flakiness of the in-container
//! bootstrap (software install, daemon start-up lag) with bounded retries.

pub mod establisher;

pub use establisher::SessionEstablisher;
