//! # Warden Admin
//!
//! Operator tooling for token keys:
//!
//! - `genkey` writes a fresh Ed25519 key pair as `<kid>.pem` files
//! - `gentoken` issues a long-lived token signed by the active key
//! - `verify` checks a token and prints its claims
//!
//! A rotation is `genkey` for the new kid, replacing the old kid's private
//! file with its public half, and restarting services with the new
//! `WARDEN_ACTIVE_KID`.

#![deny(unsafe_code)]

pub mod cli;
pub mod commands;
pub mod error;

pub use cli::Cli;
pub use commands::run;
pub use error::{AdminError, Result};
