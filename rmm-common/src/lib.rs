//! Shared models, traits and errors used to drive Primitive RMM transactions.
//!
//! The crate is network agnostic: anything that talks to a node lives behind the
//! [`traits::NetworkConnection`] and [`traits::AccountCredential`] traits.

pub mod action;
pub mod error;
pub mod models;
pub mod receipt;
pub mod traits;

pub use alloy_primitives::{Address, Bytes, B256, U256};
pub use error::RmmError;
