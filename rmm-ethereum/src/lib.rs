//! Ethereum adapter of the RMM client.
//!
//! Binds the Primitive RMM contracts of a deployment to a network connection and drives
//! each action through populate, send and receipt classification. [`rpc`] provides a
//! JSON-RPC implementation of the network traits of `rmm-common`.

#[cfg(test)]
#[macro_use]
extern crate pretty_assertions;

pub mod connection;
pub mod contracts;
pub mod deploy;
pub mod gas;
pub mod rmm;
pub mod rpc;
pub mod transaction;

pub use connection::{connect, Connection, Deployment, DeploymentRegistry};
pub use rmm::Rmm;
pub use rpc::{account::NodeAccount, EthereumRpcClient};
pub use transaction::{PopulatedTransaction, SentTransaction, TransactionPopulator};
