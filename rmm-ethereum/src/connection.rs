use std::{collections::HashMap, fmt, str::FromStr, sync::Arc};

use alloy::primitives::Address;
use chrono::{DateTime, TimeZone, Utc};
use rmm_common::{
    traits::{AccountCredential, NetworkConnection},
    RmmError,
};
use serde::Deserialize;
use tracing::{debug, instrument};

use crate::contracts::{ContractAddresses, RmmContracts};

/// Where and when the RMM contracts were deployed on one network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deployment {
    pub chain_id: u64,
    pub deployment_date: DateTime<Utc>,
    /// First block containing any of the deployment's contracts.
    pub start_block: u64,
    pub addresses: ContractAddresses,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentEntry {
    chain_id: u64,
    /// Milliseconds since the unix epoch.
    deployment_date: i64,
    start_block: u64,
    addresses: HashMap<String, String>,
}

impl DeploymentEntry {
    fn address(&self, name: &str) -> Result<Address, RmmError> {
        let raw = self.addresses.get(name).ok_or_else(|| {
            RmmError::InvalidAddress(format!("{name} missing for chain {}", self.chain_id))
        })?;
        Address::from_str(raw).map_err(|e| {
            RmmError::InvalidAddress(format!("{name} of chain {}: {raw} ({e})", self.chain_id))
        })
    }

    fn into_deployment(self) -> Result<Deployment, RmmError> {
        let addresses = ContractAddresses {
            primitive_factory: self.address("primitiveFactory")?,
            primitive_manager: self.address("primitiveManager")?,
            position_renderer: self.address("positionRenderer")?,
            position_descriptor: self.address("positionDescriptor")?,
        };
        let deployment_date = Utc
            .timestamp_millis_opt(self.deployment_date)
            .single()
            .ok_or_else(|| {
                RmmError::InvalidDeployment(format!(
                    "Invalid deployment date {} for chain {}",
                    self.deployment_date, self.chain_id
                ))
            })?;
        Ok(Deployment {
            chain_id: self.chain_id,
            deployment_date,
            start_block: self.start_block,
            addresses,
        })
    }
}

/// Known RMM deployments by chain id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeploymentRegistry {
    deployments: HashMap<u64, Deployment>,
}

impl DeploymentRegistry {
    pub fn from_deployments(deployments: impl IntoIterator<Item = Deployment>) -> Self {
        Self {
            deployments: deployments
                .into_iter()
                .map(|deployment| (deployment.chain_id, deployment))
                .collect(),
        }
    }

    /// Parses a JSON array of `{chainId, deploymentDate, startBlock, addresses}` entries.
    pub fn from_json(json: &str) -> Result<Self, RmmError> {
        let entries: Vec<DeploymentEntry> = serde_json::from_str(json)
            .map_err(|e| RmmError::InvalidDeployment(format!("Invalid deployment file: {e}")))?;
        let deployments = entries
            .into_iter()
            .map(DeploymentEntry::into_deployment)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_deployments(deployments))
    }

    pub fn get(&self, chain_id: u64) -> Option<&Deployment> {
        self.deployments.get(&chain_id)
    }

    pub fn insert(&mut self, deployment: Deployment) {
        self.deployments
            .insert(deployment.chain_id, deployment);
    }
}

/// The unbound half of a connection: what was resolved from the registry plus the
/// credential, before any contract handle exists.
pub struct ConnectionData {
    deployment: Deployment,
    credential: Arc<dyn AccountCredential>,
}

impl ConnectionData {
    pub fn new(deployment: Deployment, credential: Arc<dyn AccountCredential>) -> Self {
        Self { deployment, credential }
    }

    /// Binds the deployment's addresses to their contract interfaces.
    pub fn bind(self, network: Arc<dyn NetworkConnection>) -> Connection {
        let contracts = RmmContracts::from(&self.deployment.addresses);
        Connection {
            inner: Arc::new(ConnectionInner {
                network,
                credential: self.credential,
                deployment: self.deployment,
                contracts,
            }),
        }
    }
}

struct ConnectionInner {
    network: Arc<dyn NetworkConnection>,
    credential: Arc<dyn AccountCredential>,
    deployment: Deployment,
    contracts: RmmContracts,
}

/// A network, an account and the RMM contracts deployed on that network.
///
/// Immutable once built and cheap to clone.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<ConnectionInner>,
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("chain_id", &self.inner.deployment.chain_id)
            .field("signer", &self.inner.credential.address())
            .field("contracts", &self.inner.contracts)
            .finish()
    }
}

impl Connection {
    pub fn chain_id(&self) -> u64 {
        self.inner.deployment.chain_id
    }

    pub fn network(&self) -> &Arc<dyn NetworkConnection> {
        &self.inner.network
    }

    pub fn credential(&self) -> &Arc<dyn AccountCredential> {
        &self.inner.credential
    }

    pub fn signer_address(&self) -> Address {
        self.inner.credential.address()
    }

    pub fn deployment(&self) -> &Deployment {
        &self.inner.deployment
    }

    pub fn contracts(&self) -> &RmmContracts {
        &self.inner.contracts
    }

    pub fn contract_addresses_by_name(&self) -> HashMap<&'static str, Address> {
        self.inner
            .deployment
            .addresses
            .named()
            .into_iter()
            .collect()
    }
}

/// Resolves the network's chain id against `registry` and binds the deployed contracts.
#[instrument(level = "debug", skip_all)]
pub async fn connect(
    registry: &DeploymentRegistry,
    network: Arc<dyn NetworkConnection>,
    credential: Arc<dyn AccountCredential>,
) -> Result<Connection, RmmError> {
    let chain_id = network.chain_id().await?;
    let deployment = registry
        .get(chain_id)
        .cloned()
        .ok_or(RmmError::UnknownNetwork(chain_id))?;
    debug!(chain_id, start_block = deployment.start_block, "Resolved RMM deployment");
    Ok(ConnectionData::new(deployment, credential).bind(network))
}
