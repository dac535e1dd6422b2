//! Helpers for setting up markets on a fresh network.

use alloy::primitives::Address;
use rmm_common::{
    action::EngineCreationParams, models::blockchain::TransactionOverrides, RmmError,
};
use tracing::{info, instrument};

use crate::rmm::Rmm;

async fn ensure_token_deployed(rmm: &Rmm, token: Address, what: &str) -> Result<(), RmmError> {
    let code = rmm
        .connection()
        .network()
        .get_code(token)
        .await?;
    if code.is_empty() {
        return Err(RmmError::InvalidAddress(format!("No {what} token deployed at {token}")));
    }
    Ok(())
}

/// Returns the engine of the token pair, deploying it if the factory has none yet.
///
/// Both tokens must already be deployed contracts.
#[instrument(level = "debug", skip(rmm, overrides))]
pub async fn deploy_engine(
    rmm: &Rmm,
    risky: Address,
    stable: Address,
    overrides: TransactionOverrides,
) -> Result<Address, RmmError> {
    let params = EngineCreationParams { risky, stable };
    params.validate()?;
    ensure_token_deployed(rmm, risky, "risky").await?;
    ensure_token_deployed(rmm, stable, "stable").await?;

    let details = rmm
        .create_engine(params, overrides)
        .await?;
    if details.engine.is_zero() {
        return Err(RmmError::Decoding(format!(
            "Engine deployment for {risky}/{stable} reported no engine address"
        )));
    }
    info!(engine = %details.engine, reused = details.transaction_hash.is_none(), "Engine ready");
    Ok(details.engine)
}
