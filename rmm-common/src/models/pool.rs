use alloy_primitives::{keccak256, Address, U256};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::{token::Token, Amount, PoolId};
use crate::error::RmmError;

/// Prefix of the data URI returned by the manager's `uri(id)` function.
const TOKEN_URI_PREFIX: &str = "data:application/json;base64,";

/// Parameters a pool was created with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Calibration {
    /// Strike price of the replicated option, in stable token units.
    pub strike: u128,
    /// Implied volatility in basis points.
    pub sigma: u32,
    /// Expiry timestamp in seconds.
    pub maturity: u32,
    /// `1 - fee` in basis points.
    pub gamma: u32,
    pub last_timestamp: u32,
}

/// Reserves and total liquidity of a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reserves {
    pub reserve_risky: U256,
    pub reserve_stable: U256,
    pub liquidity: U256,
}

/// A parameterized market between a risky and a stable token hosted by an engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pool {
    pub chain_id: u64,
    pub factory: Address,
    pub engine: Address,
    pub pool_id: PoolId,
    pub risky: Token,
    pub stable: Token,
    pub calibration: Calibration,
    pub reserves: Reserves,
}

impl Pool {
    /// Builds a pool, deriving its id from the engine and calibration.
    pub fn new(
        chain_id: u64,
        factory: Address,
        engine: Address,
        risky: Token,
        stable: Token,
        calibration: Calibration,
        reserves: Reserves,
    ) -> Self {
        let pool_id = Self::compute_pool_id(engine, &calibration);
        Self { chain_id, factory, engine, pool_id, risky, stable, calibration, reserves }
    }

    /// `keccak256(abi.encodePacked(engine, strike, sigma, maturity, gamma))`
    pub fn compute_pool_id(engine: Address, calibration: &Calibration) -> PoolId {
        let mut packed = Vec::with_capacity(20 + 16 + 4 * 3);
        packed.extend_from_slice(engine.as_slice());
        packed.extend_from_slice(&calibration.strike.to_be_bytes());
        packed.extend_from_slice(&calibration.sigma.to_be_bytes());
        packed.extend_from_slice(&calibration.maturity.to_be_bytes());
        packed.extend_from_slice(&calibration.gamma.to_be_bytes());
        keccak256(packed)
    }

    /// The ERC-1155 token id of this pool's liquidity token.
    pub fn token_id(&self) -> U256 {
        Self::token_id_of(self.pool_id)
    }

    /// The manager mints liquidity tokens under the pool id read as a big-endian integer.
    pub fn token_id_of(pool_id: PoolId) -> U256 {
        U256::from_be_bytes(pool_id.0)
    }

    pub fn reserve_risky(&self) -> Amount {
        Amount::new(self.reserves.reserve_risky, self.risky.decimals)
    }

    pub fn reserve_stable(&self) -> Amount {
        Amount::new(self.reserves.reserve_stable, self.stable.decimals)
    }

    pub fn liquidity(&self) -> Amount {
        Amount::liquidity(self.reserves.liquidity)
    }

    /// Returns a copy of the pool with a different id and engine, used once the
    /// chain reports the pool that was actually created.
    pub fn with_id(&self, pool_id: PoolId, engine: Address) -> Self {
        Self { pool_id, engine, ..self.clone() }
    }

    /// Parses the base64 encoded JSON returned by the manager's `uri(id)` call.
    ///
    /// The payload does not carry the engine address, so it has to be supplied.
    pub fn from_token_uri(raw: &str, engine: Address) -> Result<Self, RmmError> {
        let encoded = raw
            .strip_prefix(TOKEN_URI_PREFIX)
            .ok_or_else(|| RmmError::Decoding(format!("Unexpected token uri prefix: {raw:.40}")))?;
        let json = STANDARD
            .decode(encoded)
            .map_err(|e| RmmError::Decoding(format!("Invalid base64 token uri: {e}")))?;
        let metadata: TokenUriMetadata = serde_json::from_slice(&json)
            .map_err(|e| RmmError::Decoding(format!("Invalid token uri json: {e}")))?;
        metadata.properties.into_pool(engine)
    }
}

#[derive(Debug, Deserialize)]
struct TokenUriMetadata {
    properties: TokenUriProperties,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenUriProperties {
    chain_id: u64,
    factory: Address,
    risky_address: Address,
    risky_name: String,
    risky_symbol: String,
    risky_decimals: String,
    stable_address: Address,
    stable_name: String,
    stable_symbol: String,
    stable_decimals: String,
    strike: String,
    sigma: String,
    maturity: String,
    gamma: String,
    last_timestamp: String,
    reserve_risky: String,
    reserve_stable: String,
    liquidity: String,
}

impl TokenUriProperties {
    fn into_pool(self, engine: Address) -> Result<Pool, RmmError> {
        let calibration = Calibration {
            strike: parse_number(&self.strike, "strike")?,
            sigma: parse_number(&self.sigma, "sigma")?,
            maturity: parse_number(&self.maturity, "maturity")?,
            gamma: parse_number(&self.gamma, "gamma")?,
            last_timestamp: parse_number(&self.last_timestamp, "lastTimestamp")?,
        };
        let reserves = Reserves {
            reserve_risky: parse_u256(&self.reserve_risky, "reserveRisky")?,
            reserve_stable: parse_u256(&self.reserve_stable, "reserveStable")?,
            liquidity: parse_u256(&self.liquidity, "liquidity")?,
        };
        let risky = Token::new(
            self.risky_address,
            parse_number(&self.risky_decimals, "riskyDecimals")?,
            &self.risky_symbol,
            &self.risky_name,
        );
        let stable = Token::new(
            self.stable_address,
            parse_number(&self.stable_decimals, "stableDecimals")?,
            &self.stable_symbol,
            &self.stable_name,
        );
        Ok(Pool::new(self.chain_id, self.factory, engine, risky, stable, calibration, reserves))
    }
}

fn parse_number<T: std::str::FromStr>(value: &str, field: &str) -> Result<T, RmmError> {
    value
        .parse()
        .map_err(|_| RmmError::Decoding(format!("Invalid {field} in token uri: {value}")))
}

fn parse_u256(value: &str, field: &str) -> Result<U256, RmmError> {
    U256::from_str_radix(value, 10)
        .map_err(|e| RmmError::Decoding(format!("Invalid {field} in token uri: {value} ({e})")))
}


#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::{fixtures::*, *};

    #[test]
    fn test_pool_id_is_packed_keccak() {
        let pool = pool();
        let mut expected = Vec::new();
        expected.extend_from_slice(engine().as_slice());
        expected.extend_from_slice(&10_000_000u128.to_be_bytes());
        expected.extend_from_slice(&10_000u32.to_be_bytes());
        expected.extend_from_slice(&1_700_000_000u32.to_be_bytes());
        expected.extend_from_slice(&9_900u32.to_be_bytes());

        assert_eq!(expected.len(), 48);
        assert_eq!(pool.pool_id, keccak256(expected));
    }

    #[test]
    fn test_pool_id_depends_on_maturity() {
        let pool = pool();
        let later = Calibration { maturity: pool.calibration.maturity + 100, ..pool.calibration };
        assert_ne!(Pool::compute_pool_id(pool.engine, &later), pool.pool_id);
    }

    #[test]
    fn test_from_token_uri() {
        let pool = pool();
        let json = serde_json::json!({
            "name": "Primitive RMM-01 LP",
            "properties": {
                "factory": pool.factory.to_string(),
                "riskyName": "Risky",
                "riskySymbol": "RSK",
                "riskyDecimals": "18",
                "riskyAddress": pool.risky.address.to_string(),
                "stableName": "Stable",
                "stableSymbol": "USDC",
                "stableDecimals": "6",
                "stableAddress": pool.stable.address.to_string(),
                "invariant": "0",
                "strike": "10000000",
                "sigma": "10000",
                "maturity": "1700000000",
                "lastTimestamp": "1650000000",
                "gamma": "9900",
                "reserveRisky": "500000000000000000",
                "reserveStable": "4000000",
                "liquidity": "1000000000000000000",
                "blockTimestamp": "1650000000",
                "cumulativeRisky": "0",
                "cumulativeStable": "0",
                "cumulativeLiquidity": "0",
                "chainId": 1337
            }
        });
        let uri = format!("{TOKEN_URI_PREFIX}{}", STANDARD.encode(json.to_string()));

        let parsed = Pool::from_token_uri(&uri, engine()).expect("valid token uri");

        assert_eq!(parsed, pool);
    }

    #[test]
    fn test_from_token_uri_rejects_non_numeric_decimals() {
        let json = serde_json::json!({
            "properties": {
                "factory": Address::repeat_byte(0xfa).to_string(),
                "riskyName": "Risky",
                "riskySymbol": "RSK",
                "riskyDecimals": "eighteen",
                "riskyAddress": Address::repeat_byte(0x01).to_string(),
                "stableName": "Stable",
                "stableSymbol": "USDC",
                "stableDecimals": "6",
                "stableAddress": Address::repeat_byte(0x02).to_string(),
                "strike": "1", "sigma": "1", "maturity": "1", "lastTimestamp": "1", "gamma": "1",
                "reserveRisky": "0", "reserveStable": "0", "liquidity": "0",
                "chainId": 31337
            }
        });
        let uri = format!("{TOKEN_URI_PREFIX}{}", STANDARD.encode(json.to_string()));

        let err = Pool::from_token_uri(&uri, engine()).unwrap_err();

        assert!(matches!(err, RmmError::Decoding(msg) if msg.contains("riskyDecimals")));
    }

    #[test]
    fn test_from_token_uri_rejects_plain_json() {
        let err = Pool::from_token_uri("{\"properties\":{}}", engine()).unwrap_err();
        assert!(matches!(err, RmmError::Decoding(_)));
    }
}
