//! Conversions between alloy's JSON-RPC types and the transaction models of `rmm_common`.

use alloy::{
    primitives::{TxKind, U256},
    rpc::types::{
        TransactionInput, TransactionReceipt, TransactionRequest as RpcTransactionRequest,
    },
};
use rmm_common::models::blockchain::{RawCall, RawLog, RawReceipt, TransactionRequest};

fn non_zero(value: U256) -> Option<U256> {
    (!value.is_zero()).then_some(value)
}

pub(crate) fn call_request(call: &RawCall) -> RpcTransactionRequest {
    RpcTransactionRequest {
        from: call.from,
        to: Some(TxKind::Call(call.to)),
        input: TransactionInput::both(call.data.clone()),
        value: non_zero(call.value),
        ..Default::default()
    }
}

pub(crate) fn transaction_request(request: &TransactionRequest) -> RpcTransactionRequest {
    RpcTransactionRequest {
        from: request.from,
        to: Some(TxKind::Call(request.to)),
        input: TransactionInput::both(request.data.clone()),
        value: non_zero(request.value),
        gas: request.gas_limit,
        nonce: request.nonce,
        chain_id: request.chain_id,
        gas_price: request.gas_price,
        max_fee_per_gas: request.max_fee_per_gas,
        max_priority_fee_per_gas: request.max_priority_fee_per_gas,
        ..Default::default()
    }
}

/// Pre-Byzantium receipts only carry a state root and count as not successful.
pub(crate) fn raw_receipt(receipt: TransactionReceipt) -> RawReceipt {
    let status = receipt
        .inner
        .as_receipt()
        .and_then(|inner| inner.status.as_eip658())
        .unwrap_or(false);

    RawReceipt {
        transaction_hash: receipt.transaction_hash,
        block_hash: receipt.block_hash,
        block_number: receipt.block_number,
        gas_used: receipt.gas_used,
        status,
        contract_address: receipt.contract_address,
        logs: receipt
            .inner
            .into_logs()
            .into_iter()
            .map(|log| {
                let address = log.inner.address;
                let (topics, data) = log.inner.data.split();
                RawLog { address, topics, data }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bytes, B256};
    use serde_json::json;

    use super::*;

    fn receipt_fields(status: serde_json::Value) -> serde_json::Value {
        json!({
            "type": "0x2",
            "transactionHash": B256::repeat_byte(0x0f),
            "transactionIndex": "0x0",
            "blockHash": B256::repeat_byte(0x0b),
            "blockNumber": "0x10",
            "from": Address::repeat_byte(0x11),
            "to": Address::repeat_byte(0x22),
            "gasUsed": "0x5208",
            "cumulativeGasUsed": "0x5208",
            "effectiveGasPrice": "0x3b9aca00",
            "contractAddress": null,
            "logsBloom": format!("0x{}", "00".repeat(256)),
            "status": status,
            "logs": [{
                "address": Address::repeat_byte(0x22),
                "topics": [B256::repeat_byte(0xaa)],
                "data": "0xabcd",
                "blockHash": B256::repeat_byte(0x0b),
                "blockNumber": "0x10",
                "transactionHash": B256::repeat_byte(0x0f),
                "transactionIndex": "0x0",
                "logIndex": "0x0",
                "removed": false
            }]
        })
    }

    #[test]
    fn test_request_serializes_hex_quantities() {
        let request = TransactionRequest {
            from: Some(Address::repeat_byte(0x11)),
            to: Address::repeat_byte(0x22),
            data: Bytes::from(vec![0xab, 0xcd]),
            value: U256::ZERO,
            gas_limit: Some(150_000),
            nonce: Some(3),
            chain_id: Some(1),
            gas_price: None,
            max_fee_per_gas: Some(2_000_000_000),
            max_priority_fee_per_gas: Some(1_500_000_000),
        };

        let value = serde_json::to_value(transaction_request(&request)).unwrap();

        assert_eq!(value["from"], json!("0x1111111111111111111111111111111111111111"));
        assert_eq!(value["to"], json!("0x2222222222222222222222222222222222222222"));
        assert_eq!(value["input"], json!("0xabcd"));
        assert_eq!(value["data"], json!("0xabcd"));
        assert_eq!(value["gas"], json!("0x249f0"));
        assert_eq!(value["nonce"], json!("0x3"));
        assert_eq!(value["chainId"], json!("0x1"));
        assert_eq!(value["maxFeePerGas"], json!("0x77359400"));
        assert_eq!(value["maxPriorityFeePerGas"], json!("0x59682f00"));
        assert!(value.get("value").is_none());
        assert!(value.get("gasPrice").is_none());
    }

    #[test]
    fn test_call_request_keeps_value() {
        let call = RawCall {
            from: None,
            to: Address::repeat_byte(0x22),
            data: Bytes::new(),
            value: U256::from(5),
        };

        let value = serde_json::to_value(call_request(&call)).unwrap();

        assert_eq!(value["value"], json!("0x5"));
        assert!(value.get("from").is_none());
        assert!(value.get("gas").is_none());
    }

    #[test]
    fn test_receipt_conversion() {
        let receipt: TransactionReceipt =
            serde_json::from_value(receipt_fields(json!("0x0"))).unwrap();

        let raw = raw_receipt(receipt);

        assert!(!raw.status);
        assert_eq!(raw.transaction_hash, B256::repeat_byte(0x0f));
        assert_eq!(raw.block_number, Some(16));
        assert_eq!(raw.gas_used, 21_000);
        assert_eq!(
            raw.logs,
            vec![RawLog {
                address: Address::repeat_byte(0x22),
                topics: vec![B256::repeat_byte(0xaa)],
                data: Bytes::from(vec![0xab, 0xcd]),
            }]
        );
    }

    #[test]
    fn test_receipt_with_state_root_is_not_successful() {
        let mut fields = receipt_fields(json!(null));
        let object = fields.as_object_mut().unwrap();
        object.remove("status");
        object.insert("type".to_string(), json!("0x0"));
        object.insert("root".to_string(), json!(B256::repeat_byte(0x01)));
        let receipt: TransactionReceipt = serde_json::from_value(fields).unwrap();

        assert!(!raw_receipt(receipt).status);
    }
}
