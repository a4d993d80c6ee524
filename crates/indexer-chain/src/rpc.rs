use crate::error::ChainError;
use crate::ChainResult;
use indexer_types::{Address, Log};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'a str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

async fn call(http: &reqwest::Client, url: &str, method: &str, params: Value) -> ChainResult<Value> {
    let request = RpcRequest {
        jsonrpc: "2.0",
        id: 1,
        method,
        params,
    };
    let response = http
        .post(url)
        .json(&request)
        .send()
        .await
        .map_err(|e| ChainError::Transport(e.to_string()))?;
    let body: RpcResponse = response
        .json()
        .await
        .map_err(|e| ChainError::Transport(e.to_string()))?;
    if let Some(err) = body.error {
        return Err(ChainError::Rpc {
            code: err.code,
            message: err.message,
        });
    }
    body.result
        .ok_or_else(|| ChainError::MalformedResponse("missing result field".to_string()))
}

pub async fn block_number(http: &reqwest::Client, url: &str) -> ChainResult<u64> {
    let result = call(http, url, "eth_blockNumber", json!([])).await?;
    parse_hex_u64(&result)
}

pub struct BlockHeader {
    pub hash: [u8; 32],
    pub timestamp: i64,
}

pub async fn block_by_number(
    http: &reqwest::Client,
    url: &str,
    number: u64,
) -> ChainResult<BlockHeader> {
    let result = call(
        http,
        url,
        "eth_getBlockByNumber",
        json!([format!("0x{:x}", number), false]),
    )
    .await?;
    if result.is_null() {
        return Err(ChainError::MalformedResponse(format!(
            "block {number} not found"
        )));
    }
    let hash_str = result["hash"]
        .as_str()
        .ok_or_else(|| ChainError::MalformedResponse("block missing hash".to_string()))?;
    let timestamp = parse_hex_u64(&result["timestamp"])?;
    Ok(BlockHeader {
        hash: parse_hex_32(hash_str)?,
        timestamp: timestamp as i64,
    })
}

pub async fn get_logs(
    http: &reqwest::Client,
    url: &str,
    address: Option<Address>,
    from: u64,
    to: u64,
    topic0: Option<[u8; 32]>,
) -> ChainResult<Vec<Log>> {
    let mut filter = serde_json::Map::new();
    filter.insert("fromBlock".to_string(), json!(format!("0x{:x}", from)));
    filter.insert("toBlock".to_string(), json!(format!("0x{:x}", to)));
    if let Some(addr) = address {
        filter.insert("address".to_string(), json!(addr.to_string()));
    }
    if let Some(topic) = topic0 {
        filter.insert("topics".to_string(), json!([format!("0x{}", hex(&topic))]));
    }

    let result = call(http, url, "eth_getLogs", json!([filter])).await?;
    let entries = result
        .as_array()
        .ok_or_else(|| ChainError::MalformedResponse("eth_getLogs did not return an array".to_string()))?;

    entries.iter().map(parse_log).collect()
}

fn parse_log(value: &Value) -> ChainResult<Log> {
    let address = value["address"]
        .as_str()
        .ok_or_else(|| ChainError::MalformedResponse("log missing address".to_string()))?;
    let topics: Vec<[u8; 32]> = value["topics"]
        .as_array()
        .ok_or_else(|| ChainError::MalformedResponse("log missing topics".to_string()))?
        .iter()
        .map(|t| {
            t.as_str()
                .ok_or_else(|| ChainError::MalformedResponse("topic is not a string".to_string()))
                .and_then(parse_hex_32)
        })
        .collect::<ChainResult<Vec<_>>>()?;
    let data_str = value["data"]
        .as_str()
        .ok_or_else(|| ChainError::MalformedResponse("log missing data".to_string()))?;
    let data = parse_hex_bytes(data_str)?;
    let block_number = parse_hex_u64(&value["blockNumber"])?;
    let block_hash = parse_hex_32(
        value["blockHash"]
            .as_str()
            .ok_or_else(|| ChainError::MalformedResponse("log missing blockHash".to_string()))?,
    )?;
    let tx_hash = parse_hex_32(
        value["transactionHash"]
            .as_str()
            .ok_or_else(|| ChainError::MalformedResponse("log missing transactionHash".to_string()))?,
    )?;
    let log_index = parse_hex_u64(&value["logIndex"])?;

    Ok(Log {
        address: Address::parse(address)
            .map_err(|e| ChainError::MalformedResponse(e.to_string()))?,
        topics,
        data,
        block_number,
        block_hash,
        tx_hash,
        log_index,
    })
}

fn parse_hex_u64(value: &Value) -> ChainResult<u64> {
    let s = value
        .as_str()
        .ok_or_else(|| ChainError::MalformedResponse("expected hex string".to_string()))?;
    u64::from_str_radix(s.trim_start_matches("0x"), 16)
        .map_err(|e| ChainError::MalformedResponse(e.to_string()))
}

fn parse_hex_32(s: &str) -> ChainResult<[u8; 32]> {
    let stripped = s.trim_start_matches("0x");
    if stripped.len() != 64 {
        return Err(ChainError::MalformedResponse(format!(
            "expected 32-byte hex value, got {} chars",
            stripped.len()
        )));
    }
    let mut bytes = [0u8; 32];
    for (i, byte) in bytes.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&stripped[i * 2..i * 2 + 2], 16)
            .map_err(|e| ChainError::MalformedResponse(e.to_string()))?;
    }
    Ok(bytes)
}

fn parse_hex_bytes(s: &str) -> ChainResult<Vec<u8>> {
    let stripped = s.trim_start_matches("0x");
    if stripped.len() % 2 != 0 {
        return Err(ChainError::MalformedResponse("odd-length hex data".to_string()));
    }
    (0..stripped.len())
        .step_by(2)
        .map(|i| {
            u8::from_str_radix(&stripped[i..i + 2], 16)
                .map_err(|e| ChainError::MalformedResponse(e.to_string()))
        })
        .collect()
}

fn hex(bytes: &[u8; 32]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_hex_u64() {
        assert_eq!(parse_hex_u64(&json!("0x64")).unwrap(), 100);
    }

    #[test]
    fn rejects_odd_length_data() {
        assert!(parse_hex_bytes("0xabc").is_err());
    }
}
