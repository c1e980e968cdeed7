//! P2P protocol messages
//!
//! Messages travel as one JSON envelope per line:
//! `{"type": 0|1|2, "data": ...}`. `data` is only present on chain
//! responses, where it carries the block array encoded as a JSON string.
//! Incoming `data` is accepted either as such a string or as a plain array.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::consensus::Block;
use crate::p2p::{P2pError, P2pResult};

/// Envelope type codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MessageType {
    QueryLatest = 0,
    QueryAll = 1,
    ResponseChain = 2,
}

impl TryFrom<u8> for MessageType {
    type Error = P2pError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(MessageType::QueryLatest),
            1 => Ok(MessageType::QueryAll),
            2 => Ok(MessageType::ResponseChain),
            other => Err(P2pError::Malformed(format!("unknown message type {}", other))),
        }
    }
}

/// P2P message types
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    /// Ask a peer for its latest block
    QueryLatest,
    /// Ask a peer for its full chain
    QueryAll,
    /// One or more blocks: a tip, or a whole chain
    ResponseChain(Vec<Block>),
}

/// Wire shape of a message
#[derive(Debug, Serialize, Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl Message {
    /// Response carrying only the given tip
    pub fn latest(block: Block) -> Self {
        Message::ResponseChain(vec![block])
    }

    /// Type code for this message
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::QueryLatest => MessageType::QueryLatest,
            Message::QueryAll => MessageType::QueryAll,
            Message::ResponseChain(_) => MessageType::ResponseChain,
        }
    }

    /// Get the command name for this message
    pub fn command(&self) -> &'static str {
        match self {
            Message::QueryLatest => "query_latest",
            Message::QueryAll => "query_all",
            Message::ResponseChain(_) => "response_chain",
        }
    }

    /// Serialize to a single JSON line, without the trailing newline
    pub fn to_json(&self) -> P2pResult<String> {
        let data = match self {
            Message::ResponseChain(blocks) => Some(Value::String(serde_json::to_string(blocks)?)),
            _ => None,
        };
        let envelope = Envelope {
            kind: self.message_type() as u8,
            data,
        };
        Ok(serde_json::to_string(&envelope)?)
    }

    /// Parse a message from JSON text
    pub fn from_json(text: &str) -> P2pResult<Self> {
        let envelope: Envelope =
            serde_json::from_str(text).map_err(|e| P2pError::Malformed(e.to_string()))?;

        match MessageType::try_from(envelope.kind)? {
            MessageType::QueryLatest => Ok(Message::QueryLatest),
            MessageType::QueryAll => Ok(Message::QueryAll),
            MessageType::ResponseChain => {
                let data = envelope
                    .data
                    .ok_or_else(|| P2pError::Malformed("chain response without data".into()))?;
                let blocks = parse_blocks(data)?;
                if blocks.is_empty() {
                    return Err(P2pError::Malformed("chain response with no blocks".into()));
                }
                Ok(Message::ResponseChain(blocks))
            }
        }
    }
}

fn parse_blocks(data: Value) -> P2pResult<Vec<Block>> {
    let parsed = match data {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    parsed.map_err(|e| P2pError::Malformed(format!("bad block list: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::genesis_block;

    #[test]
    fn test_query_latest_wire_format() {
        assert_eq!(Message::QueryLatest.to_json().unwrap(), r#"{"type":0}"#);
        assert_eq!(Message::QueryAll.to_json().unwrap(), r#"{"type":1}"#);
    }

    #[test]
    fn test_response_data_is_string_encoded() {
        let json = Message::latest(genesis_block()).to_json().unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["type"], 2);
        let inner = value["data"].as_str().unwrap();
        let blocks: Vec<Block> = serde_json::from_str(inner).unwrap();
        assert_eq!(blocks, vec![genesis_block()]);
    }

    #[test]
    fn test_response_roundtrip() {
        let msg = Message::latest(genesis_block());
        let recovered = Message::from_json(&msg.to_json().unwrap()).unwrap();
        assert_eq!(recovered, msg);
    }

    #[test]
    fn test_accepts_plain_array_data() {
        let text = r#"{"type":2,"data":[{"index":0,"previousHash":"0","timestamp":1465154705,"data":"let there be light.","hash":"816534932c2b7154836da6afc367695e6337db8a921823784c14378abed4f7d7"}]}"#;
        let msg = Message::from_json(text).unwrap();
        assert_eq!(msg, Message::latest(genesis_block()));
    }

    #[test]
    fn test_malformed_inputs() {
        for text in [
            "not json",
            r#"{"data":"[]"}"#,
            r#"{"type":7}"#,
            r#"{"type":2}"#,
            r#"{"type":2,"data":"[]"}"#,
            r#"{"type":2,"data":"[{\"index\":1}]"}"#,
        ] {
            assert!(
                matches!(Message::from_json(text), Err(P2pError::Malformed(_))),
                "expected malformed: {}",
                text
            );
        }
    }

    #[test]
    fn test_command_names() {
        assert_eq!(Message::QueryAll.command(), "query_all");
        assert_eq!(Message::ResponseChain(vec![]).message_type(), MessageType::ResponseChain);
    }
}
