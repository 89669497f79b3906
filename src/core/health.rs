use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub reachable: bool,
    pub raw_payload: Map<String, Value>,
}

impl HealthStatus {
    /// Any 2xx body is accepted. Only a JSON object is kept as payload.
    pub fn reachable_from_body(body: &[u8]) -> Self {
        let raw_payload = match serde_json::from_slice::<Value>(body) {
            Ok(Value::Object(map)) => map,
            _ => Map::new(),
        };
        Self {
            reachable: true,
            raw_payload,
        }
    }

    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            raw_payload: Map::new(),
        }
    }
}
