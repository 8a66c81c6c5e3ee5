//! Serde helpers for maps keyed by chain id.
//!
//! TOML tables only allow string keys, so chain-keyed maps are written as
//! `[chains.11155111]` and converted to `ChainId` on load.

use relayer_types::ChainId;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::HashMap;

pub fn deserialize_chain_id_map<'de, D, T>(
	deserializer: D,
) -> Result<HashMap<ChainId, T>, D::Error>
where
	D: Deserializer<'de>,
	T: Deserialize<'de>,
{
	let map = HashMap::<String, T>::deserialize(deserializer)?;

	map.into_iter()
		.map(|(k, v)| {
			k.parse::<ChainId>()
				.map(|id| (id, v))
				.map_err(|_| serde::de::Error::custom(format!("Invalid chain ID: {}", k)))
		})
		.collect()
}

pub fn serialize_chain_id_map<S, T>(
	map: &HashMap<ChainId, T>,
	serializer: S,
) -> Result<S::Ok, S::Error>
where
	S: Serializer,
	T: Serialize,
{
	let string_map: HashMap<String, &T> = map.iter().map(|(k, v)| (k.to_string(), v)).collect();

	string_map.serialize(serializer)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[derive(Debug, Deserialize, Serialize)]
	struct Wrapper {
		#[serde(
			deserialize_with = "deserialize_chain_id_map",
			serialize_with = "serialize_chain_id_map"
		)]
		chains: HashMap<ChainId, String>,
	}

	#[test]
	fn test_chain_keys_parse_from_toml() {
		let parsed: Wrapper = toml::from_str(
			r#"
[chains]
1 = "mainnet"
137 = "polygon"
"#,
		)
		.unwrap();
		assert_eq!(parsed.chains.get(&ChainId(137)).map(String::as_str), Some("polygon"));
	}

	#[test]
	fn test_non_numeric_key_rejected() {
		let result: Result<Wrapper, _> = toml::from_str("[chains]\nmainnet = \"x\"\n");
		assert!(result.is_err());
	}

	#[test]
	fn test_serializes_string_keys() {
		let mut chains = HashMap::new();
		chains.insert(ChainId(10), "op".to_string());
		let json = serde_json::to_string(&Wrapper { chains }).unwrap();
		assert_eq!(json, r#"{"chains":{"10":"op"}}"#);
	}
}
