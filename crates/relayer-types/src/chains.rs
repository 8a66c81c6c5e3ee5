use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// EVM chain identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainId(pub u64);

impl ChainId {
	pub const ETHEREUM: Self = Self(1);
	pub const POLYGON: Self = Self(137);
	pub const ARBITRUM: Self = Self(42161);
	pub const SEPOLIA: Self = Self(11155111);
	pub const AMOY: Self = Self(80002);
}

impl fmt::Display for ChainId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for ChainId {
	type Err = std::num::ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Ok(ChainId(s.trim().parse()?))
	}
}

impl From<u64> for ChainId {
	fn from(id: u64) -> Self {
		ChainId(id)
	}
}
