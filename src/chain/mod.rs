//! Chain Registry - static table of supported networks
//!
//! Descriptors follow the EIP-3085 `wallet_addEthereumChain` parameter shape so
//! they can be handed to the provider verbatim (camelCase on the wire).
//!
//! | Chain id | Name |
//! |----------|------|
//! | `0x1` | Ethereum Mainnet |
//! | `0xaa36a7` | Sepolia |
//! | `0x89` | Polygon |
//! | `0x38` | BNB Smart Chain |
//! | `0xa4b1` | Arbitrum One |
//! | `0xa` | OP Mainnet |
//! | `0x2105` | Base |

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u32,
}

impl NativeCurrency {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u32) -> Self {
        Self { name: name.into(), symbol: symbol.into(), decimals }
    }

    pub fn ether() -> Self {
        Self::new("Ether", "ETH", 18)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDescriptor {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(default)]
    pub block_explorer_urls: Vec<String>,
}

impl ChainDescriptor {
    pub fn new(chain_id: &str, chain_name: impl Into<String>, native_currency: NativeCurrency) -> Self {
        Self {
            chain_id: normalize_chain_id(chain_id).unwrap_or_else(|| chain_id.to_string()),
            chain_name: chain_name.into(),
            native_currency,
            rpc_urls: Vec::new(),
            block_explorer_urls: Vec::new(),
        }
    }

    pub fn with_rpc(mut self, url: impl Into<String>) -> Self { self.rpc_urls.push(url.into()); self }
    pub fn with_explorer(mut self, url: impl Into<String>) -> Self { self.block_explorer_urls.push(url.into()); self }
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("duplicate chain id {0}")]
    Duplicate(String),
    #[error("invalid chain id {0:?}")]
    InvalidChainId(String),
    #[error("invalid registry json: {0}")]
    Json(#[from] serde_json::Error),
}

/// Normalize a chain id to lowercase `0x` hex without leading zeros.
/// Accepts `0x`-hex in any case and plain decimal.
pub fn normalize_chain_id(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let value = if let Some(hex) = raw.strip_prefix("0x").or_else(|| raw.strip_prefix("0X")) {
        u64::from_str_radix(hex, 16).ok()?
    } else {
        raw.parse::<u64>().ok()?
    };
    Some(format!("0x{:x}", value))
}

/// Ordered, id-unique table of chain descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainRegistry {
    chains: Vec<ChainDescriptor>,
}

impl ChainRegistry {
    pub fn empty() -> Self {
        Self { chains: Vec::new() }
    }

    /// Build from descriptors, rejecting duplicate or malformed ids.
    pub fn from_descriptors(descriptors: Vec<ChainDescriptor>) -> Result<Self, RegistryError> {
        let mut registry = Self::empty();
        for descriptor in descriptors {
            registry.insert(descriptor)?;
        }
        Ok(registry)
    }

    /// Load a JSON array of EIP-3085 descriptors.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let descriptors: Vec<ChainDescriptor> = serde_json::from_str(json)?;
        Self::from_descriptors(descriptors)
    }

    pub fn with_chain(mut self, descriptor: ChainDescriptor) -> Result<Self, RegistryError> {
        self.insert(descriptor)?;
        Ok(self)
    }

    fn insert(&mut self, mut descriptor: ChainDescriptor) -> Result<(), RegistryError> {
        let id = normalize_chain_id(&descriptor.chain_id)
            .ok_or_else(|| RegistryError::InvalidChainId(descriptor.chain_id.clone()))?;
        if self.get(&id).is_some() {
            return Err(RegistryError::Duplicate(id));
        }
        descriptor.chain_id = id;
        self.chains.push(descriptor);
        Ok(())
    }

    pub fn get(&self, chain_id: &str) -> Option<&ChainDescriptor> {
        let id = normalize_chain_id(chain_id)?;
        self.chains.iter().find(|c| c.chain_id == id)
    }

    pub fn contains(&self, chain_id: &str) -> bool {
        self.get(chain_id).is_some()
    }

    /// Human-readable name; unknown ids render as the raw id.
    pub fn display_name(&self, chain_id: &str) -> String {
        self.get(chain_id)
            .map(|c| c.chain_name.clone())
            .unwrap_or_else(|| chain_id.to_string())
    }

    /// Native-currency decimals, 18 when the chain is unknown.
    pub fn decimals(&self, chain_id: &str) -> u32 {
        self.get(chain_id).map(|c| c.native_currency.decimals).unwrap_or(18)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChainDescriptor> {
        self.chains.iter()
    }

    pub fn len(&self) -> usize {
        self.chains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chains.is_empty()
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        let chains = vec![
            ChainDescriptor::new("0x1", "Ethereum Mainnet", NativeCurrency::ether())
                .with_rpc("https://ethereum-rpc.publicnode.com")
                .with_explorer("https://etherscan.io"),
            ChainDescriptor::new("0xaa36a7", "Sepolia", NativeCurrency::new("Sepolia Ether", "ETH", 18))
                .with_rpc("https://ethereum-sepolia-rpc.publicnode.com")
                .with_explorer("https://sepolia.etherscan.io"),
            ChainDescriptor::new("0x89", "Polygon", NativeCurrency::new("POL", "POL", 18))
                .with_rpc("https://polygon-rpc.com")
                .with_explorer("https://polygonscan.com"),
            ChainDescriptor::new("0x38", "BNB Smart Chain", NativeCurrency::new("BNB", "BNB", 18))
                .with_rpc("https://bsc-dataseed.binance.org")
                .with_explorer("https://bscscan.com"),
            ChainDescriptor::new("0xa4b1", "Arbitrum One", NativeCurrency::ether())
                .with_rpc("https://arb1.arbitrum.io/rpc")
                .with_explorer("https://arbiscan.io"),
            ChainDescriptor::new("0xa", "OP Mainnet", NativeCurrency::ether())
                .with_rpc("https://mainnet.optimism.io")
                .with_explorer("https://optimistic.etherscan.io"),
            ChainDescriptor::new("0x2105", "Base", NativeCurrency::ether())
                .with_rpc("https://mainnet.base.org")
                .with_explorer("https://basescan.org"),
        ];
        Self { chains }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalizes_ids() {
        assert_eq!(normalize_chain_id("0x1").as_deref(), Some("0x1"));
        assert_eq!(normalize_chain_id("0x01").as_deref(), Some("0x1"));
        assert_eq!(normalize_chain_id("0xAA36A7").as_deref(), Some("0xaa36a7"));
        assert_eq!(normalize_chain_id("137").as_deref(), Some("0x89"));
        assert_eq!(normalize_chain_id("0xzz"), None);
        assert_eq!(normalize_chain_id(""), None);
    }

    #[test]
    fn default_table_is_unique() {
        let registry = ChainRegistry::default();
        let rebuilt = ChainRegistry::from_descriptors(registry.iter().cloned().collect()).unwrap();
        assert_eq!(rebuilt.len(), registry.len());
        assert_eq!(registry.display_name("0x89"), "Polygon");
        assert_eq!(registry.display_name("0X89"), "Polygon");
    }

    #[test]
    fn unknown_id_renders_raw() {
        let registry = ChainRegistry::default();
        assert_eq!(registry.display_name("0x1337"), "0x1337");
        assert_eq!(registry.decimals("0x1337"), 18);
    }

    #[test]
    fn rejects_duplicates() {
        let registry = ChainRegistry::default();
        let dup = ChainDescriptor::new("0x01", "Again", NativeCurrency::ether());
        assert!(matches!(registry.with_chain(dup), Err(RegistryError::Duplicate(id)) if id == "0x1"));
    }

    #[test]
    fn loads_eip3085_json() {
        let json = r#"[{
            "chainId": "0x1337",
            "chainName": "Devnet",
            "nativeCurrency": {"name": "Dev", "symbol": "DEV", "decimals": 9},
            "rpcUrls": ["http://localhost:8545"]
        }]"#;
        let registry = ChainRegistry::from_json(json).unwrap();
        let devnet = registry.get("4919").unwrap();
        assert_eq!(devnet.chain_name, "Devnet");
        assert_eq!(devnet.native_currency.decimals, 9);
        assert!(devnet.block_explorer_urls.is_empty());

        let wire = serde_json::to_value(devnet).unwrap();
        assert_eq!(wire["chainId"], "0x1337");
        assert_eq!(wire["rpcUrls"][0], "http://localhost:8545");
    }
}
