//! Key, method and message constants
//!
//! Centralized registry for storage keys, EIP-1193 method names and the
//! status strings the session shows to the user.

/// Session store keys
pub mod keys {
    pub const CONNECTED_ACCOUNT: &str = "connectedAccount";
    pub const CONNECTED_CHAIN: &str = "connectedChain";

    pub const ALL: &[&str] = &[CONNECTED_ACCOUNT, CONNECTED_CHAIN];
}

/// EIP-1193 / JSON-RPC method names
pub mod methods {
    pub const REQUEST_ACCOUNTS: &str = "eth_requestAccounts";
    pub const ACCOUNTS: &str = "eth_accounts";
    pub const CHAIN_ID: &str = "eth_chainId";
    pub const GET_BALANCE: &str = "eth_getBalance";
    pub const SEND_TRANSACTION: &str = "eth_sendTransaction";
    pub const SWITCH_CHAIN: &str = "wallet_switchEthereumChain";
    pub const ADD_CHAIN: &str = "wallet_addEthereumChain";

    /// Methods that may open a permission prompt in the wallet.
    pub const PROMPTING: &[&str] = &[REQUEST_ACCOUNTS, SWITCH_CHAIN, ADD_CHAIN, SEND_TRANSACTION];
}

/// Provider push event names
pub mod events {
    pub const ACCOUNTS_CHANGED: &str = "accountsChanged";
    pub const CHAIN_CHANGED: &str = "chainChanged";
    pub const DISCONNECT: &str = "disconnect";
}

/// Status messages
pub mod status {
    pub const CONNECTED: &str = "Connected";
    pub const DISCONNECTED: &str = "Disconnected";
    pub const ACCOUNT_CHANGED: &str = "Account changed";
    pub const NETWORK_CHANGED: &str = "Network changed";
    pub const RECONNECTED: &str = "Reconnected";
    pub const PENDING: &str = "pending";
}

/// Environment variables
pub mod env {
    pub const ROOT: &str = "BEECONNECT_ROOT";
    pub const LOG_JSON: &str = "BEECONNECT_LOG_JSON";
}
