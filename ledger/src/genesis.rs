//! Genesis block creation: the first block on each network.
//!
//! The genesis block registers the two native assets and issues the whole
//! governing-token supply to the initial holder. It is built from an explicit
//! [`GenesisConfig`] value created once at startup and passed to whoever needs
//! it; nothing here is global.

use strata_types::{
    AssetId, AssetType, Block, BlockHash, Fixed8, NetworkId, PublicKey, RegisterPayload,
    ScriptHash, Timestamp, Transaction, TransactionKind, TransactionOutput,
};

/// Configuration for creating a genesis block.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GenesisConfig {
    pub network: NetworkId,
    pub timestamp: Timestamp,
    /// Owner key of both native assets.
    pub owner: PublicKey,
    /// Admin script of both native assets.
    pub admin: ScriptHash,
    /// Receives the full governing-token supply.
    pub initial_holder: ScriptHash,
    pub governing_supply: Fixed8,
    pub utility_supply: Fixed8,
}

impl GenesisConfig {
    /// Canonical genesis parameters for a network.
    pub fn for_network(network: NetworkId) -> Self {
        let supply = Fixed8::from_raw(100_000_000 * strata_types::amount::FIXED8_DECIMALS);
        Self {
            network,
            timestamp: genesis_timestamp(&network),
            owner: PublicKey::new([0x00; 33]),
            admin: ScriptHash::from_script(network.as_str().as_bytes()),
            initial_holder: ScriptHash::from_script(&network.magic().to_le_bytes()),
            governing_supply: supply,
            utility_supply: supply,
        }
    }

    fn governing_register(&self) -> Transaction {
        self.register(AssetType::GoverningToken, "governing", self.governing_supply, 0)
    }

    fn utility_register(&self) -> Transaction {
        self.register(AssetType::UtilityToken, "utility", self.utility_supply, 8)
    }

    fn register(&self, asset_type: AssetType, name: &str, amount: Fixed8, precision: u8) -> Transaction {
        Transaction::new(
            TransactionKind::Register(RegisterPayload {
                asset_type,
                name: name.to_string(),
                amount,
                precision,
                owner: self.owner,
                admin: self.admin,
            }),
            vec![],
            vec![],
        )
    }

    /// Id of the governing token (hash of its Register transaction).
    pub fn governing_token(&self) -> AssetId {
        self.governing_register().hash()
    }

    /// Id of the utility token (hash of its Register transaction).
    pub fn utility_token(&self) -> AssetId {
        self.utility_register().hash()
    }
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self::for_network(NetworkId::Dev)
    }
}

/// Create the genesis block for a given configuration.
///
/// The genesis block contains, in order:
/// - a Miner transaction carrying the network magic as nonce
/// - the Register transaction of the governing token
/// - the Register transaction of the utility token
/// - an Issue transaction moving the governing supply to `initial_holder`
pub fn create_genesis_block(config: &GenesisConfig) -> Block {
    let issue = Transaction::new(
        TransactionKind::Issue,
        vec![],
        vec![TransactionOutput::new(
            config.governing_token(),
            config.governing_supply,
            config.initial_holder,
        )],
    );
    let mut block = Block::new(
        0,
        BlockHash::ZERO,
        config.timestamp,
        vec![
            Transaction::new(
                TransactionKind::Miner {
                    nonce: config.network.magic(),
                },
                vec![],
                vec![],
            ),
            config.governing_register(),
            config.utility_register(),
            issue,
        ],
    );
    block.consensus_data = u64::from(config.network.magic());
    block
}

/// Return the deterministic genesis block hash for a configuration.
pub fn genesis_hash(config: &GenesisConfig) -> BlockHash {
    create_genesis_block(config).hash()
}

/// Genesis timestamp per network.
fn genesis_timestamp(network: &NetworkId) -> Timestamp {
    match network {
        // Live: 2026-01-01 00:00:00 UTC
        NetworkId::Live => Timestamp::new(1_767_225_600),
        // Test: 2025-06-01 00:00:00 UTC
        NetworkId::Test => Timestamp::new(1_748_736_000),
        // Dev: 2024-01-01 00:00:00 UTC
        NetworkId::Dev => Timestamp::new(1_704_067_200),
    }
}
