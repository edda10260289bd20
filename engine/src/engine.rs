use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use database::stores::{AddressStore, BlockStore, MetadataStore, TxStore, TxidStore, UtxoStore, WalletStore};
use database::{Database, Txn};
use indexer_core::{Address, BlockHash, BloomFilter, Txid, Wallet, WalletId};
use parking_lot::RwLock;
use rpc_client::NodeApi;
use serde_json::Value;
use tracing::info;

use crate::config::Config;
use crate::errors::{EngineError, EngineResult};
use crate::guard::BusyFlag;
use crate::queue::TaskMethod;
use crate::sync::SyncState;

/// In-memory mirror of the current chain-tip cursor. Replaced (never
/// mutated in place) only after a commit succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Tip {
    pub height: u32,
    pub hash: BlockHash,
}

/// The single writer over the wallet index.
///
/// All mutation flows through one task at a time (the priority queue
/// worker); sync and import additionally share the busy guard so their
/// multi-step read-stage-commit sequences never interleave.
pub struct Engine {
    pub(crate) db: Arc<Database>,
    pub(crate) wallets: WalletStore,
    pub(crate) addresses: AddressStore,
    pub(crate) txids: TxidStore,
    pub(crate) blocks: BlockStore,
    pub(crate) utxos: UtxoStore,
    pub(crate) txs: TxStore,
    pub(crate) metadata: MetadataStore,
    pub(crate) node: Arc<dyn NodeApi>,
    pub(crate) busy: BusyFlag,
    pub(crate) tip: RwLock<Option<Tip>>,
    pub(crate) global_filter: RwLock<BloomFilter>,
    pub(crate) config: Config,
    stopping: AtomicBool,
}

impl Engine {
    pub fn open(db: Arc<Database>, node: Arc<dyn NodeApi>, config: Config) -> EngineResult<Self> {
        let blocks = BlockStore::new(db.clone());
        let metadata = MetadataStore::new(db.clone());

        let tip = blocks.tip()?.map(|r| Tip { height: r.height, hash: r.hash });
        let global_filter = match metadata.address_filter()? {
            Some(filter) => filter,
            None => BloomFilter::with_rate(config.filter_capacity, config.filter_fpr, 0),
        };
        if let Some(t) = &tip {
            info!(height = t.height, hash = %t.hash, "opened wallet index at tip");
        } else {
            info!("opened empty wallet index");
        }

        Ok(Self {
            wallets: WalletStore::new(db.clone(), config.wallet_cache_size),
            addresses: AddressStore::new(db.clone()),
            txids: TxidStore::new(db.clone()),
            utxos: UtxoStore::new(db.clone()),
            txs: TxStore::new(db.clone()),
            blocks,
            metadata,
            db,
            node,
            busy: BusyFlag::new(),
            tip: RwLock::new(tip),
            global_filter: RwLock::new(global_filter),
            config,
            stopping: AtomicBool::new(false),
        })
    }

    pub fn tip(&self) -> Option<Tip> {
        *self.tip.read()
    }

    pub fn stop(&self) {
        self.stopping.store(true, Ordering::SeqCst);
    }

    pub fn is_stopping(&self) -> bool {
        self.stopping.load(Ordering::SeqCst)
    }

    /// Runs one already-validated task method. Arity has been checked by
    /// the queue worker; argument decoding failures surface as
    /// validation errors.
    pub async fn execute(&self, method: TaskMethod, params: &[Value]) -> EngineResult<Value> {
        match method {
            TaskMethod::Sync => {
                let state: SyncState = parse_param(&params[0])?;
                self.sync(state).await
            }
            TaskMethod::ImportWalletAddresses => {
                let wallet_id: WalletId = parse_param(&params[0])?;
                let strings: Vec<String> = parse_param(&params[1])?;
                let mut addresses = Vec::with_capacity(strings.len());
                for s in &strings {
                    let address: Address = s
                        .parse()
                        .map_err(|e| EngineError::InvalidParams(format!("{}: {}", s, e)))?;
                    addresses.push(address);
                }
                self.import_wallet_addresses(wallet_id, addresses).await
            }
            TaskMethod::SaveTransaction => {
                let wallet_id: WalletId = parse_param(&params[0])?;
                self.save_transaction(wallet_id, params[1].clone())
            }
            TaskMethod::CreateWallet => {
                let wallet_id: WalletId = parse_param(&params[0])?;
                self.create_wallet(wallet_id)
            }
        }
    }

    /// Registers a wallet with an empty balance and a fresh address
    /// filter. Creating an existing wallet is a no-op.
    pub fn create_wallet(&self, wallet_id: WalletId) -> EngineResult<Value> {
        if self.wallets.exists(&wallet_id)? {
            return Ok(Value::Null);
        }
        let filter = BloomFilter::with_rate(self.config.filter_capacity, self.config.filter_fpr, 0);
        let wallet = Wallet::new(wallet_id, filter);

        let mut txn = Txn::new();
        self.wallets.stage_put(&mut txn, &wallet)?;
        txn.commit(&self.db)?;
        info!(wallet = %wallet_id, "created wallet");
        Ok(Value::Null)
    }

    /// Caches detailed transaction JSON for a wallet. A detail whose
    /// confirmed height is past the current tip raced ahead of sync and
    /// is deferred rather than failed.
    pub fn save_transaction(&self, wallet_id: WalletId, detail: Value) -> EngineResult<Value> {
        if !self.wallets.exists(&wallet_id)? {
            return Err(EngineError::WalletNotFound(wallet_id));
        }
        let txid: Txid = detail
            .get("txid")
            .and_then(Value::as_str)
            .ok_or_else(|| EngineError::InvalidParams("transaction missing txid".to_string()))?
            .parse()
            .map_err(|e| EngineError::InvalidParams(format!("bad txid: {}", e)))?;

        if let Some(height) = detail.get("height").and_then(Value::as_u64) {
            let tip_height = self.tip().map_or(0, |t| t.height);
            if height > tip_height as u64 {
                return Err(EngineError::Deferred(format!(
                    "transaction at height {} is ahead of tip {}",
                    height, tip_height
                )));
            }
        }

        let mut txn = Txn::new();
        self.txs.stage_put(&mut txn, &wallet_id, &txid, serde_json::to_vec(&detail)?);
        txn.commit(&self.db)?;
        Ok(Value::Null)
    }
}

fn parse_param<T: serde::de::DeserializeOwned>(value: &Value) -> EngineResult<T> {
    serde_json::from_value(value.clone()).map_err(|e| EngineError::InvalidParams(e.to_string()))
}
