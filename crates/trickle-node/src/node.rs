//! Node composition.
//!
//! [`Node`] opens the RocksDB store, loads params and wraps the
//! [`IncentiveEngine`] in a `RwLock` so readers can query claims while a
//! transition is being applied. The host calls [`Node::begin_block`] once per
//! block and forwards position hooks and claim requests.

use parking_lot::RwLock;
use tracing::{debug, info};

use trickle_core::claim::{Claim, ClaimType};
use trickle_core::coins::Coins;
use trickle_core::params::Params;
use trickle_core::traits::{RewardBank, SharesSource};
use trickle_core::types::{Address, Timestamp};
use trickle_engine::{ClaimRequest, IncentiveEngine};

use crate::config::NodeConfig;
use crate::error::NodeError;
use crate::storage::RocksStore;

pub struct Node<Src, B> {
    engine: RwLock<IncentiveEngine<RocksStore, Src, B>>,
}

impl<Src, B> Node<Src, B>
where
    Src: SharesSource,
    B: RewardBank,
{
    /// Open the store under `config.data_dir` and load params.
    pub fn open(config: &NodeConfig, shares: Src, bank: B) -> Result<Self, NodeError> {
        std::fs::create_dir_all(&config.data_dir)?;
        let params = config.params()?;
        let store = RocksStore::open(config.db_path())?;
        info!(
            db = %config.db_path().display(),
            periods = params.reward_periods.values().map(Vec::len).sum::<usize>(),
            claim_end = params.claim_end,
            "incentive store opened"
        );
        let engine = IncentiveEngine::new(store, shares, bank, params)?;
        Ok(Self { engine: RwLock::new(engine) })
    }

    /// Accumulate every active reward period up to the block time.
    pub fn begin_block(&self, now: Timestamp) -> Result<usize, NodeError> {
        let count = self.engine.write().accumulate_all(now)?;
        debug!(now, periods = count, "rewards accumulated");
        Ok(count)
    }

    pub fn claim(&self, request: &ClaimRequest, now: Timestamp) -> Result<Coins, NodeError> {
        let paid = self.engine.write().claim(request, now)?;
        info!(owner = %request.owner, receiver = %request.receiver, paid = %paid, "reward claimed");
        Ok(paid)
    }

    pub fn after_position_created(
        &self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
    ) -> Result<(), NodeError> {
        Ok(self.engine.write().after_position_created(claim_type, source_id, owner)?)
    }

    pub fn before_position_modified(
        &self,
        claim_type: ClaimType,
        source_id: &str,
        owner: &Address,
    ) -> Result<(), NodeError> {
        Ok(self.engine.write().before_position_modified(claim_type, source_id, owner)?)
    }

    /// Run `f` against the shares source, e.g. to apply a deposit.
    pub fn with_shares<R>(&self, f: impl FnOnce(&mut Src) -> R) -> R {
        f(self.engine.write().shares_mut())
    }

    pub fn get_claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, NodeError> {
        Ok(self.engine.read().get_claim(claim_type, owner)?)
    }

    pub fn synchronized_claim(&self, claim_type: ClaimType, owner: &Address) -> Result<Option<Claim>, NodeError> {
        Ok(self.engine.read().synchronized_claim(claim_type, owner)?)
    }

    pub fn params(&self) -> Params {
        self.engine.read().params().clone()
    }

    pub fn set_params(&self, params: Params) -> Result<(), NodeError> {
        self.engine.write().set_params(params)?;
        info!("params updated");
        Ok(())
    }

    /// Module account balance as seen by the bank.
    pub fn module_balance(&self) -> Coins {
        self.engine.read().bank().module_balance()
    }

    pub fn flush(&self) -> Result<(), NodeError> {
        Ok(self.engine.read().store().flush()?)
    }

    /// Consume the node, returning the shares source and bank.
    pub fn into_parts(self) -> (Src, B) {
        let (_, shares, bank, _) = self.engine.into_inner().into_parts();
        (shares, bank)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trickle_core::coins::Coin;
    use trickle_core::decimal::Dec;
    use trickle_core::memory::{MemoryBank, MemorySharesSource};
    use trickle_core::params::{Multiplier, MultipliersPerDenom, RewardPeriod};

    fn temp_config() -> (NodeConfig, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let cfg = NodeConfig { data_dir: dir.path().to_path_buf(), ..NodeConfig::default() };
        (cfg, dir)
    }

    fn params() -> Params {
        let mut params = Params { claim_end: 1_000_000, ..Params::default() };
        params.reward_periods.insert(
            ClaimType::Swap,
            vec![RewardPeriod::new(true, "pool", 1, 900_000, Coins::single("swp", 100).unwrap())],
        );
        params.claim_multipliers.push(MultipliersPerDenom {
            denom: "swp".into(),
            context: None,
            multipliers: vec![Multiplier::new("large", 12, Dec::one())],
        });
        params
    }

    #[test]
    fn open_with_default_params() {
        let (cfg, _dir) = temp_config();
        let node = Node::open(&cfg, MemorySharesSource::new(), MemoryBank::default()).unwrap();
        assert_eq!(node.params(), Params::default());
        assert_eq!(node.begin_block(100).unwrap(), 0);
    }

    #[test]
    fn position_accrues_and_pays() {
        let (cfg, _dir) = temp_config();
        let bank = MemoryBank::new(Coins::single("swp", 1_000_000).unwrap());
        let node = Node::open(&cfg, MemorySharesSource::new(), bank).unwrap();
        node.set_params(params()).unwrap();
        let owner = Address([3; 20]);

        node.begin_block(100).unwrap();
        node.with_shares(|s| s.set_owner_shares(ClaimType::Swap, owner, "pool", Dec::from(10u64)));
        node.after_position_created(ClaimType::Swap, "pool", &owner).unwrap();
        node.begin_block(110).unwrap();

        let synced = node.synchronized_claim(ClaimType::Swap, &owner).unwrap().unwrap();
        assert_eq!(synced.reward.amount_of("swp"), 1000);

        let request = ClaimRequest::all(owner, ClaimType::Swap, "large");
        let paid = node.claim(&request, 110).unwrap();
        assert_eq!(paid, Coins::new([Coin::new("swp", 1000)]).unwrap());
        assert_eq!(node.module_balance().amount_of("swp"), 999_000);

        let (_, bank) = node.into_parts();
        assert_eq!(bank.received(&owner).amount_of("swp"), 1000);
    }

    #[test]
    fn state_survives_reopen() {
        let (cfg, _dir) = temp_config();
        let owner = Address([5; 20]);
        {
            let node = Node::open(&cfg, MemorySharesSource::new(), MemoryBank::default()).unwrap();
            node.set_params(params()).unwrap();
            node.begin_block(100).unwrap();
            node.with_shares(|s| s.set_owner_shares(ClaimType::Swap, owner, "pool", Dec::from(4u64)));
            node.after_position_created(ClaimType::Swap, "pool", &owner).unwrap();
            node.begin_block(104).unwrap();
            node.flush().unwrap();
        }

        let node = Node::open(&cfg, MemorySharesSource::new(), MemoryBank::default()).unwrap();
        let stored = node.get_claim(ClaimType::Swap, &owner).unwrap().unwrap();
        assert!(stored.has_source("pool"));
        assert!(stored.reward.is_empty());
    }
}
