//! In-memory chain and wallet for testing without a network.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use serde_json::json;
use token_core::{Chain, TxKind};
use tokio::sync::{mpsc, watch};

use crate::finality::{Finality, Subscription};
use crate::traits::{ChainTransport, TransportError};
use crate::types::{
    CallArg, ContractCall, ContractHandle, DispatchError, FinalityStatus, InterfaceDescriptor,
    MethodNames, NATIVE_BALANCE, PendingTx, ReadValue, TxId,
};
use crate::wallet::{SignRequest, Wallet, WalletError};

pub const MOCK_NETWORK: &str = "mocknet";

/// Which finality mechanism the mock exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinalityMode {
    Awaited,
    /// Emits `InBlock` then the terminal status.
    Subscribed,
}

#[derive(Debug, Clone)]
enum Effect {
    Mint { who: String, payment: u128 },
    Withdraw { who: String, amount: Option<u128> },
}

struct ChainState {
    deployed: bool,
    owner: String,
    total_supply: u128,
    contract_balance: u128,
    balances: HashMap<String, u128>,
    mint_amount: u128,
    mint_price: Option<u128>,
    failing_reads: HashSet<String>,
    fail_next_submit: Option<String>,
    revert_next: Option<DispatchError>,
    mode: FinalityMode,
    pending: HashMap<TxId, Effect>,
    submissions: usize,
    probes: usize,
    reads: usize,
}

/// Mock chain simulating the token contract in memory.
///
/// Transaction effects apply when finality settles, not at submission, so
/// tests can observe the window between the two with [`MockChain::hold_finality`].
#[derive(Clone)]
pub struct MockChain {
    state: Arc<Mutex<ChainState>>,
    hold: Arc<watch::Sender<bool>>,
    unsubscribes: Arc<AtomicUsize>,
}

impl MockChain {
    pub fn new(owner: impl Into<String>) -> Self {
        let (hold, _) = watch::channel(false);
        Self {
            state: Arc::new(Mutex::new(ChainState {
                deployed: true,
                owner: owner.into(),
                total_supply: 0,
                contract_balance: 0,
                balances: HashMap::new(),
                mint_amount: 1000,
                mint_price: None,
                failing_reads: HashSet::new(),
                fail_next_submit: None,
                revert_next: None,
                mode: FinalityMode::Awaited,
                pending: HashMap::new(),
                submissions: 0,
                probes: 0,
                reads: 0,
            })),
            hold: Arc::new(hold),
            unsubscribes: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Interface descriptor whose method names this mock answers.
    pub fn interface(chain: Chain) -> InterfaceDescriptor {
        InterfaceDescriptor {
            chain,
            module: None,
            state_object: None,
            methods: MethodNames {
                mint: "mint".into(),
                withdraw: "withdraw".into(),
                owner: "owner".into(),
                total_supply: "total_supply".into(),
                contract_balance: "contract_balance".into(),
                balance_of: "balance_of".into(),
                mint_price: Some("mint_price".into()),
            },
        }
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // ------------------------------------------------------------------------
    // Setup
    // ------------------------------------------------------------------------

    pub fn with_total_supply(self, supply: u128) -> Self {
        self.state().total_supply = supply;
        self
    }

    pub fn with_contract_balance(self, balance: u128) -> Self {
        self.state().contract_balance = balance;
        self
    }

    pub fn with_balance(self, who: impl Into<String>, balance: u128) -> Self {
        self.state().balances.insert(who.into(), balance);
        self
    }

    pub fn with_mint_amount(self, amount: u128) -> Self {
        self.state().mint_amount = amount;
        self
    }

    /// Expose an on-chain price view.
    pub fn with_mint_price(self, price: u128) -> Self {
        self.state().mint_price = Some(price);
        self
    }

    pub fn with_finality(self, mode: FinalityMode) -> Self {
        self.state().mode = mode;
        self
    }

    pub fn undeployed(self) -> Self {
        self.state().deployed = false;
        self
    }

    // ------------------------------------------------------------------------
    // Fault injection
    // ------------------------------------------------------------------------

    pub fn fail_read(&self, method: &str, failing: bool) {
        let mut state = self.state();
        if failing {
            state.failing_reads.insert(method.to_string());
        } else {
            state.failing_reads.remove(method);
        }
    }

    /// The next submission fails before broadcast with `reason`.
    pub fn fail_next_submit(&self, reason: impl Into<String>) {
        self.state().fail_next_submit = Some(reason.into());
    }

    /// The next transaction to settle fails with `error`.
    pub fn revert_next(&self, error: DispatchError) {
        self.state().revert_next = Some(error);
    }

    pub fn set_owner(&self, owner: impl Into<String>) {
        self.state().owner = owner.into();
    }

    /// Keep every finality observation pending until [`release_finality`](Self::release_finality).
    pub fn hold_finality(&self) {
        self.hold.send_replace(true);
    }

    pub fn release_finality(&self) {
        self.hold.send_replace(false);
    }

    // ------------------------------------------------------------------------
    // Inspection
    // ------------------------------------------------------------------------

    pub fn total_supply(&self) -> u128 {
        self.state().total_supply
    }

    pub fn contract_balance(&self) -> u128 {
        self.state().contract_balance
    }

    pub fn balance_of(&self, who: &str) -> u128 {
        self.state().balances.get(who).copied().unwrap_or(0)
    }

    /// Submissions that reached the chain (including ones failing before broadcast).
    pub fn submissions(&self) -> usize {
        self.state().submissions
    }

    pub fn probes(&self) -> usize {
        self.state().probes
    }

    pub fn reads(&self) -> usize {
        self.state().reads
    }

    pub fn unsubscribes(&self) -> usize {
        self.unsubscribes.load(Ordering::SeqCst)
    }

    async fn wait_released(&self) {
        let mut rx = self.hold.subscribe();
        let _ = rx.wait_for(|held| !*held).await;
    }

    fn settle(&self, id: &TxId) -> FinalityStatus {
        let mut state = self.state();
        let Some(effect) = state.pending.remove(id) else {
            return FinalityStatus::Failed(DispatchError::Other(format!("unknown transaction {id}")));
        };
        if let Some(error) = state.revert_next.take() {
            return FinalityStatus::Failed(error);
        }

        match effect {
            Effect::Mint { who, payment } => {
                let minted = state.mint_amount;
                state.total_supply += minted;
                state.contract_balance += payment;
                *state.balances.entry(who).or_insert(0) += minted;
                FinalityStatus::Finalized { emitted_events: 1 }
            }
            Effect::Withdraw { who, amount } => {
                if who != state.owner {
                    return FinalityStatus::Failed(DispatchError::Reverted(
                        "Only owner can withdraw".into(),
                    ));
                }
                let amount = amount.unwrap_or(state.contract_balance);
                if amount > state.contract_balance {
                    return FinalityStatus::Failed(DispatchError::Reverted(
                        "Insufficient contract balance".into(),
                    ));
                }
                state.contract_balance -= amount;
                FinalityStatus::Finalized { emitted_events: 1 }
            }
        }
    }
}

#[async_trait]
impl ChainTransport for MockChain {
    fn name(&self) -> &str {
        "mock"
    }

    async fn probe(&self, _handle: &ContractHandle) -> Result<(), TransportError> {
        let mut state = self.state();
        state.probes += 1;
        if state.deployed {
            Ok(())
        } else {
            Err(TransportError::NotDeployed("no code at contract address".into()))
        }
    }

    async fn read(
        &self,
        _handle: &ContractHandle,
        method: &str,
        args: &[CallArg],
    ) -> Result<ReadValue, TransportError> {
        let mut state = self.state();
        state.reads += 1;
        let failed = |reason: &str| TransportError::ReadFailed {
            method: method.to_string(),
            reason: reason.to_string(),
        };
        if state.failing_reads.contains(method) {
            return Err(failed("view not available"));
        }

        match method {
            "owner" => Ok(ReadValue::Identity(state.owner.clone())),
            "total_supply" => Ok(ReadValue::Integer(state.total_supply)),
            "contract_balance" | NATIVE_BALANCE => Ok(ReadValue::Integer(state.contract_balance)),
            "balance_of" => match args.first() {
                Some(CallArg::Identity(who)) => Ok(ReadValue::Integer(
                    state.balances.get(who).copied().unwrap_or(0),
                )),
                _ => Err(failed("expected an identity argument")),
            },
            "mint_price" => state
                .mint_price
                .map(ReadValue::Integer)
                .ok_or_else(|| failed("no price view")),
            _ => Err(failed("unknown method")),
        }
    }

    async fn submit(
        &self,
        handle: &ContractHandle,
        call: &ContractCall,
        wallet: &dyn Wallet,
    ) -> Result<PendingTx, TransportError> {
        {
            let mut state = self.state();
            state.submissions += 1;
            if let Some(reason) = state.fail_next_submit.take() {
                return Err(TransportError::Rejected(reason));
            }
        }

        let request = SignRequest {
            chain: handle.chain(),
            payload: json!({
                "method": call.method,
                "payment": call.payment.to_string(),
                "amount": call.amount.map(|a| a.to_string()),
            }),
        };
        let id = wallet.sign_and_submit(request).await?;

        let who = handle.identity.clone();
        let effect = match call.kind {
            TxKind::Mint => Effect::Mint {
                who,
                payment: call.payment,
            },
            TxKind::Withdraw => Effect::Withdraw {
                who,
                amount: call.amount,
            },
        };
        self.state().pending.insert(id.clone(), effect);

        Ok(PendingTx {
            id,
            kind: call.kind,
        })
    }

    async fn finality(
        &self,
        _handle: &ContractHandle,
        pending: &PendingTx,
    ) -> Result<Finality, TransportError> {
        let mode = self.state().mode;
        let chain = self.clone();
        let id = pending.id.clone();

        match mode {
            FinalityMode::Awaited => Ok(Finality::Awaited(Box::pin(async move {
                chain.wait_released().await;
                Ok(chain.settle(&id))
            }))),
            FinalityMode::Subscribed => {
                let (tx, rx) = mpsc::channel(4);
                let task = tokio::spawn(async move {
                    if tx.send(Ok(FinalityStatus::InBlock)).await.is_err() {
                        return;
                    }
                    chain.wait_released().await;
                    let _ = tx.send(Ok(chain.settle(&id))).await;
                });
                let unsubscribes = Arc::clone(&self.unsubscribes);
                Ok(Finality::Subscribed(Subscription::new(rx, move || {
                    task.abort();
                    unsubscribes.fetch_add(1, Ordering::SeqCst);
                })))
            }
        }
    }
}

/// Mock wallet holding one identity; can be told to decline the next prompt.
pub struct MockWallet {
    identity: String,
    network: String,
    reject_next: AtomicBool,
    signed: Mutex<Vec<SignRequest>>,
    counter: AtomicU64,
}

impl MockWallet {
    pub fn new(identity: impl Into<String>) -> Self {
        Self {
            identity: identity.into(),
            network: MOCK_NETWORK.to_string(),
            reject_next: AtomicBool::new(false),
            signed: Mutex::new(Vec::new()),
            counter: AtomicU64::new(0),
        }
    }

    pub fn on_network(mut self, network: impl Into<String>) -> Self {
        self.network = network.into();
        self
    }

    /// Decline the next signature prompt.
    pub fn reject_next_signature(&self) {
        self.reject_next.store(true, Ordering::SeqCst);
    }

    pub fn signed_requests(&self) -> Vec<SignRequest> {
        self.signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl Wallet for MockWallet {
    fn name(&self) -> &str {
        "mock"
    }

    async fn accounts(&self) -> Result<Vec<String>, WalletError> {
        Ok(vec![self.identity.clone()])
    }

    async fn network(&self) -> Result<String, WalletError> {
        Ok(self.network.clone())
    }

    async fn sign_and_submit(&self, request: SignRequest) -> Result<TxId, WalletError> {
        if self.reject_next.swap(false, Ordering::SeqCst) {
            return Err(WalletError::Rejected);
        }
        self.signed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);
        let n = self.counter.fetch_add(1, Ordering::SeqCst) + 1;
        Ok(TxId(format!("0xmock{n:04}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ContractId, NetworkEndpoint};

    const OWNER: &str = "0xowner";
    const USER: &str = "0xuser";

    fn handle(identity: &str) -> ContractHandle {
        ContractHandle {
            endpoint: NetworkEndpoint {
                network: MOCK_NETWORK.into(),
                url: "http://localhost".into(),
            },
            contract: ContractId::new("0xcontract"),
            interface: MockChain::interface(Chain::Ethereum),
            identity: identity.into(),
            generation: 1,
        }
    }

    fn mint_call(payment: u128) -> ContractCall {
        ContractCall {
            kind: TxKind::Mint,
            method: "mint".into(),
            payment,
            amount: None,
        }
    }

    #[tokio::test]
    async fn mint_applies_at_finality() {
        let chain = MockChain::new(OWNER).with_total_supply(5000);
        let wallet = MockWallet::new(USER);
        let handle = handle(USER);

        let pending = chain.submit(&handle, &mint_call(10), &wallet).await.unwrap();
        assert_eq!(chain.total_supply(), 5000);

        let Finality::Awaited(fut) = chain.finality(&handle, &pending).await.unwrap() else {
            panic!("expected awaited finality");
        };
        assert_eq!(fut.await.unwrap(), FinalityStatus::Finalized { emitted_events: 1 });
        assert_eq!(chain.total_supply(), 6000);
        assert_eq!(chain.contract_balance(), 10);
        assert_eq!(chain.balance_of(USER), 1000);
    }

    #[tokio::test]
    async fn withdraw_by_stranger_reverts() {
        let chain = MockChain::new(OWNER).with_contract_balance(50);
        let wallet = MockWallet::new(USER);
        let handle = handle(USER);
        let call = ContractCall {
            kind: TxKind::Withdraw,
            method: "withdraw".into(),
            payment: 0,
            amount: None,
        };

        let pending = chain.submit(&handle, &call, &wallet).await.unwrap();
        let Finality::Awaited(fut) = chain.finality(&handle, &pending).await.unwrap() else {
            panic!("expected awaited finality");
        };
        assert_eq!(
            fut.await.unwrap(),
            FinalityStatus::Failed(DispatchError::Reverted("Only owner can withdraw".into()))
        );
        assert_eq!(chain.contract_balance(), 50);
    }

    #[tokio::test]
    async fn subscription_reports_in_block_first() {
        let chain = MockChain::new(OWNER).with_finality(FinalityMode::Subscribed);
        let wallet = MockWallet::new(USER);
        let handle = handle(USER);

        let pending = chain.submit(&handle, &mint_call(1), &wallet).await.unwrap();
        let Finality::Subscribed(mut sub) = chain.finality(&handle, &pending).await.unwrap() else {
            panic!("expected subscription");
        };
        assert_eq!(sub.next().await, Some(Ok(FinalityStatus::InBlock)));
        assert_eq!(
            sub.next().await,
            Some(Ok(FinalityStatus::Finalized { emitted_events: 1 }))
        );
        sub.unsubscribe();
        drop(sub);
        assert_eq!(chain.unsubscribes(), 1);
    }

    #[tokio::test]
    async fn failing_read_reports_method() {
        let chain = MockChain::new(OWNER);
        chain.fail_read("owner", true);
        let err = chain.read(&handle(USER), "owner", &[]).await.unwrap_err();
        assert!(matches!(err, TransportError::ReadFailed { ref method, .. } if method == "owner"));
    }

    #[tokio::test]
    async fn declined_signature_is_rejection() {
        let chain = MockChain::new(OWNER);
        let wallet = MockWallet::new(USER);
        wallet.reject_next_signature();
        let err = chain.submit(&handle(USER), &mint_call(1), &wallet).await.unwrap_err();
        assert_eq!(err, TransportError::Rejected("user rejected".into()));
        assert!(wallet.signed_requests().is_empty());
    }
}
