mod common;

use common::{OWNER, PRICE, USER, connect, session, transitions};

use client_blockchain_core::MockChain;
use runtime::{HandleStatus, Topic};
use token_core::{TxKind, TxStatus};

/// End-to-End Mint Scenario
///
/// 1. A non-owner connects to a contract with 5000 tokens in circulation
/// 2. The read model shows the starting supply and an empty contract balance
/// 3. The user mints at the configured price
/// 4. The attempt passes through AwaitingFinality and succeeds
/// 5. The read model shows the new supply before success is reported
/// 6. The success message stays until acknowledged
#[tokio::test]
async fn test_mint_end_to_end() {
    // ================================================================
    // PHASE 1: Connect
    // ================================================================
    let chain = MockChain::new(OWNER).with_total_supply(5000);
    let session = session(&chain);
    let mut events = session.subscribe(Topic::Transaction);

    connect(&session, USER).await;
    assert_eq!(session.handle_status(), HandleStatus::Ready);

    let before = session.snapshot();
    assert_eq!(before.total_supply.base(), 5000);
    assert_eq!(before.contract_balance.format_fixed(2), "0.00");
    assert_eq!(before.owner.as_deref(), Some(OWNER));
    assert_eq!(session.available_actions(), vec![TxKind::Mint]);

    // ================================================================
    // PHASE 2: Mint
    // ================================================================
    let status = session.mint().await.expect("mint should be accepted");
    assert_eq!(status, TxStatus::Succeeded("Minted 1,000 IABS tokens!".into()));

    let seen = transitions(&mut events);
    assert_eq!(
        seen,
        vec![
            TxStatus::Submitting,
            TxStatus::AwaitingFinality,
            TxStatus::Succeeded("Minted 1,000 IABS tokens!".into()),
        ]
    );

    // ================================================================
    // PHASE 3: Reconciled read model
    // ================================================================
    let after = session.snapshot();
    assert_eq!(after.total_supply.base(), 6000);
    assert_eq!(after.contract_balance.base(), before.contract_balance.base() + PRICE);
    assert_eq!(after.caller_balance.base(), 1000);
    assert!(after.version > before.version);

    // ================================================================
    // PHASE 4: Acknowledge
    // ================================================================
    assert!(session.attempt(TxKind::Mint).is_some_and(|a| a.status.is_terminal()));
    assert!(session.acknowledge(TxKind::Mint));
    assert!(session.attempt(TxKind::Mint).is_none());
    assert_eq!(transitions(&mut events), vec![TxStatus::Idle]);
}

#[tokio::test]
async fn test_mint_pays_on_chain_price_when_exposed() {
    let chain = MockChain::new(OWNER).with_mint_price(PRICE * 2);
    let mut interface = common::interface(token_core::Chain::Ethereum);
    interface.methods.mint_price = Some("mint_price".into());
    let session = common::session_with(&chain, common::contract(), interface);

    let wallet = connect(&session, USER).await;
    assert_eq!(
        session.snapshot().mint_price.map(|p| p.base()),
        Some(PRICE * 2)
    );

    session.mint().await.expect("mint should be accepted");
    assert_eq!(chain.contract_balance(), PRICE * 2);
    let signed = wallet.signed_requests();
    assert_eq!(signed.len(), 1);
    assert_eq!(signed[0].payload["payment"], (PRICE * 2).to_string());
}
