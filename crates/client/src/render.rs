//! Plain-text rendering of session state for the console.
use runtime::{AttemptSlots, Event, HandleStatus, ReadModelEvent, TxEvent};
use token_core::{ContractConfig, ReadSnapshot, TxKind, TxStatus};

/// Warning line shown above everything else while the handle is not ready.
pub fn banner(status: &HandleStatus) -> Option<String> {
    match status {
        HandleStatus::Ready => None,
        other => Some(format!("!! {other}")),
    }
}

/// Balances, supply and price as seen by the connected account.
pub fn snapshot(snapshot: &ReadSnapshot, contract: &ContractConfig) -> String {
    let native = contract.chain.native_symbol();
    let price = snapshot
        .mint_price
        .unwrap_or_else(|| contract.mint_price_amount());

    let lines = [
        format!(
            "balance:        {} {}",
            snapshot.caller_balance.format_fixed(2),
            contract.symbol
        ),
        format!(
            "total supply:   {} {}",
            snapshot.total_supply.format_fixed(2),
            contract.symbol
        ),
        format!("contract funds: {} {native}", snapshot.contract_balance),
        format!(
            "mint:           {} {} for {price} {native}",
            contract.mint_amount_tokens(),
            contract.symbol
        ),
        format!(
            "owner:          {}",
            snapshot.owner.as_deref().unwrap_or("unknown")
        ),
    ];

    let body = lines.join("\n");
    if snapshot.is_initial() {
        format!("(not loaded yet)\n{body}")
    } else {
        body
    }
}

pub fn attempts(slots: &AttemptSlots) -> String {
    [TxKind::Mint, TxKind::Withdraw]
        .into_iter()
        .map(|kind| match slots.get(kind) {
            Some(attempt) => format!("{:<9} {} {}", kind.to_string(), attempt.id, attempt.status),
            None => format!("{:<9} idle", kind.to_string()),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn actions(actions: &[TxKind]) -> String {
    if actions.is_empty() {
        return "actions: none".to_string();
    }
    let names: Vec<String> = actions.iter().map(ToString::to_string).collect();
    format!("actions: {}", names.join(", "))
}

/// One-line notice for a bus event; `None` for events the console ignores.
pub fn event(event: &Event) -> Option<String> {
    match event {
        Event::Transaction(TxEvent::Transition {
            attempt,
            kind,
            status,
        }) => Some(match status {
            TxStatus::Succeeded(message) => format!("[{kind} {attempt}] {message}"),
            TxStatus::Failed(reason) => format!("[{kind} {attempt}] failed: {reason}"),
            other => format!("[{kind} {attempt}] {}", other.label().replace('_', " ")),
        }),
        Event::Transaction(TxEvent::Progress {
            attempt,
            kind,
            message,
        }) => Some(format!("[{kind} {attempt}] {message}")),
        Event::Transaction(TxEvent::Rejected { kind, current }) => Some(format!(
            "[{kind}] already {current}; `ack {kind}` once it finishes"
        )),
        Event::ReadModel(ReadModelEvent::FieldFailed { field, reason }) => {
            Some(format!("could not read {field}: {reason}"))
        }
        Event::Handle(handle) => banner(&handle.status),
        Event::ReadModel(ReadModelEvent::Refreshed { .. }) => None,
    }
}

#[cfg(test)]
mod tests {
    use runtime::HandleEvent;
    use token_core::{Amount, AttemptId, Chain, TxFailure};

    use super::*;

    fn contract() -> ContractConfig {
        ContractConfig {
            chain: Chain::Sui,
            network: "testnet".into(),
            rpc_url: "https://fullnode.testnet.sui.io:443".into(),
            contract_id: "0x1".into(),
            module: Some("iabs".into()),
            state_object: None,
            symbol: "IABS".into(),
            token_decimals: 0,
            native_decimals: 9,
            mint_price: 10_000_000,
            mint_amount: 1000,
            explorer_url: None,
        }
    }

    #[test]
    fn banner_only_when_not_ready() {
        assert_eq!(banner(&HandleStatus::Ready), None);
        assert_eq!(
            banner(&HandleStatus::NotDeployed("no code".into())).as_deref(),
            Some("!! contract not deployed: no code")
        );
    }

    #[test]
    fn snapshot_shows_balances_and_price() {
        let mut snap = ReadSnapshot::empty(0, 9);
        snap.caller_balance = Amount::from_base(5000, 0);
        snap.contract_balance = Amount::from_base(20_000_000, 9);
        snap.owner = Some("0xabc".into());
        snap.version = 3;

        let text = snapshot(&snap, &contract());
        assert!(!text.contains("not loaded"));
        assert!(text.contains("balance:        5,000.00 IABS"));
        assert!(text.contains("contract funds: 0.02 SUI"));
        assert!(text.contains("for 0.01 SUI"));
        assert!(text.ends_with("owner:          0xabc"));
    }

    #[test]
    fn initial_snapshot_is_marked() {
        let text = snapshot(&ReadSnapshot::empty(0, 9), &contract());
        assert_eq!(
            text,
            "(not loaded yet)\n\
             balance:        0.00 IABS\n\
             total supply:   0.00 IABS\n\
             contract funds: 0 SUI\n\
             mint:           1,000 IABS for 0.01 SUI\n\
             owner:          unknown"
        );
    }

    #[test]
    fn actions_line() {
        assert_eq!(actions(&[]), "actions: none");
        assert_eq!(
            actions(&[TxKind::Mint, TxKind::Withdraw]),
            "actions: mint, withdraw"
        );
    }

    #[test]
    fn empty_slots_render_idle() {
        assert_eq!(
            attempts(&AttemptSlots::default()),
            "mint      idle\nwithdraw  idle"
        );
    }

    #[test]
    fn transaction_events() {
        let failed = Event::Transaction(TxEvent::Transition {
            attempt: AttemptId(2),
            kind: TxKind::Mint,
            status: TxStatus::Failed(TxFailure::Rejected("user declined".into())),
        });
        assert_eq!(
            event(&failed).as_deref(),
            Some("[mint #2] failed: user declined")
        );

        let waiting = Event::Transaction(TxEvent::Transition {
            attempt: AttemptId(1),
            kind: TxKind::Withdraw,
            status: TxStatus::AwaitingFinality,
        });
        assert_eq!(
            event(&waiting).as_deref(),
            Some("[withdraw #1] awaiting finality")
        );

        let ready = Event::Handle(HandleEvent {
            status: HandleStatus::Ready,
            generation: 1,
        });
        assert_eq!(event(&ready), None);
    }
}
