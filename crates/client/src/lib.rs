//! Line-oriented console front-end over a token [`Session`].
//!
//! # Architecture
//!
//! ```text
//! Console (composition layer)
//!   ├─→ Session (resolver, read model, transaction controller)
//!   ├─→ Wallet  (account selection and signing)
//!   └─→ I/O     (one command per input line, notices per bus event)
//! ```
//!
//! Mint and withdraw run as background tasks so the prompt stays responsive
//! while an attempt awaits finality. Their progress reaches the output through
//! the session's event bus; a second request of the same kind is turned away
//! by the controller and reported the same way.

mod builder;
pub mod command;
pub mod render;

pub use builder::ConsoleBuilder;
pub use command::{Command, CommandError};

use std::sync::Arc;

use anyhow::Result;
use client_blockchain_core::Wallet;
use futures::future::select_all;
use runtime::{Event, Session, SessionError, Topic};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinSet;
use token_core::{Amount, TxKind, TxStatus};

type ActionResult = (TxKind, Result<TxStatus, SessionError>);

pub struct Console {
    session: Arc<Session>,
    wallet: Arc<dyn Wallet>,
    identity: Option<String>,
}

impl Console {
    pub fn builder() -> ConsoleBuilder {
        ConsoleBuilder::new()
    }

    /// Connect the wallet, then serve commands from `input` until `quit` or
    /// end of input. In-flight attempts are awaited before returning.
    pub async fn run<R, W>(self, input: R, mut output: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut receivers: Vec<broadcast::Receiver<Event>> = self
            .session
            .events()
            .subscribe_multiple(&[Topic::Transaction, Topic::ReadModel, Topic::Handle])
            .into_iter()
            .map(|(_, rx)| rx)
            .collect();

        let contract = self.session.contract();
        write_line(
            &mut output,
            &format!(
                "{} {} on {} {} ({})",
                contract.symbol,
                contract.contract_id,
                contract.chain,
                contract.network,
                self.wallet.name()
            ),
        )
        .await?;

        match self
            .session
            .connect(Arc::clone(&self.wallet), self.identity.as_deref())
            .await
        {
            Ok(status) => tracing::info!(%status, "console connected"),
            Err(err) => write_line(&mut output, &format!("wallet connection failed: {err}")).await?,
        }
        drain_events(&mut receivers);
        write_line(&mut output, &self.status()).await?;

        let mut lines = input.lines();
        let mut tasks: JoinSet<ActionResult> = JoinSet::new();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    let Some(line) = line? else { break };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match line.parse::<Command>() {
                        Ok(Command::Quit) => break,
                        Ok(command) => self.execute(command, &mut tasks, &mut output).await?,
                        Err(err) => write_line(&mut output, &err.to_string()).await?,
                    }
                }
                Some(joined) = tasks.join_next(), if !tasks.is_empty() => {
                    self.report(joined, &mut output).await?;
                }
                Some(event) = next_event(&mut receivers) => {
                    if let Some(text) = render::event(&event) {
                        write_line(&mut output, &text).await?;
                    }
                }
            }
        }

        if !tasks.is_empty() {
            write_line(
                &mut output,
                &format!("waiting for {} transaction(s) to finish...", tasks.len()),
            )
            .await?;
        }
        while let Some(joined) = tasks.join_next().await {
            for event in drain_events(&mut receivers) {
                if let Some(text) = render::event(&event) {
                    write_line(&mut output, &text).await?;
                }
            }
            self.report(joined, &mut output).await?;
        }
        for event in drain_events(&mut receivers) {
            if let Some(text) = render::event(&event) {
                write_line(&mut output, &text).await?;
            }
        }

        tracing::info!("console closed");
        Ok(())
    }

    async fn execute<W>(
        &self,
        command: Command,
        tasks: &mut JoinSet<ActionResult>,
        output: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match command {
            Command::Status => write_line(output, &self.status()).await?,
            Command::Refresh => match self.session.refresh().await {
                Ok(_) => write_line(output, &self.status()).await?,
                Err(err) => write_line(output, &format!("refresh failed: {err}")).await?,
            },
            Command::Mint => {
                let session = Arc::clone(&self.session);
                tasks.spawn(async move { (TxKind::Mint, session.mint().await) });
            }
            Command::Withdraw(amount) => {
                let decimals = self.session.contract().native_decimals;
                let amount = match amount.map(|text| Amount::parse(&text, decimals)).transpose() {
                    Ok(amount) => amount,
                    Err(err) => return write_line(output, &format!("invalid amount: {err}")).await,
                };
                let session = Arc::clone(&self.session);
                tasks.spawn(async move { (TxKind::Withdraw, session.withdraw(amount).await) });
            }
            Command::Ack(kind) => {
                let text = if self.session.acknowledge(kind) {
                    format!("{kind} cleared")
                } else {
                    format!("no finished {kind} to clear")
                };
                write_line(output, &text).await?;
            }
            Command::Help => write_line(output, command::HELP).await?,
            Command::Quit => {}
        }
        Ok(())
    }

    async fn report<W>(
        &self,
        joined: Result<ActionResult, tokio::task::JoinError>,
        output: &mut W,
    ) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match joined {
            Ok((kind, Ok(status))) => {
                tracing::debug!(%kind, %status, "action finished");
                write_line(output, &self.status()).await
            }
            Ok((kind, Err(err))) => write_line(output, &format!("{kind}: {err}")).await,
            Err(err) => {
                tracing::error!("action task failed: {err}");
                Ok(())
            }
        }
    }

    /// Banner, snapshot, attempts and the actions line.
    pub fn status(&self) -> String {
        let mut sections = Vec::new();
        if let Some(banner) = render::banner(&self.session.handle_status()) {
            sections.push(banner);
        }
        match self.session.connection().identity() {
            Some(identity) => sections.push(format!("account:        {identity}")),
            None => sections.push("account:        not connected".to_string()),
        }
        sections.push(render::snapshot(
            &self.session.snapshot(),
            self.session.contract(),
        ));
        sections.push(render::attempts(&self.session.attempts()));
        sections.push(render::actions(&self.session.available_actions()));
        sections.join("\n")
    }
}

async fn write_line<W>(output: &mut W, text: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    output.write_all(text.as_bytes()).await?;
    output.write_all(b"\n").await?;
    output.flush().await?;
    Ok(())
}

/// Next event from any topic; pends forever once every topic has closed.
async fn next_event(receivers: &mut Vec<broadcast::Receiver<Event>>) -> Option<Event> {
    loop {
        if receivers.is_empty() {
            return std::future::pending().await;
        }
        let (result, index, _) =
            select_all(receivers.iter_mut().map(|rx| Box::pin(rx.recv()))).await;
        match result {
            Ok(event) => return Some(event),
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "console fell behind the event bus");
            }
            Err(RecvError::Closed) => {
                receivers.remove(index);
            }
        }
    }
}

fn drain_events(receivers: &mut [broadcast::Receiver<Event>]) -> Vec<Event> {
    let mut events = Vec::new();
    for rx in receivers.iter_mut() {
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
    }
    events
}
