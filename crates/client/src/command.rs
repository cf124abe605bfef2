//! Console command parsing.
use std::str::FromStr;

use token_core::TxKind;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Status,
    Refresh,
    Mint,
    /// Amount in human native units, parsed against the chain's decimals later.
    Withdraw(Option<String>),
    Ack(TxKind),
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    #[error("empty command")]
    Empty,

    #[error("unknown command {0:?}; type `help`")]
    Unknown(String),

    #[error("usage: {0}")]
    Usage(&'static str),
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let verb = words.next().ok_or(CommandError::Empty)?.to_ascii_lowercase();
        let args: Vec<&str> = words.collect();

        let command = match (verb.as_str(), args.as_slice()) {
            ("status" | "s", []) => Command::Status,
            ("refresh" | "r", []) => Command::Refresh,
            ("mint" | "m", []) => Command::Mint,
            ("withdraw" | "w", []) => Command::Withdraw(None),
            ("withdraw" | "w", [amount]) => Command::Withdraw(Some(amount.to_string())),
            ("ack" | "a", [kind]) => kind
                .parse()
                .map(Command::Ack)
                .map_err(|_| CommandError::Usage("ack mint|withdraw"))?,
            ("help" | "h" | "?", []) => Command::Help,
            ("quit" | "exit" | "q", []) => Command::Quit,
            (verb, _) => {
                return Err(match usage(verb) {
                    Some(usage) => CommandError::Usage(usage),
                    None => CommandError::Unknown(verb.to_string()),
                });
            }
        };
        Ok(command)
    }
}

fn usage(verb: &str) -> Option<&'static str> {
    let usage = match verb {
        "status" | "s" => "status",
        "refresh" | "r" => "refresh",
        "mint" | "m" => "mint",
        "withdraw" | "w" => "withdraw [amount]",
        "ack" | "a" => "ack mint|withdraw",
        "help" | "h" | "?" => "help",
        "quit" | "exit" | "q" => "quit",
        _ => return None,
    };
    Some(usage)
}

pub const HELP: &str = "\
commands:
  status              show balances, attempts and available actions
  refresh             re-read the contract
  mint                mint tokens for the configured price
  withdraw [amount]   withdraw contract funds (owner only)
  ack mint|withdraw   clear a finished attempt
  quit                exit";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_commands() {
        assert_eq!("status".parse(), Ok(Command::Status));
        assert_eq!("  MINT ".parse(), Ok(Command::Mint));
        assert_eq!("withdraw".parse(), Ok(Command::Withdraw(None)));
        assert_eq!(
            "withdraw 0.25".parse(),
            Ok(Command::Withdraw(Some("0.25".into())))
        );
        assert_eq!("ack Withdraw".parse(), Ok(Command::Ack(TxKind::Withdraw)));
        assert_eq!("q".parse(), Ok(Command::Quit));
        assert_eq!("?".parse(), Ok(Command::Help));
    }

    #[test]
    fn rejects_malformed_input() {
        assert_eq!("".parse::<Command>(), Err(CommandError::Empty));
        assert_eq!(
            "burn".parse::<Command>(),
            Err(CommandError::Unknown("burn".into()))
        );
        assert_eq!(
            "burn it all".parse::<Command>(),
            Err(CommandError::Unknown("burn".into()))
        );
        assert_eq!(
            "ack".parse::<Command>(),
            Err(CommandError::Usage("ack mint|withdraw"))
        );
        assert_eq!(
            "ack burn".parse::<Command>(),
            Err(CommandError::Usage("ack mint|withdraw"))
        );
        assert_eq!(
            "mint now".parse::<Command>(),
            Err(CommandError::Usage("mint"))
        );
        assert_eq!(
            "withdraw 1 2".parse::<Command>(),
            Err(CommandError::Usage("withdraw [amount]"))
        );
    }
}
