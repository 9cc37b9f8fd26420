use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[clap(name = "dealwatch", version, about = "Detects genuine game discounts and alerts subscribers")]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Ingest and score on a fixed period until interrupted
    Run,

    /// Single ingest and scoring run
    Once,

    /// Create or replace the item list followed by a chat
    Subscribe {
        /// Telegram chat id receiving the alerts
        #[clap(long)]
        chat_id: String,

        /// Item id or exact catalog name; repeat for several items
        #[clap(long = "item", required = true)]
        items: Vec<String>,
    },

    /// Send a test message
    TestNotify {
        /// Defaults to TELEGRAM_CHAT_ID
        #[clap(long)]
        chat_id: Option<String>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_subscribe_with_repeated_items() {
        let cli = Cli::parse_from([
            "dealwatch",
            "subscribe",
            "--chat-id",
            "1001",
            "--item",
            "Hades",
            "--item",
            "Celeste",
        ]);

        match cli.command {
            Command::Subscribe { chat_id, items } => {
                assert_eq!(chat_id, "1001");
                assert_eq!(items, vec!["Hades", "Celeste"]);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn subscribe_requires_an_item() {
        assert!(Cli::try_parse_from(["dealwatch", "subscribe", "--chat-id", "1"]).is_err());
    }

    #[test]
    fn test_notify_chat_id_is_optional() {
        let cli = Cli::parse_from(["dealwatch", "test-notify"]);
        assert!(matches!(cli.command, Command::TestNotify { chat_id: None }));
    }
}
