use clap::Parser;
use common::logger::init_logger;
use service::{
    app::{build_ingestor, init_db, run_periodic, subscribe, test_notify},
    cli::{Cli, Command},
    config::AppConfig,
};
use tokio::sync::watch;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = AppConfig::from_env()?;

    init_logger("dealwatch", cfg.production);

    match cli.command {
        Command::Run => {
            let db = init_db(&cfg).await?;
            let (tx, rx) = watch::channel(false);
            let ingestor = build_ingestor(&cfg, &db, rx.clone())?;

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    tracing::info!("Shutdown signal received");
                    let _ = tx.send(true);
                }
            });

            run_periodic(&ingestor, &cfg, rx).await;
        }

        Command::Once => {
            let db = init_db(&cfg).await?;
            let (_tx, rx) = watch::channel(false);
            let report = build_ingestor(&cfg, &db, rx)?.run_once().await?;
            tracing::info!(%report, "single run complete");
        }

        Command::Subscribe { chat_id, items } => {
            let db = init_db(&cfg).await?;
            let sub = subscribe(&db, &chat_id, &items).await?;
            tracing::info!(
                chat_id = %sub.endpoint,
                items = sub.item_ids.len(),
                "subscription saved"
            );
        }

        Command::TestNotify { chat_id } => {
            if !test_notify(&cfg, chat_id).await? {
                anyhow::bail!("test message was not delivered");
            }
            tracing::info!("test message delivered");
        }
    }

    Ok(())
}
