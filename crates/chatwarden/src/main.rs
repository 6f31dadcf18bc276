use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use chatwarden_core::{bot::ChatBot, config::Config};

mod console;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    chatwarden_core::logging::init("chatwarden")?;

    let cfg = Arc::new(Config::load()?);
    let transport = Arc::new(console::ConsoleTransport::new());
    let world = Arc::new(console::ConsoleWorld::from_env());

    let mut bot = ChatBot::new(cfg, transport, world);
    bot.activate();

    let (tx, rx) = mpsc::channel::<String>(64);
    let cancel = CancellationToken::new();

    // Feed stdin lines to the bot; EOF closes the channel and ends the loop.
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if tx.send(line).await.is_err() {
                break;
            }
        }
    });

    let ctrlc_cancel = cancel.clone();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        ctrlc_cancel.cancel();
    });

    bot.run(rx, cancel).await;
    bot.deactivate();
    reader.abort();

    Ok(())
}
