use std::sync::Arc;

use chanlog_core::config::Config;

#[tokio::main]
async fn main() -> Result<(), chanlog_core::Error> {
    chanlog_core::logging::init("chanlog")?;

    let cfg = Arc::new(Config::load()?);
    chanlog_telegram::router::run_polling(cfg)
        .await
        .map_err(|e| chanlog_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
