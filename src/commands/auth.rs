use anyhow::Result;

use crate::config;

pub async fn run() -> Result<()> {
    let cfg = config::load_config()?;
    let google_cfg = cfg.google()?;

    lushsync_provider_google::auth::authenticate(&google_cfg).await?;

    println!("Token saved to {}", google_cfg.token_path.display());
    Ok(())
}
