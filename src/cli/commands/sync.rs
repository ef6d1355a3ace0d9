use crate::cli::commands::resolve_month;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::app::App;
use crate::core::sync::SyncLogic;
use crate::errors::AppResult;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Sync { month } = cmd {
        let app = App::open(cfg)?;
        let ym = resolve_month(month.as_ref(), app.clock.as_ref())?;
        let (result, stats) = SyncLogic::run_once(&app, ym).await?;
        SyncLogic::report(ym, &result, &stats)?;
    }
    Ok(())
}
