use crate::cli::commands::resolve_month;
use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::app::App;
use crate::core::status::CacheLogic;
use crate::errors::AppResult;
use crate::models::YearMonth;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Cache { info, clear, month } = cmd {
        let app = App::open(cfg)?;

        if *clear {
            let ym = month
                .as_ref()
                .map(|m| m.trim().parse::<YearMonth>())
                .transpose()?;
            CacheLogic::clear(&app, ym)?;
        }

        if *info || !*clear {
            let ym = resolve_month(month.as_ref(), app.clock.as_ref())?;
            CacheLogic::info(&app, ym)?;
        }
    }
    Ok(())
}
