use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::app::App;
use crate::core::status::StatusLogic;
use crate::errors::AppResult;

pub fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Status { date } = cmd {
        let app = App::open(cfg)?;
        let (date, lookup) = StatusLogic::lookup(&app, date)?;
        StatusLogic::print(&date, &lookup);
    }
    Ok(())
}
