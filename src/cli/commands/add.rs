use crate::cli::parser::Commands;
use crate::config::Config;
use crate::core::add::{AddLogic, AddRequest};
use crate::core::app::App;
use crate::errors::AppResult;
use crate::ui::messages::success;
use crate::utils::time::format_minutes;

pub async fn handle(cmd: &Commands, cfg: &Config) -> AppResult<()> {
    if let Commands::Add {
        date,
        start,
        end,
        break_time,
        location,
    } = cmd
    {
        let app = App::open(cfg)?;
        let req = AddRequest {
            date: date.clone(),
            start: start.clone(),
            end: end.clone(),
            break_time: break_time.clone(),
            location: location.clone(),
        };
        let saved = AddLogic::apply(&app, &req).await?;

        let show = |s: &str| if s.is_empty() { "--:--".to_string() } else { s.to_string() };
        success(format!(
            "Saved {}: in {} | break {} | out {}{}",
            saved.date,
            show(&saved.start_time),
            format_minutes(saved.break_minutes()),
            show(&saved.end_time),
            saved
                .location
                .as_deref()
                .map(|l| format!(" | {l}"))
                .unwrap_or_default()
        ));
    }
    Ok(())
}
