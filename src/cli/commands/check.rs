//! Check command - evaluate once from the command line

use super::build_evaluator;
use crate::cli::CheckArgs;
use crate::config::Config;
use crate::error::AppResult;

/// Execute the check command
pub async fn execute(args: CheckArgs, config: &Config) -> AppResult<()> {
    let evaluation = build_evaluator(config)?.evaluate().await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else {
        println!("{}", evaluation.upgraded);
    }

    Ok(())
}
