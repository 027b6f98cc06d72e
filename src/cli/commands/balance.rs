use anyhow::Result;
use clap::Args;
use console::style;

use crate::application::Orchestrator;
use crate::domain::models::BalanceLevel;

#[derive(Args)]
pub struct BalanceArgs {}

/// Handle the balance command.
pub async fn execute(orchestrator: &Orchestrator, _args: BalanceArgs, json: bool) -> Result<()> {
    let decision = orchestrator.check_balance().await;

    if json {
        println!("{}", serde_json::to_string_pretty(&decision)?);
        return Ok(());
    }

    match decision.level {
        BalanceLevel::Ok => println!(
            "Balance: {} tokens ({})",
            decision.balance.unwrap_or_default(),
            style("ok").green()
        ),
        BalanceLevel::Low => println!(
            "Balance: {} tokens ({})",
            decision.balance.unwrap_or_default(),
            style("low — consider topping up").yellow()
        ),
        BalanceLevel::Empty => println!(
            "{}",
            style("No usable token balance. Generation is blocked until you top up.").red()
        ),
    }
    Ok(())
}
