//! Calc command implementation.

use crate::calculator;
use crate::cli::Output;
use anyhow::Result;
use console::style;

/// Run the calculator tool on one expression.
pub fn run_calc(expression: &str) -> Result<()> {
    match calculator::evaluate(expression) {
        Ok(value) => {
            println!("{} = {}", expression.trim(), style(value).green().bold());
            Ok(())
        }
        Err(e) => {
            Output::error(&format!("Error calculating: {}", e));
            Err(e.into())
        }
    }
}
