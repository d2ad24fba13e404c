//! Search command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::search::{DuckDuckGoSearch, SearchProvider};
use anyhow::Result;

/// Run the internet search tool directly.
pub async fn run_search(query: &str, limit: Option<usize>, settings: Settings) -> Result<()> {
    preflight::check(Operation::Tool, &settings)?;
    let provider = DuckDuckGoSearch::new(&settings.search)?;
    let limit = limit.unwrap_or(settings.search.max_results);

    let spinner = Output::spinner("Searching...");
    let hits = provider.search(query, limit).await;
    spinner.finish_and_clear();

    let hits = match hits {
        Ok(hits) => hits,
        Err(e) => {
            Output::error(&format!("Error searching: {}", e));
            return Err(e.into());
        }
    };

    if hits.is_empty() {
        Output::warning(&format!("No results found for: {}", query));
        return Ok(());
    }

    Output::header(&format!("Results for \"{}\"", query));
    for hit in &hits {
        Output::search_result(&hit.title, &hit.href, &hit.body);
    }
    println!();

    Ok(())
}
