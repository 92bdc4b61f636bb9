mod cli;
mod settings;
mod workflow;

use anyhow::{Result, bail};
use cli::{OutputFormat, parse_cli, print_json, print_plain};
use codesift::logging;
use codesift::SearchState;
use codesift::url_codec::encode;
use settings::ResolvedConfig;
use workflow::SearchWorkflow;

fn main() -> Result<()> {
    let cli = parse_cli();
    logging::initialize(cli.verbose);

    let state = cli.search_state();

    if cli.print_url {
        let query = encode(&state);
        if !query.is_empty() {
            println!("?{query}");
        }
        return Ok(());
    }

    let resolved = settings::load(&cli)?;

    if cli.print_config {
        resolved.print_summary();
    }

    run_search(cli.output, resolved, state)
}

/// Execute the search workflow and print output in the chosen format.
fn run_search(format: OutputFormat, settings: ResolvedConfig, state: SearchState) -> Result<()> {
    let report = SearchWorkflow::from_config(settings, state).run()?;

    match format {
        OutputFormat::Plain => print_plain(&report),
        OutputFormat::Json => print_json(&report)?,
    }

    if let Some(error) = &report.view.error {
        bail!("search failed: {}", error.message);
    }

    Ok(())
}
