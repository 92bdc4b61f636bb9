use std::fmt::Write;
use std::path::PathBuf;

use clap::{
    ArgAction, ColorChoice, Parser, ValueEnum,
    builder::{
        Styles,
        styling::{AnsiColor, Effects},
    },
};
use codesift::app_dirs;
use codesift::url_codec::decode;
use codesift::{FilterDimension, SearchMode, SearchState, SizeRange};

/// Produce the full version banner including the config directory.
fn long_version() -> &'static str {
    let config_dir = match app_dirs::get_config_dir() {
        Ok(path) => path.display().to_string(),
        Err(err) => format!("unavailable ({err})"),
    };

    let mut details = format!("codesift {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(details);
    let _ = writeln!(details, "config directory: {config_dir}");

    Box::leak(details.into_boxed_str())
}

/// Create the clap styles used for custom colour output.
fn cli_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Cyan.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
}

/// Parse command line arguments into the strongly typed [`CliArgs`] structure.
pub(crate) fn parse_cli() -> CliArgs {
    CliArgs::parse()
}

#[derive(Parser, Debug)]
#[command(
    name = "codesift",
    version,
    long_version = long_version(),
    about = "Run a faceted code search and print results with reconciled facet counts",
    color = ColorChoice::Auto,
    styles = cli_styles()
)]
/// Command-line arguments accepted by the `codesift` binary.
pub(crate) struct CliArgs {
    #[arg(
        value_name = "LOCATION",
        help = "Shareable search URL or query string to start from (default: empty search)"
    )]
    pub(crate) location: Option<String>,
    #[arg(
        short,
        long = "config",
        value_name = "FILE",
        env = "CODESIFT_CONFIG",
        action = ArgAction::Append,
        help = "Additional configuration file to merge (default: none)"
    )]
    pub(crate) config: Vec<PathBuf>,
    #[arg(
        short = 'n',
        long = "no-config",
        help = "Skip loading default configuration files (default: disabled)"
    )]
    pub(crate) no_config: bool,
    #[arg(
        long = "base-url",
        value_name = "URL",
        help = "Search backend base URL (default: http://localhost:8080)"
    )]
    pub(crate) base_url: Option<String>,
    #[arg(
        long = "timeout-secs",
        value_name = "SECS",
        help = "Give up on a request after this many seconds (default: 30)"
    )]
    pub(crate) timeout_secs: Option<u64>,
    #[arg(
        long = "page-size",
        value_name = "NUM",
        help = "Results per page (default: 20)"
    )]
    pub(crate) page_size: Option<u32>,
    #[arg(short = 'q', long, value_name = "QUERY", help = "Search query text")]
    pub(crate) query: Option<String>,
    #[arg(long, value_name = "NAME", value_delimiter = ',', help = "Filter by project")]
    pub(crate) project: Vec<String>,
    #[arg(
        long = "project-version",
        value_name = "NAME",
        value_delimiter = ',',
        help = "Filter by project version"
    )]
    pub(crate) project_version: Vec<String>,
    #[arg(short = 'e', long, value_name = "EXT", value_delimiter = ',', help = "Filter by file extension")]
    pub(crate) extension: Vec<String>,
    #[arg(long, value_name = "LANG", value_delimiter = ',', help = "Filter by language")]
    pub(crate) language: Vec<String>,
    #[arg(long, value_name = "NAME", value_delimiter = ',', help = "Filter by repository")]
    pub(crate) repository: Vec<String>,
    #[arg(long = "min-size", value_name = "BYTES", help = "Smallest file size to match")]
    pub(crate) min_size: Option<u64>,
    #[arg(long = "max-size", value_name = "BYTES", help = "Largest file size to match")]
    pub(crate) max_size: Option<u64>,
    #[arg(long, conflicts_with = "regex", help = "Use fuzzy matching (default: disabled)")]
    pub(crate) fuzzy: bool,
    #[arg(long, help = "Treat the query as a regular expression (default: disabled)")]
    pub(crate) regex: bool,
    #[arg(long, value_name = "NUM", help = "Result page to fetch (default: 1)")]
    pub(crate) page: Option<u32>,
    #[arg(
        short = 'u',
        long = "print-url",
        help = "Print the canonical query string and exit without searching (default: disabled)"
    )]
    pub(crate) print_url: bool,
    #[arg(
        short = 'p',
        long = "print-config",
        help = "Print the resolved configuration before running (default: disabled)"
    )]
    pub(crate) print_config: bool,
    #[arg(short = 'o', long = "output", value_enum, default_value_t = OutputFormat::Plain, help = "Choose how to print the result")]
    pub(crate) output: OutputFormat,
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count, help = "Increase log verbosity (default: warnings only)")]
    pub(crate) verbose: u8,
}

impl CliArgs {
    /// The search to run: the location's state with flag overrides on top.
    ///
    /// Filter flags replace the location's values for that dimension; the
    /// page is applied last because any other change resets it.
    pub(crate) fn search_state(&self) -> SearchState {
        let mut state = self
            .location
            .as_deref()
            .map(location_query)
            .map(decode)
            .unwrap_or_default();
        let page = self.page.unwrap_or(state.page());

        if let Some(query) = &self.query {
            state = state.with_query(query.clone());
        }
        let filters = [
            (FilterDimension::Project, &self.project),
            (FilterDimension::Version, &self.project_version),
            (FilterDimension::Extension, &self.extension),
            (FilterDimension::Language, &self.language),
            (FilterDimension::Repository, &self.repository),
        ];
        for (dimension, values) in filters {
            if !values.is_empty() {
                state = state.with_filter(dimension, values.iter().cloned());
            }
        }
        if self.min_size.is_some() || self.max_size.is_some() {
            state = state.with_size_range(SizeRange::new(self.min_size, self.max_size));
        }
        if self.fuzzy || self.regex {
            state = state.with_mode(SearchMode::from_flags(self.fuzzy, self.regex));
        }
        state.with_page(page)
    }
}

/// Query string part of a location, which may be a full URL, `?a=b` or
/// plain `a=b`.
fn location_query(location: &str) -> &str {
    let location = location.trim();
    let query = match location.split_once('?') {
        Some((_, query)) => query,
        None if location.contains("://") => "",
        None => location,
    };
    query.split('#').next().unwrap_or_default()
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
/// Output formats supported by the CLI utility.
pub(crate) enum OutputFormat {
    Plain,
    Json,
}
