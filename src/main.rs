//! microdata - extract HTML Microdata as JSON

use std::io::{self, Read, Write};
use std::process::ExitCode;

use clap::Parser;

use microdata::{Config, Document, Microdata, extract, extract_selected};

#[derive(Parser)]
#[command(name = "microdata")]
#[command(version, about = "Extract HTML Microdata items as JSON", long_about = None)]
#[command(after_help = "EXAMPLES:
    microdata page.html                          Print items as JSON
    microdata page.html --base https://a.org/    Absolutize href/src/data
    curl -s https://a.org | microdata --pretty   Read from stdin
    microdata page.html --select article         Only items inside <article>")]
struct Cli {
    /// Input HTML file, or `-` for stdin
    #[arg(value_name = "INPUT", default_value = "-")]
    input: String,

    /// Base URL for resolving relative href/src/data values
    #[arg(short, long, value_name = "URL")]
    base: Option<String>,

    /// Only extract from elements matching this CSS selector
    #[arg(short, long, value_name = "SELECTOR")]
    select: Option<String>,

    /// Pretty-print the JSON output
    #[arg(short, long)]
    pretty: bool,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Log extraction details
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("error: {e}");
        return ExitCode::FAILURE;
    }

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), String> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_env("MICRODATA_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init()
        .map_err(|e| format!("failed to initialize logging: {e}"))
}

fn run(cli: &Cli) -> microdata::Result<()> {
    let config = match &cli.base {
        Some(base) => Config::new().try_with_base(base.as_str())?,
        None => Config::new(),
    };

    let bytes = read_input(&cli.input)?;
    let document = Document::parse_bytes(&bytes);
    tracing::debug!(input = %cli.input, nodes = document.dom().len(), "parsed document");

    let data: Microdata = match &cli.select {
        Some(selector) => extract_selected(&document, selector, &config)?,
        None => extract(document.root(), &config),
    };

    let json = if cli.pretty {
        data.to_json_pretty()?
    } else {
        data.to_json()?
    };

    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{json}")?;
    Ok(())
}

fn read_input(input: &str) -> io::Result<Vec<u8>> {
    if input == "-" {
        let mut buf = Vec::new();
        io::stdin().read_to_end(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read(input)
    }
}
