//! dothunt CLI: check explicit domains or search candidates from a phrase.
//!
//! The binary is a thin shell around `dothunt-lib`: it parses flags, wires
//! up the protocol clients, runs one subcommand, formats results, and maps
//! outcomes onto exit codes (0 ok, 1 I/O or strict failure, 2 usage, 130 on
//! Ctrl-C).

mod check;
mod output;
mod search;

use std::sync::Arc;
use std::time::Duration;

use clap::{Args, CommandFactory, Parser, Subcommand};
use dothunt_lib::{
    Checker, CheckerOptions, PorkbunClient, PorkbunOptions, RdapClient, RdapOptions,
    RegistrarClient, WhoisClient, WhoisOptions,
};

use crate::output::{resolve_format, OutputFormat};

#[derive(Parser)]
#[command(
    name = "dothunt",
    version,
    about = "Find available domain names (best-effort)",
    subcommand_required = true,
    arg_required_else_help = false
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args, Clone)]
struct GlobalArgs {
    /// Output format
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_parser = ["auto", "table", "ndjson", "json", "plain"]
    )]
    format: String,

    /// Alias for --format json (single JSON array)
    #[arg(long, global = true)]
    json: bool,

    /// Alias for --format ndjson (one JSON object per line)
    #[arg(long, global = true, visible_alias = "jsonl")]
    ndjson: bool,

    /// Alias for --format plain (stable tab-separated)
    #[arg(long, global = true)]
    plain: bool,

    /// Per-request timeout (e.g. 8s, 500ms, 2m)
    #[arg(long, global = true, default_value = "8s", value_parser = parse_duration_arg)]
    timeout: Duration,

    /// Max concurrent lookups
    #[arg(long, global = true, default_value_t = 16)]
    concurrency: usize,

    /// Disable WHOIS fallback (RDAP only)
    #[arg(long = "no-whois", global = true)]
    no_whois: bool,

    /// Exit non-zero if any result is unknown or errored
    #[arg(long, global = true)]
    strict: bool,

    /// Suppress non-essential stderr output
    #[arg(long, short = 'q', global = true)]
    quiet: bool,

    /// Verbose stderr output (diagnostics)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Registrar provider for buyable checks
    #[arg(
        long,
        global = true,
        default_value = "auto",
        value_parser = ["auto", "none", "porkbun"]
    )]
    registrar: String,

    /// Max concurrent registrar checks
    #[arg(long = "registrar-concurrency", global = true, default_value_t = 4)]
    registrar_concurrency: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Check availability for explicit domains (args and/or stdin)
    Check(check::CheckArgs),

    /// Generate candidates from a phrase, then check availability
    Search(search::SearchArgs),
}

/// Everything a subcommand needs to run.
pub(crate) struct Runtime {
    pub checker: Checker,
    pub registrar: Option<Arc<dyn RegistrarClient>>,
    pub registrar_concurrency: usize,
    pub format: OutputFormat,
    pub strict: bool,
}

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let cli = Cli::parse();
    init_tracing(&cli.global);

    let format = match resolve_output_format(&cli.global) {
        Ok(format) => format,
        Err(msg) => return usage_error(&msg),
    };

    let registrar = match build_registrar(&cli.global) {
        Ok(registrar) => registrar,
        Err(UsageError(msg)) => return usage_error(&msg),
    };

    let rdap = match RdapClient::new(RdapOptions {
        timeout: cli.global.timeout,
        ..RdapOptions::default()
    }) {
        Ok(client) => Arc::new(client),
        Err(err) => {
            eprintln!("{}", err);
            return 1;
        }
    };
    let whois = Arc::new(WhoisClient::new(WhoisOptions {
        timeout: cli.global.timeout,
        ..WhoisOptions::default()
    }));

    let runtime = Runtime {
        checker: Checker::new(CheckerOptions {
            rdap: Some(rdap),
            whois: Some(whois),
            no_whois: cli.global.no_whois,
            concurrency: cli.global.concurrency.max(1),
        }),
        registrar,
        registrar_concurrency: cli.global.registrar_concurrency.max(1),
        format,
        strict: cli.global.strict,
    };

    let work = async {
        match cli.command {
            Command::Check(args) => check::run(&runtime, args).await,
            Command::Search(args) => search::run(&runtime, args).await,
        }
    };

    tokio::select! {
        code = work => code,
        _ = tokio::signal::ctrl_c() => {
            eprintln!("interrupted");
            130
        }
    }
}

/// Print a usage-level error plus usage text and return exit code 2.
pub(crate) fn usage_error(msg: &str) -> i32 {
    if !msg.is_empty() {
        eprintln!("{}", msg);
        eprintln!();
    }
    eprintln!("{}", Cli::command().render_usage());
    2
}

struct UsageError(String);

fn resolve_output_format(global: &GlobalArgs) -> Result<OutputFormat, String> {
    let aliases = [global.json, global.ndjson, global.plain]
        .iter()
        .filter(|set| **set)
        .count();
    if aliases > 1 {
        return Err("flags are mutually exclusive: --json, --ndjson, --plain".to_string());
    }
    if global.format != "auto" && aliases == 1 {
        return Err("do not combine --format with --json/--ndjson/--plain".to_string());
    }

    let flag = if global.json {
        "json"
    } else if global.ndjson {
        "ndjson"
    } else if global.plain {
        "plain"
    } else {
        global.format.as_str()
    };
    Ok(resolve_format(flag))
}

fn build_registrar(global: &GlobalArgs) -> Result<Option<Arc<dyn RegistrarClient>>, UsageError> {
    let api_key = std::env::var("PORKBUN_API_KEY")
        .unwrap_or_default()
        .trim()
        .to_string();
    let secret = std::env::var("PORKBUN_SECRET_API_KEY")
        .unwrap_or_default()
        .trim()
        .to_string();

    match global.registrar.as_str() {
        "none" => Ok(None),
        "auto" => {
            if api_key.is_empty() || secret.is_empty() {
                return Ok(None);
            }
            porkbun_client(api_key, secret, global.timeout).map(Some)
        }
        "porkbun" => {
            if api_key.is_empty() || secret.is_empty() {
                return Err(UsageError(
                    "missing Porkbun API keys (set PORKBUN_API_KEY and PORKBUN_SECRET_API_KEY)"
                        .to_string(),
                ));
            }
            porkbun_client(api_key, secret, global.timeout).map(Some)
        }
        // clap restricts the value set.
        other => Err(UsageError(format!("unknown registrar {:?}", other))),
    }
}

fn porkbun_client(
    api_key: String,
    secret_api_key: String,
    timeout: Duration,
) -> Result<Arc<dyn RegistrarClient>, UsageError> {
    PorkbunClient::new(PorkbunOptions {
        api_key,
        secret_api_key,
        timeout,
        ..PorkbunOptions::default()
    })
    .map(|client| Arc::new(client) as Arc<dyn RegistrarClient>)
    .map_err(|err| UsageError(err.to_string()))
}

fn init_tracing(global: &GlobalArgs) {
    let default_filter = if global.quiet {
        "error"
    } else if global.verbose {
        "dothunt=debug,dothunt_lib=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Parse `500ms` / `8s` / `2m` / bare-seconds duration strings.
fn parse_duration_arg(s: &str) -> Result<Duration, String> {
    let s = s.trim().to_lowercase();
    let parse = |digits: &str, what: &str| {
        digits
            .trim()
            .parse::<u64>()
            .map_err(|_| format!("invalid {} value {:?}", what, s))
    };

    if let Some(ms) = s.strip_suffix("ms") {
        return parse(ms, "milliseconds").map(Duration::from_millis);
    }
    if let Some(secs) = s.strip_suffix('s') {
        return parse(secs, "seconds").map(Duration::from_secs);
    }
    if let Some(mins) = s.strip_suffix('m') {
        return parse(mins, "minutes").map(|m| Duration::from_secs(m * 60));
    }
    parse(&s, "seconds").map(Duration::from_secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duration_forms() {
        assert_eq!(parse_duration_arg("8s").unwrap(), Duration::from_secs(8));
        assert_eq!(
            parse_duration_arg("500ms").unwrap(),
            Duration::from_millis(500)
        );
        assert_eq!(parse_duration_arg("2m").unwrap(), Duration::from_secs(120));
        assert_eq!(parse_duration_arg("30").unwrap(), Duration::from_secs(30));
        assert!(parse_duration_arg("fast").is_err());
    }

    #[test]
    fn cli_parses() {
        Cli::command().debug_assert();
    }

    #[test]
    fn alias_conflicts_are_usage_errors() {
        let global = |json, ndjson, plain, format: &str| GlobalArgs {
            format: format.to_string(),
            json,
            ndjson,
            plain,
            timeout: Duration::from_secs(8),
            concurrency: 16,
            no_whois: false,
            strict: false,
            quiet: false,
            verbose: false,
            registrar: "none".to_string(),
            registrar_concurrency: 4,
        };

        assert!(resolve_output_format(&global(true, true, false, "auto")).is_err());
        assert!(resolve_output_format(&global(true, false, false, "table")).is_err());
        assert_eq!(
            resolve_output_format(&global(true, false, false, "auto")).unwrap(),
            OutputFormat::Json
        );
        assert_eq!(
            resolve_output_format(&global(false, false, true, "auto")).unwrap(),
            OutputFormat::Plain
        );
    }
}
