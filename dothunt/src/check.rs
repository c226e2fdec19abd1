//! `dothunt check`: explicit domains from arguments and/or stdin.

use std::io::{BufRead, IsTerminal};

use dothunt_lib::{enrich_results, DomainResult, DomainStatus};

use crate::output::write_results;
use crate::{usage_error, Runtime};

#[derive(clap::Args)]
pub struct CheckArgs {
    /// Domains to check
    #[arg(value_name = "DOMAIN")]
    pub domains: Vec<String>,

    /// Only output available results
    #[arg(long = "available-only")]
    pub available_only: bool,

    /// Filter output
    #[arg(
        long,
        default_value = "all",
        value_parser = ["all", "available", "taken", "unknown", "buyable"]
    )]
    pub only: String,

    /// Sort output
    #[arg(
        long,
        default_value = "input",
        value_parser = ["input", "domain", "status", "length"]
    )]
    pub sort: String,
}

pub async fn run(rt: &Runtime, args: CheckArgs) -> i32 {
    let inputs = match read_inputs(&args.domains) {
        Ok(inputs) => inputs,
        Err(err) => {
            eprintln!("failed to read domains: {}", err);
            return 1;
        }
    };
    if inputs.is_empty() {
        return usage_error("");
    }

    let only = if args.available_only {
        "available"
    } else {
        args.only.as_str()
    };
    if only == "buyable" && rt.registrar.is_none() {
        return usage_error(
            "--only buyable requires --registrar (or PORKBUN_API_KEY/PORKBUN_SECRET_API_KEY)",
        );
    }

    let mut results = rt.checker.check_domains(&inputs).await;

    if let Some(registrar) = &rt.registrar {
        enrich_results(
            registrar.clone(),
            rt.registrar_concurrency,
            &mut results,
            |r| matches!(r.status, DomainStatus::Available | DomainStatus::Unknown),
        )
        .await;
    }

    let strict_fail = rt.strict
        && results
            .iter()
            .any(|r| r.status == DomainStatus::Unknown || r.error.is_some());

    filter_only(&mut results, only);

    match args.sort.as_str() {
        "domain" => sort_by_domain(&mut results),
        "status" => sort_by_status(&mut results),
        "length" => sort_by_length(&mut results),
        // "input": leave check order, which already matches input order.
        _ => {}
    }

    let stdout = std::io::stdout();
    if let Err(err) = write_results(&mut stdout.lock(), rt.format, &results) {
        eprintln!("failed to write output: {}", err);
        return 1;
    }
    if strict_fail {
        return 1;
    }
    0
}

/// Non-empty trimmed arguments, then stdin lines when something is piped in.
fn read_inputs(args: &[String]) -> std::io::Result<Vec<String>> {
    let mut out: Vec<String> = args
        .iter()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();

    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        return Ok(out);
    }
    for line in stdin.lock().lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            out.push(line.to_string());
        }
    }
    Ok(out)
}

pub(crate) fn filter_only(results: &mut Vec<DomainResult>, only: &str) {
    match only {
        "available" => results.retain(|r| r.status == DomainStatus::Available),
        "taken" => results.retain(|r| r.status == DomainStatus::Taken),
        "unknown" => results.retain(|r| r.status == DomainStatus::Unknown),
        "buyable" => results.retain(|r| r.buyable == Some(true)),
        _ => {}
    }
}

pub(crate) fn sort_by_domain(results: &mut [DomainResult]) {
    results.sort_by(|a, b| a.domain.cmp(&b.domain));
}

pub(crate) fn sort_by_length(results: &mut [DomainResult]) {
    results.sort_by(|a, b| {
        a.domain
            .len()
            .cmp(&b.domain.len())
            .then_with(|| a.domain.cmp(&b.domain))
    });
}

fn sort_by_status(results: &mut [DomainResult]) {
    let rank = |status: DomainStatus| match status {
        DomainStatus::Available => 0,
        DomainStatus::Taken => 1,
        DomainStatus::Unknown => 2,
    };
    results.sort_by(|a, b| {
        rank(a.status)
            .cmp(&rank(b.status))
            .then_with(|| a.domain.cmp(&b.domain))
    });
}
