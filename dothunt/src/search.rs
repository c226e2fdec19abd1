//! `dothunt search`: expand a phrase into candidate labels, cross them with
//! TLDs, then check the resulting domains.

use std::collections::{HashMap, HashSet};

use clap::ArgAction;
use dothunt_lib::{enrich_results, normalize, DomainStatus, GenerateOptions, Generator};

use crate::check::{filter_only, sort_by_domain, sort_by_length};
use crate::output::write_results;
use crate::{usage_error, Runtime};

#[derive(clap::Args)]
pub struct SearchArgs {
    /// Phrase to expand into candidate labels
    #[arg(value_name = "PHRASE", required = true, num_args = 1..)]
    pub phrase: Vec<String>,

    /// Comma-separated TLDs to try
    #[arg(long, default_value = "com,io,ai,agency,de", value_name = "CSV")]
    pub tlds: String,

    /// Max base labels generated from the phrase
    #[arg(long = "max-labels", default_value_t = 80)]
    pub max_labels: usize,

    /// Max domains to check (labels x tlds), after dedupe
    #[arg(long = "max-domains", default_value_t = 800)]
    pub max_domains: usize,

    /// Max results to output (0 = unlimited)
    #[arg(long = "max-results", default_value_t = 100)]
    pub max_results: usize,

    /// Alias for --only all
    #[arg(long)]
    pub all: bool,

    /// Filter output
    #[arg(
        long,
        default_value = "auto",
        value_parser = ["auto", "available", "buyable", "taken", "unknown", "all"]
    )]
    pub only: String,

    /// Sort output
    #[arg(long, default_value = "score", value_parser = ["score", "domain", "length"])]
    pub sort: String,

    /// Generate KI<->AI token variants
    #[arg(
        long = "ki-ai",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub ki_ai: bool,

    /// For 2-word phrases, generate reversed variants
    #[arg(
        long = "reverse",
        default_value_t = true,
        action = ArgAction::Set,
        num_args = 0..=1,
        default_missing_value = "true"
    )]
    pub reverse: bool,
}

pub async fn run(rt: &Runtime, args: SearchArgs) -> i32 {
    let phrase = args.phrase.join(" ").trim().to_string();
    if phrase.is_empty() {
        return usage_error("");
    }

    let tlds = split_comma_list(&args.tlds);
    if tlds.is_empty() {
        return usage_error("no TLDs specified (use --tlds)");
    }

    let only = resolve_only(&args, rt);
    if only == "buyable" && rt.registrar.is_none() {
        return usage_error(
            "--only buyable requires --registrar (or PORKBUN_API_KEY/PORKBUN_SECRET_API_KEY)",
        );
    }

    let generator = Generator::new(GenerateOptions {
        max_labels: args.max_labels.max(1),
        replace_ki: args.ki_ai,
        reverse2: args.reverse,
        keep_hyphen: true,
        min_token_len: 2,
    });
    let labels = generator.labels(&phrase);

    let mut domains: Vec<String> = Vec::with_capacity(labels.len() * tlds.len());
    let mut seen: HashSet<String> = HashSet::new();
    let mut scores: HashMap<String, i32> = HashMap::new();
    'candidates: for cand in &labels {
        for tld in &tlds {
            let Ok(ascii) = normalize(&format!("{}.{}", cand.label, tld)) else {
                continue;
            };
            if !seen.insert(ascii.clone()) {
                continue;
            }
            scores.insert(ascii.clone(), cand.score);
            domains.push(ascii);
            if args.max_domains > 0 && domains.len() >= args.max_domains {
                break 'candidates;
            }
        }
    }
    if domains.is_empty() {
        return 0;
    }
    tracing::debug!(phrase = %phrase, candidates = domains.len(), "search expansion");

    let mut results = rt.checker.check_domains(&domains).await;
    for r in &mut results {
        r.phrase = Some(phrase.clone());
        if let Some(score) = scores.get(&r.domain) {
            r.score = Some(*score);
        }
    }

    if let Some(registrar) = &rt.registrar {
        enrich_results(
            registrar.clone(),
            rt.registrar_concurrency,
            &mut results,
            |r| r.status == DomainStatus::Available,
        )
        .await;
    }

    let strict_fail = rt.strict
        && results
            .iter()
            .any(|r| r.status == DomainStatus::Unknown || r.error.is_some());

    filter_only(&mut results, &only);

    match args.sort.as_str() {
        "domain" => sort_by_domain(&mut results),
        "length" => sort_by_length(&mut results),
        _ => sort_by_score(&mut results),
    }

    if args.max_results > 0 {
        results.truncate(args.max_results);
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

fn resolve_only(args: &SearchArgs, rt: &Runtime) -> String {
    if args.all {
        return "all".to_string();
    }
    if args.only == "auto" {
        if rt.registrar.is_some() {
            return "buyable".to_string();
        }
        return "available".to_string();
    }
    args.only.clone()
}

fn sort_by_score(results: &mut [dothunt_lib::DomainResult]) {
    results.sort_by(|a, b| {
        b.score
            .unwrap_or(0)
            .cmp(&a.score.unwrap_or(0))
            .then_with(|| a.domain.len().cmp(&b.domain.len()))
            .then_with(|| a.domain.cmp(&b.domain))
    });
}

/// Split, trim, lowercase and dedupe a comma-separated list.
fn split_comma_list(s: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut seen = HashSet::new();
    for part in s.split(',') {
        let part = part.trim().to_lowercase();
        if part.is_empty() || !seen.insert(part.clone()) {
            continue;
        }
        out.push(part);
    }
    out
}
