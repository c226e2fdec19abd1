//! Result rendering: table for humans, NDJSON/JSON/plain for machines.
//!
//! The table grows columns on demand: SCORE appears when any row carries a
//! nonzero score (search mode) and the registrar block appears when any row
//! carries registrar data.

use std::io::{IsTerminal, Write};

use console::style;
use dothunt_lib::{DomainResult, DomainStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Ndjson,
    Json,
    Plain,
}

/// Map a format flag value to a concrete format; `auto` picks a table on a
/// terminal and NDJSON when piped.
pub fn resolve_format(flag: &str) -> OutputFormat {
    match flag {
        "table" => OutputFormat::Table,
        "ndjson" => OutputFormat::Ndjson,
        "json" => OutputFormat::Json,
        "plain" => OutputFormat::Plain,
        _ => {
            if std::io::stdout().is_terminal() {
                OutputFormat::Table
            } else {
                OutputFormat::Ndjson
            }
        }
    }
}

pub fn write_results(
    w: &mut impl Write,
    format: OutputFormat,
    results: &[DomainResult],
) -> std::io::Result<()> {
    match format {
        OutputFormat::Ndjson => {
            for r in results {
                let line = serde_json::to_string(r).map_err(std::io::Error::other)?;
                writeln!(w, "{}", line)?;
            }
            Ok(())
        }
        OutputFormat::Json => {
            let body = serde_json::to_string(results).map_err(std::io::Error::other)?;
            writeln!(w, "{}", body)
        }
        OutputFormat::Plain => {
            for r in results {
                writeln!(
                    w,
                    "{}\t{}\t{}\t{}",
                    r.domain, r.status, r.method, r.confidence
                )?;
            }
            Ok(())
        }
        OutputFormat::Table => write_table(w, results),
    }
}

fn write_table(w: &mut impl Write, results: &[DomainResult]) -> std::io::Result<()> {
    let show_score = results.iter().any(|r| r.score.unwrap_or(0) != 0);
    let show_registrar = results.iter().any(|r| r.has_registrar_data());

    let mut header: Vec<String> = vec![
        "DOMAIN".into(),
        "STATUS".into(),
        "METHOD".into(),
        "CONFIDENCE".into(),
    ];
    if show_score {
        header.push("SCORE".into());
    }
    if show_registrar {
        header.extend(["BUYABLE".into(), "PREMIUM".into(), "PRICE".into(), "REGISTRAR".into()]);
    }
    header.push("DETAIL".into());

    let mut rows: Vec<Vec<String>> = vec![header];
    for r in results {
        let mut row: Vec<String> = vec![
            r.domain.clone(),
            r.status.to_string(),
            r.method.to_string(),
            r.confidence.to_string(),
        ];
        if show_score {
            row.push(r.score.unwrap_or(0).to_string());
        }
        if show_registrar {
            row.push(yes_no_cell(r.buyable));
            row.push(yes_no_cell(r.premium));
            row.push(price_cell(r));
            row.push(registrar_cell(r));
        }
        row.push(
            r.detail
                .clone()
                .or_else(|| r.error.clone())
                .unwrap_or_default(),
        );
        rows.push(row);
    }

    let columns = rows[0].len();
    let mut widths = vec![0usize; columns];
    for row in &rows {
        for (i, cell) in row.iter().enumerate() {
            widths[i] = widths[i].max(cell.len());
        }
    }

    for (line, row) in rows.iter().enumerate() {
        let mut rendered = String::new();
        for (i, cell) in row.iter().enumerate() {
            let padded = if i + 1 < columns {
                format!("{:<width$}  ", cell, width = widths[i])
            } else {
                cell.clone()
            };
            // Color the status column for data rows; console drops the ANSI
            // codes automatically when stdout is not a terminal.
            if line > 0 && i == 1 {
                let status = results[line - 1].status;
                let styled = match status {
                    DomainStatus::Available => style(padded).green(),
                    DomainStatus::Taken => style(padded).red(),
                    DomainStatus::Unknown => style(padded).yellow(),
                };
                rendered.push_str(&styled.to_string());
            } else {
                rendered.push_str(&padded);
            }
        }
        writeln!(w, "{}", rendered.trim_end())?;
    }
    Ok(())
}

fn yes_no_cell(v: Option<bool>) -> String {
    match v {
        Some(true) => "yes".to_string(),
        Some(false) => "no".to_string(),
        None => String::new(),
    }
}

fn price_cell(r: &DomainResult) -> String {
    let Some(price) = r.price.as_deref() else {
        return String::new();
    };
    let mut cell = price.to_string();
    if let Some(regular) = r.regular_price.as_deref() {
        if regular != price {
            cell = format!("{} (reg {})", price, regular);
        }
    }
    if let Some(currency) = r.currency.as_deref() {
        cell = format!("{} {}", cell, currency);
    }
    cell
}

fn registrar_cell(r: &DomainResult) -> String {
    let Some(name) = r.registrar.as_deref() else {
        return String::new();
    };
    if r.registrar_error.is_some() {
        format!("{} (err)", name)
    } else {
        name.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dothunt_lib::{CheckMethod, Confidence};

    fn sample(domain: &str, status: DomainStatus) -> DomainResult {
        let json = serde_json::json!({
            "domain": domain,
            "status": status.to_string(),
            "method": "rdap",
            "confidence": "high",
            "checked_at": "2024-01-01T00:00:00.000000000Z",
            "duration_ms": 12,
        });
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn plain_is_four_tab_separated_fields() {
        let results = vec![sample("example.com", DomainStatus::Taken)];
        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Plain, &results).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "example.com\ttaken\trdap\thigh\n"
        );
    }

    #[test]
    fn ndjson_emits_one_object_per_line() {
        let results = vec![
            sample("a.com", DomainStatus::Available),
            sample("b.com", DomainStatus::Taken),
        ];
        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Ndjson, &results).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text.lines().count(), 2);
        for line in text.lines() {
            let value: serde_json::Value = serde_json::from_str(line).unwrap();
            assert!(value.get("domain").is_some());
        }
    }

    #[test]
    fn json_is_a_single_array() {
        let results = vec![sample("a.com", DomainStatus::Available)];
        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Json, &results).unwrap();
        let value: serde_json::Value =
            serde_json::from_str(String::from_utf8(buf).unwrap().trim()).unwrap();
        assert_eq!(value.as_array().unwrap().len(), 1);
    }

    #[test]
    fn table_grows_columns_for_score_and_registrar() {
        let mut base = sample("a.com", DomainStatus::Available);
        base.detail = Some("rdap 404".to_string());

        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Table, std::slice::from_ref(&base)).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("DOMAIN"));
        assert!(!text.contains("SCORE"));
        assert!(!text.contains("BUYABLE"));

        let mut scored = base.clone();
        scored.score = Some(95);
        scored.registrar = Some("porkbun".to_string());
        scored.buyable = Some(true);
        scored.price = Some("10.29".to_string());

        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Table, &[scored]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.contains("SCORE"));
        assert!(text.contains("BUYABLE"));
        assert!(text.contains("porkbun"));
        assert!(text.contains("10.29"));
    }

    #[test]
    fn method_none_serializes_in_plain() {
        let mut r = sample("bad", DomainStatus::Unknown);
        r.method = CheckMethod::None;
        r.confidence = Confidence::Low;
        let mut buf = Vec::new();
        write_results(&mut buf, OutputFormat::Plain, &[r]).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "bad\tunknown\tnone\tlow\n");
    }
}
