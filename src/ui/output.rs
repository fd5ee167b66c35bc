//! Text and JSON rendering of scan results

use anyhow::Result;
use colored::Colorize;

use crate::scanner::{ScanResult, Severity, Vulnerability};

/// Print results as formatted text
pub fn print_text(result: &ScanResult) {
    println!();
    println!("{}", "Scan Results".cyan().bold());
    println!("{}", "════════════".cyan());
    println!();
    println!(
        "Servers: {} scanned, {} failed",
        result.servers_scanned, result.servers_failed
    );
    println!("Duration: {}ms", result.duration_ms);
    println!();

    if result.vulnerabilities.is_empty() {
        println!("{}", "No vulnerabilities found".green());
    } else {
        let count = result.vulnerabilities.len();
        println!(
            "{} {} found:",
            count,
            if count == 1 {
                "vulnerability"
            } else {
                "vulnerabilities"
            }
        );
        println!();
        for vulnerability in &result.vulnerabilities {
            print_vulnerability(vulnerability);
        }
    }

    println!(
        "Summary: {} high, {} medium, {} low",
        result.summary.high.to_string().red(),
        result.summary.medium.to_string().yellow(),
        result.summary.low.to_string().blue()
    );

    if result.has_high() {
        println!("{}", "High-severity findings present. Do not trust this configuration.".red());
    } else if !result.vulnerabilities.is_empty() {
        println!("{}", "Review the findings before trusting these servers.".yellow());
    }
}

fn print_vulnerability(vulnerability: &Vulnerability) {
    let severity = severity_display(vulnerability.severity);
    match &vulnerability.tool {
        Some(tool) => println!(
            "  [{}] {} / {}",
            severity,
            vulnerability.server.white(),
            tool.cyan()
        ),
        None => println!(
            "  [{}] {} (cross-origin references)",
            severity,
            vulnerability.server.white()
        ),
    }

    if let Some(details) = &vulnerability.detection_details {
        for m in details
            .hidden_instructions
            .iter()
            .chain(&details.tool_shadowing)
            .chain(&details.sensitive_file_access)
            .chain(&details.exfiltration_channels)
        {
            println!(
                "    {}: rule `{}` matched {:?}",
                m.category.as_str().dimmed(),
                m.rule,
                m.matched
            );
            println!("      {}", m.context.dimmed());
        }
    }

    if let Some(matches) = &vulnerability.cross_ref_matches {
        for m in matches {
            println!(
                "    tool `{}` references server {:?}",
                m.tool,
                m.referenced_name
            );
            println!("      {}", m.context.dimmed());
        }
    }

    if let Some(opinion) = &vulnerability.secondary_opinion {
        let label = opinion
            .overall_risk
            .map(|r| r.to_string())
            .unwrap_or_else(|| "none".to_string());
        println!("    model opinion ({}): {}", label, opinion.analysis.dimmed());
    }

    println!();
}

fn severity_display(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::High => "HIGH".red().bold(),
        Severity::Medium => "MEDIUM".yellow(),
        Severity::Low => "LOW".blue(),
    }
}

/// Print results as pretty JSON
pub fn print_json(result: &ScanResult) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
