// Output formatting and display for CLI

use crate::probe::{ProbeResult, ProbeStatus};
use crate::supervisor::SupervisorReport;
use colored::*;

/// Print the result of a single liveness probe
pub fn print_probe_result(result: &ProbeResult) {
    match &result.status {
        ProbeStatus::Reachable => {
            println!("{}", "✓ Endpoint is reachable".green().bold());
            println!("  {}: {}", "URL".bold(), result.url.cyan());
            println!("  {}: {:?}", "Latency".bold(), result.latency);
        }
        ProbeStatus::Unreachable(reason) => {
            println!("{}", "✗ Endpoint is unreachable".red().bold());
            println!("  {}: {}", "URL".bold(), result.url.cyan());
            println!("  {}: {}", "Reason".bold(), reason);
        }
    }
}

/// Print the outcome of a wait-until-ready poll
pub fn print_wait_result(result: &ProbeResult, attempts: u32) {
    match &result.status {
        ProbeStatus::Reachable => {
            println!(
                "{}",
                "✓ Service is up and accepting requests".green().bold()
            );
            println!("  {}: {}", "URL".bold(), result.url.cyan());
        }
        ProbeStatus::Unreachable(reason) => {
            println!(
                "{}",
                format!("✗ Service did not come up after {} attempts", attempts)
                    .red()
                    .bold()
            );
            println!("  {}: {}", "URL".bold(), result.url.cyan());
            println!("  {}: {}", "Last error".bold(), reason);
        }
    }
}

/// Print the summary after the supervisor stops cooperatively
pub fn print_run_summary(name: &str, report: &SupervisorReport) {
    println!(
        "{}",
        format!("✓ Supervisor for '{}' stopped", name).green().bold()
    );
    println!("  {}: {}", "Restarts".bold(), report.restarts);
    if let Some(ref exit) = report.last_exit {
        println!("  {}: {}", "Last exit".bold(), exit);
    }
}

/// Print an error message to stderr
pub fn print_error(error: &str) {
    eprintln!("{} {}", "✗ Error:".red().bold(), error);
}
