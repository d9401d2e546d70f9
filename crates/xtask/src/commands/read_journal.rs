//! Read and inspect decision journals
//!
//! A journal is a JSON lines file written by the simulation, one decision per
//! line. This command summarizes it, lists entries, or re-emits them as JSON.

use anyhow::{Context, Result};
use clap::Parser;
use console::style;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::PathBuf;

/// Read and inspect a decision journal
#[derive(Parser)]
pub struct ReadJournal {
    /// Journal file (JSON lines)
    #[arg(value_name = "FILE")]
    path: PathBuf,

    /// Only show decisions of this agent id
    #[arg(short, long, value_name = "ID")]
    agent: Option<u32>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "summary")]
    format: OutputFormat,

    /// Limit number of entries to display (0 = unlimited)
    #[arg(short, long, default_value = "100")]
    limit: usize,
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    /// Counts per action and per source
    Summary,
    /// One line per decision
    List,
    /// Full JSON output
    Json,
}

/// The journal fields this command reads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct JournalLine {
    tick: u64,
    agent: u32,
    state: String,
    action: String,
    reason: String,
    source: String,
    #[serde(default)]
    target: Option<serde_json::Value>,
}

impl ReadJournal {
    pub fn execute(self) -> Result<()> {
        let file = File::open(&self.path)
            .with_context(|| format!("Failed to open journal: {}", self.path.display()))?;
        let entries = parse_lines(BufReader::new(file))?;

        let entries: Vec<_> = entries
            .into_iter()
            .filter(|entry| self.agent.is_none_or(|agent| entry.agent == agent))
            .take(if self.limit == 0 {
                usize::MAX
            } else {
                self.limit
            })
            .collect();

        println!("{} {}", style("Journal:").bold().cyan(), self.path.display());
        println!("{} {}", style("Entries:").bold().cyan(), entries.len());
        println!();

        match self.format {
            OutputFormat::Summary => print_summary(&entries),
            OutputFormat::List => print_list(&entries),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&entries)
                    .context("Failed to serialize entries to JSON")?;
                println!("{}", json);
            }
        }
        Ok(())
    }
}

fn parse_lines(reader: impl BufRead) -> Result<Vec<JournalLine>> {
    let mut entries = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line.context("Failed to read journal line")?;
        if line.trim().is_empty() {
            continue;
        }
        let entry = serde_json::from_str(&line)
            .with_context(|| format!("Malformed journal entry on line {}", index + 1))?;
        entries.push(entry);
    }
    Ok(entries)
}

fn count_by<'a>(
    entries: &'a [JournalLine],
    key: impl Fn(&'a JournalLine) -> &'a str,
) -> Vec<(&'a str, usize)> {
    let mut counts = BTreeMap::new();
    for entry in entries {
        *counts.entry(key(entry)).or_insert(0) += 1;
    }
    let mut counts: Vec<_> = counts.into_iter().collect();
    counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    counts
}

fn print_summary(entries: &[JournalLine]) {
    println!("{}", style("=== Decision Summary ===").bold().green());
    println!();

    println!("{}", style("Actions:").bold().yellow());
    for (action, count) in count_by(entries, |entry| entry.action.as_str()) {
        println!("  {}: {}", action, count);
    }
    println!();

    println!("{}", style("Sources:").bold().yellow());
    for (source, count) in count_by(entries, |entry| entry.source.as_str()) {
        println!("  {}: {}", source, count);
    }
    println!();

    if let (Some(first), Some(last)) = (entries.first(), entries.last()) {
        println!("{}", style("Tick Range:").bold().yellow());
        println!("  First: {}", first.tick);
        println!("  Last: {}", last.tick);
        println!();
    }
}

fn print_list(entries: &[JournalLine]) {
    println!("{}", style("=== Decisions ===").bold().green());
    println!();

    for entry in entries {
        println!(
            "{} {:>5}  #{:<4} {:<20} {:<10} {}",
            style("tick").bold(),
            entry.tick,
            entry.agent,
            entry.action,
            style(&entry.source).dim(),
            entry.reason
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JOURNAL: &str = concat!(
        r#"{"tick":0,"agent":1,"state":"idle","target":null,"action":"explore","reason":"Fallback: Nothing urgent, exploring","at":0,"source":"fallback"}"#,
        "\n",
        r#"{"tick":4,"agent":2,"state":"pursuing_bounty","target":{"kind":"bounty","id":1},"action":"pursue_bounty","reason":"Heading out","at":400,"source":"heuristic"}"#,
        "\n\n",
        r#"{"tick":9,"agent":1,"state":"shopping","target":{"kind":"entity","id":3},"action":"buy_item","reason":"Stocking up","at":900,"source":"advisory"}"#,
        "\n",
    );

    #[test]
    fn test_parses_journal_lines() {
        let entries = parse_lines(JOURNAL.as_bytes()).unwrap();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[2].action, "buy_item");
        assert_eq!(entries[2].source, "advisory");
        assert!(entries[0].target.is_none());
        assert!(entries[1].target.is_some());
    }

    #[test]
    fn test_counts_sorted_by_frequency() {
        let mut entries = parse_lines(JOURNAL.as_bytes()).unwrap();
        entries.push(entries[0].clone());
        let counts = count_by(&entries, |entry| entry.action.as_str());
        assert_eq!(counts[0], ("explore", 2));
        assert_eq!(counts.len(), 3);
    }

    #[test]
    fn test_malformed_line_reports_position() {
        let error = parse_lines("{}\n".as_bytes()).unwrap_err();
        assert!(error.to_string().contains("line 1"));
    }
}
