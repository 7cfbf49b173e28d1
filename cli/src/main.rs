use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{Months, NaiveDate};
use clap::{Parser, Subcommand};
use owo_colors::OwoColorize;
use serde::Deserialize;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use tokenomics::{
    AllocationCheck, AllocationValidator, ScheduleEngine, TokenProject, VestingPolicy,
};

#[derive(Parser)]
#[command(name = "tokenplan")]
#[command(about = "Token allocation and vesting schedule planner")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Check that a project's allocations sum to 100%
    Validate {
        /// Path to a project definition file
        file: PathBuf,
    },
    /// Show per-category amounts and release policies
    Summary {
        file: PathBuf,
    },
    /// Print one category's unlock schedule
    Schedule {
        file: PathBuf,
        /// Allocation category to compute
        #[arg(short, long)]
        category: String,
        /// Extend the series past full vesting
        #[arg(long)]
        horizon: Option<u32>,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print the project-wide unlock table
    Unlocks {
        file: PathBuf,
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

type CliResult = Result<ExitCode, Box<dyn std::error::Error>>;

#[derive(Debug, Deserialize)]
struct ProjectFile {
    project: ProjectSection,
    #[serde(default, rename = "allocation")]
    allocations: Vec<AllocationSection>,
}

#[derive(Debug, Deserialize)]
struct ProjectSection {
    name: String,
    total_supply: f64,
    genesis_date: Option<NaiveDate>,
}

#[derive(Debug, Deserialize)]
struct AllocationSection {
    category: String,
    percentage: f64,
    vesting: Option<VestingSection>,
}

/// Raw vesting values as written in the project file; converted through
/// the engine's checked path so malformed fields name the category
#[derive(Debug, Deserialize)]
struct VestingSection {
    #[serde(default)]
    tge_percent: f64,
    #[serde(default)]
    cliff_months: i64,
    #[serde(default)]
    vesting_months: i64,
}

fn build_project(file: ProjectFile) -> Result<TokenProject, tokenomics::TokenomicsError> {
    let mut project = TokenProject::new(file.project.name, file.project.total_supply);
    for section in file.allocations {
        project
            .allocations
            .insert(section.category.clone(), section.percentage)?;
        if let Some(v) = section.vesting {
            let policy = VestingPolicy::from_parts(
                &section.category,
                v.tge_percent,
                v.cliff_months,
                v.vesting_months,
            )?;
            project.policies.insert(section.category, policy);
        }
    }
    Ok(project)
}

fn load_project(path: &Path) -> Result<(TokenProject, Option<NaiveDate>), Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let file: ProjectFile = toml::from_str(&contents)?;
    debug!(
        file = %path.display(),
        allocations = file.allocations.len(),
        "loaded project definition"
    );
    let genesis_date = file.project.genesis_date;
    Ok((build_project(file)?, genesis_date))
}

/// "2026-03" when a genesis date is configured, "M14" otherwise
fn month_label(genesis: Option<NaiveDate>, month: u32) -> String {
    match genesis.and_then(|d| d.checked_add_months(Months::new(month))) {
        Some(date) => date.format("%Y-%m").to_string(),
        None => format!("M{}", month),
    }
}

fn policy_label(policy: &VestingPolicy) -> String {
    if policy.tge_percent >= 100.0 && policy.vesting_months == 0 {
        return "unlocked at TGE".to_string();
    }
    let mut parts = Vec::new();
    if policy.tge_percent > 0.0 {
        parts.push(format!("{}% TGE", policy.tge_percent));
    }
    if policy.cliff_months > 0 {
        parts.push(format!("{} mo cliff", policy.cliff_months));
    }
    if policy.vesting_months > 0 {
        parts.push(format!("{} mo linear", policy.vesting_months));
    }
    if parts.is_empty() {
        "no release".to_string()
    } else {
        parts.join(", ")
    }
}

fn format_amount(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (int_part, frac_part) = formatted.split_once('.').unwrap_or((&formatted, "00"));
    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if value < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let head: String = s.chars().take(max - 1).collect();
        format!("{}…", head)
    }
}

fn cmd_validate(file: &Path) -> CliResult {
    let (project, _) = load_project(file)?;
    match AllocationValidator::validate(&project.allocations) {
        AllocationCheck::Valid => {
            println!(
                "{} allocations sum to 100% ({} categories)",
                "✓".green(),
                project.allocations.len()
            );
            Ok(ExitCode::SUCCESS)
        }
        AllocationCheck::SumMismatch { total } => {
            println!(
                "{} allocations must sum to 100%, current total: {:.2}%",
                "✗".red(),
                total
            );
            Ok(ExitCode::FAILURE)
        }
        AllocationCheck::OutOfRange {
            category,
            percentage,
        } => {
            println!(
                "{} category '{}' has out-of-range percentage {}",
                "✗".red(),
                category,
                percentage
            );
            Ok(ExitCode::FAILURE)
        }
    }
}

fn cmd_summary(file: &Path) -> CliResult {
    let (project, genesis) = load_project(file)?;
    let summary = project.summary();

    println!("\n{}", summary.name.cyan().bold());
    println!(
        "{}: {}",
        "Total Supply".yellow().bold(),
        format_amount(summary.total_supply)
    );
    if let Some(date) = genesis {
        println!("{}: {}", "Genesis".yellow().bold(), date.format("%Y-%m-%d"));
    }

    println!(
        "\n{} ({})",
        "Allocations".yellow().bold(),
        summary.categories.len()
    );
    for (i, c) in summary.categories.iter().enumerate() {
        println!(
            "  {}. {:<16} {:>7.2}%  {:>18}  {}",
            i + 1,
            c.category,
            c.percentage,
            format_amount(c.amount).green(),
            policy_label(&c.policy).bright_black()
        );
    }

    println!(
        "\n{}: {} ({:.2}% of supply)",
        "Unlocked at TGE".yellow().bold(),
        format_amount(summary.tge_unlock),
        summary.tge_percent_of_supply
    );
    println!(
        "{}: {}",
        "Fully vested".yellow().bold(),
        month_label(genesis, summary.full_vesting_month)
    );
    println!();
    Ok(ExitCode::SUCCESS)
}

fn cmd_schedule(file: &Path, category: &str, horizon: Option<u32>, json: bool) -> CliResult {
    let (project, genesis) = load_project(file)?;
    let entry = project
        .allocations
        .get(category)
        .ok_or_else(|| format!("no allocation category '{}'", category))?;
    let policy = project.policy_for(category);
    let points = ScheduleEngine::category_schedule(
        category,
        entry.amount(project.total_supply),
        &policy,
        horizon,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&points)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n{} / {}", project.name.cyan().bold(), category.cyan());
    println!("{}", policy_label(&policy).bright_black());

    let header = format!(
        "\n{:>5}  {:>8}  {:>18}  {:>18}  {:>8}",
        "Month", "Date", "Unlocked", "Cumulative", "%"
    );
    println!("{}", header.yellow().bold());
    for point in &points {
        println!(
            "{:>5}  {:>8}  {:>18}  {:>18}  {:>7.2}%",
            point.month,
            month_label(genesis, point.month),
            format_amount(point.unlocked_this_month),
            format_amount(point.cumulative_unlocked),
            point.cumulative_percent
        );
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

fn cmd_unlocks(file: &Path, json: bool) -> CliResult {
    let (project, genesis) = load_project(file)?;
    let schedule = project.schedule()?;
    info!(rows = schedule.rows.len(), "project schedule computed");

    if json {
        println!("{}", serde_json::to_string_pretty(&schedule)?);
        return Ok(ExitCode::SUCCESS);
    }

    println!("\n{}", project.name.cyan().bold());

    let mut header = format!("{:>5}  {:>8}", "Month", "Date");
    for category in &schedule.categories {
        header.push_str(&format!("  {:>14}", truncate(category, 14)));
    }
    header.push_str(&format!("  {:>16}  {:>16}", "Unlocked", "Cumulative"));
    println!("{}", header.yellow().bold());

    for row in &schedule.rows {
        let mut line = format!("{:>5}  {:>8}", row.month, month_label(genesis, row.month));
        for amount in &row.unlocked_this_month {
            line.push_str(&format!("  {:>14}", format_amount(*amount)));
        }
        line.push_str(&format!(
            "  {:>16}  {:>16}",
            format_amount(row.total_unlocked_this_month),
            format_amount(row.cumulative_total)
        ));
        println!("{}", line);
    }
    println!();
    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Validate { file } => cmd_validate(&file),
        Command::Summary { file } => cmd_summary(&file),
        Command::Schedule {
            file,
            category,
            horizon,
            json,
        } => cmd_schedule(&file, &category, horizon, json),
        Command::Unlocks { file, json } => cmd_unlocks(&file, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {}", "error:".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE: &str = r#"
[project]
name = "demo"
total_supply = 1000000.0
genesis_date = "2026-01-01"

[[allocation]]
category = "team"
percentage = 40.0

[allocation.vesting]
tge_percent = 10.0
cliff_months = 6
vesting_months = 12

[[allocation]]
category = "community"
percentage = 60.0
"#;

    #[test]
    fn test_parse_project_file() {
        let file: ProjectFile = toml::from_str(EXAMPLE).unwrap();
        assert_eq!(file.project.name, "demo");
        assert_eq!(file.allocations.len(), 2);
        assert!(file.allocations[0].vesting.is_some());
        assert!(file.allocations[1].vesting.is_none());
    }

    #[test]
    fn test_build_project_from_file() {
        let file: ProjectFile = toml::from_str(EXAMPLE).unwrap();
        let project = build_project(file).unwrap();

        assert_eq!(project.allocations.len(), 2);
        assert_eq!(project.policy_for("team"), VestingPolicy::new(10.0, 6, 12));
        // no vesting table means full unlock at genesis
        assert_eq!(project.policy_for("community"), VestingPolicy::immediate());
    }

    #[test]
    fn test_build_project_rejects_negative_months() {
        let bad = EXAMPLE.replace("cliff_months = 6", "cliff_months = -6");
        let file: ProjectFile = toml::from_str(&bad).unwrap();
        let err = build_project(file).unwrap_err();
        assert!(matches!(
            err,
            tokenomics::TokenomicsError::InvalidPolicy { field, .. } if field == "cliff_months"
        ));
    }

    #[test]
    fn test_month_label() {
        let genesis = NaiveDate::from_ymd_opt(2026, 1, 1);
        assert_eq!(month_label(genesis, 0), "2026-01");
        assert_eq!(month_label(genesis, 14), "2027-03");
        assert_eq!(month_label(None, 14), "M14");
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1_000_000.0), "1,000,000.00");
        assert_eq!(format_amount(75_000.5), "75,000.50");
        assert_eq!(format_amount(0.0), "0.00");
    }
}
