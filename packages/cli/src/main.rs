#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for per-agency traffic stop reports.
//!
//! Provides subcommands that fetch an agency's (or a single officer's)
//! datasets and print the same derived views the dashboard charts render:
//! overview breakdowns, stop/search series, departmental search rate,
//! contraband hit rate, and likelihood-of-search comparisons.

use clap::{Parser, Subcommand};
use traffic_stops_aggregate::series::{BaselineComparison, GroupTimeSeries, SeriesPoint};
use traffic_stops_dashboard::{AgencyDashboard, NO_BASELINE_EXPLANATION};
use traffic_stops_datasets_models::{DatasetKey, EntityScope, YearFilter};
use traffic_stops_selection::{FilterState, GroupSelection};

/// Query and report per-agency traffic stop statistics.
#[derive(Parser)]
#[command(name = "traffic_stops")]
#[command(about = "Report per-agency traffic stop statistics")]
struct Cli {
    /// Agency identifier to report on.
    agency_id: String,

    /// Narrow every dataset to a single officer within the agency.
    #[arg(long)]
    officer: Option<String>,

    /// Base URL of the statistics API.
    #[arg(long, default_value = "http://localhost:8000")]
    base_url: String,

    /// Restrict derived views to a single year (default: all years).
    #[arg(long)]
    year: Option<u16>,

    /// Subcommand to execute.
    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Summary breakdowns of stops, searches, and use of force.
    Overview,

    /// Stops per year per group, optionally narrowed to one stop purpose.
    Stops {
        /// Report raw counts instead of percentages.
        #[arg(long)]
        counts: bool,

        /// Narrow to a single stop purpose (implies counts).
        #[arg(long)]
        purpose: Option<String>,
    },

    /// Searches per year per group, optionally narrowed to one search type.
    Searches {
        /// Narrow to a single search type.
        #[arg(long)]
        search_type: Option<String>,
    },

    /// Departmental search rate per group, with the pooled average line.
    SearchRate,

    /// Contraband found as a percentage of searches, per group.
    HitRate,

    /// Likelihood of being searched relative to the baseline group.
    Likelihood,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pretty_env_logger::init();
    let cli = Cli::parse();

    let scope = match &cli.officer {
        Some(officer) => EntityScope::officer(cli.agency_id.clone(), officer.clone()),
        None => EntityScope::agency(cli.agency_id.clone()),
    };
    let dashboard = AgencyDashboard::connect(scope, cli.base_url.clone())?;

    let filter = FilterState {
        year: cli.year.map_or(YearFilter::All, YearFilter::Year),
        stop_purpose: match &cli.command {
            Commands::Stops { purpose, .. } => purpose.clone(),
            _ => None,
        },
        search_type: match &cli.command {
            Commands::Searches { search_type } => search_type.clone(),
            _ => None,
        },
        date_range: None,
    };

    match cli.command {
        Commands::Overview => cmd_overview(&dashboard, &filter).await,
        Commands::Stops { counts, ref purpose } => {
            cmd_stops(&dashboard, &filter, counts || purpose.is_some()).await
        }
        Commands::Searches { .. } => cmd_searches(&dashboard, &filter).await,
        Commands::SearchRate => cmd_search_rate(&dashboard, &filter).await,
        Commands::HitRate => cmd_hit_rate(&dashboard, &filter).await,
        Commands::Likelihood => cmd_likelihood(&dashboard, &filter).await,
    }
}

/// Loads the named datasets and fails fast on any fetch error among them.
async fn require(
    dashboard: &AgencyDashboard,
    keys: &[DatasetKey],
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    dashboard.load(keys, filter).await;
    let snapshot = dashboard.snapshot(keys);
    match snapshot.error {
        Some(message) => Err(message.into()),
        None => Ok(()),
    }
}

fn print_points(points: &[SeriesPoint], unit: &str) {
    for point in points {
        println!("  {:<16} {:>6.1}{unit}", point.x, point.y);
    }
}

fn print_series(series: &[GroupTimeSeries], unit: &str) {
    for line in series {
        println!("{}:", line.id);
        for point in &line.points {
            println!("  {:<6} {:>8.1}{unit}", point.x, point.y);
        }
    }
}

/// Prints overview breakdowns for the three headline datasets.
async fn cmd_overview(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    let keys = [
        DatasetKey::AgencyDetails,
        DatasetKey::Stops,
        DatasetKey::Searches,
        DatasetKey::UseOfForce,
    ];
    require(dashboard, &keys, filter).await?;

    println!("=== Overview ===");
    for (title, key) in [
        ("Stops", DatasetKey::Stops),
        ("Searches", DatasetKey::Searches),
        ("Use of force", DatasetKey::UseOfForce),
    ] {
        println!();
        println!("{title}:");
        if let Some(message) = dashboard.no_data_message(key) {
            println!("  {message}");
        } else if let Some(points) = dashboard.overview_breakdown(key, filter) {
            print_points(&points, "%");
        }
    }

    if let Some(points) = dashboard.census_breakdown() {
        println!();
        println!("Census population:");
        print_points(&points, "%");
    }
    Ok(())
}

async fn cmd_stops(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
    counts: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let keys = if filter.stop_purpose.is_some() {
        vec![DatasetKey::StopsByReason]
    } else {
        vec![DatasetKey::Stops]
    };
    require(dashboard, &keys, filter).await?;

    let selection = GroupSelection::all_selected();
    if counts {
        println!("=== Stops by count ===");
        if let Some(series) = dashboard.stops_by_count(filter, &selection) {
            print_series(&series, "");
        }
    } else {
        println!("=== Stops by percentage ===");
        if let Some(series) = dashboard.stops_by_percentage(&selection) {
            print_series(&series, "%");
        }
    }
    Ok(())
}

async fn cmd_searches(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    let keys = if filter.search_type.is_some() {
        vec![DatasetKey::SearchesByType]
    } else {
        vec![DatasetKey::Searches]
    };
    require(dashboard, &keys, filter).await?;

    println!("=== Searches by count ===");
    if let Some(series) = dashboard.searches_by_count(filter, &GroupSelection::all_selected()) {
        print_series(&series, "");
    }
    Ok(())
}

async fn cmd_search_rate(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    require(dashboard, &[DatasetKey::Stops, DatasetKey::Searches], filter).await?;

    println!("=== Departmental search rate ===");
    if let Some(series) = dashboard.search_rate(&GroupSelection::all_selected()) {
        print_series(&series, "%");
    }
    Ok(())
}

async fn cmd_hit_rate(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    require(dashboard, &[DatasetKey::ContrabandHitRate], filter).await?;

    println!("=== Contraband hit rate ===");
    if let Some(points) = dashboard.contraband_hit_rate(filter, &GroupSelection::all_selected()) {
        print_points(&points, "%");
    }
    Ok(())
}

async fn cmd_likelihood(
    dashboard: &AgencyDashboard,
    filter: &FilterState,
) -> Result<(), Box<dyn std::error::Error>> {
    require(dashboard, &[DatasetKey::Stops, DatasetKey::Searches], filter).await?;

    println!("=== Likelihood of search vs. baseline ===");
    let Some(comparisons) = dashboard.likelihood_of_search(filter) else {
        return Ok(());
    };
    let mut missing_baseline = false;
    for (group, comparison) in comparisons {
        println!("  {:<16} {}", group.label(), format_comparison(comparison));
        missing_baseline |= comparison == BaselineComparison::NoBaselineData;
    }
    if missing_baseline {
        println!();
        println!("{NO_BASELINE_EXPLANATION}");
    }
    Ok(())
}

/// Renders a baseline comparison for display. The difference is a ratio
/// relative to the baseline rate, shown as a percentage.
fn format_comparison(comparison: BaselineComparison) -> String {
    match comparison {
        BaselineComparison::Difference(diff) => format!("{:>+7.1}%", diff * 100.0),
        BaselineComparison::NoBaselineData => "    n/a".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_ratio_is_rendered_as_a_percentage() {
        // Four times the baseline rate reads as 400% more likely.
        let rendered = format_comparison(BaselineComparison::Difference(4.0));
        assert_eq!(rendered.trim(), "+400.0%");

        let rendered = format_comparison(BaselineComparison::Difference(-0.25));
        assert_eq!(rendered.trim(), "-25.0%");

        let rendered = format_comparison(BaselineComparison::NoBaselineData);
        assert_eq!(rendered.trim(), "n/a");
    }
}
