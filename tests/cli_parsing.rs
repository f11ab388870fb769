use clap::Parser;
use near_fees::cli::commands::report::ReportName;
use near_fees::cli::{Cli, Commands};
use near_fees::QuerySource;
use std::path::PathBuf;

#[test]
fn test_parse_check_offline() {
    let cli = Cli::try_parse_from(["near-fees", "check", "--offline"]).unwrap();

    match cli.command {
        Commands::Check(args) => assert!(args.offline),
        _ => panic!("Wrong top-level command"),
    }
    assert!(!cli.json);
    assert!(cli.config.is_none());
}

#[test]
fn test_parse_query_inline_sql() {
    let cli = Cli::try_parse_from(["near-fees", "query", "SELECT CURRENT_DATE()", "--json"]).unwrap();

    assert!(cli.json);
    match cli.command {
        Commands::Query(args) => {
            assert_eq!(
                args.source(),
                Some(QuerySource::Text("SELECT CURRENT_DATE()".to_string()))
            );
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_query_from_file() {
    let cli = Cli::try_parse_from(["near-fees", "query", "--file", "queries/top_assets.sql"]).unwrap();

    match cli.command {
        Commands::Query(args) => {
            assert_eq!(
                args.source(),
                Some(QuerySource::File(PathBuf::from("queries/top_assets.sql")))
            );
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_query_requires_sql_or_file() {
    assert!(Cli::try_parse_from(["near-fees", "query"]).is_err());
}

#[test]
fn test_query_rejects_sql_and_file_together() {
    let result = Cli::try_parse_from(["near-fees", "query", "SELECT 1", "--file", "fees.sql"]);
    assert!(result.is_err());
}

#[test]
fn test_parse_report_with_global_flags() {
    let cli = Cli::try_parse_from([
        "near-fees",
        "--config",
        "ci.yaml",
        "report",
        "daily-fees",
        "--show-sql",
        "-j",
    ])
    .unwrap();

    assert!(cli.json);
    assert_eq!(cli.config, Some(PathBuf::from("ci.yaml")));
    match cli.command {
        Commands::Report(args) => {
            assert_eq!(args.report, ReportName::DailyFees);
            assert!(args.show_sql);
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_unknown_report_is_rejected() {
    assert!(Cli::try_parse_from(["near-fees", "report", "weekly"]).is_err());
}
