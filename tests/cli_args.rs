//! CLI argument parsing tests.
//!
//! These tests pin down the command-line interface of the exporter.

use std::path::PathBuf;

use clap::Parser;
use favro_export::cli::Cli;

#[test]
fn test_cli_parses_destination() {
    let cli = Cli::parse_from(["favro-export", "-d", "backup"]);

    assert_eq!(cli.destination, PathBuf::from("backup"));
    assert!(!cli.json);
    assert!(!cli.no_clean);
    assert_eq!(cli.verbose, 0);
}

#[test]
fn test_cli_requires_destination() {
    let result = Cli::try_parse_from(["favro-export", "--user", "me@example.com"]);
    assert!(result.is_err());
}

#[test]
fn test_credentials_and_base_url_flags() {
    let cli = Cli::parse_from([
        "favro-export",
        "--destination",
        "out",
        "--user",
        "me@example.com",
        "--token",
        "secret",
        "--base-url",
        "http://localhost:8080/api/v1",
    ]);

    assert_eq!(cli.user.as_deref(), Some("me@example.com"));
    assert_eq!(cli.token.as_deref(), Some("secret"));
    assert_eq!(cli.base_url, "http://localhost:8080/api/v1");
}

#[test]
fn test_organization_and_switches() {
    let cli = Cli::parse_from([
        "favro-export",
        "-d",
        "out",
        "--organization",
        "org-1",
        "--no-clean",
        "--json",
    ]);

    assert_eq!(cli.organization.as_deref(), Some("org-1"));
    assert!(cli.no_clean);
    assert!(cli.json);
}

#[test]
fn test_verbosity_levels() {
    let cli = Cli::parse_from(["favro-export", "-d", "out"]);
    assert_eq!(cli.log_level(), tracing::Level::INFO);

    let cli = Cli::parse_from(["favro-export", "-d", "out", "-v"]);
    assert_eq!(cli.log_level(), tracing::Level::DEBUG);

    let cli = Cli::parse_from(["favro-export", "-d", "out", "-vvv"]);
    assert_eq!(cli.log_level(), tracing::Level::TRACE);
}
