use super::*;

#[test]
fn parses_extract_command() {
    let cli = Cli::try_parse_from([
        "shelfscan",
        "extract",
        "--retailer",
        "coles",
        "--input",
        "search.html",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Extract {
            retailer,
            kind,
            input,
        } => {
            assert_eq!(retailer, "coles");
            assert_eq!(kind, None);
            assert_eq!(input, PathBuf::from("search.html"));
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn extract_defaults_to_stdin() {
    let cli = Cli::try_parse_from(["shelfscan", "extract", "--retailer", "aldi"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Extract { ref input, .. } if input == &PathBuf::from("-")
    ));
}

#[test]
fn extract_accepts_explicit_kind() {
    let cli = Cli::try_parse_from([
        "shelfscan",
        "extract",
        "--retailer",
        "woolworths",
        "--kind",
        "json",
    ])
    .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Commands::Extract {
            kind: Some(ContentKind::Json),
            ..
        }
    ));
}

#[test]
fn extract_rejects_unknown_kind() {
    let result = Cli::try_parse_from([
        "shelfscan",
        "extract",
        "--retailer",
        "aldi",
        "--kind",
        "xml",
    ]);
    assert!(result.is_err());
}

#[test]
fn extract_requires_retailer() {
    assert!(Cli::try_parse_from(["shelfscan", "extract"]).is_err());
}

#[test]
fn parses_fetch_with_repeated_urls() {
    let cli = Cli::try_parse_from([
        "shelfscan",
        "fetch",
        "--retailer",
        "aldi",
        "--url",
        "https://www.aldi.com.au/fruit-vegetables",
        "--url",
        "https://www.aldi.com.au/dairy-eggs-fridge",
    ])
    .expect("expected valid cli args");

    match cli.command {
        Commands::Fetch { retailer, urls } => {
            assert_eq!(retailer, "aldi");
            assert_eq!(urls.len(), 2);
        }
        other => panic!("unexpected command: {other:?}"),
    }
}

#[test]
fn fetch_requires_a_url() {
    assert!(Cli::try_parse_from(["shelfscan", "fetch", "--retailer", "aldi"]).is_err());
}

#[test]
fn parses_retailers_command() {
    let cli =
        Cli::try_parse_from(["shelfscan", "retailers"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Commands::Retailers));
}

#[test]
fn subcommand_is_required() {
    assert!(Cli::try_parse_from(["shelfscan"]).is_err());
}
