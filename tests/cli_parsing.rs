use clap::Parser;
use dataapi::cli::{Cli, Commands};

#[test]
fn test_parse_serve_defaults() {
    let cli = Cli::try_parse_from(["dataapi", "serve"]).unwrap();

    match cli.command {
        Commands::Serve(args) => {
            assert!(args.host.is_none());
            assert!(args.port.is_none());
        }
        _ => panic!("Wrong top-level command"),
    }
    assert!(cli.env.is_none());
    assert!(!cli.json);
}

#[test]
fn test_parse_serve_bind_overrides() {
    let cli = Cli::try_parse_from(["dataapi", "serve", "--host", "0.0.0.0", "--port", "9000"]).unwrap();

    match cli.command {
        Commands::Serve(args) => {
            assert_eq!(args.host.as_deref(), Some("0.0.0.0"));
            assert_eq!(args.port, Some(9000));
        }
        _ => panic!("Wrong top-level command"),
    }
}

#[test]
fn test_parse_migrate_with_env_and_config_file() {
    let cli = Cli::try_parse_from([
        "dataapi",
        "--env",
        "prod",
        "--config-file",
        "/etc/dataapi.yaml",
        "migrate",
    ])
    .unwrap();

    assert!(matches!(cli.command, Commands::Migrate));
    assert_eq!(cli.env.as_deref(), Some("prod"));
    assert_eq!(
        cli.config_file.as_deref(),
        Some(std::path::Path::new("/etc/dataapi.yaml"))
    );
}

#[test]
fn test_invalid_port_rejected() {
    assert!(Cli::try_parse_from(["dataapi", "serve", "--port", "99999"]).is_err());
}

#[test]
fn test_missing_subcommand_rejected() {
    assert!(Cli::try_parse_from(["dataapi"]).is_err());
}
