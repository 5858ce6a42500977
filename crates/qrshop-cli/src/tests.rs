use super::*;

#[test]
fn parses_migrate_command() {
    let cli = Cli::try_parse_from(["qrshop-cli", "migrate"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Migrate)));
}

#[test]
fn parses_list_with_shop() {
    let cli = Cli::try_parse_from(["qrshop-cli", "list", "--shop", "a.myshopify.com"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::List { ref shop }) if shop == "a.myshopify.com"
    ));
}

#[test]
fn list_requires_shop() {
    assert!(Cli::try_parse_from(["qrshop-cli", "list"]).is_err());
}

#[test]
fn parses_image_with_output() {
    let cli = Cli::try_parse_from(["qrshop-cli", "image", "42", "-o", "code.svg"])
        .expect("expected valid cli args");
    match cli.command {
        Some(Commands::Image { id, output }) => {
            assert_eq!(id, 42);
            assert_eq!(output, Some(PathBuf::from("code.svg")));
        }
        other => panic!("expected image command, got {other:?}"),
    }
}

#[test]
fn image_rejects_non_numeric_id() {
    assert!(Cli::try_parse_from(["qrshop-cli", "image", "abc"]).is_err());
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["qrshop-cli"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}
