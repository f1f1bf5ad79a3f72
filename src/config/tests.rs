use super::*;

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = RawSettings::default();
    raw.server.port = Some(4000);
    raw.logging.level = Some("info".to_string());

    let overrides = ServeOverrides {
        server_port: Some(4321),
        log_level: Some("debug".to_string()),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.server.addr.port(), 4321);
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
}

#[test]
fn defaults_are_usable_without_any_file() {
    let settings = Settings::from_raw(RawSettings::default()).expect("valid settings");

    assert_eq!(settings.server.addr.port(), DEFAULT_PORT);
    assert!(settings.database.url.is_none());
    assert_eq!(settings.notion.api_version, "2022-06-28");
    assert_eq!(
        settings.notion.api_base_url.as_str(),
        "https://api.notion.com/v1/"
    );
    assert_eq!(settings.notion.body_format, BodyFormat::Markdown);
    assert_eq!(settings.retry.max_attempts.get(), 3);
    assert_eq!(settings.retry.base_delay, Duration::from_millis(250));
    assert_eq!(settings.retry.max_delay, Duration::from_secs(2));
    assert_eq!(settings.views.cookie_max_age, time::Duration::hours(24));
    assert!(!settings.views.secure_cookies);
}

#[test]
fn blank_database_url_selects_memory_store() {
    let mut raw = RawSettings::default();
    raw.database.url = Some("   ".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert!(settings.database.url.is_none());
}

#[test]
fn notion_overrides_apply() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        notion: NotionOverrides {
            token: Some("secret".to_string()),
            posts_database_id: Some("posts-db".to_string()),
            body_format: Some("blocks".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.notion.token.as_deref(), Some("secret"));
    assert_eq!(settings.notion.posts_database_id.as_deref(), Some("posts-db"));
    assert!(settings.notion.projects_database_id.is_none());
    assert_eq!(settings.notion.body_format, BodyFormat::Blocks);
}

#[test]
fn unknown_body_format_is_rejected() {
    let mut raw = RawSettings::default();
    raw.notion.body_format = Some("html".to_string());
    let err = Settings::from_raw(raw).expect_err("invalid format");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "notion.body_format",
            ..
        }
    ));
}

#[test]
fn retry_delays_must_be_ordered() {
    let mut raw = RawSettings::default();
    raw.retry.base_delay_ms = Some(500);
    raw.retry.max_delay_ms = Some(100);
    let err = Settings::from_raw(raw).expect_err("invalid retry");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "retry.max_delay_ms",
            ..
        }
    ));
}

#[test]
fn zero_cookie_window_is_rejected() {
    let mut raw = RawSettings::default();
    raw.views.cookie_max_age_seconds = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn base_urls_gain_trailing_slash() {
    let mut raw = RawSettings::default();
    raw.notion.api_base_url = Some("http://127.0.0.1:9000/v1".to_string());
    let settings = Settings::from_raw(raw).expect("valid settings");
    assert_eq!(
        settings.notion.api_base_url.join("pages/abc").expect("join").as_str(),
        "http://127.0.0.1:9000/v1/pages/abc"
    );
}

#[test]
fn cli_json_logging_enforces_format() {
    let mut raw = RawSettings::default();
    let overrides = ServeOverrides {
        log_json: Some(true),
        ..Default::default()
    };

    raw.apply_serve_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn default_to_serve_command() {
    let args = CliArgs::parse_from(["folio"]);
    let command = args
        .command
        .unwrap_or(Command::Serve(Box::<ServeArgs>::default()));
    assert!(matches!(command, Command::Serve(_)));
}

#[test]
fn parse_migrate_arguments() {
    let args = CliArgs::parse_from(["folio", "migrate", "--database-url", "postgres://example"]);

    match args.command.expect("migrate command") {
        Command::Migrate(migrate) => {
            assert_eq!(
                migrate.database.database_url.as_deref(),
                Some("postgres://example")
            );
        }
        _ => panic!("wrong command parsed"),
    }
}

#[test]
fn parse_serve_overrides() {
    let args = CliArgs::parse_from([
        "folio",
        "serve",
        "--server-host",
        "0.0.0.0",
        "--database-url",
        "postgres://override",
        "--views-secure-cookies",
        "true",
    ]);

    match args.command.expect("serve command") {
        Command::Serve(serve) => {
            assert_eq!(serve.overrides.server_host.as_deref(), Some("0.0.0.0"));
            assert_eq!(
                serve.overrides.database_url.as_deref(),
                Some("postgres://override")
            );
            assert_eq!(serve.overrides.views_secure_cookies, Some(true));
        }
        _ => panic!("wrong command parsed"),
    }
}
