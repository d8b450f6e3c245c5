use std::io::Write;

use tempfile::NamedTempFile;
use vitrine_api_types::AdLayout;

use super::*;

fn raw_with_base_url() -> RawSettings {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("https://shop.example.com/api".to_string());
    raw
}

#[test]
fn defaults_match_documented_values() {
    let settings = Settings::from_raw(raw_with_base_url()).expect("valid settings");

    assert_eq!(settings.api.request_timeout, Duration::from_millis(15_000));
    assert_eq!(settings.cache.default_ttl, Duration::from_secs(300));
    assert!(settings.cache.ttl_overrides.is_empty());
    assert_eq!(settings.carousel.autoplay_interval, Duration::from_millis(6_000));
    assert_eq!(settings.carousel.transition, Duration::from_millis(500));
    assert_eq!(settings.catalog.items_per_page, 50);
    assert_eq!(settings.catalog.rail_limit, 12);
    assert_eq!(settings.recent.limit, 10);
    assert_eq!(settings.recent.max_age, Duration::from_secs(7 * 24 * 60 * 60));
    assert_eq!(settings.logging.level, LevelFilter::INFO);
    assert!(matches!(settings.logging.format, LogFormat::Compact));
}

#[test]
fn base_url_is_required() {
    let err = Settings::from_raw(RawSettings::default()).expect_err("missing base url");
    assert!(matches!(err, LoadError::Invalid { key: "api.base_url", .. }));
}

#[test]
fn base_url_gains_trailing_slash() {
    let settings = Settings::from_raw(raw_with_base_url()).expect("valid settings");
    assert_eq!(
        settings.api.base_url.as_str(),
        "https://shop.example.com/api/"
    );
    assert_eq!(
        settings
            .api
            .base_url
            .join("products/sponsored")
            .expect("join")
            .as_str(),
        "https://shop.example.com/api/products/sponsored"
    );
}

#[test]
fn non_http_base_url_is_rejected() {
    let mut raw = RawSettings::default();
    raw.api.base_url = Some("ftp://shop.example.com".to_string());
    let err = Settings::from_raw(raw).expect_err("ftp scheme");
    assert!(matches!(err, LoadError::Invalid { key: "api.base_url", .. }));
}

#[test]
fn cli_overrides_take_highest_precedence() {
    let mut raw = raw_with_base_url();
    raw.logging.level = Some("info".to_string());

    let overrides = GlobalOverrides {
        api_base_url: Some("http://localhost:8080/".to_string()),
        log_level: Some("debug".to_string()),
        log_json: Some(true),
    };

    raw.apply_overrides(&overrides);
    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(settings.api.base_url.as_str(), "http://localhost:8080/");
    assert_eq!(settings.logging.level, LevelFilter::DEBUG);
    assert!(matches!(settings.logging.format, LogFormat::Json));
}

#[test]
fn ttl_overrides_accept_underscore_keys() {
    let mut raw = raw_with_base_url();
    raw.cache.ttl_overrides.insert("layout".to_string(), 30);
    raw.cache.ttl_overrides.insert("ads_triple".to_string(), 600);

    let settings = Settings::from_raw(raw).expect("valid settings");

    assert_eq!(
        settings.cache.ttl_overrides.get(&CollectionKey::Layout),
        Some(&Duration::from_secs(30))
    );
    assert_eq!(
        settings
            .cache
            .ttl_overrides
            .get(&CollectionKey::Ads(AdLayout::Triple)),
        Some(&Duration::from_secs(600))
    );
}

#[test]
fn unknown_ttl_override_key_is_rejected() {
    let mut raw = raw_with_base_url();
    raw.cache.ttl_overrides.insert("banners".to_string(), 30);

    let err = Settings::from_raw(raw).expect_err("unknown key");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "cache.ttl_overrides",
            ..
        }
    ));
}

#[test]
fn zero_values_are_rejected() {
    let mut raw = raw_with_base_url();
    raw.catalog.items_per_page = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_base_url();
    raw.cache.default_ttl_secs = Some(0);
    assert!(Settings::from_raw(raw).is_err());

    let mut raw = raw_with_base_url();
    raw.recent.max_age_days = Some(0);
    assert!(Settings::from_raw(raw).is_err());
}

#[test]
fn transition_must_fit_inside_interval() {
    let mut raw = raw_with_base_url();
    raw.carousel.autoplay_interval_ms = Some(400);
    raw.carousel.transition_ms = Some(500);

    let err = Settings::from_raw(raw).expect_err("transition too long");
    assert!(matches!(
        err,
        LoadError::Invalid {
            key: "carousel.transition_ms",
            ..
        }
    ));
}

#[test]
fn invalid_log_level_is_reported() {
    let mut raw = raw_with_base_url();
    raw.logging.level = Some("chatty".to_string());
    let err = Settings::from_raw(raw).expect_err("bad level");
    assert!(matches!(err, LoadError::Invalid { key: "logging.level", .. }));
}

#[test]
fn explicit_config_file_is_layered() {
    let mut file = tempfile::Builder::new()
        .suffix(".toml")
        .tempfile()
        .expect("tmp file");
    write!(
        file,
        "[api]\nbase_url = \"https://file.example.com\"\nrequest_timeout_ms = 2500\n\n[catalog]\nitems_per_page = 24\n"
    )
    .expect("write config");

    let args = CliArgs::parse_from([
        "vitrine",
        "--config-file",
        file.path().to_str().expect("utf-8 path"),
    ]);
    let settings = load(&args).expect("settings load");

    assert_eq!(settings.api.base_url.as_str(), "https://file.example.com/");
    assert_eq!(settings.api.request_timeout, Duration::from_millis(2_500));
    assert_eq!(settings.catalog.items_per_page, 24);
}

#[test]
fn missing_explicit_config_file_fails() {
    let missing = NamedTempFile::new().expect("tmp file").path().with_extension("toml");
    let args = CliArgs::parse_from([
        "vitrine",
        "--config-file",
        missing.to_str().expect("utf-8 path"),
    ]);
    assert!(matches!(load(&args), Err(LoadError::Build(_))));
}

#[test]
fn default_to_plan_command() {
    let args = CliArgs::parse_from(["vitrine"]);
    let command = args.command.unwrap_or_default();
    assert!(matches!(command, Command::Plan(_)));
}

#[test]
fn parse_plan_arguments() {
    let args = CliArgs::parse_from([
        "vitrine",
        "plan",
        "--page",
        "3",
        "--pretty",
        "--api-base-url",
        "http://localhost:9000",
    ]);

    assert_eq!(
        args.overrides.api_base_url.as_deref(),
        Some("http://localhost:9000")
    );
    match args.command.expect("plan command") {
        Command::Plan(plan) => {
            assert_eq!(plan.page, Some(3));
            assert!(plan.pretty);
        }
        other => panic!("unexpected command {other:?}"),
    }
}

#[test]
fn parse_act_arguments() {
    let args = CliArgs::parse_from([
        "vitrine",
        "act",
        "--token",
        "abc",
        "add-to-cart",
        "p42",
        "--quantity",
        "3",
    ]);

    let Some(Command::Act(act)) = args.command else {
        panic!("expected act command");
    };
    assert_eq!(act.token.as_deref(), Some("abc"));
    assert!(matches!(
        act.action,
        ActAction::AddToCart { ref product_id, quantity: 3 } if product_id == "p42"
    ));
}

#[test]
fn parse_recent_record() {
    let args = CliArgs::parse_from(["vitrine", "recent", "record", "p7"]);
    let Some(Command::Recent(recent)) = args.command else {
        panic!("expected recent command");
    };
    assert!(matches!(recent.action, RecentAction::Record { ref product_id } if product_id == "p7"));
}
