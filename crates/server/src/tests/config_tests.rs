use super::*;

use std::collections::HashMap;

use shared::error::ErrorCode;

fn env_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| vars.get(key).cloned()
}

fn with_token() -> Settings {
    Settings {
        telegram_token: Some("123:abc".into()),
        ..Settings::default()
    }
}

#[test]
fn defaults_match_reference_deployment() {
    let settings = Settings::default();
    assert_eq!(settings.port, 5000);
    assert_eq!(settings.fonts_dir, PathBuf::from("fonts"));
    assert_eq!(settings.font_extension, "ttf");
    assert_eq!(settings.render_settings(), RenderSettings::default());
    assert_eq!(settings.session_idle_ttl(), None);
}

#[test]
fn file_values_override_defaults() {
    let file_cfg: FileSettings = toml::from_str(
        r#"
        telegram_token = "from-file"
        port = 8080
        fonts_dir = "/srv/fonts"
        canvas_width = 640
        session_idle_ttl_seconds = 3600
        "#,
    )
    .expect("toml");
    let mut settings = Settings::default();
    apply_file(&mut settings, file_cfg);

    assert_eq!(settings.telegram_token.as_deref(), Some("from-file"));
    assert_eq!(settings.port, 8080);
    assert_eq!(settings.fonts_dir, PathBuf::from("/srv/fonts"));
    assert_eq!(settings.canvas_width, 640);
    assert_eq!(settings.canvas_height, 200);
    assert_eq!(settings.session_idle_ttl(), Some(Duration::from_secs(3600)));
}

#[test]
fn env_overrides_and_app_alias_wins() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[
            ("TELEGRAM_TOKEN", "plain-token"),
            ("APP__TELEGRAM_TOKEN", "alias-token"),
            ("PORT", "7000"),
            ("WEBHOOK_URL", "https://bot.example.com/webhook"),
            ("FONTS_DIR", "./my-fonts"),
        ]),
    );
    assert_eq!(settings.telegram_token.as_deref(), Some("alias-token"));
    assert_eq!(settings.port, 7000);
    assert_eq!(
        settings.webhook_url.as_deref(),
        Some("https://bot.example.com/webhook")
    );
    assert_eq!(settings.fonts_dir, PathBuf::from("./my-fonts"));
}

#[test]
fn invalid_or_blank_env_values_are_ignored() {
    let mut settings = Settings::default();
    apply_env(
        &mut settings,
        env_from(&[("PORT", "not-a-port"), ("WEBHOOK_URL", "   ")]),
    );
    assert_eq!(settings.port, 5000);
    assert_eq!(settings.webhook_url, None);
}

#[test]
fn missing_token_is_fatal_configuration_error() {
    let err = Settings::default().validate().expect_err("no token");
    assert_eq!(err.code, ErrorCode::Configuration);

    let blank = Settings {
        telegram_token: Some("  ".into()),
        ..Settings::default()
    };
    assert_eq!(blank.validate().expect_err("blank").code, ErrorCode::Configuration);
}

#[test]
fn webhook_url_selects_push_delivery() {
    assert_eq!(with_token().validate().expect("polling"), DeliveryMode::Polling);

    let push = Settings {
        webhook_url: Some("https://bot.example.com/webhook".into()),
        ..with_token()
    };
    let DeliveryMode::Webhook(url) = push.validate().expect("webhook") else {
        panic!("expected webhook mode");
    };
    assert_eq!(url.host_str(), Some("bot.example.com"));
}

#[test]
fn malformed_webhook_url_is_rejected() {
    for raw in ["not a url", "ftp://bot.example.com/webhook"] {
        let settings = Settings {
            webhook_url: Some(raw.into()),
            ..with_token()
        };
        let err = settings.validate().expect_err(raw);
        assert_eq!(err.code, ErrorCode::Configuration);
    }
}

#[test]
fn zero_canvas_is_rejected() {
    let settings = Settings {
        canvas_height: 0,
        ..with_token()
    };
    assert_eq!(
        settings.validate().expect_err("zero canvas").code,
        ErrorCode::Configuration
    );
}

#[test]
fn load_settings_reads_toml_file() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bot.toml");
    fs::write(&path, "canvas_width = 1024\nfont_extension = \"otf\"\n").expect("write");

    let settings = load_settings(&path);
    assert_eq!(settings.canvas_width, 1024);
    assert_eq!(settings.font_extension, "otf");
}

#[test]
fn unparsable_file_keeps_defaults() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("bot.toml");
    fs::write(&path, "canvas_width = \"wide\"").expect("write");

    let settings = load_settings(&path);
    assert_eq!(settings.canvas_width, Settings::default().canvas_width);
}
