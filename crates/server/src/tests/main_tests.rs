use super::*;

#[test]
fn config_path_defaults_to_bot_toml() {
    let args = Args::try_parse_from(["font-bot"]).expect("args");
    assert_eq!(args.config, PathBuf::from("bot.toml"));
}

#[test]
fn config_path_can_be_overridden() {
    let args = Args::try_parse_from(["font-bot", "--config", "/etc/font-bot.toml"]).expect("args");
    assert_eq!(args.config, PathBuf::from("/etc/font-bot.toml"));
}

#[tokio::test(start_paused = true)]
async fn session_sweeper_evicts_idle_sessions() {
    let fonts = FontRegistry::initialize(
        &std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../fonts"),
        "ttf",
    )
    .expect("registry");
    let bot = BotContext::new(
        fonts,
        ColorPalette::default(),
        render::RenderSettings::default(),
    );
    bot.sessions.get_or_create(shared::domain::UserId(1)).await;
    assert_eq!(bot.sessions.len().await, 1);

    spawn_session_sweeper(bot.sessions.clone(), Duration::ZERO);
    tokio::time::sleep(Duration::from_secs(31)).await;
    assert!(bot.sessions.is_empty().await);
}
