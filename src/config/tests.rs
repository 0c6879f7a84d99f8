use super::*;

#[test]
fn parses_flat_toml_config() {
    let raw = parse_config_str(
        r#"
            # a comment
            default_provider = "anthropic"
            default_model = "claude-sonnet"
            fallback_providers = "openai, echo"
            api_key = "sk-test"
        "#,
    )
    .unwrap();
    assert_eq!(raw.default_provider.as_deref(), Some("anthropic"));
    assert_eq!(raw.default_model.as_deref(), Some("claude-sonnet"));
    assert_eq!(raw.fallback_providers.as_deref(), Some("openai, echo"));
    assert_eq!(raw.api_key.as_deref(), Some("sk-test"));
}

#[test]
fn missing_file_yields_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let config = load_config(&path).unwrap();
    assert_eq!(config.default_provider, "echo");
    assert_eq!(config.memory_backend, "markdown");
    assert!(config.mcp_servers.is_empty());
}

#[test]
fn parses_mcp_servers_pipe_separated() {
    let servers = parse_mcp_servers("fs=node server.js --root /tmp|git=git-mcp serve");
    assert_eq!(servers.len(), 2);
    assert_eq!(servers[0].name, "fs");
    assert_eq!(servers[0].argv, vec!["node", "server.js", "--root", "/tmp"]);
    assert_eq!(servers[1].name, "git");
    assert_eq!(servers[1].argv, vec!["git-mcp", "serve"]);
}

#[test]
fn split_csv_trims_and_drops_empties() {
    assert_eq!(split_csv("openai, , echo"), vec!["openai", "echo"]);
}

#[test]
fn resolve_api_key_prefers_backend_specific_env_over_config() {
    let config = Config {
        api_key: Some("from-config".to_string()),
        ..Config::default()
    };
    // SAFETY: test runs single-threaded within this process's test harness
    // for this guarded variable; no other test reads ANTHROPIC_API_KEY.
    std::env::set_var("ANTHROPIC_API_KEY", "from-env");
    let resolved = resolve_api_key("anthropic", &config);
    std::env::remove_var("ANTHROPIC_API_KEY");
    assert_eq!(resolved.as_deref(), Some("from-env"));
}

#[test]
fn resolve_api_key_falls_back_to_config_value() {
    std::env::remove_var("ANTHROPIC_API_KEY");
    std::env::remove_var("BARECLAW_API_KEY");
    let config = Config {
        api_key: Some("from-config".to_string()),
        ..Config::default()
    };
    assert_eq!(resolve_api_key("anthropic", &config).as_deref(), Some("from-config"));
}
