//! Environment overrides live in their own test binary: they mutate process state.

use tempfile::TempDir;

use ngtrie::Settings;

#[test]
fn given_env_vars_when_loading_then_override_config_file() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ngtrie.toml");
    std::fs::write(&path, "min_score = 5\ntop_k = 3\n").unwrap();
    std::env::set_var("NGTRIE_MIN_SCORE", "50");
    std::env::set_var("NGTRIE_PROBE_WORDS", "你好,天氣");

    let settings = Settings::load(Some(&path)).unwrap();

    std::env::remove_var("NGTRIE_MIN_SCORE");
    std::env::remove_var("NGTRIE_PROBE_WORDS");
    assert_eq!(settings.min_score, 50);
    assert_eq!(settings.top_k, 3);
    assert_eq!(settings.probe_words, vec!["你好".to_string(), "天氣".to_string()]);
}
