use pretty_assertions::assert_eq;

use super::*;

#[test]
fn empty_document_uses_defaults() {
	assert_eq!(SnippetConfig::from_toml("").unwrap(), SnippetConfig::default());
}

#[test]
fn partial_document_overrides_fields() {
	let config = SnippetConfig::from_toml(
		r#"
uncached-vars = ["UUID"]
autostop-on-normal-mode = false
"#,
	)
	.unwrap();
	assert_eq!(config.uncached_vars, vec!["UUID".to_string()]);
	assert!(!config.autostop_on_normal_mode);
	assert!(config.autostop_on_final_edit);
	assert_eq!(config.comment_leaders, SnippetConfig::default().comment_leaders);
}

#[test]
fn unknown_keys_are_rejected() {
	let err = SnippetConfig::from_toml("autostop = true").unwrap_err();
	assert!(matches!(err, ConfigError::Toml(_)));
}

#[test]
fn wrong_type_is_rejected() {
	assert!(SnippetConfig::from_toml("comment-leaders = \"#\"").is_err());
}

#[test]
fn missing_file_reports_path() {
	let err = SnippetConfig::load(Path::new("/nonexistent/stencil.toml")).unwrap_err();
	assert!(err.to_string().contains("/nonexistent/stencil.toml"));
}
