//! Engine configuration, loadable from TOML.

use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
	#[error("TOML parse error: {0}")]
	Toml(#[from] toml::de::Error),

	/// Error reading a configuration file.
	#[error("I/O error reading {path}: {error}")]
	Io {
		/// Path to the file that failed to read.
		path: PathBuf,
		/// The underlying I/O error.
		error: std::io::Error,
	},
}

/// Snippet engine settings.
///
/// ```toml
/// uncached-vars = ["RANDOM", "UUID"]
/// comment-leaders = ["//", "#"]
/// autostop-on-final-edit = false
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case", deny_unknown_fields)]
pub struct SnippetConfig {
	/// Variables evaluated on every occurrence and never cached.
	pub uncached_vars: Vec<String>,
	/// Line comment prefixes treated as part of a line's indent.
	pub comment_leaders: Vec<String>,
	/// Stop the session once text is typed into the final tabstop.
	pub autostop_on_final_edit: bool,
	/// Stop the session when leaving insert mode at the final tabstop.
	pub autostop_on_normal_mode: bool,
}

impl Default for SnippetConfig {
	fn default() -> Self {
		Self {
			uncached_vars: ["RANDOM", "RANDOM_HEX", "UUID"].map(String::from).to_vec(),
			comment_leaders: ["///", "//!", "//", "#", "--", ";"].map(String::from).to_vec(),
			autostop_on_final_edit: true,
			autostop_on_normal_mode: true,
		}
	}
}

impl SnippetConfig {
	pub fn from_toml(src: &str) -> Result<Self, ConfigError> {
		Ok(toml::from_str(src)?)
	}

	pub fn load(path: &Path) -> Result<Self, ConfigError> {
		let src = std::fs::read_to_string(path).map_err(|error| ConfigError::Io {
			path: path.to_path_buf(),
			error,
		})?;
		let config = Self::from_toml(&src)?;
		tracing::debug!(path = %path.display(), "loaded snippet config");
		Ok(config)
	}
}

#[cfg(test)]
mod tests;
