//! Variable resolution for snippet expansion.

use std::path::PathBuf;

use chrono::{DateTime, Datelike, Local, Timelike};
use rustc_hash::FxHashMap;

/// Resolves `$NAME` variables. `None` means the variable is undefined.
pub trait SnippetVarResolver {
	fn resolve_var(&self, name: &str) -> Option<String>;
}

impl<F> SnippetVarResolver for F
where
	F: Fn(&str) -> Option<String>,
{
	fn resolve_var(&self, name: &str) -> Option<String> {
		self(name)
	}
}

/// A resolver that knows no variables.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoVars;

impl SnippetVarResolver for NoVars {
	fn resolve_var(&self, _name: &str) -> Option<String> {
		None
	}
}

/// Pre-resolved values keyed by tabstop id or variable name.
///
/// Callers seed it before normalization; normalization caches evaluated
/// variables into it.
pub type Lookup = FxHashMap<String, String>;

/// Editor context the built-in variables are computed from.
#[derive(Debug, Clone, Default)]
pub struct VarContext {
	pub file_path: Option<PathBuf>,
	pub workspace: Option<PathBuf>,
	pub selection: Option<String>,
	pub current_line: Option<String>,
	pub current_word: Option<String>,
	/// Zero-based line of the cursor.
	pub line: Option<usize>,
	/// Zero-based index of the cursor among all cursors.
	pub cursor_index: Option<usize>,
	pub clipboard: Option<String>,
	pub line_comment: Option<String>,
	pub block_comment: Option<(String, String)>,
}

/// Built-in variables: paths, cursor context, time and random values.
///
/// The timestamp is taken once at construction so every time variable of one
/// expansion agrees.
#[derive(Debug, Clone)]
pub struct DefaultVarResolver {
	ctx: VarContext,
	now: DateTime<Local>,
}

impl DefaultVarResolver {
	pub fn new(ctx: VarContext) -> Self {
		Self::at(ctx, Local::now())
	}

	pub fn at(ctx: VarContext, now: DateTime<Local>) -> Self {
		Self { ctx, now }
	}

	fn path_var(&self, name: &str) -> Option<String> {
		let path = self.ctx.file_path.as_ref();
		match name {
			"TM_FILEPATH" => path.map(|path| path.to_string_lossy().to_string()),
			"TM_DIRECTORY" => path.and_then(|path| path.parent().map(|parent| parent.to_string_lossy().to_string())),
			"TM_FILENAME" => path.and_then(|path| path.file_name().map(|name| name.to_string_lossy().to_string())),
			"TM_FILENAME_BASE" => path.and_then(|path| path.file_stem().map(|stem| stem.to_string_lossy().to_string())),
			"RELATIVE_FILEPATH" => {
				let path = path?;
				let relative = self.ctx.workspace.as_ref().and_then(|root| path.strip_prefix(root).ok()).unwrap_or(path);
				Some(relative.to_string_lossy().to_string())
			}
			"WORKSPACE_FOLDER" => self.ctx.workspace.as_ref().map(|root| root.to_string_lossy().to_string()),
			"WORKSPACE_NAME" => self
				.ctx
				.workspace
				.as_ref()
				.and_then(|root| root.file_name().map(|name| name.to_string_lossy().to_string())),
			_ => None,
		}
	}

	fn time_var(&self, name: &str) -> Option<String> {
		let now = &self.now;
		let value = match name {
			"CURRENT_YEAR" => format!("{:04}", now.year()),
			"CURRENT_YEAR_SHORT" => format!("{:02}", now.year().rem_euclid(100)),
			"CURRENT_MONTH" => format!("{:02}", now.month()),
			"CURRENT_MONTH_NAME" => now.format("%B").to_string(),
			"CURRENT_MONTH_NAME_SHORT" => now.format("%b").to_string(),
			"CURRENT_DATE" => format!("{:02}", now.day()),
			"CURRENT_DAY_NAME" => now.format("%A").to_string(),
			"CURRENT_DAY_NAME_SHORT" => now.format("%a").to_string(),
			"CURRENT_HOUR" => format!("{:02}", now.hour()),
			"CURRENT_MINUTE" => format!("{:02}", now.minute()),
			"CURRENT_SECOND" => format!("{:02}", now.second()),
			"CURRENT_SECONDS_UNIX" => now.timestamp().to_string(),
			"CURRENT_TIMEZONE_OFFSET" => now.format("%:z").to_string(),
			_ => return None,
		};
		Some(value)
	}
}

impl SnippetVarResolver for DefaultVarResolver {
	fn resolve_var(&self, name: &str) -> Option<String> {
		let ctx = &self.ctx;
		match name {
			"TM_SELECTED_TEXT" | "SELECTION" => Some(ctx.selection.clone().unwrap_or_default()),
			"TM_CURRENT_LINE" => ctx.current_line.clone(),
			"TM_CURRENT_WORD" => ctx.current_word.clone(),
			"TM_LINE_INDEX" => ctx.line.map(|line| line.to_string()),
			"TM_LINE_NUMBER" => ctx.line.map(|line| (line + 1).to_string()),
			"CURSOR_INDEX" => Some(ctx.cursor_index.unwrap_or(0).to_string()),
			"CURSOR_NUMBER" => Some((ctx.cursor_index.unwrap_or(0) + 1).to_string()),
			"CLIPBOARD" => ctx.clipboard.clone(),
			"LINE_COMMENT" => ctx.line_comment.clone(),
			"BLOCK_COMMENT_START" => ctx.block_comment.as_ref().map(|(start, _)| start.clone()),
			"BLOCK_COMMENT_END" => ctx.block_comment.as_ref().map(|(_, end)| end.clone()),
			"RANDOM" => Some(format!("{:06}", random_u128() % 1_000_000)),
			"RANDOM_HEX" => Some(format!("{:06x}", random_u128() & 0xff_ffff)),
			"UUID" => Some(uuid::Uuid::new_v4().to_string()),
			_ => self.path_var(name).or_else(|| self.time_var(name)),
		}
	}
}

fn random_u128() -> u128 {
	uuid::Uuid::new_v4().as_u128()
}

/// Tries `first`, then `second`.
#[derive(Debug, Clone)]
pub struct ChainResolver<A, B> {
	pub first: A,
	pub second: B,
}

impl<A: SnippetVarResolver, B: SnippetVarResolver> SnippetVarResolver for ChainResolver<A, B> {
	fn resolve_var(&self, name: &str) -> Option<String> {
		self.first.resolve_var(name).or_else(|| self.second.resolve_var(name))
	}
}
