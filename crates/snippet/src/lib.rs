#![cfg_attr(test, allow(unused_crate_dependencies))]
//! Snippet templating engine.
//!
//! Snippet bodies such as `for ${1:i} in ${2:iter} {\n\t$0\n}` are parsed into
//! a node tree ([`parse_snippet`]), normalized against variable values
//! ([`normalize`]) and inserted into a host buffer as a live [`Session`]. The
//! [`SnippetEngine`] keeps a stack of sessions, moves focus between tabstops
//! and keeps linked tabstops in sync while the user types.
//!
//! The host is abstracted by [`stencil_buffer::Host`]; the engine only keeps
//! tracked range handles into host buffers.

/// Engine settings and their TOML form.
pub mod config;
/// Session stack and host notifications.
pub mod engine;
pub mod error;
/// Observer notifications.
pub mod events;
/// Tabstop traversal order.
pub mod graph;
/// Node tree.
pub mod node;
/// Variable/tabstop resolution, linking and final tabstop insertion.
pub mod normalize;
/// Live sessions and text synchronization.
pub mod session;
/// Snippet grammar parser.
pub mod syntax;
/// Variable resolvers.
pub mod vars;

pub use config::{ConfigError, SnippetConfig};
pub use engine::SnippetEngine;
pub use error::SnippetError;
pub use events::{Observer, SessionEvent};
pub use graph::{Direction, InvalidDirection, TabstopGraph, TabstopLink};
pub use node::{InvalidTabstopId, Node, Tabstop, TabstopId, Transform, Var, escape_text, render_default, walk};
pub use normalize::{NormalizeError, normalize};
pub use session::{Decoration, DecorationKind, Session, SessionError, SessionSnapshot, dedent, line_indent, reindent};
pub use syntax::{ParseError, parse_snippet};
pub use vars::{ChainResolver, DefaultVarResolver, Lookup, NoVars, SnippetVarResolver, VarContext};
