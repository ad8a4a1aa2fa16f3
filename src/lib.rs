//! Colloquy: chat-completion orchestration for Rust.
//!
//! A conversation lives in a [`ChatSession`](session::ChatSession): a
//! transcript of turns, a set of declared tools, and a backend that
//! answers requests. One `chat_completion` call resolves parameters
//! across configuration scopes, runs the request hooks, and drives the
//! tool continuation loop until the model produces a final reply.
//!
//! # Quick Start
//!
//! ```no_run
//! use colloquy::prelude::*;
//!
//! # async fn example() -> colloquy::error::Result<()> {
//! let backend = OpenAiChatBackend::from_env()?;
//! let mut session = ChatSession::new(backend)
//!     .with_system("You are a terse assistant.");
//! session.push_user("Name one ocean.");
//!
//! let outcome = session.complete().await?;
//! println!("{}", outcome.text().unwrap_or_default());
//! # Ok(())
//! # }
//! ```

pub mod backend;
pub mod error;
pub mod hooks;
pub mod prelude;
pub mod session;
pub mod settings;
pub mod tools;
pub mod transcript;
pub mod util;
pub mod wire;

pub use error::{ColloquyError, Result};
pub use session::{ChatOutcome, ChatSession, CompletionCall, Reply};
