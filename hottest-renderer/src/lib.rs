//! # hottest-renderer
//!
//! Turns hottest models into the CI server's configuration documents, and
//! pipeline models into the groovy script those documents embed.
//!
//! ```rust,no_run
//! use hottest_renderer::Renderer;
//! use hottest_core::FolderModel;
//!
//! if let Ok(renderer) = Renderer::new() {
//!     if let Ok(doc) = renderer.render_folder(&FolderModel) {
//!         println!("{doc}");
//!     }
//! }
//! ```

pub mod context;
pub mod engine;
pub mod error;
pub mod groovy;

pub use context::AGENT_COMMAND;
pub use engine::{ArtifactKind, Renderer};
pub use error::RenderError;
pub use groovy::pipeline_script;
