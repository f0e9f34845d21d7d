//! # ccviz
//!
//! Compiler pipeline visualizer: takes C source text, runs it through an
//! external LLVM toolchain and shows what each stage produced.
//!
//! ## Modules
//!
//! - [`pipeline`] - runs clang, opt and llvm-dis in a throwaway workspace
//! - [`collector`] - reads stage output files back into text
//! - [`presentation`] - maps a run to labelled panels and compiler messages
//! - [`session`] - current source plus the last run
//! - [`toolchain`] - which programs to run and at what optimization level
//! - `gui` - egui front-end (requires feature `gui`)
//!
//! No compilation happens in this crate. Every artifact comes from an
//! external process.
//!
//! ## Example
//!
//! ```rust,no_run
//! use ccviz::{Session, Toolchain};
//!
//! let mut session = Session::new(Toolchain::default());
//! let run = session.trigger();
//! for diag in &run.diagnostics {
//!     eprintln!("{}", diag);
//! }
//! println!("{}", run.assembly.as_deref().unwrap_or_default());
//! ```

pub mod collector;
pub mod error;
pub mod pipeline;
pub mod presentation;
pub mod session;
pub mod toolchain;

// === GUI (requires feature 'gui') ===
#[cfg(feature = "gui")]
pub mod gui;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{VizError, VizResult};
pub use pipeline::{run_pipeline, Artifact, Diagnostic, PipelineRun, Stage, StageResult};
pub use presentation::{Panel, PanelBody, PanelKind, Presentation};
pub use session::{Session, DEFAULT_SOURCE};
pub use toolchain::{OptLevel, ToolCommand, Toolchain};
