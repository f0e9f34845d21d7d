//! The compiler pipeline.
//!
//! One trigger runs five external invocations in a fixed order inside a
//! throwaway workspace:
//!
//! 1. AST dump (`clang -Xclang -ast-dump -fsyntax-only`), tree on stdout
//! 2. IR emission (`clang -S -emit-llvm`) to `source.ll`
//! 3. optimization (`opt -O3`) of `source.ll` to `opt.bc`
//! 4. disassembly (`llvm-dis`) of `opt.bc` to `opt.ll`
//! 5. assembly (`clang -S`) of the original source to `source.s`
//!
//! Every stage runs even if an earlier one failed. Steps 3 and 4 consume the
//! previous step's file; if it is missing the tool says so on stderr and
//! that becomes the stage's diagnostic.
//!
//! The result is an immutable [`PipelineRun`]. Nothing in here returns an
//! error: failures end up in [`PipelineRun::diagnostics`].

pub mod runner;
pub mod workspace;

use std::ffi::OsString;
use std::fmt;
use std::path::PathBuf;
use std::time::Instant;

use log::{info, warn};
use serde::Serialize;

use crate::collector::read_artifact;
use crate::toolchain::{OptLevel, ToolCommand, Toolchain};

pub use runner::{run_tool, StageResult};
pub use workspace::Workspace;

/// Label used for failures that happen before any stage runs.
pub const WORKSPACE_LABEL: &str = "Workspace";

/// One external invocation of the pipeline, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Syntax,
    Ir,
    Optimize,
    Disassemble,
    Assembly,
}

impl Stage {
    pub const ALL: [Stage; 5] = [
        Stage::Syntax,
        Stage::Ir,
        Stage::Optimize,
        Stage::Disassemble,
        Stage::Assembly,
    ];

    /// Name shown on the diagnostics panel.
    pub fn label(self, level: OptLevel) -> String {
        match self {
            Self::Syntax => "AST / Syntax".to_string(),
            Self::Ir => "IR generation".to_string(),
            Self::Optimize => format!("Optimization (opt {})", level.flag()),
            Self::Disassemble => "llvm-dis".to_string(),
            Self::Assembly => "Assembly generation".to_string(),
        }
    }

    /// The artifact this stage fills in, if any.
    pub fn artifact(self) -> Option<Artifact> {
        match self {
            Self::Syntax => Some(Artifact::SyntaxTree),
            Self::Ir => Some(Artifact::Ir),
            Self::Optimize => None,
            Self::Disassemble => Some(Artifact::OptimizedIr),
            Self::Assembly => Some(Artifact::Assembly),
        }
    }

    fn tool(self, toolchain: &Toolchain) -> &ToolCommand {
        match self {
            Self::Syntax | Self::Ir | Self::Assembly => &toolchain.clang,
            Self::Optimize => &toolchain.opt,
            Self::Disassemble => &toolchain.llvm_dis,
        }
    }

    fn args(self, ws: &Workspace, level: OptLevel) -> Vec<OsString> {
        let src = ws.source_path().into_os_string();
        match self {
            Self::Syntax => vec![
                "-Xclang".into(),
                "-ast-dump".into(),
                "-fsyntax-only".into(),
                src,
            ],
            Self::Ir => vec![
                "-S".into(),
                "-emit-llvm".into(),
                src,
                "-o".into(),
                ws.ir_path().into_os_string(),
            ],
            Self::Optimize => vec![
                level.flag().into(),
                ws.ir_path().into_os_string(),
                "-o".into(),
                ws.opt_bitcode_path().into_os_string(),
            ],
            Self::Disassemble => vec![
                ws.opt_bitcode_path().into_os_string(),
                "-o".into(),
                ws.opt_ir_path().into_os_string(),
            ],
            Self::Assembly => vec![
                "-S".into(),
                src,
                "-o".into(),
                ws.asm_path().into_os_string(),
            ],
        }
    }

    /// File the artifact is read from. The syntax stage has none, its
    /// artifact is stdout.
    fn output_path(self, ws: &Workspace) -> Option<PathBuf> {
        match self {
            Self::Ir => Some(ws.ir_path()),
            Self::Disassemble => Some(ws.opt_ir_path()),
            Self::Assembly => Some(ws.asm_path()),
            Self::Syntax | Self::Optimize => None,
        }
    }
}

/// The four things the pipeline can show besides the source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Artifact {
    SyntaxTree,
    Ir,
    OptimizedIr,
    Assembly,
}

impl Artifact {
    pub const ALL: [Artifact; 4] = [
        Artifact::SyntaxTree,
        Artifact::Ir,
        Artifact::OptimizedIr,
        Artifact::Assembly,
    ];
}

/// Diagnostic text reported while running the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    /// `None` for workspace failures.
    pub stage: Option<Stage>,
    pub label: String,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.label, self.message)
    }
}

/// Exit status of one stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StageOutcome {
    pub stage: Stage,
    /// `None` if the tool never started or was killed by a signal.
    pub exit_code: Option<i32>,
}

/// Everything one trigger produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PipelineRun {
    pub source: String,
    pub opt_level: OptLevel,
    pub syntax_tree: Option<String>,
    pub ir: Option<String>,
    pub optimized_ir: Option<String>,
    pub assembly: Option<String>,
    /// In stage order, at most one per stage.
    pub diagnostics: Vec<Diagnostic>,
    pub outcomes: Vec<StageOutcome>,
    pub elapsed_ms: u64,
}

impl PipelineRun {
    fn new(source: &str, opt_level: OptLevel) -> Self {
        Self {
            source: source.to_string(),
            opt_level,
            syntax_tree: None,
            ir: None,
            optimized_ir: None,
            assembly: None,
            diagnostics: Vec::new(),
            outcomes: Vec::new(),
            elapsed_ms: 0,
        }
    }

    pub fn artifact(&self, artifact: Artifact) -> Option<&str> {
        match artifact {
            Artifact::SyntaxTree => self.syntax_tree.as_deref(),
            Artifact::Ir => self.ir.as_deref(),
            Artifact::OptimizedIr => self.optimized_ir.as_deref(),
            Artifact::Assembly => self.assembly.as_deref(),
        }
    }

    fn artifact_mut(&mut self, artifact: Artifact) -> &mut Option<String> {
        match artifact {
            Artifact::SyntaxTree => &mut self.syntax_tree,
            Artifact::Ir => &mut self.ir,
            Artifact::OptimizedIr => &mut self.optimized_ir,
            Artifact::Assembly => &mut self.assembly,
        }
    }

    /// Artifacts with something to show.
    pub fn non_empty_artifacts(&self) -> usize {
        Artifact::ALL
            .iter()
            .filter(|a| self.artifact(**a).is_some_and(|text| !text.is_empty()))
            .count()
    }

    pub fn diagnostic(&self, stage: Stage) -> Option<&Diagnostic> {
        self.diagnostics.iter().find(|d| d.stage == Some(stage))
    }

    pub fn has_diagnostics(&self) -> bool {
        !self.diagnostics.is_empty()
    }

    /// Record diagnostic text, merging with an existing entry for the
    /// same stage.
    fn report(&mut self, stage: Stage, message: &str) {
        if message.is_empty() {
            return;
        }
        if let Some(existing) = self
            .diagnostics
            .iter_mut()
            .find(|d| d.stage == Some(stage))
        {
            if !existing.message.ends_with('\n') {
                existing.message.push('\n');
            }
            existing.message.push_str(message);
            return;
        }
        self.diagnostics.push(Diagnostic {
            stage: Some(stage),
            label: stage.label(self.opt_level),
            message: message.to_string(),
        });
    }
}

/// Run the whole pipeline on `source`.
///
/// Blocks until every tool has exited. There is no timeout.
pub fn run_pipeline(source: &str, toolchain: &Toolchain) -> PipelineRun {
    let started = Instant::now();
    let mut run = PipelineRun::new(source, toolchain.opt_level);

    let workspace = match Workspace::create(toolchain.workspace_root.as_deref())
        .and_then(|ws| ws.write_source(source).map(|_| ws))
    {
        Ok(ws) => ws,
        Err(err) => {
            warn!("{}", err);
            run.diagnostics.push(Diagnostic {
                stage: None,
                label: WORKSPACE_LABEL.to_string(),
                message: err.to_string(),
            });
            return run;
        }
    };

    for stage in Stage::ALL {
        run_stage(stage, &workspace, toolchain, &mut run);
    }

    if let Err(err) = workspace.close() {
        warn!("failed to remove workspace: {}", err);
    }

    run.elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    info!(
        "pipeline finished in {} ms: {} artifacts, {} diagnostics",
        run.elapsed_ms,
        run.non_empty_artifacts(),
        run.diagnostics.len()
    );
    run
}

fn run_stage(stage: Stage, ws: &Workspace, toolchain: &Toolchain, run: &mut PipelineRun) {
    let result = run_tool(stage.tool(toolchain), &stage.args(ws, run.opt_level));

    run.outcomes.push(StageOutcome {
        stage,
        exit_code: result.exit_code,
    });
    run.report(stage, &result.diagnostics);

    let Some(artifact) = stage.artifact() else {
        return;
    };

    let text = match stage.output_path(ws) {
        Some(path) => match read_artifact(&path) {
            Ok(text) => text,
            Err(err) => {
                warn!("{}", err);
                run.report(stage, &err.to_string());
                None
            }
        },
        None => Some(result.stdout).filter(|out| !out.is_empty()),
    };
    *run.artifact_mut(artifact) = text;
}
