//! Presentation model.
//!
//! Maps the current source and the last [`PipelineRun`] to five labelled
//! panels plus the compiler messages. The mapping is pure; the terminal
//! renderer below and the egui front-end in `gui` both draw from it.

use std::collections::BTreeSet;
use std::fmt::Write as _;
use std::str::FromStr;

use colored::Colorize;
use serde::Serialize;

use crate::pipeline::{Artifact, PipelineRun};
use crate::toolchain::OptLevel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelKind {
    Source,
    SyntaxTree,
    Ir,
    OptimizedIr,
    Assembly,
}

impl PanelKind {
    pub const ALL: [PanelKind; 5] = [
        PanelKind::Source,
        PanelKind::SyntaxTree,
        PanelKind::Ir,
        PanelKind::OptimizedIr,
        PanelKind::Assembly,
    ];

    /// Short name used for tabs.
    pub fn tab(self) -> &'static str {
        match self {
            Self::Source => "Source",
            Self::SyntaxTree => "AST (Syntax Tree)",
            Self::Ir => "LLVM IR",
            Self::OptimizedIr => "Optimized IR",
            Self::Assembly => "Assembly",
        }
    }

    /// Heading shown above the panel body.
    pub fn title(self, level: OptLevel) -> String {
        match self {
            Self::Source => "Source code".to_string(),
            Self::SyntaxTree => "AST (Syntax Tree)".to_string(),
            Self::Ir => "LLVM IR (Intermediate Representation)".to_string(),
            Self::OptimizedIr => format!("Optimized LLVM IR ({})", level.flag()),
            Self::Assembly => "Assembly (Machine Code)".to_string(),
        }
    }

    /// Name used by `:show`.
    pub fn key(self) -> &'static str {
        match self {
            Self::Source => "source",
            Self::SyntaxTree => "ast",
            Self::Ir => "ir",
            Self::OptimizedIr => "opt",
            Self::Assembly => "asm",
        }
    }

    /// Syntax hint for highlighting front-ends.
    pub fn language(self) -> &'static str {
        match self {
            Self::Source => "c",
            Self::SyntaxTree => "text",
            Self::Ir | Self::OptimizedIr => "llvm",
            Self::Assembly => "asm",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Source => "No source code.",
            Self::SyntaxTree => "Run the pipeline to see the AST.",
            Self::Ir => "IR has not been generated yet.",
            Self::OptimizedIr => "Optimized IR is not available yet.",
            Self::Assembly => "Assembly has not been generated yet.",
        }
    }

    fn artifact(self) -> Option<Artifact> {
        match self {
            Self::Source => None,
            Self::SyntaxTree => Some(Artifact::SyntaxTree),
            Self::Ir => Some(Artifact::Ir),
            Self::OptimizedIr => Some(Artifact::OptimizedIr),
            Self::Assembly => Some(Artifact::Assembly),
        }
    }
}

impl FromStr for PanelKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "source" | "src" => Ok(Self::Source),
            "ast" | "tree" => Ok(Self::SyntaxTree),
            "ir" | "llvm" => Ok(Self::Ir),
            "opt" | "optimized" => Ok(Self::OptimizedIr),
            "asm" | "assembly" => Ok(Self::Assembly),
            other => Err(format!(
                "unknown panel '{}' (expected source, ast, ir, opt or asm)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PanelBody {
    Code {
        text: String,
        language: &'static str,
    },
    Placeholder {
        message: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Panel {
    pub kind: PanelKind,
    pub title: String,
    pub body: PanelBody,
}

impl Panel {
    fn new(kind: PanelKind, level: OptLevel, text: Option<&str>) -> Self {
        let body = match text {
            Some(text) if !text.is_empty() => PanelBody::Code {
                text: text.to_string(),
                language: kind.language(),
            },
            _ => PanelBody::Placeholder {
                message: kind.placeholder(),
            },
        };
        Self {
            kind,
            title: kind.title(level),
            body,
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, PanelBody::Placeholder { .. })
    }

    pub fn text(&self) -> &str {
        match &self.body {
            PanelBody::Code { text, .. } => text,
            PanelBody::Placeholder { message } => message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiagnosticEntry {
    pub label: String,
    pub message: String,
}

impl DiagnosticEntry {
    pub fn line_count(&self) -> usize {
        self.message.lines().count()
    }
}

/// Everything there is to draw for one session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Presentation {
    pub panels: Vec<Panel>,
    pub diagnostics: Vec<DiagnosticEntry>,
    /// The source was edited after the run shown in the artifact panels.
    pub stale: bool,
}

impl Presentation {
    pub fn build(source: &str, run: Option<&PipelineRun>) -> Self {
        let level = run.map(|r| r.opt_level).unwrap_or_default();

        let panels = PanelKind::ALL
            .iter()
            .map(|&kind| {
                let text = match kind.artifact() {
                    None => Some(source),
                    Some(artifact) => run.and_then(|r| r.artifact(artifact)),
                };
                Panel::new(kind, level, text)
            })
            .collect();

        let diagnostics = run
            .map(|r| {
                r.diagnostics
                    .iter()
                    .filter(|d| !d.message.is_empty())
                    .map(|d| DiagnosticEntry {
                        label: d.label.clone(),
                        message: d.message.clone(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Self {
            panels,
            diagnostics,
            stale: run.is_some_and(|r| r.source != source),
        }
    }

    pub fn panel(&self, kind: PanelKind) -> &Panel {
        // `build` always creates one panel per kind, in `PanelKind::ALL` order.
        let index = PanelKind::ALL
            .iter()
            .position(|k| *k == kind)
            .unwrap_or_default();
        &self.panels[index]
    }
}

/// Render one panel for the terminal.
pub fn render_panel(panel: &Panel) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", format!("== {} ==", panel.title).bold().cyan());
    match &panel.body {
        PanelBody::Code { text, .. } => {
            out.push_str(text);
            if !text.ends_with('\n') {
                out.push('\n');
            }
        }
        PanelBody::Placeholder { message } => {
            let _ = writeln!(out, "{}", message.dimmed());
        }
    }
    out
}

/// Render the compiler messages. Entries whose index is in `expanded` show
/// their text, the rest only their header.
pub fn render_diagnostics(entries: &[DiagnosticEntry], expanded: &BTreeSet<usize>) -> String {
    let mut out = String::new();
    if entries.is_empty() {
        return out;
    }

    let _ = writeln!(out, "{}", "== Compiler Messages ==".bold().yellow());
    for (i, entry) in entries.iter().enumerate() {
        let number = i + 1;
        if expanded.contains(&number) {
            let _ = writeln!(out, "[{}] v {}", number, entry.label.bold());
            for line in entry.message.lines() {
                let _ = writeln!(out, "    {}", line);
            }
        } else {
            let _ = writeln!(
                out,
                "[{}] > {} ({} lines)",
                number,
                entry.label.bold(),
                entry.line_count()
            );
        }
    }
    out
}

/// Render every panel followed by the compiler messages.
pub fn render_all(presentation: &Presentation, expanded: &BTreeSet<usize>) -> String {
    let mut out = String::new();
    if presentation.stale {
        let _ = writeln!(
            out,
            "{}",
            "note: source changed since the last run; artifacts are out of date".yellow()
        );
    }
    for panel in &presentation.panels {
        out.push_str(&render_panel(panel));
        out.push('\n');
    }
    out.push_str(&render_diagnostics(&presentation.diagnostics, expanded));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{Diagnostic, Stage};

    fn sample_run() -> PipelineRun {
        PipelineRun {
            source: "int main(void) { return 0; }".to_string(),
            opt_level: OptLevel::O3,
            syntax_tree: Some("TranslationUnitDecl\n".to_string()),
            ir: Some(String::new()),
            optimized_ir: None,
            assembly: Some("main:\n".to_string()),
            diagnostics: vec![Diagnostic {
                stage: Some(Stage::Optimize),
                label: Stage::Optimize.label(OptLevel::O3),
                message: "opt: error: bad input\nsecond line\n".to_string(),
            }],
            outcomes: Vec::new(),
            elapsed_ms: 12,
        }
    }

    #[test]
    fn test_idle_presentation() {
        let p = Presentation::build("int x;", None);

        assert_eq!(p.panels.len(), 5);
        assert_eq!(p.panel(PanelKind::Source).text(), "int x;");
        for kind in &PanelKind::ALL[1..] {
            assert!(p.panel(*kind).is_placeholder());
        }
        assert!(p.diagnostics.is_empty());
        assert!(!p.stale);
    }

    #[test]
    fn test_empty_artifact_falls_back_to_placeholder() {
        let run = sample_run();
        let p = Presentation::build(&run.source, Some(&run));

        assert_eq!(p.panel(PanelKind::SyntaxTree).text(), "TranslationUnitDecl\n");
        assert!(p.panel(PanelKind::Ir).is_placeholder());
        assert!(p.panel(PanelKind::OptimizedIr).is_placeholder());
        assert_eq!(
            p.panel(PanelKind::OptimizedIr).title,
            "Optimized LLVM IR (-O3)"
        );
        assert_eq!(p.diagnostics.len(), 1);
        assert_eq!(p.diagnostics[0].label, "Optimization (opt -O3)");
    }

    #[test]
    fn test_stale_when_source_edited() {
        let run = sample_run();
        let p = Presentation::build("int main(void) { return 1; }", Some(&run));

        assert!(p.stale);
        assert_eq!(
            p.panel(PanelKind::Source).text(),
            "int main(void) { return 1; }"
        );
        assert_eq!(p.panel(PanelKind::Assembly).text(), "main:\n");
    }

    #[test]
    fn test_diagnostics_collapsed_by_default() {
        let run = sample_run();
        let p = Presentation::build(&run.source, Some(&run));

        let collapsed = render_diagnostics(&p.diagnostics, &BTreeSet::new());
        assert!(collapsed.contains("(2 lines)"));
        assert!(!collapsed.contains("bad input"));

        let expanded = render_diagnostics(&p.diagnostics, &BTreeSet::from([1]));
        assert!(expanded.contains("    opt: error: bad input"));
        assert!(expanded.contains("    second line"));
    }

    #[test]
    fn test_render_all_lists_every_panel() {
        let p = Presentation::build("int x;", None);
        let text = render_all(&p, &BTreeSet::new());

        for kind in PanelKind::ALL {
            assert!(text.contains(&kind.title(OptLevel::O3)));
        }
        assert!(text.contains("Run the pipeline to see the AST."));
        assert!(!text.contains("Compiler Messages"));
    }

    #[test]
    fn test_panel_keys_round_trip() {
        for kind in PanelKind::ALL {
            assert_eq!(kind.key().parse::<PanelKind>().unwrap(), kind);
        }
        assert!("bytecode".parse::<PanelKind>().is_err());
    }
}
