//! Interactive session state.
//!
//! A session is the current source text plus the last pipeline run, if
//! any. Triggering replaces the run wholesale; nothing from an earlier run
//! survives.

use std::collections::BTreeSet;

use log::info;

use crate::pipeline::{run_pipeline, PipelineRun};
use crate::presentation::Presentation;
use crate::toolchain::Toolchain;

/// Sample program the session starts with.
pub const DEFAULT_SOURCE: &str = "\
int add(int a, int b) {
    return a + b;
}

int main() {
    int x = add(2, 3);
    return x;
}";

#[derive(Debug)]
pub struct Session {
    source: String,
    toolchain: Toolchain,
    last_run: Option<PipelineRun>,
    /// 1-based indices of expanded compiler messages.
    expanded: BTreeSet<usize>,
}

impl Session {
    pub fn new(toolchain: Toolchain) -> Self {
        Self::with_source(toolchain, DEFAULT_SOURCE)
    }

    pub fn with_source(toolchain: Toolchain, source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            toolchain,
            last_run: None,
            expanded: BTreeSet::new(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Mutable access for editors that work on the buffer in place.
    pub fn source_mut(&mut self) -> &mut String {
        &mut self.source
    }

    /// Replace the source text. The last run is kept until the next trigger.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = source.into();
    }

    /// Restore the sample program.
    pub fn reset_source(&mut self) {
        self.source = DEFAULT_SOURCE.to_string();
    }

    pub fn toolchain(&self) -> &Toolchain {
        &self.toolchain
    }

    pub fn last_run(&self) -> Option<&PipelineRun> {
        self.last_run.as_ref()
    }

    /// Run the pipeline on the current source, replacing the previous run.
    ///
    /// Blocks until every stage has finished.
    pub fn trigger(&mut self) -> &PipelineRun {
        info!("running pipeline on {} bytes of source", self.source.len());
        self.expanded.clear();
        self.last_run.insert(run_pipeline(&self.source, &self.toolchain))
    }

    /// Source differs from what the last run compiled.
    pub fn is_stale(&self) -> bool {
        self.last_run
            .as_ref()
            .is_some_and(|run| run.source != self.source)
    }

    pub fn presentation(&self) -> Presentation {
        Presentation::build(&self.source, self.last_run.as_ref())
    }

    pub fn expanded(&self) -> &BTreeSet<usize> {
        &self.expanded
    }

    /// Toggle compiler message `number` (1-based). Returns false if there is
    /// no such message.
    pub fn toggle_diagnostic(&mut self, number: usize) -> bool {
        let count = self.diagnostic_count();
        if number == 0 || number > count {
            return false;
        }
        if !self.expanded.remove(&number) {
            self.expanded.insert(number);
        }
        true
    }

    pub fn expand_all_diagnostics(&mut self) {
        self.expanded = (1..=self.diagnostic_count()).collect();
    }

    pub fn collapse_all_diagnostics(&mut self) {
        self.expanded.clear();
    }

    fn diagnostic_count(&self) -> usize {
        self.last_run
            .as_ref()
            .map_or(0, |run| run.diagnostics.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::presentation::PanelKind;
    use crate::toolchain::ToolCommand;
    use tempfile::tempdir;

    fn unavailable(root: &std::path::Path) -> Toolchain {
        Toolchain {
            clang: ToolCommand::new("ccviz-missing-clang"),
            opt: ToolCommand::new("ccviz-missing-opt"),
            llvm_dis: ToolCommand::new("ccviz-missing-llvm-dis"),
            workspace_root: Some(root.to_path_buf()),
            ..Toolchain::default()
        }
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = Session::new(Toolchain::default());

        assert_eq!(session.source(), DEFAULT_SOURCE);
        assert!(session.last_run().is_none());
        assert!(!session.is_stale());
        let p = session.presentation();
        assert!(p.panel(PanelKind::SyntaxTree).is_placeholder());
        assert!(p.diagnostics.is_empty());
    }

    #[test]
    fn test_unavailable_toolchain_keeps_session_usable() {
        let root = tempdir().unwrap();
        let mut session = Session::new(unavailable(root.path()));

        let run = session.trigger();
        assert_eq!(run.diagnostics.len(), 5);
        assert_eq!(run.non_empty_artifacts(), 0);

        let p = session.presentation();
        assert_eq!(p.diagnostics.len(), 5);
        assert!(p
            .diagnostics
            .iter()
            .all(|d| d.message.starts_with("Command not found")));
        assert_eq!(p.panel(PanelKind::Source).text(), DEFAULT_SOURCE);
    }

    #[test]
    fn test_edit_marks_stale_until_next_trigger() {
        let root = tempdir().unwrap();
        let mut session = Session::new(unavailable(root.path()));
        session.trigger();

        session.set_source("int main(void) { return 0; }");
        assert!(session.is_stale());
        assert!(session.presentation().stale);

        session.trigger();
        assert!(!session.is_stale());
        assert_eq!(
            session.last_run().unwrap().source,
            "int main(void) { return 0; }"
        );
    }

    #[test]
    fn test_toggle_diagnostics() {
        let root = tempdir().unwrap();
        let mut session = Session::new(unavailable(root.path()));
        assert!(!session.toggle_diagnostic(1));

        session.trigger();
        assert!(session.toggle_diagnostic(2));
        assert!(session.expanded().contains(&2));
        assert!(session.toggle_diagnostic(2));
        assert!(session.expanded().is_empty());
        assert!(!session.toggle_diagnostic(6));

        session.expand_all_diagnostics();
        assert_eq!(session.expanded().len(), 5);

        session.trigger();
        assert!(session.expanded().is_empty());
    }

    #[test]
    fn test_reset_source() {
        let mut session = Session::with_source(Toolchain::default(), "int y;");
        session.reset_source();
        assert_eq!(session.source(), DEFAULT_SOURCE);
    }

    #[cfg(unix)]
    #[test]
    fn test_rerun_replaces_previous_artifacts() {
        use crate::testing::FakeToolchain;

        let fake = FakeToolchain::new();
        let mut session = Session::with_source(
            fake.toolchain().clone(),
            "int first(void) { return 1; }\n",
        );

        session.trigger();
        let first = session.last_run().unwrap().clone();
        assert!(first.ir.as_deref().unwrap().contains("@first"));

        session.set_source("#error stop here\n");
        session.trigger();
        let second = session.last_run().unwrap();
        assert_eq!(second.non_empty_artifacts(), 0);
        assert_eq!(second.diagnostics.len(), 5);

        session.set_source("int second(void) { return 2; }\n");
        session.trigger();
        let third = session.last_run().unwrap();
        assert!(third.diagnostics.is_empty());
        assert!(third.ir.as_deref().unwrap().contains("@second"));
        assert!(!third.ir.as_deref().unwrap().contains("@first"));
        assert!(!third.assembly.as_deref().unwrap().contains("first:"));
        assert_eq!(fake.leftover_workspaces(), 0);
    }
}
