//! Native GUI front-end using egui/eframe.
//!
//! Source editor and run button on top, one tab per panel below, compiler
//! messages as collapsible sections at the bottom.

#[cfg(feature = "gui")]
use eframe::egui;

#[cfg(feature = "gui")]
use crate::presentation::{PanelBody, PanelKind, Presentation};
#[cfg(feature = "gui")]
use crate::session::Session;
#[cfg(feature = "gui")]
use crate::toolchain::Toolchain;

#[cfg(feature = "gui")]
pub struct VisualizerApp {
    session: Session,
    tab: PanelKind,
    /// Rebuilt after every trigger or edit instead of every frame.
    presentation: Presentation,
}

#[cfg(feature = "gui")]
impl VisualizerApp {
    pub fn new(session: Session) -> Self {
        let presentation = session.presentation();
        Self {
            session,
            tab: PanelKind::Source,
            presentation,
        }
    }

    fn run_pipeline(&mut self) {
        self.session.trigger();
        self.presentation = self.session.presentation();
        if self.tab == PanelKind::Source {
            self.tab = PanelKind::SyntaxTree;
        }
    }

    fn source_editor(&mut self, ui: &mut egui::Ui) {
        ui.label("C source code:");
        let response = ui.add(
            egui::TextEdit::multiline(self.session.source_mut())
                .code_editor()
                .desired_rows(12)
                .desired_width(f32::INFINITY),
        );
        if response.changed() {
            self.presentation = self.session.presentation();
        }
    }

    fn tabs(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            for kind in PanelKind::ALL {
                ui.selectable_value(&mut self.tab, kind, kind.tab());
            }
        });
        ui.separator();

        let panel = self.presentation.panel(self.tab);
        ui.heading(panel.title.as_str());
        match &panel.body {
            PanelBody::Code { text, .. } => {
                egui::ScrollArea::both()
                    .id_salt("panel_body")
                    .max_height(360.0)
                    .show(ui, |ui| {
                        let mut view = text.as_str();
                        ui.add(
                            egui::TextEdit::multiline(&mut view)
                                .code_editor()
                                .desired_width(f32::INFINITY),
                        );
                    });
            }
            PanelBody::Placeholder { message } => {
                ui.weak(*message);
            }
        }
    }

    fn diagnostics(&self, ui: &mut egui::Ui) {
        if self.presentation.diagnostics.is_empty() {
            return;
        }
        ui.separator();
        ui.heading("Compiler Messages");
        for entry in &self.presentation.diagnostics {
            egui::CollapsingHeader::new(entry.label.as_str())
                .default_open(false)
                .show(ui, |ui| {
                    let mut view = entry.message.as_str();
                    ui.add(
                        egui::TextEdit::multiline(&mut view)
                            .code_editor()
                            .desired_width(f32::INFINITY),
                    );
                });
        }
    }
}

#[cfg(feature = "gui")]
impl eframe::App for VisualizerApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| {
            ui.heading("Mini Compiler Visualizer (C + LLVM)");
            ui.label("Write C code, press Run, then inspect every compiler stage below.");
            ui.separator();

            egui::ScrollArea::vertical().show(ui, |ui| {
                self.source_editor(ui);

                ui.horizontal(|ui| {
                    if ui.button("Run compiler pipeline").clicked() {
                        self.run_pipeline();
                    }
                    if ui.button("Reset sample").clicked() {
                        self.session.reset_source();
                        self.presentation = self.session.presentation();
                    }
                    if self.presentation.stale {
                        ui.colored_label(
                            egui::Color32::YELLOW,
                            "source changed since the last run",
                        );
                    }
                });
                ui.separator();

                self.tabs(ui);
                self.diagnostics(ui);
            });
        });
    }
}

/// Open the visualizer window. Blocks until it is closed.
#[cfg(feature = "gui")]
pub fn run_gui(toolchain: Toolchain) -> Result<(), String> {
    let title = "ccviz";
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 800.0])
            .with_title(title),
        ..Default::default()
    };

    let session = Session::new(toolchain);
    eframe::run_native(
        title,
        options,
        Box::new(|_cc| Ok(Box::new(VisualizerApp::new(session)))),
    )
    .map_err(|e| e.to_string())
}
