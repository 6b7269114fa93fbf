use crate::api::{ApiClient, TransportError};
use crate::event::AppEvent;
use crate::session::controller::{ChatDispatch, SessionController};
use crate::session::{ModelId, Role, Turn};
use crate::theme::Theme;
use crate::upload::UploadCoordinator;
use eframe::egui::{self, RichText, ScrollArea};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender, TryRecvError};
use std::time::Duration;
use tokio::runtime::Handle;
use tracing::warn;

pub struct FinChatApp {
    rx: Receiver<AppEvent>,
    tx: Sender<AppEvent>,
    api: ApiClient,
    runtime_handle: Handle,
    controller: SessionController,
    uploads: UploadCoordinator,
    theme: Theme,
    scroll_to_bottom: bool,
}

impl FinChatApp {
    pub fn new(
        rx: Receiver<AppEvent>,
        tx: Sender<AppEvent>,
        api: ApiClient,
        runtime_handle: Handle,
    ) -> Self {
        Self {
            rx,
            tx,
            api,
            runtime_handle,
            controller: SessionController::new(),
            uploads: UploadCoordinator::new(),
            theme: Theme::default(),
            scroll_to_bottom: false,
        }
    }

    fn drain_events(&mut self, ctx: &egui::Context) {
        loop {
            match self.rx.try_recv() {
                Ok(event) => {
                    self.apply_event(event);
                    self.scroll_to_bottom = true;
                    ctx.request_repaint();
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    warn!("event channel disconnected");
                    break;
                }
            }
        }
    }

    fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::ChatSettled(result) => self.controller.settle_chat(result),
            AppEvent::UploadSettled(result) => {
                if let Some(summary) = self.uploads.settle(result) {
                    self.controller.record_upload(&summary);
                }
            }
        }
    }

    fn submit_draft(&mut self, ctx: &egui::Context) {
        if let Some(dispatch) = self.controller.submit() {
            self.dispatch_chat(dispatch);
            self.scroll_to_bottom = true;
            ctx.request_repaint();
        }
    }

    fn dispatch_chat(&self, dispatch: ChatDispatch) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = api
                .send_chat_turn(&dispatch.history, dispatch.model, dispatch.temperature)
                .await;
            let _ = tx.send(AppEvent::ChatSettled(result));
        });
    }

    fn pick_and_upload(&mut self) {
        let Some(path) = rfd::FileDialog::new()
            .add_filter("CSV", &["csv"])
            .pick_file()
        else {
            return;
        };

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_default();

        // The path is consumed here and never retained, so picking the
        // identical file again starts a fresh upload.
        if self.uploads.accept(&filename) {
            self.dispatch_upload(path, filename);
        }
    }

    fn dispatch_upload(&self, path: PathBuf, filename: String) {
        let api = self.api.clone();
        let tx = self.tx.clone();
        self.runtime_handle.spawn(async move {
            let result = match tokio::fs::read(&path).await {
                Ok(bytes) => api.upload_dataset(&filename, bytes).await,
                Err(err) => {
                    warn!(error = %err, path = %path.display(), "failed to read selected file");
                    Err(TransportError::Unreachable(err.to_string()))
                }
            };
            let _ = tx.send(AppEvent::UploadSettled(result));
        });
    }

    fn render_header(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.vertical_centered(|ui| {
                ui.heading("💰 Asistente Analista Financiero");
                ui.label(
                    RichText::new("Powered by Vertex AI Gemini")
                        .color(self.theme.text_muted)
                        .small(),
                );
            });
        });
    }

    fn render_controls(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("controls").show(ctx, |ui| {
            ui.horizontal_wrapped(|ui| {
                ui.label("Modelo:");
                let mut model = self.controller.config().model;
                egui::ComboBox::from_id_salt("model_select")
                    .selected_text(model.label())
                    .show_ui(ui, |ui| {
                        for candidate in ModelId::ALL {
                            ui.selectable_value(&mut model, candidate, candidate.label());
                        }
                    });
                if model != self.controller.config().model {
                    self.controller.set_model(model);
                }

                ui.separator();

                let mut temperature = self.controller.config().temperature;
                ui.label(format!("Temperatura: {temperature:.1}"));
                if ui
                    .add(
                        egui::Slider::new(&mut temperature, 0.0..=1.0)
                            .step_by(0.1)
                            .show_value(false),
                    )
                    .changed()
                {
                    self.controller.set_temperature(temperature);
                }

                ui.separator();

                let upload_label = if self.uploads.uploading() {
                    "Cargando..."
                } else {
                    "📁 Cargar CSV"
                };
                if ui
                    .add_enabled(!self.uploads.uploading(), egui::Button::new(upload_label))
                    .clicked()
                {
                    self.pick_and_upload();
                }

                if ui.button("🗑️ Limpiar").clicked() {
                    self.controller.clear();
                }
            });

            if let Some(error) = self.uploads.error() {
                ui.label(RichText::new(error).color(self.theme.danger).small());
            }
        });
    }

    fn render_welcome(&self, ui: &mut egui::Ui) {
        ui.add_space(self.theme.spacing_12);
        ui.heading("¡Bienvenido!");
        ui.label("Soy tu asistente de análisis financiero. Puedo ayudarte con:");
        ui.label("  📊 Análisis de estados financieros");
        ui.label("  📈 Cálculo de ratios financieros (liquidez, endeudamiento, rentabilidad)");
        ui.label("  📉 Análisis de tendencias");
        ui.label("  💹 Proyecciones de flujo de caja (DCF)");
        ui.label("  ⚠ Identificación de riesgos financieros");
        ui.label("Carga un archivo CSV con tus datos o hazme una pregunta.");
    }

    fn render_turn(&self, ui: &mut egui::Ui, index: usize, turn: &Turn) {
        let (author, fill) = match turn.role {
            Role::User => ("👤 Usuario", self.theme.user_bubble),
            Role::Assistant => ("🤖 Asistente", self.theme.assistant_bubble),
        };

        self.theme.bubble_frame(fill).show(ui, |ui| {
            ui.label(RichText::new(author).strong().color(self.theme.accent));
            ui.label(&turn.content);

            if !turn.tool_calls.is_empty() {
                egui::CollapsingHeader::new(
                    RichText::new("🔧 Herramientas utilizadas").small(),
                )
                .id_salt(("tool_calls", index))
                .default_open(false)
                .show(ui, |ui| {
                    for call in &turn.tool_calls {
                        ui.label(RichText::new(&call.name).strong());
                        if let Some(arguments) = &call.arguments {
                            let pretty = serde_json::to_string_pretty(arguments)
                                .unwrap_or_else(|_| arguments.to_string());
                            ui.label(RichText::new(pretty).monospace());
                        }
                    }
                });
            }
        });
        ui.add_space(self.theme.spacing_8);
    }

    fn render_chat(&mut self, ctx: &egui::Context) {
        egui::CentralPanel::default().show(ctx, |ui| {
            let transcript_height = (ui.available_height() - 80.0).max(120.0);
            ScrollArea::vertical()
                .id_salt("transcript")
                .max_height(transcript_height)
                .stick_to_bottom(true)
                .show(ui, |ui| {
                    if self.controller.timeline().is_empty() {
                        self.render_welcome(ui);
                    }

                    // Positional keys are safe: the timeline only ever
                    // appends until a wholesale clear.
                    for (index, turn) in self.controller.timeline().iter().enumerate() {
                        self.render_turn(ui, index, turn);
                    }

                    if self.controller.pending() {
                        ui.horizontal(|ui| {
                            ui.spinner();
                            ui.label(RichText::new("Pensando...").color(self.theme.text_muted));
                        });
                    }

                    if self.scroll_to_bottom {
                        ui.scroll_to_cursor(Some(egui::Align::BOTTOM));
                    }
                });
            self.scroll_to_bottom = false;

            ui.separator();

            let pending = self.controller.pending();
            let hint = if pending {
                "Esperando respuesta..."
            } else {
                "Escribe tu pregunta o solicitud de análisis..."
            };

            let mut send_now = false;
            ui.horizontal(|ui| {
                let response = ui.add_enabled(
                    !pending,
                    egui::TextEdit::singleline(self.controller.draft_mut())
                        .desired_width(ui.available_width() - 110.0)
                        .hint_text(hint),
                );
                if response.lost_focus() && ui.input(|i| i.key_pressed(egui::Key::Enter)) {
                    send_now = true;
                }

                let can_send = !pending && !self.controller.draft_mut().trim().is_empty();
                send_now |= ui
                    .add_enabled(can_send, egui::Button::new("📤 Enviar"))
                    .clicked();
            });

            if send_now && !pending {
                self.submit_draft(ctx);
            }
        });
    }
}

impl eframe::App for FinChatApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.drain_events(ctx);
        self.render_header(ctx);
        self.render_controls(ctx);
        self.render_chat(ctx);

        // Keep polling the channel while a request is outstanding; the
        // settlement arrives from the runtime thread between frames.
        if self.controller.pending() || self.uploads.uploading() {
            ctx.request_repaint_after(Duration::from_millis(100));
        }
    }
}
