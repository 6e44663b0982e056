use crate::domain::models::{MessageSeverity, SessionEvent, Tab};
use crate::domain::packetizer::{Packetizer, DEFAULT_PACKET_SIZE};
use crate::domain::session::{DrinkSelection, SessionController};
use crate::domain::settings::SettingsService;
use crate::infrastructure::transport::{spawn_worker, VendingMachineSimulator};
use crate::presentation::components::Components;
use crate::presentation::theme::VendingPalette;
use eframe::egui;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub struct VendingApp {
    // Services
    pub(crate) settings: Arc<Mutex<SettingsService>>,

    // Session
    pub(crate) controller: SessionController,
    pub(crate) events_rx: mpsc::UnboundedReceiver<SessionEvent>,

    // UI State
    pub(crate) scan_input: String,
    pub(crate) is_dark_mode: bool,

    // Logging guard
    pub(crate) _logging_guard: Option<crate::infrastructure::logging::LoggingGuard>,
}

impl VendingApp {
    pub fn new(cc: &eframe::CreationContext<'_>) -> Self {
        crate::presentation::theme::configure_vending_style(&cc.egui_ctx, false);

        let settings_service = SettingsService::new().expect("Failed to load settings");

        let logging_guard =
            crate::infrastructure::logging::init_logger(&settings_service.get().log_settings)
                .map_err(|e| eprintln!("Failed to initialize logging: {}", e))
                .ok();

        tracing::info!("Starting Yogurt Vending Machine controller");

        let packetizer = Packetizer::new(settings_service.get().packet_size).unwrap_or_else(|e| {
            tracing::warn!("configured packet size rejected: {e}");
            Packetizer::new(DEFAULT_PACKET_SIZE).expect("default frame size is valid")
        });

        let (adapter_tx, adapter_rx) = mpsc::unbounded_channel();
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let transport = Arc::new(VendingMachineSimulator::demo(adapter_tx));
        let commands = spawn_worker(transport, adapter_rx, events_tx, packetizer);

        let controller = SessionController::new(commands, settings_service.get());
        controller.initialize();

        Self {
            settings: Arc::new(Mutex::new(settings_service)),
            controller,
            events_rx,
            scan_input: String::new(),
            is_dark_mode: false,
            _logging_guard: logging_guard,
        }
    }

    fn ui_top_bar(&mut self, ctx: &egui::Context) {
        let palette = VendingPalette::new(self.is_dark_mode);

        egui::TopBottomPanel::top("top_panel").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.label(
                    egui::RichText::new("Yogurt Vending Machine")
                        .strong()
                        .size(18.0)
                        .color(palette.primary),
                );
                ui.separator();

                let current = self.controller.state().tab;
                if ui.selectable_label(current == Tab::Home, "Home").clicked() {
                    self.controller.select_tab(Tab::Home);
                }
                if ui
                    .selectable_label(current == Tab::Connect, "Connect")
                    .clicked()
                {
                    self.controller.select_tab(Tab::Connect);
                }

                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    let switch_icon = if self.is_dark_mode {
                        "☀ Light"
                    } else {
                        "🌙 Dark"
                    };
                    if ui.button(switch_icon).clicked() {
                        self.is_dark_mode = !self.is_dark_mode;
                        crate::presentation::theme::configure_vending_style(
                            ctx,
                            self.is_dark_mode,
                        );
                    }
                    Components::radio_dot(ui, self.controller.state().radio_enabled, &palette);
                });
            });
        });
    }

    fn ui_notice_window(&mut self, ctx: &egui::Context) {
        let notice = match self.controller.current_notice().cloned() {
            Some(notice) => notice,
            None => return,
        };
        let palette = VendingPalette::new(self.is_dark_mode);
        let title_color = match notice.severity {
            MessageSeverity::Info => palette.secondary,
            MessageSeverity::Success => egui::Color32::from_rgb(0, 150, 0),
            MessageSeverity::Warning => egui::Color32::from_rgb(200, 150, 0),
            MessageSeverity::Error => palette.accent_red,
        };

        egui::Window::new(
            egui::RichText::new(&notice.title)
                .color(title_color)
                .strong(),
        )
        .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            if let Some(body) = &notice.body {
                ui.label(body);
            }
            ui.add_space(8.0);
            if ui.button("OK").clicked() {
                self.controller.dismiss_notice();
            }
        });
    }

    fn ui_scan_window(&mut self, ctx: &egui::Context) {
        if !self.controller.state().scan_modal_open {
            return;
        }

        egui::Window::new("Scan your favourite yogurt here")
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .collapsible(false)
            .resizable(false)
            .show(ctx, |ui| {
                ui.label("Tap a shelf code, or type the label from the bottle.");
                ui.add_space(4.0);

                ui.horizontal(|ui| {
                    for drink in DrinkSelection::ALL {
                        let caption = format!("{}\n[{}]", drink.label(), drink.payload());
                        if ui.button(caption).clicked() {
                            self.controller.scan_received(drink.payload());
                        }
                    }
                });

                ui.separator();
                ui.horizontal(|ui| {
                    ui.text_edit_singleline(&mut self.scan_input);
                    if ui.button("Send").clicked() && !self.scan_input.is_empty() {
                        let payload = std::mem::take(&mut self.scan_input);
                        self.controller.scan_received(&payload);
                    }
                });

                ui.add_space(4.0);
                if ui.button("DISMISS").clicked() {
                    self.controller.dismiss_scan_modal();
                }
            });
    }
}

impl eframe::App for VendingApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        while let Ok(event) = self.events_rx.try_recv() {
            self.controller.apply(event);
        }

        ctx.request_repaint();

        self.ui_top_bar(ctx);

        egui::CentralPanel::default().show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                ui.vertical_centered(|ui| {
                    ui.set_max_width(400.0);
                    ui.add_space(20.0);

                    use crate::presentation::tabs;
                    match self.controller.state().tab {
                        Tab::Home => tabs::home::render(self, ui),
                        Tab::Connect => tabs::connect::render(self, ui),
                    }

                    ui.add_space(50.0);
                });
            });
        });

        self.ui_scan_window(ctx);
        self.ui_notice_window(ctx);
    }
}
