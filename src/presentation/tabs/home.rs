use crate::domain::models::ConnectionStatus;
use crate::domain::session::DRINK_PRICE;
use crate::presentation::app::VendingApp;
use crate::presentation::components::Components;
use crate::presentation::theme::VendingPalette;
use eframe::egui;

pub fn render(app: &mut VendingApp, ui: &mut egui::Ui) {
    let palette = VendingPalette::new(app.is_dark_mode);

    ui_balance_panel(app, ui, &palette);
    ui.add_space(15.0);

    ui_machine_panel(app, ui, &palette);
}

fn ui_balance_panel(app: &mut VendingApp, ui: &mut egui::Ui, palette: &VendingPalette) {
    let balance = app.controller.state().balance;
    Components::brutalist_card(ui, "PayWave Balance", |ui| {
        let color = if balance < 0 {
            palette.accent_red
        } else {
            palette.primary
        };
        ui.label(
            egui::RichText::new(format!("RM {balance}"))
                .size(40.0)
                .strong()
                .color(color),
        );
        ui.label(format!("Every drink costs RM {DRINK_PRICE}"));
    });
}

fn ui_machine_panel(app: &mut VendingApp, ui: &mut egui::Ui, palette: &VendingPalette) {
    let status = app.controller.state().connection;
    let machine_name = app
        .controller
        .state()
        .active_device
        .as_ref()
        .map(|d| d.name.clone());
    let write_in_flight = app.controller.state().write_in_flight;

    Components::brutalist_card(ui, "Vending Machine", |ui| {
        match status {
            ConnectionStatus::Connected => {
                let name = machine_name.unwrap_or_else(|| "machine".to_string());
                Components::status_banner(
                    ui,
                    &format!("CONNECTED TO {}", name.to_uppercase()),
                    palette.accent_lime,
                    egui::Color32::BLACK,
                );
                ui.add_space(10.0);

                if write_in_flight {
                    ui.horizontal(|ui| {
                        ui.spinner();
                        ui.label("Sending your selection to the machine...");
                    });
                } else {
                    let purchase = egui::Button::new(
                        egui::RichText::new("PURCHASE").size(18.0).strong(),
                    );
                    if ui.add_sized([ui.available_width(), 48.0], purchase).clicked() {
                        app.controller.open_scan_modal();
                    }
                }
            }
            ConnectionStatus::Connecting => {
                Components::status_banner(
                    ui,
                    "CONNECTING...",
                    palette.secondary,
                    egui::Color32::WHITE,
                );
                ui.horizontal(|ui| {
                    ui.spinner();
                    ui.label("Opening the serial channel");
                });
            }
            ConnectionStatus::Disconnected => {
                Components::status_banner(
                    ui,
                    "NOT CONNECTED",
                    egui::Color32::from_gray(100),
                    egui::Color32::WHITE,
                );
                ui.add_space(10.0);
                if ui.button("Connect to the vending machine").clicked() {
                    app.controller.not_connected_pressed();
                }
            }
        }
    });
}
