use crate::domain::models::ConnectionStatus;
use crate::presentation::app::VendingApp;
use crate::presentation::components::Components;
use crate::presentation::theme::VendingPalette;
use eframe::egui;

pub fn render(app: &mut VendingApp, ui: &mut egui::Ui) {
    let palette = VendingPalette::new(app.is_dark_mode);

    ui_radio_panel(app, ui, &palette);
    ui.add_space(15.0);

    ui_connection_panel(app, ui, &palette);
    ui.add_space(15.0);

    ui_paired_panel(app, ui);
    ui.add_space(15.0);

    ui_discovery_panel(app, ui);
}

fn ui_radio_panel(app: &mut VendingApp, ui: &mut egui::Ui, palette: &VendingPalette) {
    let enabled = app.controller.state().radio_enabled;

    Components::brutalist_card(ui, "Bluetooth", |ui| {
        ui.horizontal(|ui| {
            Components::radio_dot(ui, enabled, palette);
            ui.label(if enabled { "Radio is on" } else { "Radio is off" });

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                let mut on = enabled;
                if ui.checkbox(&mut on, "").changed() {
                    app.controller.toggle_radio(on);
                }
            });
        });

        if !enabled && ui.button("Ask to enable").clicked() {
            app.controller.request_enable();
        }
    });
}

fn ui_connection_panel(app: &mut VendingApp, ui: &mut egui::Ui, palette: &VendingPalette) {
    let status = app.controller.state().connection;
    let device = app.controller.state().active_device.clone();
    let configured = app
        .settings
        .lock()
        .ok()
        .map(|s| s.get().machine_address.clone());

    Components::brutalist_card(ui, "Connection", |ui| {
        let (text, bg, fg) = match status {
            ConnectionStatus::Connected => {
                ("CONNECTED", palette.accent_lime, egui::Color32::BLACK)
            }
            ConnectionStatus::Connecting => {
                ("CONNECTING...", palette.secondary, egui::Color32::WHITE)
            }
            ConnectionStatus::Disconnected => (
                "DISCONNECTED",
                egui::Color32::from_gray(100),
                egui::Color32::WHITE,
            ),
        };
        Components::status_banner(ui, text, bg, fg);
        ui.add_space(8.0);

        match device {
            Some(device) => {
                ui.label(format!("{} ({})", device.name, device.id));
                match status {
                    ConnectionStatus::Connected => {
                        if ui.button("Disconnect").clicked() {
                            app.controller.disconnect();
                        }
                    }
                    ConnectionStatus::Connecting => {
                        ui.spinner();
                    }
                    ConnectionStatus::Disconnected => {
                        if ui.button("Reconnect").clicked() {
                            app.controller.toggle_connection(true);
                        }
                    }
                }
            }
            None => {
                ui.label("No machine connected yet. Pick one below.");
                if let Some(address) = configured {
                    ui.label(
                        egui::RichText::new(format!("Configured machine: {address}")).weak(),
                    );
                }
            }
        }
    });
}

fn ui_paired_panel(app: &mut VendingApp, ui: &mut egui::Ui) {
    let devices = app.controller.state().paired_devices.clone();

    Components::brutalist_card(ui, "Paired Devices", |ui| {
        if devices.is_empty() {
            ui.label("Nothing bonded yet.");
            return;
        }
        for device in &devices {
            ui.horizontal(|ui| {
                ui.label(format!("{} ({})", device.name, device.id));
                ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                    if ui.button("Connect").clicked() {
                        app.controller.device_pressed(device);
                    }
                });
            });
        }
    });
}

fn ui_discovery_panel(app: &mut VendingApp, ui: &mut egui::Ui) {
    let discovering = app.controller.state().discovering;
    let devices = app.controller.state().unpaired_devices.clone();

    Components::brutalist_card(ui, "Nearby Devices", |ui| {
        ui.horizontal(|ui| {
            if discovering {
                ui.spinner();
                ui.label("Scanning...");
                if ui.button("Cancel scan").clicked() {
                    app.controller.cancel_discovery();
                }
            } else if ui.button("Scan for devices").clicked() {
                app.controller.start_discovery();
            }
        });

        if devices.is_empty() {
            if !discovering {
                ui.label("No unpaired devices seen yet.");
            }
            return;
        }

        ui.separator();
        egui::ScrollArea::vertical()
            .id_salt("unpaired_devices")
            .max_height(160.0)
            .show(ui, |ui| {
                for device in &devices {
                    ui.horizontal(|ui| {
                        ui.label(format!("{} ({})", device.name, device.id));
                        ui.with_layout(
                            egui::Layout::right_to_left(egui::Align::Center),
                            |ui| {
                                if ui.button("Pair").clicked() {
                                    app.controller.device_pressed(device);
                                }
                            },
                        );
                    });
                }
            });
    });
}
