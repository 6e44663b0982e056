use eframe::egui;

use vending_machine_controller::presentation::VendingApp;

fn main() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([420.0, 720.0])
            .with_title("Yogurt Vending Machine"),
        ..Default::default()
    };

    eframe::run_native(
        "Yogurt Vending Machine",
        options,
        Box::new(|cc| Ok(Box::new(VendingApp::new(cc)))),
    )
}
