use eframe::egui;
use pixelgrid::app::PixelGridApp;
use pixelgrid::{cli, logger};

fn main() -> Result<(), eframe::Error> {
    // -- CLI / headless mode ---------------------------------------------
    if cli::CliArgs::is_cli_mode() {
        use clap::Parser;
        let args = cli::CliArgs::parse();
        let code = cli::run(args);
        std::process::exit(if code == std::process::ExitCode::SUCCESS {
            0
        } else {
            1
        });
    }

    // -- GUI mode -----------------------------------------------------
    logger::init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_title("PixelGrid"),
        ..Default::default()
    };

    eframe::run_native(
        "PixelGrid",
        options,
        Box::new(|cc| Box::new(PixelGridApp::new(cc))),
    )
}
