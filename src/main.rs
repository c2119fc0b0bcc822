use inspection_kiosk::app::KioskApp;
use inspection_kiosk::config::Settings;
use inspection_kiosk::coordinator::CoordinatorBuilder;
use inspection_kiosk::error::AppError;
use tracing::{info, Level};

fn init_logging() {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();
}

fn main() -> Result<(), AppError> {
    init_logging();
    let settings = Settings::load()?;

    // The window needs the main thread; background tasks get their own runtime.
    let runtime = tokio::runtime::Runtime::new()?;
    let coordinator = {
        let _guard = runtime.enter();
        CoordinatorBuilder::new(settings.clone()).build()?
    };

    let gui = KioskApp::start_gui(&settings, coordinator.handles());
    info!("Kiosk window closed");
    runtime.block_on(coordinator.shutdown())?;
    gui
}
