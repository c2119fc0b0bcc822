pub mod kiosk_app;
pub mod views;

pub use kiosk_app::KioskApp;
