mod api;
mod app;
mod event;
mod session;
mod theme;
mod upload;

use api::ApiClient;
use app::FinChatApp;
use eframe::egui;
use std::sync::mpsc;
use theme::Theme;
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("finchat=info")),
        )
        .init();

    let base_url =
        std::env::var("FINCHAT_API_URL").unwrap_or_else(|_| api::DEFAULT_BASE_URL.to_string());

    let (tx, rx) = mpsc::channel();

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .thread_name("finchat-runtime")
        .build()?;

    let app = FinChatApp::new(rx, tx, ApiClient::new(base_url), runtime.handle().clone());
    let _runtime = runtime;

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([960.0, 720.0])
            .with_min_inner_size([720.0, 560.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Asistente Analista Financiero",
        native_options,
        Box::new(move |creation_context| {
            Theme::default().apply_visuals(&creation_context.egui_ctx);
            Ok(Box::new(app))
        }),
    )?;

    Ok(())
}
