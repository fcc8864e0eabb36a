use anyhow::Context as _;
use clap::Parser;
use eframe::egui;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use frame_labeler::app::LabelerApp;
use frame_labeler::config::{Args, Settings};
use frame_labeler::fetch::Fetcher;
use frame_labeler::storage::{FileStorage, KeyValueStorage, MemoryStorage};
use frame_labeler::store::AnnotationStore;

fn main() -> anyhow::Result<()> {
    let settings = Settings::from_args(Args::parse());

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| settings.log_filter.as_str().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let storage: Box<dyn KeyValueStorage> = match &settings.storage_path {
        Some(path) => {
            tracing::info!(path = %path.display(), "using annotation storage");
            Box::new(FileStorage::open(path))
        }
        None => {
            tracing::warn!("no data directory found, annotations will not be kept");
            Box::new(MemoryStorage::new())
        }
    };
    let store = AnnotationStore::open(storage);
    let source = settings.source.build();
    tracing::info!(source = %source.describe(), "starting session");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("frame-labeler"),
        ..Default::default()
    };

    eframe::run_native(
        "frame-labeler",
        options,
        Box::new(move |cc| {
            let fetcher = Fetcher::new(source).with_repaint(cc.egui_ctx.clone());
            Ok(Box::new(LabelerApp::new(store, fetcher)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
    .context("failed to run the labelling window")
}
