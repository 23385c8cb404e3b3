//! Interactive network viewer.
//!
//! ```text
//!   Network ──► layout::layered_layout ──► AppState ──► NetworkViewerApp
//!                                            ▲              │
//!                      File → Open (rfd) ────┘      egui_plot arrows + nodes
//! ```

pub mod app;
pub mod color;
pub mod layout;
pub mod state;
pub mod ui;

use anyhow::anyhow;
use eframe::egui;

use crate::network::Network;
use app::NetworkViewerApp;
use state::AppState;

/// Open a window showing `network` as a top-down layered drawing. Blocks
/// until the window is closed.
pub fn plot_network(network: &Network) -> anyhow::Result<()> {
    run_viewer(AppState::with_network(network.clone()))
}

/// Open the viewer with nothing loaded; networks are picked with File → Open.
pub fn open_viewer() -> anyhow::Result<()> {
    run_viewer(AppState::default())
}

fn run_viewer(state: AppState) -> anyhow::Result<()> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([500.0, 350.0]),
        ..Default::default()
    };

    eframe::run_native(
        "cmc-bayes – Network Viewer",
        options,
        Box::new(|_cc| Ok(Box::new(NetworkViewerApp::new(state)))),
    )
    .map_err(|e| anyhow!("network viewer failed: {e}"))
}
