use std::path::{Path, PathBuf};

use super::color::LayerColors;
use super::layout::{layered_layout, Layout};
use crate::network::Network;

// ---------------------------------------------------------------------------
// Viewer state
// ---------------------------------------------------------------------------

/// The full viewer state, independent of rendering.
#[derive(Default)]
pub struct AppState {
    /// Network being shown (None until one is opened).
    pub network: Option<Network>,

    /// Layout of `network`, recomputed whenever the network changes.
    pub layout: Option<Layout>,

    pub layer_colors: LayerColors,

    /// File the network came from, if any.
    pub source: Option<PathBuf>,

    /// Node clicked in the plot or the side panel.
    pub selected: Option<usize>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,
}

impl AppState {
    pub fn with_network(network: Network) -> Self {
        let mut state = Self::default();
        state.set_network(network, None);
        state
    }

    /// Show a new network and lay it out.
    pub fn set_network(&mut self, network: Network, source: Option<&Path>) {
        let layout = layered_layout(&network);
        self.layer_colors = LayerColors::new(layout.n_layers());
        self.layout = Some(layout);
        self.network = Some(network);
        self.source = source.map(Path::to_path_buf);
        self.selected = None;
        self.status_message = None;
    }

    /// Select a node, or clear the selection when it is clicked again.
    pub fn toggle_selected(&mut self, node: usize) {
        self.selected = if self.selected == Some(node) {
            None
        } else {
            Some(node)
        };
    }

    pub fn selected_name(&self) -> Option<&str> {
        let network = self.network.as_ref()?;
        network.nodes().get(self.selected?).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn setting_a_network_resets_selection() {
        let net = Network::from_edges(&[("class", "media_exposure")]).unwrap();
        let mut state = AppState::with_network(net.clone());
        state.toggle_selected(1);
        assert_eq!(state.selected_name(), Some("media_exposure"));
        state.toggle_selected(1);
        assert_eq!(state.selected, None);

        state.toggle_selected(0);
        state.set_network(net, Some(Path::new("net.json")));
        assert_eq!(state.selected, None);
        assert_eq!(state.source, Some(PathBuf::from("net.json")));
        assert_eq!(state.layout.as_ref().unwrap().n_layers(), 2);
    }
}
