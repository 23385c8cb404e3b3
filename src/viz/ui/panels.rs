use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::network::Network;
use crate::viz::state::AppState;

// ---------------------------------------------------------------------------
// Left side panel – node list and selected family
// ---------------------------------------------------------------------------

/// Render the left panel: legend, node list, parents/children of the
/// selected node.
pub fn side_panel(ui: &mut Ui, state: &mut AppState) {
    ui.heading("Nodes");
    ui.separator();

    let (Some(network), Some(layout)) = (&state.network, &state.layout) else {
        ui.label("No network loaded.");
        return;
    };

    // Clone what we need so we can mutate state inside the loop.
    let nodes = network.nodes().to_vec();
    let layers = layout.layers.clone();
    let family = state
        .selected_name()
        .map(|name| family_of(network, name));

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for (label, color) in state.layer_colors.legend_entries() {
            ui.label(RichText::new(format!("● {label}")).color(color));
        }
    });
    ui.separator();

    ScrollArea::vertical()
        .auto_shrink([false, false])
        .max_height(ui.available_height() * 0.6)
        .show(ui, |ui: &mut Ui| {
            for (idx, name) in nodes.iter().enumerate() {
                let color = state.layer_colors.color_for(layers[idx]);
                let text = RichText::new(name).color(color);
                if ui
                    .selectable_label(state.selected == Some(idx), text)
                    .clicked()
                {
                    state.toggle_selected(idx);
                }
            }
        });

    if let Some((name, parents, children)) = family {
        ui.separator();
        ui.strong(name);
        egui::CollapsingHeader::new(format!("Parents ({})", parents.len()))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for p in &parents {
                    ui.label(p);
                }
            });
        egui::CollapsingHeader::new(format!("Children ({})", children.len()))
            .default_open(true)
            .show(ui, |ui: &mut Ui| {
                for c in &children {
                    ui.label(c);
                }
            });
    }
}

fn family_of(network: &Network, name: &str) -> (String, Vec<String>, Vec<String>) {
    let owned = |v: Vec<&str>| -> Vec<String> { v.into_iter().map(str::to_string).collect() };
    (
        name.to_string(),
        owned(network.parents(name)),
        owned(network.children(name)),
    )
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu / toolbar.
pub fn top_bar(ui: &mut Ui, state: &mut AppState) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open network…").clicked() {
                open_file_dialog(state);
                ui.close_menu();
            }
        });

        ui.separator();

        if let Some(net) = &state.network {
            ui.label(format!(
                "{} nodes, {} edges",
                net.node_count(),
                net.edge_count()
            ));
        }
        if let Some(path) = &state.source {
            ui.separator();
            ui.label(path.display().to_string());
        }

        if let Some(msg) = &state.status_message {
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialog
// ---------------------------------------------------------------------------

pub fn open_file_dialog(state: &mut AppState) {
    let file = rfd::FileDialog::new()
        .set_title("Open network")
        .add_filter("Network (JSON)", &["json"])
        .pick_file();

    if let Some(path) = file {
        match Network::from_file(&path) {
            Ok(network) => {
                log::info!(
                    "Loaded network with {} nodes and {} edges from {}",
                    network.node_count(),
                    network.edge_count(),
                    path.display()
                );
                state.set_network(network, Some(&path));
            }
            Err(e) => {
                log::error!("Failed to load network: {e:#}");
                state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}
