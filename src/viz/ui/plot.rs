use eframe::egui::{Color32, RichText, Ui};
use egui_plot::{Arrows, MarkerShape, Plot, PlotPoint, PlotPoints, Points, Text};

use crate::viz::state::AppState;

/// Radius (plot units) around a node that counts as a click on it.
const PICK_RADIUS: f64 = 0.2;

/// How far arrow tips stop short of the child node.
const TIP_GAP: f64 = 0.12;

// ---------------------------------------------------------------------------
// Network plot (central panel)
// ---------------------------------------------------------------------------

/// Draw the network: one arrow per edge, one labelled marker per node.
/// Clicking a node selects it.
pub fn network_plot(ui: &mut Ui, state: &mut AppState) {
    let (Some(network), Some(layout)) = (&state.network, &state.layout) else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("Open a network to view it  (File → Open network…)");
        });
        return;
    };

    let selected = state.selected;
    let layer_colors = &state.layer_colors;

    let response = Plot::new("network_plot")
        .data_aspect(1.0)
        .show_axes(false)
        .show_grid(false)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            let mut origins = Vec::with_capacity(network.edge_count());
            let mut tips = Vec::with_capacity(network.edge_count());
            for &(parent, child) in network.edge_indices() {
                let [x0, y0] = layout.positions[parent];
                let [x1, y1] = layout.positions[child];
                let len = (x1 - x0).hypot(y1 - y0).max(f64::EPSILON);
                let shrink = (len - TIP_GAP).max(0.0) / len;
                origins.push([x0, y0]);
                tips.push([x0 + (x1 - x0) * shrink, y0 + (y1 - y0) * shrink]);
            }
            plot_ui.arrows(
                Arrows::new(PlotPoints::from(origins), PlotPoints::from(tips))
                    .color(Color32::GRAY)
                    .tip_length(10.0),
            );

            for (idx, name) in network.nodes().iter().enumerate() {
                let [x, y] = layout.positions[idx];
                let color = layer_colors.color_for(layout.layers[idx]);
                let radius = if selected == Some(idx) { 9.0 } else { 6.0 };
                plot_ui.points(
                    Points::new(vec![[x, y]])
                        .shape(MarkerShape::Circle)
                        .filled(true)
                        .radius(radius)
                        .color(color),
                );

                let mut label = RichText::new(name).color(color);
                if selected == Some(idx) {
                    label = label.strong();
                }
                plot_ui.text(Text::new(PlotPoint::new(x, y + 0.18), label));
            }

            if plot_ui.response().clicked() {
                plot_ui
                    .pointer_coordinate()
                    .and_then(|p| layout.node_at([p.x, p.y], PICK_RADIUS))
            } else {
                None
            }
        });

    if let Some(idx) = response.inner {
        state.toggle_selected(idx);
    }
}
