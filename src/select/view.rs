use crate::model::{ChartId, SetId};

/// Render state of a carousel panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelState {
    Selected,
    NotSelected,
    Collapsed,
}

/// One chart row inside a set panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartPanel {
    pub chart_id: ChartId,
    pub visible: bool,
    pub state: PanelState,
}

/// One set panel with its chart rows in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SetPanel {
    pub set_id: SetId,
    pub visible: bool,
    pub state: PanelState,
    pub charts: Vec<ChartPanel>,
}

/// The fully ordered, visibility-annotated carousel view.
///
/// Rebuilt from scratch on every filter pass, never diffed in place. Every
/// set appears, annotated, so the UI layer can animate departures;
/// traversal and random selection consult only the visible subset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CarouselView {
    pub panels: Vec<SetPanel>,
}

impl CarouselView {
    /// Visible sets in display order.
    pub fn visible_set_ids(&self) -> Vec<SetId> {
        self.panels
            .iter()
            .filter(|p| p.visible)
            .map(|p| p.set_id)
            .collect()
    }

    /// Visible charts flattened in (set order, within-set order).
    pub fn visible_chart_ids(&self) -> Vec<ChartId> {
        self.panels
            .iter()
            .filter(|p| p.visible)
            .flat_map(|p| p.charts.iter().filter(|c| c.visible).map(|c| c.chart_id))
            .collect()
    }

    /// Visible charts of one set, in display order.
    pub fn visible_charts_of(&self, set_id: SetId) -> Vec<ChartId> {
        self.panels
            .iter()
            .find(|p| p.set_id == set_id)
            .map(|p| {
                p.charts
                    .iter()
                    .filter(|c| c.visible)
                    .map(|c| c.chart_id)
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn is_set_visible(&self, set_id: SetId) -> bool {
        self.panels.iter().any(|p| p.set_id == set_id && p.visible)
    }

    pub fn is_chart_visible(&self, chart_id: ChartId) -> bool {
        self.panels
            .iter()
            .flat_map(|p| p.charts.iter())
            .any(|c| c.chart_id == chart_id && c.visible)
    }

    /// Re-derive panel states for the given selection. The selected set
    /// expands; every other set renders its charts collapsed.
    pub(crate) fn apply_selection(&mut self, selected: Option<ChartId>, owner: Option<SetId>) {
        for panel in &mut self.panels {
            let is_selected_set = owner == Some(panel.set_id);
            panel.state = if is_selected_set {
                PanelState::Selected
            } else {
                PanelState::NotSelected
            };
            for chart in &mut panel.charts {
                chart.state = if selected == Some(chart.chart_id) {
                    PanelState::Selected
                } else if is_selected_set {
                    PanelState::NotSelected
                } else {
                    PanelState::Collapsed
                };
            }
        }
    }
}
