//! The viewer control panel
//!
//! The panel never touches the session directly. It reads a [`PanelState`]
//! snapshot and records what the user clicked as [`UiAction`]s, which the
//! application applies between frames.

use crate::router::View;

/// Something the user asked for through the panel
#[derive(Debug, Clone, PartialEq)]
pub enum UiAction {
    Navigate(View),
    Back,
    SelectModel(usize),
    SelectPanorama(usize),
    SetAutoRotate(bool),
    ResetCamera,
}

/// Everything the panel displays
#[derive(Debug, Clone, PartialEq)]
pub struct PanelState {
    pub view: View,
    pub models: Vec<String>,
    pub panoramas: Vec<String>,
    pub selected_model: Option<usize>,
    pub selected_panorama: Option<usize>,
    pub loading: bool,
    pub auto_rotate: bool,
    pub triangles: usize,
    pub last_error: Option<String>,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            view: View::ModelViewer,
            models: Vec::new(),
            panoramas: Vec::new(),
            selected_model: None,
            selected_panorama: None,
            loading: false,
            auto_rotate: true,
            triangles: 0,
            last_error: None,
        }
    }
}

impl PanelState {
    /// Titles listed for the current page
    pub fn entries(&self) -> &[String] {
        match self.view {
            View::ModelViewer => &self.models,
            View::PanoramaViewer => &self.panoramas,
        }
    }

    pub fn selected(&self) -> Option<usize> {
        match self.view {
            View::ModelViewer => self.selected_model,
            View::PanoramaViewer => self.selected_panorama,
        }
    }

    /// The action picking entry `index` on the current page, unless it is
    /// already shown
    pub fn select(&self, index: usize) -> Option<UiAction> {
        if index >= self.entries().len() || self.selected() == Some(index) {
            return None;
        }
        Some(match self.view {
            View::ModelViewer => UiAction::SelectModel(index),
            View::PanoramaViewer => UiAction::SelectPanorama(index),
        })
    }

    pub fn status_line(&self) -> String {
        if self.loading {
            "Loading...".to_string()
        } else if let Some(error) = &self.last_error {
            format!("Error: {error}")
        } else {
            format!("{} triangles", self.triangles)
        }
    }
}

/// Builds the panel window and appends the user's choices to `actions`
pub fn viewer_panel(ui: &imgui::Ui, state: &PanelState, actions: &mut Vec<UiAction>) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }
    let panel_width = (display_size[0] * 0.25).clamp(260.0, 380.0);

    ui.window("Viewer")
        .size([panel_width, 0.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .always_auto_resize(true)
        .collapsible(true)
        .build(|| {
            render_navigation(ui, state, actions);
            ui.separator();
            render_entries(ui, state, actions);
            ui.separator();
            render_camera_controls(ui, state, actions);
            ui.separator();
            ui.text(state.status_line());
        });
}

fn render_navigation(ui: &imgui::Ui, state: &PanelState, actions: &mut Vec<UiAction>) {
    for view in [View::ModelViewer, View::PanoramaViewer] {
        let _token = (state.view == view)
            .then(|| ui.push_style_color(imgui::StyleColor::Button, [0.26, 0.59, 0.98, 1.0]));
        if ui.button(view.title()) && state.view != view {
            actions.push(UiAction::Navigate(view));
        }
        ui.same_line();
    }
    if ui.button("Back") {
        actions.push(UiAction::Back);
    }
}

fn render_entries(ui: &imgui::Ui, state: &PanelState, actions: &mut Vec<UiAction>) {
    let heading = match state.view {
        View::ModelViewer => "Models",
        View::PanoramaViewer => "Panoramas",
    };
    ui.text(heading);

    if state.entries().is_empty() {
        ui.text_disabled("Nothing in the catalog");
        return;
    }

    ui.child_window("entries")
        .size([0.0, 150.0])
        .border(true)
        .build(|| {
            for (index, title) in state.entries().iter().enumerate() {
                let label = format!("{title}##entry{index}");
                if ui
                    .selectable_config(&label)
                    .selected(state.selected() == Some(index))
                    .build()
                {
                    actions.extend(state.select(index));
                }
            }
        });
}

fn render_camera_controls(ui: &imgui::Ui, state: &PanelState, actions: &mut Vec<UiAction>) {
    let mut auto_rotate = state.auto_rotate;
    if ui.checkbox("Auto-rotate", &mut auto_rotate) {
        actions.push(UiAction::SetAutoRotate(auto_rotate));
    }
    ui.same_line();
    if ui.button("Reset camera") {
        actions.push(UiAction::ResetCamera);
    }
}
