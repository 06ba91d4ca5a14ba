// src/ui/panel.rs
//! Debug panel for the viewport
//!
//! One window that edits the live [`ViewportConfig`] and shows what the
//! viewer is doing.

use crate::{
    config::{
        ViewportConfig, LIGHT_ANGLE_RANGE, LIGHT_INTENSITY_RANGE, LIGHT_PENUMBRA_RANGE,
        SPEED_RANGE,
    },
    gfx::picking::Intersection,
    viewer::LoadStatus,
};

/// Read-only state shown under the controls
#[derive(Debug, Clone, Copy)]
pub struct PanelStatus<'a> {
    pub node_count: usize,
    pub load_status: &'a LoadStatus,
    pub last_pick: Option<&'a Intersection>,
}

impl PanelStatus<'_> {
    pub fn summary(&self) -> String {
        let pick = match self.last_pick {
            Some(hit) => format!(
                "({:.2}, {:.2}, {:.2})",
                hit.point.x, hit.point.y, hit.point.z
            ),
            None => "none".to_string(),
        };
        format!(
            "{} nodes | {} | last pick: {}",
            self.node_count, self.load_status, pick
        )
    }
}

/// Draws the "Viewport" window
///
/// Edits land in `config` immediately and are clamped to the slider ranges
/// before returning, so the caller can hand `config` straight to the frame.
pub fn viewport_panel(
    ui: &imgui::Ui,
    config: &mut ViewportConfig,
    show_light_helper: &mut bool,
    status: PanelStatus<'_>,
) {
    let display_size = ui.io().display_size;
    if display_size[0] <= 0.0 || display_size[1] <= 0.0 {
        return;
    }

    ui.window("Viewport")
        .size([380.0, 0.0], imgui::Condition::FirstUseEver)
        .position([20.0, 20.0], imgui::Condition::FirstUseEver)
        .collapsible(true)
        .build(|| {
            ui.color_edit3("sphereColor", &mut config.sphere_color);
            ui.checkbox("wireframe", &mut config.wireframe);
            ui.slider("speed", SPEED_RANGE.0, SPEED_RANGE.1, &mut config.speed);

            ui.separator();
            ui.slider("angle", LIGHT_ANGLE_RANGE.0, LIGHT_ANGLE_RANGE.1, &mut config.light_angle);
            ui.slider(
                "penumbra",
                LIGHT_PENUMBRA_RANGE.0,
                LIGHT_PENUMBRA_RANGE.1,
                &mut config.light_penumbra,
            );
            ui.slider(
                "intensity",
                LIGHT_INTENSITY_RANGE.0,
                LIGHT_INTENSITY_RANGE.1,
                &mut config.light_intensity,
            );
            ui.checkbox("Show light helper", show_light_helper);

            ui.separator();
            ui.text_wrapped(status.summary());
        });

    // Ctrl+click lets ImGui sliders accept typed values outside the range
    config.clamp_to_ranges();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gfx::picking::PointerSample;
    use cgmath::Point3;

    #[test]
    fn test_summary_without_pick() {
        let status = PanelStatus {
            node_count: 9,
            load_status: &LoadStatus::Loading { percent: 42.0 },
            last_pick: None,
        };

        assert_eq!(status.summary(), "9 nodes | loading 42% | last pick: none");
    }

    #[test]
    fn test_summary_with_pick() {
        let hit = Intersection {
            node: 3,
            node_name: "interactable".to_string(),
            pointer: PointerSample { ndc_x: 0.0, ndc_y: 0.0 },
            point: Point3::new(1.5, 0.0, -2.25),
            distance: 10.0,
        };
        let status = PanelStatus {
            node_count: 12,
            load_status: &LoadStatus::Loaded { nodes: 3 },
            last_pick: Some(&hit),
        };

        assert_eq!(
            status.summary(),
            "12 nodes | model loaded (3 nodes) | last pick: (1.50, 0.00, -2.25)"
        );
    }
}
