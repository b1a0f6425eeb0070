//! Open polyline with optional arrow heads.
//!
//! Point coordinates in the markup are document-absolute, so this widget's
//! group carries no translation.

use opsview_model::markup::NodeRef;

use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::parse_draw_style;
use crate::widgets::WidgetError;

pub struct PolylineWidget {
    line_id: SceneId,
}

impl PolylineWidget {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let mut points = Vec::new();
        for point in node.find_children("Point") {
            points.push((
                point.parse_float_child("x")?,
                point.parse_float_child("y")?,
            ));
        }

        let draw = parse_draw_style(node)?;
        let line_id = scene.add(group, NodeKind::Polyline { points });
        scene.set_attr(line_id, "fill", "none");
        draw.apply(scene, line_id);

        if node.parse_boolean_child_or("ArrowStart", false) {
            scene.set_attr(line_id, "marker-start", "url(#arrow-start)");
        }
        if node.parse_boolean_child_or("ArrowEnd", false) {
            scene.set_attr(line_id, "marker-end", "url(#arrow-end)");
        }

        Ok(Self { line_id })
    }

    pub(crate) fn digest(
        &mut self,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        // a line's color is its stroke
        if let Some(color) = fill {
            scene.set_attr(self.line_id, "stroke", color);
        }
        Ok(())
    }
}
