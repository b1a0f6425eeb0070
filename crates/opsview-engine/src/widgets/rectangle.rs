//! Filled/stroked rectangle.

use opsview_model::markup::NodeRef;

use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::{parse_draw_style, parse_fill_style};
use crate::widgets::{StandardOptions, WidgetError};

pub struct RectangleWidget {
    rect_id: SceneId,
}

impl RectangleWidget {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let fill = parse_fill_style(node)?;
        let draw = parse_draw_style(node)?;

        let rect_id = scene.add(
            group,
            NodeKind::Rect {
                x: 0.0,
                y: 0.0,
                width: opts.width,
                height: opts.height,
            },
        );
        fill.apply(scene, rect_id);
        draw.apply(scene, rect_id);

        // odd stroke widths land between pixels; shift for crisp edges
        if (draw.width as i64) % 2 == 1 {
            let (tx, ty) = scene.translate(group);
            scene.set_translate(group, tx + 0.5, ty + 0.5);
        }

        Ok(Self { rect_id })
    }

    pub(crate) fn digest(
        &mut self,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        if let Some(color) = fill {
            scene.set_attr(self.rect_id, "fill", color);
            scene.set_attr(self.rect_id, "fill-opacity", "1");
        }
        Ok(())
    }
}
