//! Static text widget.

use opsview_model::markup::NodeRef;

use crate::scene::{Scene, SceneId};
use crate::style::{parse_text_style, write_text, TextStyle};
use crate::widgets::{StandardOptions, WidgetError};

pub struct Label {
    text_id: SceneId,
}

impl Label {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let text = node.parse_string_child_or("Text", "");
        let style = match node.find_child("TextStyle") {
            Ok(style_node) => parse_text_style(style_node.deref()?)?,
            Err(_) => TextStyle::default(),
        };
        let text_id = write_text(
            scene,
            group,
            0.0,
            0.0,
            opts.width,
            opts.height,
            &style,
            &text,
        );
        Ok(Self { text_id })
    }

    pub(crate) fn digest(
        &mut self,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        if let Some(color) = fill {
            scene.set_attr(self.text_id, "fill", color);
        }
        Ok(())
    }
}
