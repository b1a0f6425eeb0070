//! Image widget referencing a file outside the display document.

use opsview_model::markup::NodeRef;

use crate::scene::{NodeKind, Scene, SceneId};
use crate::widgets::{StandardOptions, WidgetContext, WidgetError};

pub struct ExternalImage {
    #[allow(dead_code)]
    image_id: SceneId,
}

impl ExternalImage {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        ctx: &mut WidgetContext<'_>,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let pathname = node.parse_string_child("Pathname")?;
        let href = match ctx.resolver {
            Some(resolver) => resolver.resolve_path(&pathname),
            None => pathname,
        };
        let image_id = scene.add(
            group,
            NodeKind::Image {
                x: 0.0,
                y: 0.0,
                width: opts.width,
                height: opts.height,
                href,
            },
        );
        Ok(Self { image_id })
    }

    pub(crate) fn digest(&mut self, _scene: &mut Scene) -> Result<(), WidgetError> {
        Ok(())
    }
}
