//! Symbol widget: an image whose file is switched by parameter value
//! through a symbol library's state map.

use std::collections::HashMap;

use opsview_model::markup::NodeRef;
use opsview_model::ParameterSample;
use tracing::warn;

use crate::scene::{NodeKind, Scene, SceneId};
use crate::widgets::{StandardOptions, WidgetContext, WidgetError};

pub struct SymbolWidget {
    image_id: SceneId,
    /// Per-state hrefs, already passed through the resolver.
    states: HashMap<String, String>,
    default_href: Option<String>,
    value: Option<String>,
}

impl SymbolWidget {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        ctx: &mut WidgetContext<'_>,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let library_name = node.parse_string_child("LibraryName")?;
        let symbol_name = node.parse_string_child("SymbolName")?;

        let entry = ctx
            .symbols
            .get_or_load(&library_name, ctx.resolver)
            .and_then(|library| library.symbol(&symbol_name))
            .cloned();
        if entry.is_none() {
            warn!(
                "cannot find symbol '{}' in library '{}'",
                symbol_name, library_name
            );
        }

        let resolve = |file: &str| -> String {
            let relative = format!("images/{}", file);
            match ctx.resolver {
                Some(resolver) => resolver.resolve_path(&relative),
                None => relative,
            }
        };

        let mut states = HashMap::new();
        let mut default_href = None;
        if let Some(entry) = &entry {
            for (state, file) in &entry.states {
                states.insert(state.clone(), resolve(file));
            }
            default_href = entry.default_image.as_deref().map(resolve);
        }

        let image_id = scene.add(
            group,
            NodeKind::Image {
                x: 0.0,
                y: 0.0,
                width: opts.width,
                height: opts.height,
                href: default_href.clone().unwrap_or_default(),
            },
        );

        Ok(Self {
            image_id,
            states,
            default_href,
            value: None,
        })
    }

    pub(crate) fn on_value(&mut self, sample: &ParameterSample, using_raw: bool) {
        self.value = Some(sample.value(using_raw).to_string());
    }

    pub(crate) fn digest(&mut self, scene: &mut Scene) -> Result<(), WidgetError> {
        if let Some(value) = &self.value {
            match self.states.get(value).or(self.default_href.as_ref()) {
                Some(href) => scene.set_href(self.image_id, href.clone()),
                None => warn!("no image for symbol state '{}'", value),
            }
        }
        Ok(())
    }
}
