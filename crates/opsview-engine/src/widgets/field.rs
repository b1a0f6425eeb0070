//! Formatted numeric read-out with quality coloring.
//!
//! The representative data-bound widget: VALUE updates are stored in memory
//! during dispatch; the digest formats the value, writes the text node and
//! recolors both text and background from the quality table — unless
//! `OverrideDQI` is set, in which case only FILL_COLOR bindings may change
//! the background.

use opsview_model::markup::NodeRef;
use opsview_model::{ParameterSample, Value};
use tracing::debug;

use crate::numfmt::format_value;
use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::{parse_text_style, write_text, QualityState, TextStyle};
use crate::widgets::{StandardOptions, WidgetError};

pub struct Field {
    text_id: SceneId,
    background_id: SceneId,
    decimals: usize,
    format: Option<String>,
    override_dqi: bool,
    last: Option<(ParameterSample, bool)>,
}

impl Field {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let decimals = node.parse_int_child_or("Decimals", 0)?.max(0) as usize;
        let format = node
            .find_child("Format")
            .ok()
            .map(|n| n.text().to_string())
            .filter(|f| !f.is_empty());
        let override_dqi = node.parse_boolean_child_or("OverrideDQI", false);

        let style = match node.find_child("TextStyle") {
            Ok(style_node) => parse_text_style(style_node.deref()?)?,
            Err(_) => TextStyle::default(),
        };

        // an optional unit label narrows the field box from the right
        let unit = node.parse_string_child_or("Unit", "");
        let show_unit = node.parse_boolean_child_or("ShowUnit", false);
        let mut field_width = opts.width;
        if show_unit && !unit.is_empty() {
            let unit_style = match node.find_child("UnitTextStyle") {
                Ok(style_node) => parse_text_style(style_node.deref()?)?,
                Err(_) => TextStyle::default(),
            };
            // no font metrics backend; estimate from glyph count
            let unit_width = unit.len() as f64 * unit_style.font_size as f64 * 0.6 + 2.0;
            write_text(
                scene,
                group,
                opts.width - unit_width,
                0.0,
                unit_width,
                opts.height,
                &unit_style,
                &unit,
            );
            field_width = (opts.width - unit_width).max(0.0);
        }

        let background_id = scene.add(
            group,
            NodeKind::Rect {
                x: 0.0,
                y: 0.0,
                width: field_width,
                height: opts.height,
            },
        );
        if !override_dqi {
            scene.set_class(background_id, "dead-background");
        }

        let text_id = write_text(
            scene,
            group,
            0.0,
            0.0,
            field_width,
            opts.height,
            &style,
            " ",
        );

        Ok(Self {
            text_id,
            background_id,
            decimals,
            format,
            override_dqi,
            last: None,
        })
    }

    pub(crate) fn on_value(&mut self, sample: &ParameterSample, using_raw: bool) {
        // overwrite-based: between digests only the latest sample matters
        self.last = Some((sample.clone(), using_raw));
    }

    pub(crate) fn digest(
        &mut self,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        if let Some((sample, using_raw)) = &self.last {
            let value = sample.value(*using_raw);
            let text = match value {
                Value::Float(v) => match &self.format {
                    Some(format) => format_value(format, value)?,
                    None => format!("{:.*}", self.decimals, v),
                },
                Value::Text(s) => s.clone(),
            };
            scene.set_text_content(self.text_id, text);

            if !self.override_dqi {
                let quality =
                    QualityState::of(sample.acquisition_status, sample.monitoring_result);
                scene.set_class(self.text_id, &quality.foreground_class());
                scene.set_class(self.background_id, &quality.background_class());
            }
        }

        if let Some(color) = fill {
            if self.override_dqi {
                scene.set_attr(self.background_id, "fill", color);
            } else {
                debug!("FILL_COLOR on field without OverrideDQI, ignoring");
            }
        }
        Ok(())
    }
}
