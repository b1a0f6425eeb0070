//! Linear meter with tick marks and a moving indicator.

use opsview_model::markup::NodeRef;
use opsview_model::{Color, ParameterSample};

use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::{parse_draw_style, parse_fill_style, write_text, TextStyle, VerticalAlignment};
use crate::widgets::{Bounds, StandardOptions, WidgetError};

const TRACK_THICKNESS: f64 = 6.0;
const TICK_LENGTH: f64 = 4.0;
const INDICATOR_SIZE: f64 = 5.0;

pub struct LinearTickMeter {
    indicator_id: SceneId,
    lower: f64,
    upper: f64,
    vertical: bool,
    value: Option<f64>,
}

impl LinearTickMeter {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        let lower = node.parse_float_child_or("Lower", 0.0)?;
        let upper = node.parse_float_child_or("Upper", 100.0)?;
        let tick_interval = node.parse_float_child_or("TickInterval", 10.0)?;
        let label_interval = node.parse_float_child_or("LabelInterval", 0.0)?;
        let vertical = node
            .parse_string_child_or("Orientation", "VERTICAL")
            .to_uppercase()
            != "HORIZONTAL";

        let stroke = match node.find_child("DrawStyle") {
            Ok(_) => parse_draw_style(node)?.color,
            Err(_) => Color::BLACK,
        };

        let (w, h) = (opts.width, opts.height);
        let track = if vertical {
            NodeKind::Rect { x: 0.0, y: 0.0, width: TRACK_THICKNESS, height: h }
        } else {
            NodeKind::Rect {
                x: 0.0,
                y: h - TRACK_THICKNESS,
                width: w,
                height: TRACK_THICKNESS,
            }
        };
        let track_id = scene.add(group, track);
        scene.set_stroke(track_id, stroke);
        match node.find_child("FillStyle") {
            Ok(_) => parse_fill_style(node)?.apply(scene, track_id),
            Err(_) => scene.set_attr(track_id, "fill", "none"),
        }

        // ticks every TickInterval, labels every LabelInterval (0 = none)
        let span = upper - lower;
        if tick_interval > 0.0 && span > 0.0 {
            let mut v = lower;
            while v <= upper + 1e-9 {
                let at = Self::offset(v, lower, upper, vertical, w, h);
                let points = if vertical {
                    vec![(TRACK_THICKNESS, at), (TRACK_THICKNESS + TICK_LENGTH, at)]
                } else {
                    vec![
                        (at, h - TRACK_THICKNESS),
                        (at, h - TRACK_THICKNESS - TICK_LENGTH),
                    ]
                };
                let tick_id = scene.add(group, NodeKind::Polyline { points });
                scene.set_stroke(tick_id, stroke);
                v += tick_interval;
            }
        }
        if label_interval > 0.0 && span > 0.0 {
            let style = TextStyle {
                font_size: 9,
                vertical: VerticalAlignment::Center,
                color: stroke,
                ..TextStyle::default()
            };
            let mut v = lower;
            while v <= upper + 1e-9 {
                let at = Self::offset(v, lower, upper, vertical, w, h);
                let text = trim_float(v);
                if vertical {
                    write_text(
                        scene,
                        group,
                        TRACK_THICKNESS + TICK_LENGTH + 2.0,
                        at - 5.0,
                        30.0,
                        10.0,
                        &style,
                        &text,
                    );
                } else {
                    write_text(
                        scene,
                        group,
                        at - 15.0,
                        h - TRACK_THICKNESS - TICK_LENGTH - 12.0,
                        30.0,
                        10.0,
                        &style,
                        &text,
                    );
                }
                v += label_interval;
            }
        }

        // indicator caret; repositioned by translating this node
        let indicator_points = if vertical {
            vec![
                (TRACK_THICKNESS + INDICATOR_SIZE, -INDICATOR_SIZE),
                (TRACK_THICKNESS, 0.0),
                (TRACK_THICKNESS + INDICATOR_SIZE, INDICATOR_SIZE),
            ]
        } else {
            vec![
                (-INDICATOR_SIZE, h - TRACK_THICKNESS - INDICATOR_SIZE),
                (0.0, h - TRACK_THICKNESS),
                (INDICATOR_SIZE, h - TRACK_THICKNESS - INDICATOR_SIZE),
            ]
        };
        let indicator_id = scene.add(group, NodeKind::Polyline { points: indicator_points });
        scene.set_attr(indicator_id, "fill", stroke.to_string());
        scene.set_stroke(indicator_id, stroke);
        let start = Self::offset(lower, lower, upper, vertical, w, h);
        if vertical {
            scene.set_translate(indicator_id, 0.0, start);
        } else {
            scene.set_translate(indicator_id, start, 0.0);
        }

        Ok(Self {
            indicator_id,
            lower,
            upper,
            vertical,
            value: None,
        })
    }

    fn offset(v: f64, lower: f64, upper: f64, vertical: bool, w: f64, h: f64) -> f64 {
        let span = upper - lower;
        let ratio = if span > 0.0 {
            ((v - lower) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        if vertical {
            h * (1.0 - ratio)
        } else {
            w * ratio
        }
    }

    pub(crate) fn on_value(&mut self, sample: &ParameterSample, using_raw: bool) {
        if let Some(v) = sample.value(using_raw).as_f64() {
            self.value = Some(v);
        }
    }

    pub(crate) fn digest(
        &mut self,
        bounds: &Bounds,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        if let Some(v) = self.value {
            let at = Self::offset(
                v,
                self.lower,
                self.upper,
                self.vertical,
                bounds.width,
                bounds.height,
            );
            if self.vertical {
                scene.set_translate(self.indicator_id, 0.0, at);
            } else {
                scene.set_translate(self.indicator_id, at, 0.0);
            }
        }
        if let Some(color) = fill {
            scene.set_attr(self.indicator_id, "fill", color);
            scene.set_attr(self.indicator_id, "stroke", color);
        }
        Ok(())
    }
}

fn trim_float(v: f64) -> String {
    if v.fract() == 0.0 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
