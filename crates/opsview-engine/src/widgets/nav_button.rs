//! Push button that opens or closes display frames.
//!
//! Press feedback swaps the beveled highlight/shadow strokes; the click
//! action is the parsed press command, executed by the frame layer.

use opsview_model::markup::NodeRef;
use opsview_model::Color;

use crate::commands::{parse_press_command, PressCommand};
use crate::scene::{NodeKind, Scene, SceneId};
use crate::style::{parse_fill_style, parse_text_style, write_text, TextStyle};
use crate::widgets::{StandardOptions, WidgetError};

pub struct NavigationButton {
    command: PressCommand,
    rect_id: SceneId,
    highlight_id: SceneId,
    shadow_id: SceneId,
    highlight: Color,
    shadow: Color,
    pressed: bool,
}

impl NavigationButton {
    pub(crate) fn parse_and_draw(
        node: NodeRef<'_>,
        opts: &StandardOptions,
        scene: &mut Scene,
        group: SceneId,
    ) -> Result<Self, WidgetError> {
        // an unsupported command class is fatal for this widget only
        let command = parse_press_command(node)?;

        let fill = parse_fill_style(node)?;
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
        scene.set_stroke(rect_id, Color::BLACK);
        scene.set_attr(rect_id, "stroke-width", "1");
        scene.set_attr(rect_id, "stroke-opacity", "1");

        // beveled edges: top-left highlight, bottom-right shadow
        let highlight = fill.color.brighter();
        let shadow = fill.color.darker();
        let (w, h) = (opts.width, opts.height);
        let highlight_id = scene.add(
            group,
            NodeKind::Polyline {
                points: vec![(0.0, h), (0.0, 0.0), (w, 0.0)],
            },
        );
        scene.set_attr(highlight_id, "fill", "none");
        scene.set_stroke(highlight_id, highlight);
        let shadow_id = scene.add(
            group,
            NodeKind::Polyline {
                points: vec![(w, 0.0), (w, h), (0.0, h)],
            },
        );
        scene.set_attr(shadow_id, "fill", "none");
        scene.set_stroke(shadow_id, shadow);

        // the released-state label lives in a nested compound
        if let Ok(label) = node
            .find_child("ReleasedCompound")
            .and_then(|c| c.find_child("Elements"))
            .and_then(|e| e.find_child("Label"))
        {
            let label = label.deref()?;
            let text = label.parse_string_child_or("Text", "");
            let style = match label.find_child("TextStyle") {
                Ok(style_node) => parse_text_style(style_node.deref()?)?,
                Err(_) => TextStyle::default(),
            };
            write_text(scene, group, 0.0, 0.0, w, h, &style, &text);
        }

        Ok(Self {
            command,
            rect_id,
            highlight_id,
            shadow_id,
            highlight,
            shadow,
            pressed: false,
        })
    }

    pub fn command(&self) -> &PressCommand {
        &self.command
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    /// Mouse-down: swap highlight and shadow for the sunken look.
    pub fn press(&mut self, scene: &mut Scene) {
        if !self.pressed {
            scene.set_stroke(self.highlight_id, self.shadow);
            scene.set_stroke(self.shadow_id, self.highlight);
            self.pressed = true;
        }
    }

    /// Mouse-up or mouse-out: restore the raised look.
    pub fn release(&mut self, scene: &mut Scene) {
        if self.pressed {
            scene.set_stroke(self.highlight_id, self.highlight);
            scene.set_stroke(self.shadow_id, self.shadow);
            self.pressed = false;
        }
    }

    pub(crate) fn digest(
        &mut self,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        if let Some(color) = fill {
            scene.set_attr(self.rect_id, "fill", color);
        }
        Ok(())
    }
}
