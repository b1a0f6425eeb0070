//! Style extraction from markup fragments, and the quality table that maps
//! parameter status to a visual state.

use opsview_model::markup::NodeRef;
use opsview_model::{AcquisitionStatus, Color, MarkupError, MonitoringResult};

use crate::scene::{Scene, SceneId};

// ── Fill / draw styles ───────────────────────────────────────────────────────

/// Extracted `FillStyle` child: a fill color plus whether the SOLID pattern
/// was selected (any other pattern renders fully transparent).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FillStyle {
    pub color: Color,
    pub opaque: bool,
}

pub fn parse_fill_style(node: NodeRef<'_>) -> Result<FillStyle, MarkupError> {
    let style = node.find_child("FillStyle")?;
    let pattern = style.parse_string_child("Pattern")?;
    Ok(FillStyle {
        color: style.parse_color_child("Color")?,
        opaque: pattern.eq_ignore_ascii_case("solid"),
    })
}

impl FillStyle {
    pub fn apply(&self, scene: &mut Scene, id: SceneId) {
        scene.set_fill(id, self.color);
        scene.set_attr(id, "fill-opacity", if self.opaque { "1" } else { "0" });
    }
}

/// Extracted `DrawStyle` child: stroke color, width, opacity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawStyle {
    pub color: Color,
    pub width: f64,
    pub opaque: bool,
}

pub fn parse_draw_style(node: NodeRef<'_>) -> Result<DrawStyle, MarkupError> {
    let style = node.find_child("DrawStyle")?;
    let pattern = style.parse_string_child("Pattern")?;
    Ok(DrawStyle {
        color: style.parse_color_child("Color")?,
        width: style.parse_float_child_or("Width", 1.0)?,
        opaque: pattern.eq_ignore_ascii_case("solid"),
    })
}

impl DrawStyle {
    pub fn apply(&self, scene: &mut Scene, id: SceneId) {
        scene.set_stroke(id, self.color);
        scene.set_attr(id, "stroke-width", self.width.to_string());
        scene.set_attr(id, "stroke-opacity", if self.opaque { "1" } else { "0" });
    }
}

// ── Text style and layout ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HorizontalAlignment {
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerticalAlignment {
    Top,
    Center,
    Bottom,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub color: Color,
    pub font_size: i32,
    pub font_family: String,
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub horizontal: HorizontalAlignment,
    pub vertical: VerticalAlignment,
}

/// Read a `TextStyle`-shaped node (the node itself, not a parent).
pub fn parse_text_style(style: NodeRef<'_>) -> Result<TextStyle, MarkupError> {
    let horizontal = match style
        .parse_string_child_or("HorizontalAlignment", "LEFT")
        .to_lowercase()
        .as_str()
    {
        "center" => HorizontalAlignment::Center,
        "right" => HorizontalAlignment::Right,
        _ => HorizontalAlignment::Left,
    };
    let vertical = match style
        .parse_string_child_or("VerticalAlignment", "TOP")
        .to_lowercase()
        .as_str()
    {
        "center" => VerticalAlignment::Center,
        "bottom" => VerticalAlignment::Bottom,
        _ => VerticalAlignment::Top,
    };
    Ok(TextStyle {
        color: style.parse_color_child_or("Color", Color::BLACK)?,
        font_size: style.parse_int_child_or("Fontsize", 12)?,
        font_family: style.parse_string_child_or("Fontname", "sans-serif"),
        bold: style.parse_boolean_child_or("IsBold", false),
        italic: style.parse_boolean_child_or("IsItalic", false),
        underline: style.parse_boolean_child_or("IsUnderlined", false),
        horizontal,
        vertical,
    })
}

impl Default for TextStyle {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            font_size: 12,
            font_family: "sans-serif".to_string(),
            bold: false,
            italic: false,
            underline: false,
            horizontal: HorizontalAlignment::Left,
            vertical: VerticalAlignment::Top,
        }
    }
}

impl TextStyle {
    fn apply(&self, scene: &mut Scene, id: SceneId) {
        scene.set_fill(id, self.color);
        scene.set_attr(id, "font-size", format!("{}px", self.font_size));
        scene.set_attr(id, "font-family", self.font_family.clone());
        if self.bold {
            scene.set_attr(id, "font-weight", "bold");
        }
        if self.italic {
            scene.set_attr(id, "font-style", "italic");
        }
        if self.underline {
            scene.set_attr(id, "text-decoration", "underline");
        }
    }
}

/// Place aligned text within the box (x, y, width, height) under `parent`.
///
/// There is no font-metrics backend here, so the baseline is approximated
/// from the font size; hosts that re-render the SVG get exact metrics from
/// their own renderer.
pub fn write_text(
    scene: &mut Scene,
    parent: SceneId,
    x: f64,
    y: f64,
    width: f64,
    height: f64,
    style: &TextStyle,
    text: &str,
) -> SceneId {
    let size = style.font_size as f64;
    let tx = match style.horizontal {
        HorizontalAlignment::Left => x,
        HorizontalAlignment::Center => x + width / 2.0,
        HorizontalAlignment::Right => x + width,
    };
    let ty = match style.vertical {
        VerticalAlignment::Top => y + size * 0.8,
        VerticalAlignment::Center => y + height / 2.0 + size * 0.3,
        VerticalAlignment::Bottom => y + height - size * 0.2,
    };

    // NBSP keeps runs of spaces visible in the rendered output
    let content = text.replace(' ', "\u{a0}");
    let id = scene.add(
        parent,
        crate::scene::NodeKind::Text { x: tx, y: ty, content },
    );
    style.apply(scene, id);
    let anchor = match style.horizontal {
        HorizontalAlignment::Left => "start",
        HorizontalAlignment::Center => "middle",
        HorizontalAlignment::Right => "end",
    };
    scene.set_attr(id, "text-anchor", anchor);
    id
}

// ── Quality states ───────────────────────────────────────────────────────────

/// Visual state derived from a sample's acquisition and monitoring status.
/// Drives the CSS class pair on a data-bound widget's text and background.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QualityState {
    Nominal,
    Warning,
    Danger,
    Dead,
    Expired,
    Disabled,
    Undefined,
}

impl QualityState {
    pub fn of(
        acquisition: AcquisitionStatus,
        monitoring: Option<MonitoringResult>,
    ) -> QualityState {
        match acquisition {
            AcquisitionStatus::Acquired => match monitoring {
                Some(MonitoringResult::InLimits) => QualityState::Nominal,
                Some(
                    MonitoringResult::Watch
                    | MonitoringResult::Warning
                    | MonitoringResult::Distress,
                ) => QualityState::Warning,
                Some(MonitoringResult::Critical | MonitoringResult::Severe) => {
                    QualityState::Danger
                }
                Some(MonitoringResult::Disabled) => QualityState::Disabled,
                None => QualityState::Undefined,
            },
            AcquisitionStatus::NotReceived | AcquisitionStatus::Invalid => QualityState::Dead,
            AcquisitionStatus::Expired => QualityState::Expired,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            QualityState::Nominal => "nominal",
            QualityState::Warning => "warning",
            QualityState::Danger => "danger",
            QualityState::Dead => "dead",
            QualityState::Expired => "expired",
            QualityState::Disabled => "disabled",
            QualityState::Undefined => "undefined",
        }
    }

    pub fn foreground_class(&self) -> String {
        format!("{}-foreground", self.name())
    }

    pub fn background_class(&self) -> String {
        format!("{}-background", self.name())
    }
}
