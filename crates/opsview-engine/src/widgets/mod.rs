//! Widget base contract and the closed variant set.
//!
//! A widget owns its scene nodes and its data bindings. Dispatch mutates
//! only in-memory widget state (and sets the dirty flag); the actual scene
//! mutation happens in the variant's digest. The variant set is a closed
//! enum so tag dispatch is checked at compile time; unknown markup tags are
//! rejected before construction by [`WidgetTag::from_tag`].

pub mod compound;
pub mod external_image;
pub mod field;
pub mod label;
pub mod line_graph;
pub mod nav_button;
pub mod polyline;
pub mod rectangle;
pub mod symbol_widget;
pub mod tick_meter;

use opsview_model::markup::NodeRef;
use opsview_model::{MarkupError, ParameterSample};
use thiserror::Error;
use tracing::{debug, warn};

use crate::binding::{parse_data_bindings, DataSourceBinding, DynamicProperty};
use crate::numfmt::FormatError;
use crate::resource::ResourceResolver;
use crate::scene::{NodeKind, Scene, SceneId};
use crate::symbol::SymbolCache;

pub use compound::Compound;
pub use external_image::ExternalImage;
pub use field::Field;
pub use label::Label;
pub use line_graph::LineGraph;
pub use nav_button::NavigationButton;
pub use polyline::PolylineWidget;
pub use rectangle::RectangleWidget;
pub use symbol_widget::SymbolWidget;
pub use tick_meter::LinearTickMeter;

/// Errors raised while constructing or digesting a single widget. These
/// never abort sibling widgets.
#[derive(Debug, Error)]
pub enum WidgetError {
    #[error(transparent)]
    Markup(#[from] MarkupError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("unsupported press command class '{0}'")]
    UnsupportedCommand(String),
}

/// External collaborators a widget may need while it is being built.
pub struct WidgetContext<'a> {
    pub resolver: Option<&'a dyn ResourceResolver>,
    pub symbols: &'a mut SymbolCache,
}

/// The closed set of markup tags that construct widgets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WidgetTag {
    Label,
    Field,
    LinearTickMeter,
    LineGraph,
    Polyline,
    Rectangle,
    ExternalImage,
    Symbol,
    NavigationButton,
    Compound,
}

impl WidgetTag {
    /// Registry lookup. `LabelFor` is an indirection tag: it re-dispatches
    /// on its `class` attribute instead of its own tag name.
    pub fn from_element(node: NodeRef<'_>) -> Option<WidgetTag> {
        let tag = node.tag();
        if tag == "LabelFor" {
            return node.attribute("class").and_then(Self::from_tag);
        }
        Self::from_tag(tag)
    }

    pub fn from_tag(tag: &str) -> Option<WidgetTag> {
        match tag {
            "Label" => Some(WidgetTag::Label),
            "Field" => Some(WidgetTag::Field),
            "LinearTickMeter" => Some(WidgetTag::LinearTickMeter),
            "LineGraph" => Some(WidgetTag::LineGraph),
            "Polyline" => Some(WidgetTag::Polyline),
            "Rectangle" => Some(WidgetTag::Rectangle),
            "ExternalImage" => Some(WidgetTag::ExternalImage),
            "Symbol" => Some(WidgetTag::Symbol),
            "NavigationButton" => Some(WidgetTag::NavigationButton),
            "Compound" => Some(WidgetTag::Compound),
            _ => None,
        }
    }
}

/// Standard options every element carries.
#[derive(Debug, Clone)]
pub struct StandardOptions {
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub depth: i32,
}

pub fn parse_standard_options(node: NodeRef<'_>) -> Result<StandardOptions, MarkupError> {
    Ok(StandardOptions {
        name: node.parse_string_child_or("Name", ""),
        x: node.parse_float_child("X")?,
        y: node.parse_float_child("Y")?,
        width: node.parse_float_child("Width")?,
        height: node.parse_float_child("Height")?,
        depth: node.parse_int_child_or("Depth", 0)?,
    })
}

/// Local drawing box a variant digest works within (the widget's group node
/// carries the translation).
#[derive(Debug, Clone, Copy)]
pub struct Bounds {
    pub width: f64,
    pub height: f64,
}

/// Position/color updates accumulated between digests.
#[derive(Debug, Default)]
struct Pending {
    x: Option<f64>,
    y: Option<f64>,
    fill: Option<String>,
}

/// A drawable unit of the display.
pub struct Widget {
    /// Construction-order sequence number, the stable draw-order tie-break.
    pub seq: u32,
    pub name: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Author-specified z-order.
    pub depth: i32,
    pub bindings: Vec<DataSourceBinding>,
    pub dirty: bool,
    /// The widget's outer group node in the scene.
    pub handle: SceneId,
    pending: Pending,
    pub kind: WidgetKind,
}

/// Construct the widget for one element node and attach its scene nodes
/// under `parent`.
pub fn build_widget(
    seq: u32,
    tag: WidgetTag,
    node: NodeRef<'_>,
    opts: StandardOptions,
    scene: &mut Scene,
    ctx: &mut WidgetContext<'_>,
    parent: SceneId,
) -> Result<Widget, WidgetError> {
    let bindings = parse_data_bindings(node);

    let group = scene.add(parent, NodeKind::Group);
    scene.set_translate(group, opts.x, opts.y);
    if !opts.name.is_empty() {
        scene.set_attr(group, "data-name", opts.name.clone());
    }

    let kind = match tag {
        WidgetTag::Label => WidgetKind::Label(Label::parse_and_draw(node, &opts, scene, group)?),
        WidgetTag::Field => WidgetKind::Field(Field::parse_and_draw(node, &opts, scene, group)?),
        WidgetTag::LinearTickMeter => WidgetKind::LinearTickMeter(
            LinearTickMeter::parse_and_draw(node, &opts, scene, group)?,
        ),
        WidgetTag::LineGraph => WidgetKind::LineGraph(LineGraph::parse_and_draw(
            node, &opts, &bindings, scene, group,
        )?),
        WidgetTag::Polyline => {
            // polyline points are document-absolute; the group stays at the origin
            scene.set_translate(group, 0.0, 0.0);
            WidgetKind::Polyline(PolylineWidget::parse_and_draw(node, scene, group)?)
        }
        WidgetTag::Rectangle => WidgetKind::Rectangle(RectangleWidget::parse_and_draw(
            node, &opts, scene, group,
        )?),
        WidgetTag::ExternalImage => WidgetKind::ExternalImage(ExternalImage::parse_and_draw(
            node, &opts, scene, ctx, group,
        )?),
        WidgetTag::Symbol => WidgetKind::Symbol(SymbolWidget::parse_and_draw(
            node, &opts, scene, ctx, group,
        )?),
        WidgetTag::NavigationButton => WidgetKind::NavigationButton(
            NavigationButton::parse_and_draw(node, &opts, scene, group)?,
        ),
        WidgetTag::Compound => {
            // nested elements keep document-absolute coordinates
            scene.set_translate(group, 0.0, 0.0);
            WidgetKind::Compound(Compound::new())
        }
    };

    Ok(Widget {
        seq,
        name: opts.name,
        x: opts.x,
        y: opts.y,
        width: opts.width,
        height: opts.height,
        depth: opts.depth,
        bindings,
        dirty: false,
        handle: group,
        pending: Pending::default(),
        kind,
    })
}

impl Widget {
    /// Apply one inbound sample to every binding this widget has on the
    /// sample's opsName. Returns true when any binding matched; the widget
    /// is then dirty until the next digest.
    pub fn update_bindings(&mut self, sample: &ParameterSample) -> bool {
        let mut touched = false;
        for i in 0..self.bindings.len() {
            if !self.bindings[i].triggered_by(&sample.ops_name) {
                continue;
            }
            let property = self.bindings[i].dynamic_property().clone();
            let using_raw = self.bindings[i].using_raw();
            match property {
                DynamicProperty::Value => self.kind.on_value(sample, using_raw),
                DynamicProperty::X => {
                    if let Some(v) = sample.value(using_raw).as_f64() {
                        self.pending.x = Some(v);
                    }
                }
                DynamicProperty::Y => {
                    if let Some(v) = sample.value(using_raw).as_f64() {
                        self.pending.y = Some(v);
                    }
                }
                DynamicProperty::FillColor => {
                    self.pending.fill = Some(sample.value(using_raw).to_string());
                }
                DynamicProperty::Other(p) => {
                    warn!(
                        "unsupported dynamic property '{}' on widget '{}'",
                        p, self.name
                    );
                    continue;
                }
            }
            touched = true;
        }
        if touched {
            self.dirty = true;
        }
        touched
    }

    /// Apply accumulated state to the scene. Called by the display's digest
    /// for dirty widgets only. On error the flag is still cleared — the
    /// widget is not retried until new data arrives for it.
    pub fn digest(&mut self, scene: &mut Scene) -> Result<(), WidgetError> {
        self.dirty = false;

        if self.pending.x.is_some() || self.pending.y.is_some() {
            let (tx, ty) = scene.translate(self.handle);
            let nx = self.pending.x.take().unwrap_or(tx);
            let ny = self.pending.y.take().unwrap_or(ty);
            self.x = nx;
            self.y = ny;
            scene.set_translate(self.handle, nx, ny);
        }

        let fill = self.pending.fill.take();
        let bounds = Bounds { width: self.width, height: self.height };
        self.kind.digest(&bounds, fill.as_deref(), scene)
    }

    pub fn navigation(&self) -> Option<&NavigationButton> {
        match &self.kind {
            WidgetKind::NavigationButton(b) => Some(b),
            _ => None,
        }
    }

    pub fn navigation_mut(&mut self) -> Option<&mut NavigationButton> {
        match &mut self.kind {
            WidgetKind::NavigationButton(b) => Some(b),
            _ => None,
        }
    }
}

/// Variant payloads.
pub enum WidgetKind {
    Label(Label),
    Field(Field),
    LinearTickMeter(LinearTickMeter),
    LineGraph(LineGraph),
    Polyline(PolylineWidget),
    Rectangle(RectangleWidget),
    ExternalImage(ExternalImage),
    Symbol(SymbolWidget),
    NavigationButton(NavigationButton),
    Compound(Compound),
}

impl WidgetKind {
    pub fn tag_name(&self) -> &'static str {
        match self {
            WidgetKind::Label(_) => "Label",
            WidgetKind::Field(_) => "Field",
            WidgetKind::LinearTickMeter(_) => "LinearTickMeter",
            WidgetKind::LineGraph(_) => "LineGraph",
            WidgetKind::Polyline(_) => "Polyline",
            WidgetKind::Rectangle(_) => "Rectangle",
            WidgetKind::ExternalImage(_) => "ExternalImage",
            WidgetKind::Symbol(_) => "Symbol",
            WidgetKind::NavigationButton(_) => "NavigationButton",
            WidgetKind::Compound(_) => "Compound",
        }
    }

    fn on_value(&mut self, sample: &ParameterSample, using_raw: bool) {
        match self {
            WidgetKind::Field(f) => f.on_value(sample, using_raw),
            WidgetKind::LinearTickMeter(m) => m.on_value(sample, using_raw),
            WidgetKind::LineGraph(g) => g.on_value(sample, using_raw),
            WidgetKind::Symbol(s) => s.on_value(sample, using_raw),
            other => debug!("VALUE update ignored by {} widget", other.tag_name()),
        }
    }

    fn digest(
        &mut self,
        bounds: &Bounds,
        fill: Option<&str>,
        scene: &mut Scene,
    ) -> Result<(), WidgetError> {
        match self {
            WidgetKind::Label(w) => w.digest(fill, scene),
            WidgetKind::Field(w) => w.digest(fill, scene),
            WidgetKind::LinearTickMeter(w) => w.digest(bounds, fill, scene),
            WidgetKind::LineGraph(w) => w.digest(bounds, scene),
            WidgetKind::Polyline(w) => w.digest(fill, scene),
            WidgetKind::Rectangle(w) => w.digest(fill, scene),
            WidgetKind::ExternalImage(w) => w.digest(scene),
            WidgetKind::Symbol(w) => w.digest(scene),
            WidgetKind::NavigationButton(w) => w.digest(fill, scene),
            WidgetKind::Compound(_) => Ok(()),
        }
    }
}
