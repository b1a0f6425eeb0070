//! Retained scene graph — the render surface widgets draw into.
//!
//! Widgets build their nodes once during display construction and mutate
//! them in place during digest; nothing is ever re-laid-out wholesale. Child
//! order within a parent is the draw order. `to_svg` serialises the whole
//! scene for hosts that want a snapshot.

use opsview_model::Color;
use tracing::warn;

/// Stable handle to one scene node; this is the opaque rendered handle a
/// widget keeps between digests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SceneId(usize);

/// Geometry payload per node type. Attributes (fill, stroke, class, font)
/// live in the generic attribute list instead.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Group,
    Rect {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
    },
    Text {
        x: f64,
        y: f64,
        content: String,
    },
    Polyline {
        points: Vec<(f64, f64)>,
    },
    /// A stroked path of disjoint segments. Trend traces use this so an
    /// expired-parameter gap renders as a break, not an interpolated line.
    Path {
        segments: Vec<Vec<(f64, f64)>>,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
    Image {
        x: f64,
        y: f64,
        width: f64,
        height: f64,
        href: String,
    },
}

#[derive(Debug, Clone)]
struct SceneNode {
    kind: NodeKind,
    attributes: Vec<(String, String)>,
    children: Vec<SceneId>,
    translate: (f64, f64),
}

/// The retained scene for one display surface.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: Vec<SceneNode>,
    width: f64,
    height: f64,
}

impl Scene {
    /// A new scene with an empty root group.
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            nodes: vec![SceneNode {
                kind: NodeKind::Group,
                attributes: Vec::new(),
                children: Vec::new(),
                translate: (0.0, 0.0),
            }],
            width,
            height,
        }
    }

    pub fn root(&self) -> SceneId {
        SceneId(0)
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Append a node under `parent` and return its handle.
    pub fn add(&mut self, parent: SceneId, kind: NodeKind) -> SceneId {
        let id = SceneId(self.nodes.len());
        self.nodes.push(SceneNode {
            kind,
            attributes: Vec::new(),
            children: Vec::new(),
            translate: (0.0, 0.0),
        });
        self.nodes[parent.0].children.push(id);
        id
    }

    pub fn kind(&self, id: SceneId) -> &NodeKind {
        &self.nodes[id.0].kind
    }

    /// Set or replace a presentation attribute.
    pub fn set_attr(&mut self, id: SceneId, name: &str, value: impl Into<String>) {
        let attrs = &mut self.nodes[id.0].attributes;
        let value = value.into();
        match attrs.iter_mut().find(|(k, _)| k == name) {
            Some(entry) => entry.1 = value,
            None => attrs.push((name.to_string(), value)),
        }
    }

    pub fn attr(&self, id: SceneId, name: &str) -> Option<&str> {
        self.nodes[id.0]
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn set_fill(&mut self, id: SceneId, color: Color) {
        self.set_attr(id, "fill", color.to_string());
    }

    pub fn set_stroke(&mut self, id: SceneId, color: Color) {
        self.set_attr(id, "stroke", color.to_string());
    }

    pub fn set_class(&mut self, id: SceneId, class: &str) {
        self.set_attr(id, "class", class);
    }

    /// Replace the text content of a Text node.
    pub fn set_text_content(&mut self, id: SceneId, text: impl Into<String>) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Text { content, .. } => *content = text.into(),
            other => warn!("set_text_content on non-text node {:?}", other),
        }
    }

    /// Replace the point list of a Polyline node.
    pub fn set_points(&mut self, id: SceneId, new_points: Vec<(f64, f64)>) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Polyline { points } => *points = new_points,
            other => warn!("set_points on non-polyline node {:?}", other),
        }
    }

    /// Replace the segment list of a Path node.
    pub fn set_segments(&mut self, id: SceneId, new_segments: Vec<Vec<(f64, f64)>>) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Path { segments } => *segments = new_segments,
            other => warn!("set_segments on non-path node {:?}", other),
        }
    }

    /// Replace the href of an Image node.
    pub fn set_href(&mut self, id: SceneId, new_href: impl Into<String>) {
        match &mut self.nodes[id.0].kind {
            NodeKind::Image { href, .. } => *href = new_href.into(),
            other => warn!("set_href on non-image node {:?}", other),
        }
    }

    pub fn set_translate(&mut self, id: SceneId, x: f64, y: f64) {
        self.nodes[id.0].translate = (x, y);
    }

    pub fn translate(&self, id: SceneId) -> (f64, f64) {
        self.nodes[id.0].translate
    }

    /// Serialise the scene as a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\" \
             width=\"{}\" height=\"{}\">\n",
            self.width, self.height
        ));
        self.write_node(self.root(), 1, &mut out);
        out.push_str("</svg>\n");
        out
    }

    fn write_node(&self, id: SceneId, depth: usize, out: &mut String) {
        let node = &self.nodes[id.0];
        let indent = "  ".repeat(depth);

        let mut extra = String::new();
        if node.translate != (0.0, 0.0) {
            extra.push_str(&format!(
                " transform=\"translate({},{})\"",
                node.translate.0, node.translate.1
            ));
        }
        for (k, v) in &node.attributes {
            extra.push_str(&format!(" {}=\"{}\"", k, escape(v)));
        }

        match &node.kind {
            NodeKind::Group => {
                out.push_str(&format!("{}<g{}>\n", indent, extra));
                for &child in &node.children {
                    self.write_node(child, depth + 1, out);
                }
                out.push_str(&format!("{}</g>\n", indent));
            }
            NodeKind::Rect { x, y, width, height } => {
                out.push_str(&format!(
                    "{}<rect x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\"{}/>\n",
                    indent, x, y, width, height, extra
                ));
            }
            NodeKind::Text { x, y, content } => {
                out.push_str(&format!(
                    "{}<text x=\"{}\" y=\"{}\"{}>{}</text>\n",
                    indent,
                    x,
                    y,
                    extra,
                    escape(content)
                ));
            }
            NodeKind::Polyline { points } => {
                let pts: Vec<String> =
                    points.iter().map(|(x, y)| format!("{},{}", x, y)).collect();
                out.push_str(&format!(
                    "{}<polyline points=\"{}\"{}/>\n",
                    indent,
                    pts.join(" "),
                    extra
                ));
            }
            NodeKind::Path { segments } => {
                let mut d = String::new();
                for segment in segments {
                    for (i, (x, y)) in segment.iter().enumerate() {
                        let op = if i == 0 { 'M' } else { 'L' };
                        d.push_str(&format!("{}{} {} ", op, x, y));
                    }
                }
                out.push_str(&format!(
                    "{}<path d=\"{}\"{}/>\n",
                    indent,
                    d.trim_end(),
                    extra
                ));
            }
            NodeKind::Circle { cx, cy, r } => {
                out.push_str(&format!(
                    "{}<circle cx=\"{}\" cy=\"{}\" r=\"{}\"{}/>\n",
                    indent, cx, cy, r, extra
                ));
            }
            NodeKind::Image { x, y, width, height, href } => {
                out.push_str(&format!(
                    "{}<image x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" \
                     xlink:href=\"{}\"{}/>\n",
                    indent,
                    x,
                    y,
                    width,
                    height,
                    escape(href),
                    extra
                ));
            }
        }
    }
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_order_is_draw_order() {
        let mut scene = Scene::new(100.0, 100.0);
        let root = scene.root();
        scene.add(root, NodeKind::Rect { x: 0.0, y: 0.0, width: 10.0, height: 10.0 });
        scene.add(
            root,
            NodeKind::Text { x: 5.0, y: 5.0, content: "hi".into() },
        );
        let svg = scene.to_svg();
        let rect_at = svg.find("<rect").unwrap();
        let text_at = svg.find("<text").unwrap();
        assert!(rect_at < text_at);
    }

    #[test]
    fn test_mutation_in_place() {
        let mut scene = Scene::new(100.0, 100.0);
        let root = scene.root();
        let t = scene.add(
            root,
            NodeKind::Text { x: 0.0, y: 0.0, content: "old".into() },
        );
        scene.set_text_content(t, "3.14");
        scene.set_class(t, "nominal-foreground");
        let svg = scene.to_svg();
        assert!(svg.contains(">3.14</text>"));
        assert!(svg.contains("class=\"nominal-foreground\""));
        assert!(!svg.contains("old"));
    }

    #[test]
    fn test_translate_rendered_as_transform() {
        let mut scene = Scene::new(100.0, 100.0);
        let g = scene.add(scene.root(), NodeKind::Group);
        scene.set_translate(g, 12.0, 34.0);
        assert!(scene.to_svg().contains("translate(12,34)"));
    }

    #[test]
    fn test_text_is_escaped() {
        let mut scene = Scene::new(10.0, 10.0);
        let root = scene.root();
        scene.add(
            root,
            NodeKind::Text { x: 0.0, y: 0.0, content: "a<b & c".into() },
        );
        assert!(scene.to_svg().contains("a&lt;b &amp; c"));
    }
}
