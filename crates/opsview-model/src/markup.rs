//! In-memory model of a parsed display markup document.
//!
//! Nodes live in a flat arena inside [`MarkupDocument`]; a [`NodeRef`] is a
//! cheap copyable handle combining the document with a [`NodeId`]. Parent
//! links are kept so `..` reference tokens can walk upward without any
//! shared-ownership cycles.
//!
//! Accessor contract (used throughout the engine):
//! - required lookups (`find_child`, `parse_*_child`) fail with
//!   [`MarkupError::NotFound`] when the child is absent;
//! - the `*_or` variants return the given default instead;
//! - a present child whose text does not parse fails with
//!   [`MarkupError::Malformed`] in both modes.

use quick_xml::events::Event;
use quick_xml::Reader;

use crate::color::Color;
use crate::error::MarkupError;

/// Index of a node within its [`MarkupDocument`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Debug, Clone)]
struct NodeData {
    tag: String,
    attributes: Vec<(String, String)>,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
    text: String,
}

/// A parsed markup document. The root element is the node the document
/// started with (`<Display>` for panel files, `<library>` for symbol files).
#[derive(Debug, Clone)]
pub struct MarkupDocument {
    nodes: Vec<NodeData>,
}

impl MarkupDocument {
    /// Handle to the root element.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef { doc: self, id: NodeId(0) }
    }

    /// Handle to an arbitrary node.
    pub fn node(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { doc: self, id }
    }

    fn data(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0]
    }
}

/// Parse XML text into a [`MarkupDocument`].
///
/// Element text is whitespace-trimmed; multiple text runs within one element
/// are concatenated. Processing instructions and comments are skipped.
pub fn parse_markup(xml: &str) -> Result<MarkupDocument, MarkupError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut nodes: Vec<NodeData> = Vec::new();
    let mut stack: Vec<NodeId> = Vec::new();
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let id = push_node(&mut nodes, &stack, e)?;
                stack.push(id);
            }
            Ok(Event::Empty(ref e)) => {
                push_node(&mut nodes, &stack, e)?;
            }
            Ok(Event::End(_)) => {
                stack.pop();
            }
            Ok(Event::Text(ref t)) => {
                if let Some(&id) = stack.last() {
                    let text = t
                        .unescape()
                        .map_err(|e| MarkupError::Syntax(e.to_string()))?;
                    nodes[id.0].text.push_str(&text);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(MarkupError::Syntax(format!(
                    "at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
        buf.clear();
    }

    if nodes.is_empty() {
        return Err(MarkupError::Syntax("document has no root element".into()));
    }
    Ok(MarkupDocument { nodes })
}

fn push_node(
    nodes: &mut Vec<NodeData>,
    stack: &[NodeId],
    e: &quick_xml::events::BytesStart<'_>,
) -> Result<NodeId, MarkupError> {
    let tag = String::from_utf8_lossy(e.name().as_ref()).into_owned();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|e| MarkupError::Syntax(e.to_string()))?;
        attributes.push((
            String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
            String::from_utf8_lossy(&attr.value).into_owned(),
        ));
    }

    let id = NodeId(nodes.len());
    let parent = stack.last().copied();
    nodes.push(NodeData {
        tag,
        attributes,
        children: Vec::new(),
        parent,
        text: String::new(),
    });
    if let Some(p) = parent {
        nodes[p.0].children.push(id);
    }
    Ok(id)
}

/// Copyable handle to one node of a [`MarkupDocument`].
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a MarkupDocument,
    id: NodeId,
}

impl std::fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{}>", self.tag())
    }
}

impl<'a> NodeRef<'a> {
    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn tag(&self) -> &'a str {
        &self.doc.data(self.id).tag
    }

    /// Concatenated, trimmed text content of this element.
    pub fn text(&self) -> &'a str {
        &self.doc.data(self.id).text
    }

    pub fn parent(&self) -> Option<NodeRef<'a>> {
        self.doc
            .data(self.id)
            .parent
            .map(|id| self.doc.node(id))
    }

    /// All direct children, in document order. Child order is draw-order
    /// relevant for `Elements` subtrees.
    pub fn children(&self) -> impl Iterator<Item = NodeRef<'a>> + '_ {
        self.doc
            .data(self.id)
            .children
            .iter()
            .map(|&id| self.doc.node(id))
    }

    pub fn attribute(&self, name: &str) -> Option<&'a str> {
        self.doc
            .data(self.id)
            .attributes
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn require_attribute(&self, name: &str) -> Result<&'a str, MarkupError> {
        self.attribute(name)
            .ok_or_else(|| MarkupError::Attribute(name.to_string()))
    }

    /// First direct child with an exact tag-name match.
    pub fn find_child(&self, name: &str) -> Result<NodeRef<'a>, MarkupError> {
        self.children()
            .find(|c| c.tag() == name)
            .ok_or_else(|| MarkupError::NotFound(name.to_string()))
    }

    pub fn has_child(&self, name: &str) -> bool {
        self.children().any(|c| c.tag() == name)
    }

    /// All direct children with a matching tag name, order preserved.
    pub fn find_children(&self, name: &str) -> Vec<NodeRef<'a>> {
        self.children().filter(|c| c.tag() == name).collect()
    }

    // ── Typed child extraction ───────────────────────────────────────────────

    pub fn parse_string_child(&self, name: &str) -> Result<String, MarkupError> {
        Ok(self.find_child(name)?.text().to_string())
    }

    pub fn parse_string_child_or(&self, name: &str, default: &str) -> String {
        match self.find_child(name) {
            Ok(c) => c.text().to_string(),
            Err(_) => default.to_string(),
        }
    }

    pub fn parse_int_child(&self, name: &str) -> Result<i32, MarkupError> {
        let child = self.find_child(name)?;
        parse_int(child.text(), name)
    }

    pub fn parse_int_child_or(&self, name: &str, default: i32) -> Result<i32, MarkupError> {
        match self.find_child(name) {
            Ok(c) => parse_int(c.text(), name),
            Err(_) => Ok(default),
        }
    }

    pub fn parse_float_child(&self, name: &str) -> Result<f64, MarkupError> {
        let child = self.find_child(name)?;
        parse_float(child.text(), name)
    }

    pub fn parse_float_child_or(&self, name: &str, default: f64) -> Result<f64, MarkupError> {
        match self.find_child(name) {
            Ok(c) => parse_float(c.text(), name),
            Err(_) => Ok(default),
        }
    }

    /// Boolean extraction. Compatibility requires the exact, case-sensitive
    /// comparison `text == "true"`; `"True"` and `"1"` are false.
    pub fn parse_boolean_child(&self, name: &str) -> Result<bool, MarkupError> {
        Ok(self.find_child(name)?.text() == "true")
    }

    pub fn parse_boolean_child_or(&self, name: &str, default: bool) -> bool {
        match self.find_child(name) {
            Ok(c) => c.text() == "true",
            Err(_) => default,
        }
    }

    pub fn parse_color_child(&self, name: &str) -> Result<Color, MarkupError> {
        parse_color_node(self.find_child(name)?)
    }

    pub fn parse_color_child_or(&self, name: &str, default: Color) -> Result<Color, MarkupError> {
        match self.find_child(name) {
            Ok(c) => parse_color_node(c),
            Err(_) => Ok(default),
        }
    }

    // ── Reference resolution ─────────────────────────────────────────────────

    /// Substitute the node this one's `reference` attribute points at, or
    /// return the node unchanged when it carries no reference.
    ///
    /// Consumers that read attributes or children of an arbitrary element
    /// must go through this first; references can appear on any node.
    pub fn deref(&self) -> Result<NodeRef<'a>, MarkupError> {
        if self.attribute("reference").is_some() {
            self.resolve_reference()
        } else {
            Ok(*self)
        }
    }

    /// Walk this node's `reference` attribute token by token.
    ///
    /// Tokens are `..` (parent) or `Name[index]` with a 1-based index that
    /// defaults to the first same-named sibling. Resolution is purely
    /// structural and fails with [`MarkupError::Reference`] when a segment
    /// does not exist.
    pub fn resolve_reference(&self) -> Result<NodeRef<'a>, MarkupError> {
        let path = self.require_attribute("reference")?;
        let mut node = *self;

        for token in path.split('/') {
            if token == ".." {
                node = node.parent().ok_or_else(|| MarkupError::Reference {
                    path: path.to_string(),
                    reason: "no such parent".to_string(),
                })?;
            } else {
                let (name, index) = parse_reference_token(token, path)?;
                let matches = node.find_children(name);
                node = *matches.get(index).ok_or_else(|| MarkupError::Reference {
                    path: path.to_string(),
                    reason: format!("no child '{}' with index {}", name, index + 1),
                })?;
            }
        }
        Ok(node)
    }
}

/// Split a `Name[index]` token into its name and 0-based index.
fn parse_reference_token<'t>(
    token: &'t str,
    path: &str,
) -> Result<(&'t str, usize), MarkupError> {
    match token.find('[') {
        Some(open) => {
            let close = token[open..].find(']').map(|i| open + i).ok_or_else(|| {
                MarkupError::Reference {
                    path: path.to_string(),
                    reason: format!("unterminated index in token '{}'", token),
                }
            })?;
            let idx: usize =
                token[open + 1..close]
                    .parse()
                    .map_err(|_| MarkupError::Reference {
                        path: path.to_string(),
                        reason: format!("bad index in token '{}'", token),
                    })?;
            if idx == 0 {
                return Err(MarkupError::Reference {
                    path: path.to_string(),
                    reason: format!("index in token '{}' is 1-based", token),
                });
            }
            Ok((&token[..open], idx - 1))
        }
        None => Ok((token, 0)),
    }
}

/// Read a color element with `red`/`green`/`blue`/`alpha` integer children.
pub fn parse_color_node(node: NodeRef<'_>) -> Result<Color, MarkupError> {
    let component = |name: &'static str| -> Result<u8, MarkupError> {
        let child = node.find_child(name)?;
        child
            .text()
            .parse::<u8>()
            .map_err(|_| MarkupError::Malformed {
                kind: "color component",
                text: child.text().to_string(),
                element: name.to_string(),
            })
    };
    Ok(Color::new(
        component("red")?,
        component("green")?,
        component("blue")?,
        component("alpha")?,
    ))
}

fn parse_int(text: &str, element: &str) -> Result<i32, MarkupError> {
    text.trim()
        .parse::<i32>()
        .map_err(|_| MarkupError::Malformed {
            kind: "integer",
            text: text.to_string(),
            element: element.to_string(),
        })
}

fn parse_float(text: &str, element: &str) -> Result<f64, MarkupError> {
    text.trim()
        .parse::<f64>()
        .map_err(|_| MarkupError::Malformed {
            kind: "float",
            text: text.to_string(),
            element: element.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"
        <Display>
            <Width>800</Width>
            <Height>600</Height>
            <Visible>true</Visible>
            <Hidden>True</Hidden>
            <BackgroundColor>
                <red>212</red>
                <green>212</green>
                <blue>212</blue>
                <alpha>255</alpha>
            </BackgroundColor>
            <Elements>
                <Label><Name>first</Name></Label>
                <Label><Name>second</Name></Label>
                <Rectangle>
                    <Name>box</Name>
                    <Peer reference="../../Label[2]"/>
                </Rectangle>
            </Elements>
        </Display>"#;

    #[test]
    fn test_find_child_and_missing() {
        let doc = parse_markup(DOC).unwrap();
        let root = doc.root();
        assert_eq!(root.find_child("Width").unwrap().text(), "800");
        assert!(matches!(
            root.find_child("Nope"),
            Err(MarkupError::NotFound(_))
        ));
    }

    #[test]
    fn test_typed_extraction_two_mode() {
        let doc = parse_markup(DOC).unwrap();
        let root = doc.root();
        assert_eq!(root.parse_int_child("Width").unwrap(), 800);
        assert_eq!(root.parse_int_child_or("Margin", 7).unwrap(), 7);
        assert!(root.parse_int_child("Margin").is_err());
        assert_eq!(root.parse_float_child("Height").unwrap(), 600.0);
        assert_eq!(
            root.parse_string_child_or("Title", "untitled"),
            "untitled"
        );
    }

    #[test]
    fn test_boolean_is_case_sensitive() {
        let doc = parse_markup(DOC).unwrap();
        let root = doc.root();
        assert!(root.parse_boolean_child("Visible").unwrap());
        // "True" is not "true"
        assert!(!root.parse_boolean_child("Hidden").unwrap());
        assert!(root.parse_boolean_child_or("Gone", true));
    }

    #[test]
    fn test_color_parse() {
        let doc = parse_markup(DOC).unwrap();
        let c = doc.root().parse_color_child("BackgroundColor").unwrap();
        assert_eq!(c, Color::new(212, 212, 212, 255));
    }

    #[test]
    fn test_reference_round_trip() {
        let doc = parse_markup(DOC).unwrap();
        let elements = doc.root().find_child("Elements").unwrap();
        let rect = elements.find_child("Rectangle").unwrap();
        let peer = rect.find_child("Peer").unwrap();

        let resolved = peer.resolve_reference().unwrap();
        let manual = elements.find_children("Label")[1];
        assert_eq!(resolved.id(), manual.id());
        assert_eq!(resolved.find_child("Name").unwrap().text(), "second");

        // deref is a no-op on nodes without a reference
        assert_eq!(rect.deref().unwrap().id(), rect.id());
    }

    #[test]
    fn test_reference_failures() {
        let xml = r#"
            <Root>
                <A><B reference="../A[3]"/></A>
                <C reference=".."/>
                <D reference="Missing[1]"/>
            </Root>"#;
        let doc = parse_markup(xml).unwrap();
        let root = doc.root();

        let b = root.find_child("A").unwrap().find_child("B").unwrap();
        assert!(matches!(
            b.resolve_reference(),
            Err(MarkupError::Reference { .. })
        ));

        // ".." from a direct child lands on the root; one more would escape
        let c = root.find_child("C").unwrap();
        assert_eq!(c.resolve_reference().unwrap().id(), root.id());

        let d = root.find_child("D").unwrap();
        assert!(matches!(
            d.resolve_reference(),
            Err(MarkupError::Reference { .. })
        ));
    }

    #[test]
    fn test_children_order_preserved() {
        let doc = parse_markup(DOC).unwrap();
        let elements = doc.root().find_child("Elements").unwrap();
        let tags: Vec<&str> = elements.children().map(|c| c.tag()).collect();
        assert_eq!(tags, vec!["Label", "Label", "Rectangle"]);
    }
}
