//! Display — single owner of the widget tree for one panel.
//!
//! All mutable state lives here: the flattened widget list, the trigger
//! index routing inbound samples to dependent widgets, and the retained
//! scene. Inputs arrive as parameter-sample values; the two-phase
//! dispatch/digest split coalesces bursts of same-widget updates into a
//! single redraw, so redraw cost is bounded by the number of distinct dirty
//! widgets rather than the sample rate.

use std::collections::{BTreeSet, HashMap};

use opsview_model::markup::{MarkupDocument, NodeRef};
use opsview_model::{Color, MarkupError, ParameterSample};
use serde::Serialize;
use tracing::{debug, warn};

use crate::binding::{ComputationArg, DataSourceBinding};
use crate::commands::PressCommand;
use crate::resource::ResourceResolver;
use crate::scene::{NodeKind, Scene, SceneId};
use crate::symbol::SymbolCache;
use crate::widgets::{
    build_widget, parse_standard_options, StandardOptions, Widget, WidgetContext, WidgetError,
    WidgetKind, WidgetTag,
};

const DEFAULT_BACKGROUND: Color = Color::new(212, 212, 212, 255);

/// Derived-parameter definition for the hosting application to register
/// with its data source, mirroring the subscription set for plain
/// parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ComputationDef {
    pub name: String,
    pub expression: String,
    pub args: Vec<ComputationArg>,
}

/// One panel: widget tree, trigger index, scene.
pub struct Display {
    pub title: String,
    pub width: f64,
    pub height: f64,
    pub background: Color,
    widgets: Vec<Widget>,
    /// opsName → indices of widgets to notify. Entries are deduplicated per
    /// widget, so a widget gets exactly one notification per inbound sample.
    trigger_index: HashMap<String, Vec<usize>>,
    ops_names: BTreeSet<String>,
    computations: Vec<ComputationDef>,
    scene: Scene,
    symbols: SymbolCache,
    next_seq: u32,
    computation_count: u32,
}

impl Default for Display {
    fn default() -> Self {
        Self::new()
    }
}

impl Display {
    pub fn new() -> Self {
        Self {
            title: String::new(),
            width: 0.0,
            height: 0.0,
            background: DEFAULT_BACKGROUND,
            widgets: Vec::new(),
            trigger_index: HashMap::new(),
            ops_names: BTreeSet::new(),
            computations: Vec::new(),
            scene: Scene::new(0.0, 0.0),
            symbols: SymbolCache::new(),
            next_seq: 0,
            computation_count: 0,
        }
    }

    /// Build the widget tree and trigger index from a markup document.
    /// Intended to run once per Display; calling it again replaces
    /// everything.
    pub fn parse_and_draw(
        &mut self,
        doc: &MarkupDocument,
        resolver: Option<&dyn ResourceResolver>,
    ) -> Result<(), MarkupError> {
        let root = doc.root();
        if root.tag() != "Display" {
            return Err(MarkupError::NotFound("Display".to_string()));
        }

        self.widgets.clear();
        self.trigger_index.clear();
        self.ops_names.clear();
        self.computations.clear();
        self.next_seq = 0;
        self.computation_count = 0;

        self.title = root.parse_string_child_or("Title", "Untitled");
        self.width = root.parse_float_child("Width")?;
        self.height = root.parse_float_child("Height")?;
        self.background = root.parse_color_child_or("BackgroundColor", DEFAULT_BACKGROUND)?;

        self.scene = Scene::new(self.width, self.height);
        let root_id = self.scene.root();
        let backdrop = self.scene.add(
            root_id,
            NodeKind::Rect {
                x: 0.0,
                y: 0.0,
                width: self.width,
                height: self.height,
            },
        );
        self.scene.set_fill(backdrop, self.background);

        let elements = root.find_child("Elements")?;
        self.draw_elements(elements, root_id, resolver);
        Ok(())
    }

    /// Construct and attach the widgets of one `Elements` level.
    ///
    /// Construction happens in document order (assigning sequence numbers),
    /// then attachment follows the stable sort by `(depth, seq)`: depth is
    /// the author's z-order, the sequence number breaks ties, and the result
    /// is reproducible independent of any map iteration order. Returns the
    /// sequence numbers built at this level.
    fn draw_elements(
        &mut self,
        elements: NodeRef<'_>,
        parent: SceneId,
        resolver: Option<&dyn ResourceResolver>,
    ) -> Vec<u32> {
        struct PendingElement<'a> {
            tag: WidgetTag,
            node: NodeRef<'a>,
            opts: StandardOptions,
            seq: u32,
        }

        let mut pending = Vec::new();
        for element in elements.children() {
            let Some(tag) = WidgetTag::from_element(element) else {
                warn!("unsupported element '{}', skipping", element.tag());
                continue;
            };
            // a reference substitutes another node before construction
            let node = match element.deref() {
                Ok(node) => node,
                Err(e) => {
                    warn!("cannot resolve element '{}': {}, skipping", element.tag(), e);
                    continue;
                }
            };
            let opts = match parse_standard_options(node) {
                Ok(opts) => opts,
                Err(e) => {
                    warn!("malformed '{}' element: {}, skipping", element.tag(), e);
                    continue;
                }
            };
            let seq = self.next_seq;
            self.next_seq += 1;
            pending.push(PendingElement { tag, node, opts, seq });
        }

        pending.sort_by_key(|p| (p.opts.depth, p.seq));

        let mut level = Vec::new();
        for p in pending {
            let mut ctx = WidgetContext {
                resolver,
                symbols: &mut self.symbols,
            };
            let widget = match build_widget(
                p.seq,
                p.tag,
                p.node,
                p.opts,
                &mut self.scene,
                &mut ctx,
                parent,
            ) {
                Ok(widget) => widget,
                Err(e) => {
                    warn!("skipping malformed widget (seq {}): {}", p.seq, e);
                    continue;
                }
            };

            level.push(widget.seq);
            let index = self.widgets.len();
            let handle = widget.handle;
            self.widgets.push(widget);
            self.register_widget(index);

            if p.tag == WidgetTag::Compound {
                if let Ok(sub) = p.node.find_child("Elements") {
                    let nested = self.draw_elements(sub, handle, resolver);
                    if let WidgetKind::Compound(compound) = &mut self.widgets[index].kind {
                        compound.children = nested;
                    }
                }
            }
        }
        level
    }

    /// Enter a widget's bindings into the trigger index and subscription
    /// set. Parameter bindings register their opsName; computation bindings
    /// register every argument opsName.
    fn register_widget(&mut self, index: usize) {
        let widget = &self.widgets[index];
        let mut names: Vec<String> = Vec::new();
        let mut computations: Vec<(Option<String>, String, Vec<ComputationArg>)> = Vec::new();

        for binding in &widget.bindings {
            match binding {
                DataSourceBinding::Parameter(p) => {
                    if !p.ops_name.is_empty() {
                        names.push(p.ops_name.clone());
                    }
                }
                DataSourceBinding::Computation(c) => {
                    for arg in &c.args {
                        if !arg.ops_name.is_empty() {
                            names.push(arg.ops_name.clone());
                        }
                    }
                    computations.push((c.name.clone(), c.expression.clone(), c.args.clone()));
                }
            }
        }

        names.sort();
        names.dedup();
        for name in names {
            self.ops_names.insert(name.clone());
            let entry = self.trigger_index.entry(name).or_default();
            if !entry.contains(&index) {
                entry.push(index);
            }
        }

        for (name, expression, args) in computations {
            let name = name.unwrap_or_else(|| {
                self.computation_count += 1;
                format!("__computation{}", self.computation_count)
            });
            self.computations.push(ComputationDef { name, expression, args });
        }
    }

    // ── Live updates ─────────────────────────────────────────────────────────

    /// Dispatch phase: route each sample to its dependent widgets and mark
    /// them dirty. Samples with no registered widget cost one map lookup.
    /// Synchronous and non-blocking; no scene mutation happens here.
    pub fn process_parameter_samples(&mut self, samples: &[ParameterSample]) {
        for sample in samples {
            let Some(indices) = self.trigger_index.get(&sample.ops_name) else {
                continue;
            };
            for &index in indices {
                self.widgets[index].update_bindings(sample);
            }
        }
    }

    /// Digest phase: redraw every dirty widget exactly once and clear the
    /// flags. A failing widget is logged and does not stop the others; the
    /// first error is returned after the full pass.
    pub fn digest(&mut self) -> Result<(), WidgetError> {
        let mut first_error = None;
        for widget in &mut self.widgets {
            if !widget.dirty {
                continue;
            }
            if let Err(e) = widget.digest(&mut self.scene) {
                warn!("digest failure on widget '{}': {}", widget.name, e);
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    // ── Host contract ────────────────────────────────────────────────────────

    /// Every parameter name this display depends on — the upstream
    /// subscription request.
    pub fn ops_names(&self) -> &BTreeSet<String> {
        &self.ops_names
    }

    /// Derived-parameter definitions the host must register upstream.
    pub fn computations(&self) -> &[ComputationDef] {
        &self.computations
    }

    /// Drop all routing state. After this the display no longer reacts to
    /// samples; the host should also cancel its upstream subscription.
    pub fn disconnect(&mut self) {
        self.trigger_index.clear();
        self.ops_names.clear();
        self.computations.clear();
        debug!("display '{}' disconnected", self.title);
    }

    // ── Introspection ────────────────────────────────────────────────────────

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget_by_name(&self, name: &str) -> Option<&Widget> {
        self.widgets.iter().find(|w| w.name == name)
    }

    pub fn dirty_count(&self) -> usize {
        self.widgets.iter().filter(|w| w.dirty).count()
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn to_svg(&self) -> String {
        self.scene.to_svg()
    }

    // ── Navigation buttons ───────────────────────────────────────────────────

    /// Press feedback for a named navigation button. Returns false when no
    /// such button exists.
    pub fn press_button(&mut self, name: &str) -> bool {
        let Some(index) = self.widgets.iter().position(|w| w.name == name) else {
            return false;
        };
        match self.widgets[index].navigation_mut() {
            Some(button) => {
                button.press(&mut self.scene);
                true
            }
            None => false,
        }
    }

    pub fn release_button(&mut self, name: &str) -> bool {
        let Some(index) = self.widgets.iter().position(|w| w.name == name) else {
            return false;
        };
        match self.widgets[index].navigation_mut() {
            Some(button) => {
                button.release(&mut self.scene);
                true
            }
            None => false,
        }
    }

    /// The press command of a named navigation button, for the frame layer
    /// to execute on click.
    pub fn button_command(&self, name: &str) -> Option<&PressCommand> {
        self.widget_by_name(name)
            .and_then(|w| w.navigation())
            .map(|b| b.command())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use opsview_model::{parse_markup, AcquisitionStatus, MonitoringResult, Value};

    fn display_from(xml: &str) -> Display {
        let doc = parse_markup(xml).unwrap();
        let mut display = Display::new();
        display.parse_and_draw(&doc, None).unwrap();
        display
    }

    fn sample(ops_name: &str, eng: f64) -> ParameterSample {
        ParameterSample {
            ops_name: ops_name.to_string(),
            raw_value: Value::Float(eng * 100.0),
            eng_value: Value::Float(eng),
            acquisition_status: AcquisitionStatus::Acquired,
            monitoring_result: Some(MonitoringResult::InLimits),
            generation_time: Utc::now(),
        }
    }

    fn label(name: &str, depth: i32) -> String {
        format!(
            r#"<Label>
                <Name>{name}</Name>
                <X>0</X><Y>0</Y><Width>50</Width><Height>10</Height>
                <Depth>{depth}</Depth>
                <Text>{name}</Text>
            </Label>"#
        )
    }

    fn rectangle(name: &str, depth: i32) -> String {
        format!(
            r#"<Rectangle>
                <Name>{name}</Name>
                <X>0</X><Y>0</Y><Width>20</Width><Height>20</Height>
                <Depth>{depth}</Depth>
                <FillStyle>
                    <Pattern>SOLID</Pattern>
                    <Color><red>1</red><green>2</green><blue>3</blue><alpha>255</alpha></Color>
                </FillStyle>
                <DrawStyle>
                    <Pattern>SOLID</Pattern>
                    <Width>2</Width>
                    <Color><red>0</red><green>0</green><blue>0</blue><alpha>255</alpha></Color>
                </DrawStyle>
            </Rectangle>"#
        )
    }

    fn panel(elements: &str) -> String {
        format!(
            r#"<Display>
                <Title>test</Title>
                <Width>400</Width>
                <Height>300</Height>
                <Elements>{elements}</Elements>
            </Display>"#
        )
    }

    fn render_order(display: &Display) -> Vec<String> {
        let svg = display.to_svg();
        let mut found: Vec<(usize, String)> = Vec::new();
        for name in display.widgets().iter().map(|w| w.name.clone()) {
            if let Some(at) = svg.find(&format!("data-name=\"{}\"", name)) {
                found.push((at, name));
            }
        }
        found.sort();
        found.into_iter().map(|(_, name)| name).collect()
    }

    #[test]
    fn test_draw_order_depth_then_declaration() {
        let xml = panel(&format!(
            "{}{}{}",
            label("A", 0),
            label("B", 0),
            rectangle("R", 1)
        ));
        let display = display_from(&xml);
        assert_eq!(render_order(&display), vec!["A", "B", "R"]);

        // swapping declaration order swaps equal-depth widgets only
        let xml = panel(&format!(
            "{}{}{}",
            label("B", 0),
            label("A", 0),
            rectangle("R", 1)
        ));
        let display = display_from(&xml);
        assert_eq!(render_order(&display), vec!["B", "A", "R"]);

        // a negative depth goes below everything
        let xml = panel(&format!(
            "{}{}{}",
            label("A", 0),
            label("B", 0),
            rectangle("R", -1)
        ));
        let display = display_from(&xml);
        assert_eq!(render_order(&display), vec!["R", "A", "B"]);
    }

    #[test]
    fn test_draw_order_is_reproducible() {
        let xml = panel(&format!(
            "{}{}{}{}",
            label("w1", 3),
            label("w2", 0),
            label("w3", 3),
            label("w4", -2)
        ));
        let first = render_order(&display_from(&xml));
        for _ in 0..5 {
            assert_eq!(render_order(&display_from(&xml)), first);
        }
        assert_eq!(first, vec!["w4", "w2", "w1", "w3"]);
    }

    fn field(name: &str, ops: &str) -> String {
        format!(
            r#"<Field>
                <Name>{name}</Name>
                <X>0</X><Y>0</Y><Width>80</Width><Height>16</Height>
                <Depth>0</Depth>
                <Decimals>2</Decimals>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="ExternalDataSource">
                            <Names>
                                <entry><string>Opsname</string><string>{ops}</string></entry>
                            </Names>
                        </DataSource>
                    </DataBinding>
                </DataBindings>
            </Field>"#
        )
    }

    #[test]
    fn test_dispatch_marks_dirty_and_digest_clears() {
        let xml = panel(&field("f1", "TEMP"));
        let mut display = display_from(&xml);
        assert_eq!(
            display.ops_names().iter().map(|s| s.as_str()).collect::<Vec<_>>(),
            vec!["TEMP"]
        );

        // K samples between digests → one dirty widget, one redraw
        let samples: Vec<ParameterSample> =
            (0..10).map(|i| sample("TEMP", i as f64)).collect();
        display.process_parameter_samples(&samples);
        assert_eq!(display.dirty_count(), 1);

        display.digest().unwrap();
        assert_eq!(display.dirty_count(), 0);
        // only the last sample's effect is visible
        assert!(display.to_svg().contains("9.00"));
        assert!(!display.to_svg().contains("8.00"));
    }

    #[test]
    fn test_unknown_ops_name_is_dropped() {
        let xml = panel(&field("f1", "TEMP"));
        let mut display = display_from(&xml);
        display.process_parameter_samples(&[sample("OTHER", 1.0)]);
        assert_eq!(display.dirty_count(), 0);
    }

    #[test]
    fn test_malformed_widget_does_not_block_siblings() {
        // the Rectangle lacks its FillStyle and must be skipped
        let broken = r#"<Rectangle>
            <Name>broken</Name>
            <X>0</X><Y>0</Y><Width>10</Width><Height>10</Height>
        </Rectangle>"#;
        let xml = panel(&format!("{}{}", broken, label("ok", 0)));
        let display = display_from(&xml);
        assert_eq!(display.widgets().len(), 1);
        assert_eq!(display.widgets()[0].name, "ok");
    }

    #[test]
    fn test_unsupported_tag_skipped() {
        let xml = panel(&format!("<Dial><X>0</X></Dial>{}", label("ok", 0)));
        let display = display_from(&xml);
        assert_eq!(display.widgets().len(), 1);
    }

    #[test]
    fn test_compound_flattens_into_trigger_index() {
        let inner = field("inner", "PRESSURE");
        let xml = panel(&format!(
            r#"<Compound>
                <Name>grp</Name>
                <X>10</X><Y>10</Y><Width>100</Width><Height>100</Height>
                <Depth>0</Depth>
                <Elements>{inner}</Elements>
            </Compound>"#
        ));
        let mut display = display_from(&xml);
        assert_eq!(display.widgets().len(), 2);
        assert!(display.ops_names().contains("PRESSURE"));

        display.process_parameter_samples(&[sample("PRESSURE", 5.0)]);
        assert_eq!(display.dirty_count(), 1);
        display.digest().unwrap();
        assert!(display.to_svg().contains("5.00"));
    }

    #[test]
    fn test_disconnect_clears_routing() {
        let xml = panel(&field("f1", "TEMP"));
        let mut display = display_from(&xml);
        display.disconnect();
        assert!(display.ops_names().is_empty());
        display.process_parameter_samples(&[sample("TEMP", 1.0)]);
        assert_eq!(display.dirty_count(), 0);
    }

    #[test]
    fn test_computation_registers_argument_names() {
        let xml = panel(
            r#"<Field>
                <Name>sum</Name>
                <X>0</X><Y>0</Y><Width>80</Width><Height>16</Height>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="Computation">
                            <Expression>a + b</Expression>
                            <Arguments>
                                <ExternalDataSource>
                                    <Names><entry><string>Opsname</string><string>VOLT_A</string></entry></Names>
                                </ExternalDataSource>
                                <ExternalDataSource>
                                    <Names><entry><string>Opsname</string><string>VOLT_B</string></entry></Names>
                                </ExternalDataSource>
                            </Arguments>
                        </DataSource>
                    </DataBinding>
                </DataBindings>
            </Field>"#,
        );
        let mut display = display_from(&xml);
        assert!(display.ops_names().contains("VOLT_A"));
        assert!(display.ops_names().contains("VOLT_B"));
        assert_eq!(display.computations().len(), 1);
        assert_eq!(display.computations()[0].expression, "a + b");

        display.process_parameter_samples(&[sample("VOLT_B", 2.0)]);
        assert_eq!(display.dirty_count(), 1);
    }
}
