//! Display frames: window chrome and stacking for open displays.
//!
//! A thin coordinating layer over [`Display`]: each frame adds a title bar,
//! can be dragged by it, and participates in a bottom-to-top stacking
//! order. Navigation-button clicks are executed here because opening a
//! display means opening a new frame.

use anyhow::Context;
use opsview_model::parse_markup;
use tracing::{debug, warn};

use crate::commands::PressCommand;
use crate::display::Display;
use crate::resource::ResourceResolver;

pub const TITLE_BAR_HEIGHT: f64 = 20.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameId(u32);

pub struct DisplayFrame {
    pub id: FrameId,
    pub title: String,
    pub x: f64,
    pub y: f64,
    /// Outer size, title bar included.
    pub width: f64,
    pub height: f64,
    pub display: Display,
}

impl DisplayFrame {
    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.width && py >= self.y && py < self.y + self.height
    }

    pub fn in_title_bar(&self, px: f64, py: f64) -> bool {
        self.contains(px, py) && py < self.y + TITLE_BAR_HEIGHT
    }
}

struct DragState {
    id: FrameId,
    grab_dx: f64,
    grab_dy: f64,
}

/// All open frames, bottom to top.
#[derive(Default)]
pub struct FrameStack {
    frames: Vec<DisplayFrame>,
    order: Vec<FrameId>,
    next_id: u32,
    drag: Option<DragState>,
}

impl FrameStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a display in a new topmost frame at the given position.
    pub fn open(&mut self, display: Display, x: f64, y: f64) -> FrameId {
        let id = FrameId(self.next_id);
        self.next_id += 1;
        let frame = DisplayFrame {
            id,
            title: display.title.clone(),
            x,
            y,
            width: display.width,
            height: display.height + TITLE_BAR_HEIGHT,
            display,
        };
        debug!("opening frame '{}' at ({}, {})", frame.title, x, y);
        self.frames.push(frame);
        self.order.push(id);
        id
    }

    /// Close a frame and disconnect its display's routing state.
    pub fn close(&mut self, id: FrameId) -> bool {
        let Some(position) = self.frames.iter().position(|f| f.id == id) else {
            return false;
        };
        let mut frame = self.frames.remove(position);
        frame.display.disconnect();
        self.order.retain(|&o| o != id);
        if self.drag.as_ref().map(|d| d.id) == Some(id) {
            self.drag = None;
        }
        true
    }

    pub fn bring_to_front(&mut self, id: FrameId) {
        if self.order.contains(&id) {
            self.order.retain(|&o| o != id);
            self.order.push(id);
        }
    }

    /// Stacking order, bottom to top.
    pub fn order(&self) -> &[FrameId] {
        &self.order
    }

    pub fn top(&self) -> Option<FrameId> {
        self.order.last().copied()
    }

    pub fn frame(&self, id: FrameId) -> Option<&DisplayFrame> {
        self.frames.iter().find(|f| f.id == id)
    }

    pub fn frame_mut(&mut self, id: FrameId) -> Option<&mut DisplayFrame> {
        self.frames.iter_mut().find(|f| f.id == id)
    }

    /// Topmost frame under the point, title bar included.
    pub fn frame_at(&self, px: f64, py: f64) -> Option<FrameId> {
        self.order
            .iter()
            .rev()
            .copied()
            .find(|&id| self.frame(id).map(|f| f.contains(px, py)).unwrap_or(false))
    }

    // ── Dragging ─────────────────────────────────────────────────────────────

    /// Start a title-bar drag. Raises the frame. Returns false when the
    /// point is not on the frame's title bar.
    pub fn begin_drag(&mut self, id: FrameId, px: f64, py: f64) -> bool {
        let Some(frame) = self.frame(id) else {
            return false;
        };
        if !frame.in_title_bar(px, py) {
            return false;
        }
        self.drag = Some(DragState {
            id,
            grab_dx: px - frame.x,
            grab_dy: py - frame.y,
        });
        self.bring_to_front(id);
        true
    }

    pub fn drag_to(&mut self, px: f64, py: f64) {
        let Some(drag) = &self.drag else {
            return;
        };
        let (id, dx, dy) = (drag.id, drag.grab_dx, drag.grab_dy);
        if let Some(frame) = self.frame_mut(id) {
            frame.x = px - dx;
            frame.y = py - dy;
        }
    }

    pub fn end_drag(&mut self) {
        self.drag = None;
    }

    // ── Navigation ───────────────────────────────────────────────────────────

    /// Execute the press command of a navigation button in `frame`. An
    /// OpenDisplay command loads the target markup through the resolver and
    /// opens it as a new frame at the command's coordinates; CloseDisplay is
    /// a placeholder pending host integration.
    pub fn click_navigation(
        &mut self,
        frame_id: FrameId,
        widget_name: &str,
        resolver: &dyn ResourceResolver,
    ) -> anyhow::Result<Option<FrameId>> {
        let command = self
            .frame(frame_id)
            .and_then(|f| f.display.button_command(widget_name))
            .cloned();

        match command {
            Some(PressCommand::OpenDisplay { basename, x, y }) => {
                let path = format!("{}.uss", basename);
                let xml = resolver
                    .resolve(&path)
                    .with_context(|| format!("loading display '{}'", basename))?;
                let doc = parse_markup(&xml)?;
                let mut display = Display::new();
                display.parse_and_draw(&doc, Some(resolver))?;
                Ok(Some(self.open(display, x, y)))
            }
            Some(PressCommand::CloseDisplay) => {
                debug!("CloseDisplay pending host integration");
                Ok(None)
            }
            None => {
                warn!("no navigation button '{}' in frame", widget_name);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_display(title: &str) -> Display {
        let xml = format!(
            r#"<Display>
                <Title>{title}</Title>
                <Width>200</Width>
                <Height>100</Height>
                <Elements/>
            </Display>"#
        );
        let doc = parse_markup(&xml).unwrap();
        let mut display = Display::new();
        display.parse_and_draw(&doc, None).unwrap();
        display
    }

    #[test]
    fn test_open_close_and_order() {
        let mut stack = FrameStack::new();
        let a = stack.open(blank_display("a"), 0.0, 0.0);
        let b = stack.open(blank_display("b"), 50.0, 50.0);
        assert_eq!(stack.order(), &[a, b]);
        assert_eq!(stack.top(), Some(b));

        stack.bring_to_front(a);
        assert_eq!(stack.order(), &[b, a]);

        assert!(stack.close(b));
        assert_eq!(stack.order(), &[a]);
        assert!(!stack.close(b));
    }

    #[test]
    fn test_frame_at_prefers_topmost() {
        let mut stack = FrameStack::new();
        let a = stack.open(blank_display("a"), 0.0, 0.0);
        let b = stack.open(blank_display("b"), 10.0, 10.0);
        // both frames cover (20, 30); b is on top
        assert_eq!(stack.frame_at(20.0, 30.0), Some(b));
        stack.bring_to_front(a);
        assert_eq!(stack.frame_at(20.0, 30.0), Some(a));
        assert_eq!(stack.frame_at(999.0, 999.0), None);
    }

    #[test]
    fn test_drag_moves_frame_by_title_bar_only() {
        let mut stack = FrameStack::new();
        let a = stack.open(blank_display("a"), 100.0, 100.0);

        // grab below the title bar does nothing
        assert!(!stack.begin_drag(a, 110.0, 150.0));

        assert!(stack.begin_drag(a, 110.0, 105.0));
        stack.drag_to(210.0, 155.0);
        stack.end_drag();
        let frame = stack.frame(a).unwrap();
        assert_eq!((frame.x, frame.y), (200.0, 150.0));
    }

    #[test]
    fn test_click_navigation_opens_target_frame() {
        let dir = tempfile::tempdir().unwrap();
        let target = r#"<Display>
            <Title>target</Title>
            <Width>120</Width>
            <Height>80</Height>
            <Elements/>
        </Display>"#;
        std::fs::write(dir.path().join("detail.uss"), target).unwrap();
        let resolver = crate::resource::DirectoryResolver::new(dir.path());

        let source = r#"<Display>
            <Title>source</Title>
            <Width>200</Width>
            <Height>100</Height>
            <Elements>
                <NavigationButton>
                    <Name>go</Name>
                    <X>0</X><Y>0</Y><Width>60</Width><Height>20</Height>
                    <PressCommand class="OpenDisplayCommand">
                        <DisplayBasename>detail</DisplayBasename>
                        <X>30</X>
                        <Y>40</Y>
                    </PressCommand>
                    <FillStyle>
                        <Pattern>SOLID</Pattern>
                        <Color><red>200</red><green>200</green><blue>200</blue><alpha>255</alpha></Color>
                    </FillStyle>
                </NavigationButton>
            </Elements>
        </Display>"#;
        let doc = parse_markup(source).unwrap();
        let mut display = Display::new();
        display.parse_and_draw(&doc, Some(&resolver)).unwrap();

        let mut stack = FrameStack::new();
        let main = stack.open(display, 0.0, 0.0);
        let opened = stack
            .click_navigation(main, "go", &resolver)
            .unwrap()
            .expect("a new frame");

        let frame = stack.frame(opened).unwrap();
        assert_eq!(frame.title, "target");
        assert_eq!((frame.x, frame.y), (30.0, 40.0));
        assert_eq!(stack.top(), Some(opened));
    }
}
