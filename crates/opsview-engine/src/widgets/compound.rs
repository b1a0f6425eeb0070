//! Group widget containing a nested `Elements` subtree.
//!
//! The nested widgets live in the display's flat widget list and register
//! into the display-level trigger index; the compound itself only anchors
//! their shared scene group and remembers which widgets it contains.

#[derive(Debug, Default)]
pub struct Compound {
    /// Sequence numbers of the directly nested widgets.
    pub children: Vec<u32>,
}

impl Compound {
    pub fn new() -> Self {
        Self::default()
    }
}
