//! Symbol libraries: named sets of images, where a dynamic symbol maps
//! parameter values to per-state images.
//!
//! Library files are XML of the form:
//!
//! ```xml
//! <library>
//!   <symbol>
//!     <type>dynamic</type>
//!     <name>led</name>
//!     <image state="ON" default="true">led_on.png</image>
//!     <image state="OFF">led_off.png</image>
//!   </symbol>
//! </library>
//! ```

use std::collections::HashMap;

use opsview_model::{parse_markup, MarkupError};
use tracing::warn;

use crate::resource::ResourceResolver;

#[derive(Debug, Clone)]
pub struct SymbolEntry {
    pub name: String,
    /// "dynamic" symbols switch images by state; anything else is static.
    pub kind: String,
    pub states: HashMap<String, String>,
    pub default_image: Option<String>,
}

impl SymbolEntry {
    /// Image for a given parameter value, falling back to the default.
    pub fn image_for(&self, state: &str) -> Option<&str> {
        self.states
            .get(state)
            .or(self.default_image.as_ref())
            .map(|s| s.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct SymbolLibrary {
    pub name: String,
    symbols: HashMap<String, SymbolEntry>,
}

impl SymbolLibrary {
    pub fn symbol(&self, name: &str) -> Option<&SymbolEntry> {
        self.symbols.get(name)
    }
}

/// Parse a library file.
pub fn parse_symbol_library(name: &str, xml: &str) -> Result<SymbolLibrary, MarkupError> {
    let doc = parse_markup(xml)?;
    let mut symbols = HashMap::new();

    for symbol_node in doc.root().find_children("symbol") {
        let symbol_name = symbol_node.parse_string_child("name")?;
        let kind = symbol_node.parse_string_child_or("type", "static");
        let mut states = HashMap::new();
        let mut default_image = None;

        for image in symbol_node.find_children("image") {
            let file = image.text().to_string();
            if let Some(state) = image.attribute("state") {
                states.insert(state.to_string(), file.clone());
            }
            if kind == "dynamic" {
                // the 'default' attribute picks the at-rest image
                if image.attribute("default").map(|v| v.eq_ignore_ascii_case("true"))
                    == Some(true)
                {
                    default_image = Some(file);
                }
            } else {
                default_image = Some(file);
            }
        }

        symbols.insert(
            symbol_name.clone(),
            SymbolEntry { name: symbol_name, kind, states, default_image },
        );
    }

    Ok(SymbolLibrary { name: name.to_string(), symbols })
}

/// Per-display cache of loaded libraries. A failed load is remembered so the
/// resolver is not hit again for every symbol widget in the panel.
#[derive(Debug, Default)]
pub struct SymbolCache {
    libraries: HashMap<String, Option<SymbolLibrary>>,
}

impl SymbolCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        library_name: &str,
        resolver: Option<&dyn ResourceResolver>,
    ) -> Option<&SymbolLibrary> {
        if !self.libraries.contains_key(library_name) {
            let loaded = load_library(library_name, resolver);
            self.libraries.insert(library_name.to_string(), loaded);
        }
        self.libraries.get(library_name).and_then(|l| l.as_ref())
    }
}

fn load_library(
    library_name: &str,
    resolver: Option<&dyn ResourceResolver>,
) -> Option<SymbolLibrary> {
    let Some(resolver) = resolver else {
        warn!("no resolver available to load symbol library '{}'", library_name);
        return None;
    };
    let path = format!("{}.xml", library_name);
    match resolver.resolve(&path) {
        Ok(xml) => match parse_symbol_library(library_name, &xml) {
            Ok(library) => Some(library),
            Err(e) => {
                warn!("malformed symbol library '{}': {}", library_name, e);
                None
            }
        },
        Err(e) => {
            warn!("cannot load symbol library '{}': {}", library_name, e);
            None
        }
    }
}
