//! Press commands carried by navigation buttons.

use opsview_model::markup::NodeRef;

use crate::widgets::WidgetError;

/// Parsed `PressCommand` of a NavigationButton.
#[derive(Debug, Clone, PartialEq)]
pub enum PressCommand {
    /// Load another display document and open it as a new frame at the
    /// configured coordinates.
    OpenDisplay {
        basename: String,
        x: f64,
        y: f64,
    },
    /// Placeholder pending host integration.
    CloseDisplay,
}

/// Read the `PressCommand` child of a NavigationButton node. An unknown
/// command class is fatal for that widget only.
pub fn parse_press_command(button_node: NodeRef<'_>) -> Result<PressCommand, WidgetError> {
    let command = button_node.find_child("PressCommand")?.deref()?;
    let class = command.attribute("class").unwrap_or("");
    match class {
        "OpenDisplayCommand" => Ok(PressCommand::OpenDisplay {
            basename: command.parse_string_child("DisplayBasename")?,
            x: command.parse_float_child_or("X", 0.0)?,
            y: command.parse_float_child_or("Y", 0.0)?,
        }),
        "CloseDisplayCommand" => Ok(PressCommand::CloseDisplay),
        other => Err(WidgetError::UnsupportedCommand(other.to_string())),
    }
}
