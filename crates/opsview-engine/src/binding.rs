//! Data-binding resolution: turns a widget's `DataBindings` markup subtree
//! into typed parameter/computation bindings.
//!
//! Resolution never fails for an individual malformed binding — it degrades
//! by omission with a warning, so one broken binding cannot keep the rest of
//! the display from loading.

use std::collections::HashMap;

use opsview_model::markup::NodeRef;
use serde::Serialize;
use tracing::warn;

/// The aspect of a widget a binding drives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DynamicProperty {
    Value,
    X,
    Y,
    FillColor,
    /// Preserved verbatim; warned about and ignored at dispatch time.
    Other(String),
}

impl DynamicProperty {
    pub fn parse(text: &str) -> Self {
        match text {
            "VALUE" => DynamicProperty::Value,
            "X" => DynamicProperty::X,
            "Y" => DynamicProperty::Y,
            "FILL_COLOR" => DynamicProperty::FillColor,
            other => DynamicProperty::Other(other.to_string()),
        }
    }
}

/// Binding to a named telemetry parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub dynamic_property: DynamicProperty,
    pub using_raw: bool,
    pub ops_name: String,
    pub path_name: Option<String>,
    pub sid: Option<String>,
}

/// One argument feeding a computation expression.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComputationArg {
    /// Friendly name from the `DEFAULT` entry, when present.
    pub name: Option<String>,
    pub ops_name: String,
}

/// Binding to a derived expression over parameter arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct ComputationBinding {
    pub dynamic_property: DynamicProperty,
    pub using_raw: bool,
    pub expression: String,
    pub args: Vec<ComputationArg>,
    /// Friendly label from the data source's own `DEFAULT` entry.
    pub name: Option<String>,
}

/// A resolved binding of either kind.
#[derive(Debug, Clone, PartialEq)]
pub enum DataSourceBinding {
    Parameter(ParameterBinding),
    Computation(ComputationBinding),
}

impl DataSourceBinding {
    pub fn dynamic_property(&self) -> &DynamicProperty {
        match self {
            DataSourceBinding::Parameter(p) => &p.dynamic_property,
            DataSourceBinding::Computation(c) => &c.dynamic_property,
        }
    }

    pub fn using_raw(&self) -> bool {
        match self {
            DataSourceBinding::Parameter(p) => p.using_raw,
            DataSourceBinding::Computation(c) => c.using_raw,
        }
    }

    /// Every opsName this binding must be triggered by.
    pub fn ops_names(&self) -> Vec<&str> {
        match self {
            DataSourceBinding::Parameter(p) => vec![p.ops_name.as_str()],
            DataSourceBinding::Computation(c) => {
                c.args.iter().map(|a| a.ops_name.as_str()).collect()
            }
        }
    }

    /// Whether a sample for `ops_name` should reach this binding.
    pub fn triggered_by(&self, ops_name: &str) -> bool {
        self.ops_names().iter().any(|n| *n == ops_name)
    }
}

/// Resolve every `DataBindings/DataBinding` child of a widget node.
/// Individual failures are logged and skipped.
pub fn parse_data_bindings(widget_node: NodeRef<'_>) -> Vec<DataSourceBinding> {
    let mut bindings = Vec::new();
    let Ok(container) = widget_node.find_child("DataBindings") else {
        return bindings;
    };
    for child in container.find_children("DataBinding") {
        if let Some(binding) = parse_data_binding(child) {
            bindings.push(binding);
        }
    }
    bindings
}

/// Resolve a single `DataBinding` element; `None` means dropped-with-warning.
pub fn parse_data_binding(binding_node: NodeRef<'_>) -> Option<DataSourceBinding> {
    let dynamic_property = match binding_node.parse_string_child("DynamicProperty") {
        Ok(text) => DynamicProperty::parse(&text),
        Err(e) => {
            warn!("DataBinding without DynamicProperty, dropping: {}", e);
            return None;
        }
    };

    let data_source = match binding_node.find_child("DataSource").and_then(|n| n.deref()) {
        Ok(node) => node,
        Err(e) => {
            warn!("DataBinding without usable DataSource, dropping: {}", e);
            return None;
        }
    };

    let class = data_source.attribute("class").unwrap_or("");
    let using_raw = data_source.parse_boolean_child_or("UsingRaw", false);

    match class {
        "ExternalDataSource" => {
            let names = parse_names(data_source);
            let Some(ops_name) = names.get("Opsname").map(|s| s.trim().to_string()) else {
                warn!("ExternalDataSource without Opsname entry, dropping binding");
                return None;
            };
            Some(DataSourceBinding::Parameter(ParameterBinding {
                dynamic_property,
                using_raw,
                ops_name,
                path_name: names.get("Pathname").cloned(),
                sid: names.get("SID").cloned(),
            }))
        }
        "Computation" => {
            let expression = match data_source.parse_string_child("Expression") {
                Ok(e) => e,
                Err(e) => {
                    warn!("Computation without Expression, dropping binding: {}", e);
                    return None;
                }
            };

            let mut args = Vec::new();
            if let Ok(arguments) = data_source.find_child("Arguments") {
                for arg_source in arguments.find_children("ExternalDataSource") {
                    let names = parse_names(arg_source);
                    match names.get("Opsname") {
                        Some(ops_name) => args.push(ComputationArg {
                            name: names.get("DEFAULT").cloned(),
                            ops_name: ops_name.trim().to_string(),
                        }),
                        None => {
                            warn!("computation argument without Opsname entry, skipping")
                        }
                    }
                }
            }

            let name = parse_names(data_source).get("DEFAULT").cloned();
            Some(DataSourceBinding::Computation(ComputationBinding {
                dynamic_property,
                using_raw,
                expression,
                args,
                name,
            }))
        }
        other => {
            warn!("unsupported DataSource class '{}', dropping binding", other);
            None
        }
    }
}

/// Extract a `Names/entry` key→value map. Each entry carries two `string`
/// children: the key (Opsname, Pathname, SID, DEFAULT) then the value.
fn parse_names(node: NodeRef<'_>) -> HashMap<String, String> {
    let mut map = HashMap::new();
    let Ok(names) = node.find_child("Names") else {
        return map;
    };
    for entry in names.find_children("entry") {
        let strings = entry.find_children("string");
        if strings.len() >= 2 {
            map.insert(strings[0].text().to_string(), strings[1].text().to_string());
        } else {
            warn!("Names entry with fewer than two strings, skipping");
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use opsview_model::parse_markup;

    fn bindings_of(xml: &str) -> Vec<DataSourceBinding> {
        let doc = parse_markup(xml).unwrap();
        parse_data_bindings(doc.root())
    }

    const PARAMETER: &str = r#"
        <Field>
            <DataBindings>
                <DataBinding>
                    <DynamicProperty>VALUE</DynamicProperty>
                    <DataSource class="ExternalDataSource">
                        <Names>
                            <entry><string>Opsname</string><string>BATT_TEMP</string></entry>
                            <entry><string>Pathname</string><string>\EPS\BATT_TEMP</string></entry>
                        </Names>
                        <UsingRaw>false</UsingRaw>
                    </DataSource>
                </DataBinding>
            </DataBindings>
        </Field>"#;

    #[test]
    fn test_parameter_binding() {
        let bindings = bindings_of(PARAMETER);
        assert_eq!(bindings.len(), 1);
        match &bindings[0] {
            DataSourceBinding::Parameter(p) => {
                assert_eq!(p.ops_name, "BATT_TEMP");
                assert_eq!(p.dynamic_property, DynamicProperty::Value);
                assert!(!p.using_raw);
                assert_eq!(p.path_name.as_deref(), Some("\\EPS\\BATT_TEMP"));
                assert_eq!(p.sid, None);
            }
            other => panic!("expected parameter binding, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_opsname_drops_binding_only() {
        let xml = r#"
            <Field>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="ExternalDataSource">
                            <Names>
                                <entry><string>Pathname</string><string>\A\B</string></entry>
                            </Names>
                        </DataSource>
                    </DataBinding>
                    <DataBinding>
                        <DynamicProperty>FILL_COLOR</DynamicProperty>
                        <DataSource class="ExternalDataSource">
                            <Names>
                                <entry><string>Opsname</string><string>MODE</string></entry>
                            </Names>
                        </DataSource>
                    </DataBinding>
                </DataBindings>
            </Field>"#;
        let bindings = bindings_of(xml);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].ops_names(), vec!["MODE"]);
        assert_eq!(*bindings[0].dynamic_property(), DynamicProperty::FillColor);
    }

    #[test]
    fn test_computation_binding() {
        let xml = r#"
            <Field>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="Computation">
                            <Expression>a + b</Expression>
                            <Names>
                                <entry><string>DEFAULT</string><string>SUM</string></entry>
                            </Names>
                            <Arguments>
                                <ExternalDataSource>
                                    <Names>
                                        <entry><string>Opsname</string><string>VOLT_A</string></entry>
                                    </Names>
                                </ExternalDataSource>
                                <ExternalDataSource>
                                    <Names>
                                        <entry><string>Opsname</string><string>VOLT_B</string></entry>
                                    </Names>
                                </ExternalDataSource>
                            </Arguments>
                        </DataSource>
                    </DataBinding>
                </DataBindings>
            </Field>"#;
        let bindings = bindings_of(xml);
        assert_eq!(bindings.len(), 1);
        match &bindings[0] {
            DataSourceBinding::Computation(c) => {
                assert_eq!(c.expression, "a + b");
                assert_eq!(c.name.as_deref(), Some("SUM"));
                assert_eq!(c.args.len(), 2);
                assert_eq!(c.args[1].ops_name, "VOLT_B");
            }
            other => panic!("expected computation binding, got {:?}", other),
        }
        assert!(bindings[0].triggered_by("VOLT_A"));
        assert!(bindings[0].triggered_by("VOLT_B"));
        assert!(!bindings[0].triggered_by("VOLT_C"));
    }

    #[test]
    fn test_unknown_class_skipped() {
        let xml = r#"
            <Field>
                <DataBindings>
                    <DataBinding>
                        <DynamicProperty>VALUE</DynamicProperty>
                        <DataSource class="ScriptDataSource"/>
                    </DataBinding>
                </DataBindings>
            </Field>"#;
        assert!(bindings_of(xml).is_empty());
    }

    #[test]
    fn test_referenced_data_source() {
        let xml = r#"
            <Elements>
                <Field>
                    <Name>original</Name>
                    <DataBindings>
                        <DataBinding>
                            <DynamicProperty>VALUE</DynamicProperty>
                            <DataSource class="ExternalDataSource">
                                <Names>
                                    <entry><string>Opsname</string><string>SHARED</string></entry>
                                </Names>
                            </DataSource>
                        </DataBinding>
                    </DataBindings>
                </Field>
                <Field>
                    <Name>aliased</Name>
                    <DataBindings>
                        <DataBinding>
                            <DynamicProperty>VALUE</DynamicProperty>
                            <DataSource reference="../../../../Field[1]/DataBindings[1]/DataBinding[1]/DataSource[1]"/>
                        </DataBinding>
                    </DataBindings>
                </Field>
            </Elements>"#;
        let doc = parse_markup(xml).unwrap();
        let fields = doc.root().find_children("Field");
        let bindings = parse_data_bindings(fields[1]);
        assert_eq!(bindings.len(), 1);
        assert_eq!(bindings[0].ops_names(), vec!["SHARED"]);
    }
}
