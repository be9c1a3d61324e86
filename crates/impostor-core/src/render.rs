use std::fmt::Write;

use crate::template::ModelTemplate;
use crate::types::{PreviewType, ResolvedTypes, type_name};

/// Render type definitions: one object type per model, in registration
/// order, followed by one line per preview type.
pub fn render_type_definitions(
    templates: &[ModelTemplate],
    types: &ResolvedTypes,
    previews: &[PreviewType],
) -> String {
    let mut output = String::new();

    for template in templates {
        let _ = writeln!(output, "type {} = {{", type_name(&template.name));
        for field in template.field_names() {
            let ty = types.get(&template.name, field).unwrap_or("unknown");
            let _ = writeln!(output, "  {field}: {ty};");
        }
        output.push_str("}\n");
    }

    for preview in previews {
        let _ = writeln!(output, "type {} = {}", preview.name, preview.definition);
    }

    output
}
