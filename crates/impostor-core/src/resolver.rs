use tracing::debug;

use crate::error::SchemaError;
use crate::template::ModelTemplate;
use crate::types::{PreviewType, ResolvedTypes, object_type, type_name};

/// Output of type resolution: the full table plus derived preview types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeResolution {
    pub types: ResolvedTypes,
    /// Preview types in the order their source models became fully resolved.
    pub previews: Vec<PreviewType>,
    pub rounds: usize,
}

/// Compute a semantic type for every field of every model.
///
/// Each round retries the pending fields in declaration order; a field that
/// resolves is visible to the fields after it in the same round. A round that
/// resolves nothing while fields remain pending is a cycle or a reference to
/// something that can never resolve.
pub fn resolve_types(templates: &[ModelTemplate]) -> Result<TypeResolution, SchemaError> {
    let mut types = ResolvedTypes::with_models(templates.iter().map(|t| t.name.as_str()));
    let mut previews = Vec::new();
    let mut pending: Vec<(usize, usize)> = templates
        .iter()
        .enumerate()
        .flat_map(|(model_idx, template)| {
            (0..template.fields.len()).map(move |field_idx| (model_idx, field_idx))
        })
        .collect();
    let mut rounds = 0;

    while !pending.is_empty() {
        rounds += 1;
        let mut waiting = Vec::new();
        let mut blocked = Vec::new();

        for &(model_idx, field_idx) in &pending {
            let template = &templates[model_idx];
            let (field, spec) = &template.fields[field_idx];

            match spec.semantic_type(&types) {
                Ok(ty) => {
                    types.insert(&template.name, field, ty);
                    if types.resolved_count(&template.name) == template.fields.len()
                        && let Some(preview) = preview_type(template, &types)
                    {
                        previews.push(preview);
                    }
                }
                Err(on) => {
                    waiting.push((model_idx, field_idx));
                    blocked.push(format!("{}.{} (waiting on {on})", template.name, field));
                }
            }
        }

        if waiting.len() == pending.len() {
            return Err(SchemaError::Unresolvable {
                unresolved: blocked,
            });
        }

        debug!(
            round = rounds,
            resolved = pending.len() - waiting.len(),
            pending = waiting.len(),
            "type resolution round finished"
        );
        pending = waiting;
    }

    Ok(TypeResolution {
        types,
        previews,
        rounds,
    })
}

fn preview_type(template: &ModelTemplate, types: &ResolvedTypes) -> Option<PreviewType> {
    let preview = template.preview_fields();
    if preview.is_empty() {
        return None;
    }

    let members = preview.iter().map(|field| {
        let ty = types.get(&template.name, field).unwrap_or("unknown");
        (field.as_str(), ty)
    });

    Some(PreviewType {
        name: format!("{}Preview", type_name(&template.name)),
        model: template.name.clone(),
        definition: object_type(members),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::{CountRange, FieldSpec, IdKind, Transform};
    use crate::template::ModelOptions;

    fn template(name: &str, fields: Vec<(&str, FieldSpec)>, options: ModelOptions) -> ModelTemplate {
        ModelTemplate::new(
            name.to_string(),
            fields
                .into_iter()
                .map(|(field, spec)| (field.to_string(), spec))
                .collect(),
            options,
        )
        .expect("valid template")
    }

    fn shop() -> Vec<ModelTemplate> {
        vec![
            template(
                "product",
                vec![
                    ("id", FieldSpec::unique(IdKind::String)),
                    ("name", FieldSpec::words(CountRange::new(1.0, 3.0))),
                    (
                        "store",
                        FieldSpec::owner("store", Some(Transform::pick(["id", "name"]))),
                    ),
                ],
                ModelOptions::default().with_preview(["name", "store"]),
            ),
            template(
                "store",
                vec![
                    ("id", FieldSpec::unique(IdKind::String)),
                    ("name", FieldSpec::word()),
                    ("products", FieldSpec::owned_set_of("product", None, None)),
                ],
                ModelOptions::default().with_owns("product", CountRange::new(5.0, 10.0)),
            ),
        ]
    }

    #[test]
    fn resolves_forward_references_across_rounds() {
        let resolution = resolve_types(&shop()).expect("acyclic graph resolves");

        assert_eq!(
            resolution.types.get("product", "store"),
            Some("{ id: string; name: string }")
        );
        assert_eq!(resolution.types.get("store", "products"), Some("Product[]"));
        assert!(resolution.rounds >= 2);
    }

    #[test]
    fn derives_preview_once_model_is_complete() {
        let resolution = resolve_types(&shop()).expect("acyclic graph resolves");

        assert_eq!(resolution.previews.len(), 1);
        let preview = &resolution.previews[0];
        assert_eq!(preview.name, "ProductPreview");
        assert_eq!(
            preview.definition,
            "{ name: string; store: { id: string; name: string } }"
        );
    }

    #[test]
    fn cycle_is_unresolvable() {
        let templates = vec![
            template(
                "a",
                vec![
                    ("id", FieldSpec::unique(IdKind::Number)),
                    ("b", FieldSpec::owner("b", Some(Transform::pick(["a"])))),
                ],
                ModelOptions::default(),
            ),
            template(
                "b",
                vec![
                    ("id", FieldSpec::unique(IdKind::Number)),
                    ("a", FieldSpec::owner("a", Some(Transform::pick(["b"])))),
                ],
                ModelOptions::default(),
            ),
        ];

        let err = resolve_types(&templates).expect_err("cycle must fail");
        match err {
            SchemaError::Unresolvable { unresolved } => {
                assert_eq!(unresolved.len(), 2);
                assert!(unresolved[0].starts_with("a.b"));
                assert!(unresolved[1].starts_with("b.a"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unknown_model_is_unresolvable() {
        let templates = vec![template(
            "review",
            vec![
                ("id", FieldSpec::unique(IdKind::String)),
                ("author", FieldSpec::owner("user", None)),
            ],
            ModelOptions::default(),
        )];

        let err = resolve_types(&templates).expect_err("unknown model must fail");
        assert!(err.to_string().contains("review.author"));
    }
}
