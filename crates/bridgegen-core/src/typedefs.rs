//! Collects the named types the APIs reference into definitions for the
//! shared types file.

use indexmap::IndexMap;

use crate::ir::{
    DefinitionKind, EnumValue, ParsedAPI, ParsedType, ParsedTypeDefinition, TypeKind,
};
use crate::resolver::{TypeDecl, TypeResolver};

/// Walks every parameter, return, event payload and named callback type in
/// API order. The first definition seen for a name wins.
pub fn collect_type_definitions(
    apis: &[ParsedAPI],
    resolver: &dyn TypeResolver,
) -> IndexMap<String, ParsedTypeDefinition> {
    let mut collector = Collector {
        resolver,
        definitions: IndexMap::new(),
    };
    for api in apis {
        for param in &api.parameters {
            collector.visit(&param.ty);
        }
        collector.visit(&api.return_type);
        if let Some(data) = &api.event_data_type {
            collector.visit(data);
        }
        for callback in &api.named_callbacks {
            if let Some(data) = &callback.data_type {
                collector.visit(data);
            }
        }
    }
    collector.definitions
}

struct Collector<'r> {
    resolver: &'r dyn TypeResolver,
    definitions: IndexMap<String, ParsedTypeDefinition>,
}

impl Collector<'_> {
    fn visit(&mut self, ty: &ParsedType) {
        match &ty.kind {
            TypeKind::Primitive => {}
            TypeKind::Object { properties } => {
                if !ty.name.is_empty() && !ty.is_any() && !self.definitions.contains_key(&ty.name) {
                    let definition = self.definition(
                        &ty.name,
                        DefinitionKind::Interface {
                            properties: properties.clone(),
                        },
                    );
                    self.definitions.insert(ty.name.clone(), definition);
                }
                for property in properties {
                    self.visit(&property.ty);
                }
            }
            TypeKind::Array { element } => self.visit(element),
            TypeKind::Function { params, returns } => {
                for param in params {
                    self.visit(&param.ty);
                }
                self.visit(returns);
            }
            TypeKind::Promise { inner } => self.visit(inner),
            TypeKind::Union {
                members,
                discriminant: None,
            } => {
                if !ty.name.is_empty() && !self.definitions.contains_key(&ty.name) {
                    if let Some(values) = self.enum_values(&ty.name, members) {
                        let definition = self.definition(&ty.name, DefinitionKind::Enum { values });
                        self.definitions.insert(ty.name.clone(), definition);
                    }
                }
            }
            TypeKind::Union {
                discriminant: Some(discriminant),
                ..
            } => {
                for variant in &discriminant.variants {
                    for property in &variant.properties {
                        self.visit(&property.ty);
                    }
                }
            }
        }
    }

    /// Values of a literal union; member names come from the declaring
    /// `enum` when there is one.
    fn enum_values(&self, name: &str, members: &[ParsedType]) -> Option<Vec<EnumValue>> {
        let declared = match self.resolver.resolve_type(name) {
            Some(TypeDecl::Enum(e)) if e.members.len() == members.len() => Some(e),
            _ => None,
        };
        let values = members
            .iter()
            .enumerate()
            .map(|(i, member)| {
                let declared_name = declared.map(|e| e.members[i].name.clone());
                if let Some(literal) = member.literal_value() {
                    return Some(EnumValue {
                        name: declared_name.unwrap_or_else(|| literal.to_string()),
                        value: literal.to_string(),
                        numeric: false,
                    });
                }
                if member.is_primitive("number") {
                    return Some(EnumValue {
                        name: declared_name.unwrap_or_else(|| format!("Value{}", member.raw)),
                        value: member.raw.clone(),
                        numeric: true,
                    });
                }
                None
            })
            .collect::<Option<Vec<_>>>()?;
        (!values.is_empty()).then_some(values)
    }

    fn definition(&self, name: &str, kind: DefinitionKind) -> ParsedTypeDefinition {
        let description = self
            .resolver
            .resolve_type(name)
            .and_then(|decl| decl.doc())
            .map(|doc| doc.description.clone())
            .filter(|d| !d.is_empty());
        ParsedTypeDefinition {
            name: name.to_string(),
            kind,
            description,
            source_file: self.resolver.declared_in(name).map(|p| p.to_path_buf()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::InputConfig;
    use crate::extract::extract;
    use crate::loader::Project;
    use crate::resolver::ProjectResolver;

    fn definitions(src: &str) -> IndexMap<String, ParsedTypeDefinition> {
        let (project, _) = Project::from_sources([("camera.d.ts", src)]);
        let resolver = ProjectResolver::new(&project);
        let (apis, _) = extract(&project, &resolver, &InputConfig::default());
        collect_type_definitions(&apis, &resolver)
    }

    #[test]
    fn collects_interfaces_and_literal_enums() {
        let defs = definitions(
            "/** Which lens to open. */\n\
             export type Facing = 'front' | 'back';\n\
             export interface Photo { id: string; facing: Facing; size?: Size }\n\
             export interface Size { width: number; height: number }\n\
             export declare function takePhoto(facing: Facing): Promise<Photo>;",
        );
        let names: Vec<_> = defs.keys().map(String::as_str).collect();
        assert_eq!(names, ["Facing", "Photo", "Size"]);

        let facing = &defs["Facing"];
        assert_eq!(facing.description.as_deref(), Some("Which lens to open."));
        match &facing.kind {
            DefinitionKind::Enum { values } => {
                assert_eq!(values[0].value, "front");
                assert!(!values[0].numeric);
            }
            other => panic!("expected enum, got {other:?}"),
        }
        assert!(matches!(&defs["Photo"].kind, DefinitionKind::Interface { properties } if properties.len() == 3));
    }

    #[test]
    fn ts_enums_keep_member_names() {
        let defs = definitions(
            "export enum Accuracy { Lowest = 1, Low, High = 'high' }\n\
             export declare function setAccuracy(a: Accuracy): void;",
        );
        match &defs["Accuracy"].kind {
            DefinitionKind::Enum { values } => {
                let pairs: Vec<_> = values.iter().map(|v| (v.name.as_str(), v.value.as_str(), v.numeric)).collect();
                assert_eq!(pairs, [("Lowest", "1", true), ("Low", "2", true), ("High", "high", false)]);
            }
            other => panic!("expected enum, got {other:?}"),
        }
    }

    #[test]
    fn anonymous_shapes_are_not_definitions() {
        let defs = definitions("export declare function f(o: { a: string }): 'x' | 'y';");
        assert!(defs.is_empty());
    }
}
