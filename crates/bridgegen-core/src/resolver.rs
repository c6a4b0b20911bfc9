//! Name resolution over parsed declarations.
//!
//! The extractor and the mapper only see declarations through
//! [`TypeResolver`]. The built-in implementation looks names up in the
//! project symbol table without import scoping or inference: a name that
//! is declared anywhere in the project resolves, the rest do not.

use std::collections::HashMap;
use std::path::Path;

use bridgegen_dts::{
    DtsClass, DtsEnum, DtsFunction, DtsInterface, DtsItem, DtsType, DtsTypeAlias, DtsVariable,
    FunctionType, JsDoc, ObjectMember, Param, TupleElement, TypeParam,
};

use crate::loader::Project;

/// Alias and member chains deeper than this are treated as unresolvable.
const MAX_DEPTH: usize = 24;

/// A type-level declaration.
#[derive(Debug, Clone, Copy)]
pub enum TypeDecl<'a> {
    Alias(&'a DtsTypeAlias),
    /// Every declaration of a merged interface, in load order.
    Interface(&'a [&'a DtsInterface]),
    Class(&'a DtsClass),
    Enum(&'a DtsEnum),
}

impl<'a> TypeDecl<'a> {
    pub fn doc(&self) -> Option<&'a JsDoc> {
        match self {
            TypeDecl::Alias(alias) => alias.doc.as_ref(),
            TypeDecl::Interface(decls) => decls.iter().find_map(|i| i.doc.as_ref()),
            TypeDecl::Class(class) => class.doc.as_ref(),
            TypeDecl::Enum(e) => e.doc.as_ref(),
        }
    }

    pub fn type_params(&self) -> &'a [TypeParam] {
        match self {
            TypeDecl::Alias(alias) => &alias.type_params,
            TypeDecl::Interface(decls) => decls.first().map(|i| i.type_params.as_slice()).unwrap_or(&[]),
            TypeDecl::Class(class) => &class.type_params,
            TypeDecl::Enum(_) => &[],
        }
    }
}

/// A value-level declaration.
#[derive(Debug, Clone, Copy)]
pub enum ValueDecl<'a> {
    /// The last overload of a function.
    Function(&'a DtsFunction),
    Variable(&'a DtsVariable),
}

impl ValueDecl<'_> {
    /// The declared type of the value.
    pub fn ty(&self) -> DtsType {
        match self {
            ValueDecl::Function(f) => DtsType::Function(Box::new(function_type(f))),
            ValueDecl::Variable(v) => v.ty.clone(),
        }
    }
}

/// Looks declarations up by name.
pub trait TypeResolver {
    fn resolve_type(&self, name: &str) -> Option<TypeDecl<'_>>;

    fn resolve_value(&self, name: &str) -> Option<ValueDecl<'_>>;

    /// The file declaring `name`, for diagnostics and type definitions.
    fn declared_in(&self, name: &str) -> Option<&Path>;
}

/// Resolver backed by a loaded [`Project`].
pub struct ProjectResolver<'p> {
    project: &'p Project,
    interfaces: HashMap<String, Vec<&'p DtsInterface>>,
}

impl<'p> ProjectResolver<'p> {
    pub fn new(project: &'p Project) -> Self {
        let mut interfaces: HashMap<String, Vec<&'p DtsInterface>> = HashMap::new();
        for name in project.symbol_names() {
            for symbol in project.symbols(name) {
                if let DtsItem::Interface(iface) = &symbol.item {
                    interfaces.entry(name.to_string()).or_default().push(iface);
                }
            }
        }
        ProjectResolver {
            project,
            interfaces,
        }
    }

    pub fn project(&self) -> &'p Project {
        self.project
    }

    /// `NS.Name` falls back to `Name` when the namespace is not known.
    fn candidates(name: &str) -> impl Iterator<Item = &str> {
        let short = name.rsplit_once('.').map(|(_, last)| last);
        std::iter::once(name).chain(short)
    }
}

impl TypeResolver for ProjectResolver<'_> {
    fn resolve_type(&self, name: &str) -> Option<TypeDecl<'_>> {
        for candidate in Self::candidates(name) {
            let symbols = self.project.symbols(candidate);
            if let Some(alias) = symbols.iter().find_map(|s| match &s.item {
                DtsItem::TypeAlias(a) => Some(a),
                _ => None,
            }) {
                return Some(TypeDecl::Alias(alias));
            }
            if let Some(decls) = self.interfaces.get(candidate) {
                return Some(TypeDecl::Interface(decls));
            }
            for symbol in symbols {
                match &symbol.item {
                    DtsItem::Class(c) => return Some(TypeDecl::Class(c)),
                    DtsItem::Enum(e) => return Some(TypeDecl::Enum(e)),
                    _ => {}
                }
            }
        }
        None
    }

    fn resolve_value(&self, name: &str) -> Option<ValueDecl<'_>> {
        let symbols = self.project.symbols(name);
        // Overload sets: the last declaration is the widest.
        if let Some(f) = symbols.iter().rev().find_map(|s| match &s.item {
            DtsItem::Function(f) => Some(f),
            _ => None,
        }) {
            return Some(ValueDecl::Function(f));
        }
        symbols.iter().find_map(|s| match &s.item {
            DtsItem::Variable(v) => Some(ValueDecl::Variable(v)),
            _ => None,
        })
    }

    fn declared_in(&self, name: &str) -> Option<&Path> {
        Self::candidates(name).find_map(|candidate| {
            self.project
                .symbols(candidate)
                .first()
                .and_then(|s| self.project.file(s.file))
                .map(|f| f.path.as_path())
        })
    }
}

pub fn function_type(f: &DtsFunction) -> FunctionType {
    FunctionType {
        type_params: f.type_params.clone(),
        params: f.params.clone(),
        return_type: Box::new(
            f.return_type
                .clone()
                .unwrap_or(DtsType::Primitive(bridgegen_dts::Primitive::Void)),
        ),
    }
}

/// The type a member contributes to its object.
pub fn member_type(member: &ObjectMember) -> Option<DtsType> {
    match member {
        ObjectMember::Property(p) => Some(p.ty.clone()),
        ObjectMember::Method(m) => Some(DtsType::Function(Box::new(m.as_function_type()))),
        _ => None,
    }
}

/// The type of a value path such as `IAP` or `IAP.getProductItemList`.
pub fn value_type(resolver: &dyn TypeResolver, path: &str) -> Option<DtsType> {
    if let Some(value) = resolver.resolve_value(path) {
        return Some(value.ty());
    }
    let (head, member) = path.rsplit_once('.')?;
    let owner = value_type(resolver, head)?;
    members_of(resolver, &owner)?
        .iter()
        .find(|m| m.name() == Some(member))
        .and_then(member_type)
}

/// Instantiates a generic declaration body: parameters without an argument
/// take their default, then their constraint.
pub fn instantiate(params: &[TypeParam], args: &[DtsType], body: &DtsType) -> DtsType {
    if params.is_empty() {
        return body.clone();
    }
    let map = bindings(params, args);
    substitute(body, &map)
}

fn bindings(params: &[TypeParam], args: &[DtsType]) -> HashMap<String, DtsType> {
    params
        .iter()
        .enumerate()
        .filter_map(|(i, param)| {
            let bound = args
                .get(i)
                .cloned()
                .or_else(|| param.default.clone())
                .or_else(|| param.constraint.clone())?;
            Some((param.name.clone(), bound))
        })
        .collect()
}

/// Replaces free type-parameter references.
pub fn substitute(ty: &DtsType, map: &HashMap<String, DtsType>) -> DtsType {
    if map.is_empty() {
        return ty.clone();
    }
    let sub = |t: &DtsType| substitute(t, map);
    match ty {
        DtsType::Named { name, type_args } if type_args.is_empty() => {
            map.get(name).cloned().unwrap_or_else(|| ty.clone())
        }
        DtsType::Named { name, type_args } => DtsType::Named {
            name: name.clone(),
            type_args: type_args.iter().map(sub).collect(),
        },
        DtsType::Union(types) => DtsType::Union(types.iter().map(sub).collect()),
        DtsType::Intersection(types) => DtsType::Intersection(types.iter().map(sub).collect()),
        DtsType::Array(inner) => DtsType::Array(Box::new(sub(inner))),
        DtsType::Parenthesized(inner) => DtsType::Parenthesized(Box::new(sub(inner))),
        DtsType::KeyOf(inner) => DtsType::KeyOf(Box::new(sub(inner))),
        DtsType::Function(f) => DtsType::Function(Box::new(substitute_function(f, map))),
        DtsType::Constructor(f) => DtsType::Constructor(Box::new(substitute_function(f, map))),
        DtsType::Object(members) => DtsType::Object(substitute_members(members, map)),
        DtsType::Tuple(elements) => DtsType::Tuple(
            elements
                .iter()
                .map(|el| TupleElement {
                    ty: sub(&el.ty),
                    ..el.clone()
                })
                .collect(),
        ),
        DtsType::IndexAccess { object, index } => DtsType::IndexAccess {
            object: Box::new(sub(object)),
            index: Box::new(sub(index)),
        },
        DtsType::Conditional {
            check,
            extends,
            true_type,
            false_type,
        } => DtsType::Conditional {
            check: Box::new(sub(check)),
            extends: Box::new(sub(extends)),
            true_type: Box::new(sub(true_type)),
            false_type: Box::new(sub(false_type)),
        },
        other => other.clone(),
    }
}

fn substitute_params(params: &[Param], map: &HashMap<String, DtsType>) -> Vec<Param> {
    params
        .iter()
        .map(|p| Param {
            ty: substitute(&p.ty, map),
            ..p.clone()
        })
        .collect()
}

/// Type parameters a signature declares itself shadow the outer ones.
fn shadowed(map: &HashMap<String, DtsType>, own: &[TypeParam]) -> HashMap<String, DtsType> {
    let mut inner = map.clone();
    for tp in own {
        inner.remove(&tp.name);
    }
    inner
}

fn substitute_function(f: &FunctionType, map: &HashMap<String, DtsType>) -> FunctionType {
    let inner = shadowed(map, &f.type_params);
    FunctionType {
        type_params: f.type_params.clone(),
        params: substitute_params(&f.params, &inner),
        return_type: Box::new(substitute(&f.return_type, &inner)),
    }
}

pub fn substitute_members(
    members: &[ObjectMember],
    map: &HashMap<String, DtsType>,
) -> Vec<ObjectMember> {
    if map.is_empty() {
        return members.to_vec();
    }
    members
        .iter()
        .map(|member| match member {
            ObjectMember::Property(p) => {
                let mut p = p.clone();
                p.ty = substitute(&p.ty, map);
                ObjectMember::Property(p)
            }
            ObjectMember::Method(m) => {
                let inner = shadowed(map, &m.type_params);
                let mut m = m.clone();
                m.params = substitute_params(&m.params, &inner);
                m.return_type = m.return_type.as_ref().map(|t| substitute(t, &inner));
                ObjectMember::Method(m)
            }
            ObjectMember::CallSignature(c) => {
                let inner = shadowed(map, &c.type_params);
                let mut c = c.clone();
                c.params = substitute_params(&c.params, &inner);
                c.return_type = c.return_type.as_ref().map(|t| substitute(t, &inner));
                ObjectMember::CallSignature(c)
            }
            other => other.clone(),
        })
        .collect()
}

/// Members of an object-like type, following aliases, interfaces (with
/// their `extends` chain), classes, `typeof` and intersections.
pub fn members_of(resolver: &dyn TypeResolver, ty: &DtsType) -> Option<Vec<ObjectMember>> {
    members_at(resolver, ty, 0)
}

fn members_at(resolver: &dyn TypeResolver, ty: &DtsType, depth: usize) -> Option<Vec<ObjectMember>> {
    if depth > MAX_DEPTH {
        return None;
    }
    match ty.unparen() {
        DtsType::Object(members) => Some(members.clone()),
        DtsType::TypeOf(path) => {
            let value = value_type(resolver, path)?;
            members_at(resolver, &value, depth + 1)
        }
        DtsType::Intersection(parts) => {
            let mut merged = Vec::new();
            let mut any = false;
            for part in parts {
                if let Some(members) = members_at(resolver, part, depth + 1) {
                    any = true;
                    merge_members(&mut merged, members);
                }
            }
            any.then_some(merged)
        }
        DtsType::Named { name, type_args } => match resolver.resolve_type(name)? {
            TypeDecl::Alias(alias) => {
                let body = instantiate(&alias.type_params, type_args, &alias.ty);
                members_at(resolver, &body, depth + 1)
            }
            TypeDecl::Interface(decls) => {
                let map = decls
                    .first()
                    .map(|i| bindings(&i.type_params, type_args))
                    .unwrap_or_default();
                let mut merged = Vec::new();
                for iface in decls.iter() {
                    for base in &iface.extends {
                        if let Some(members) = members_at(resolver, base, depth + 1) {
                            merge_members(&mut merged, members);
                        }
                    }
                }
                for iface in decls.iter() {
                    merge_members(&mut merged, substitute_members(&iface.members, &map));
                }
                Some(merged)
            }
            TypeDecl::Class(class) => {
                let map = bindings(&class.type_params, type_args);
                let mut merged = Vec::new();
                if let Some(base) = &class.extends {
                    if let Some(members) = members_at(resolver, base, depth + 1) {
                        merge_members(&mut merged, members);
                    }
                }
                merge_members(&mut merged, substitute_members(&class.members, &map));
                Some(merged)
            }
            TypeDecl::Enum(_) => None,
        },
        _ => None,
    }
}

/// Later members replace earlier ones with the same name.
fn merge_members(into: &mut Vec<ObjectMember>, members: Vec<ObjectMember>) {
    for member in members {
        match member.name() {
            Some(name) => {
                if let Some(slot) = into.iter_mut().find(|m| m.name() == Some(name)) {
                    *slot = member;
                } else {
                    into.push(member);
                }
            }
            None => into.push(member),
        }
    }
}

/// The call signature of a callable type (the last one for overloaded
/// call signatures).
pub fn call_signature(resolver: &dyn TypeResolver, ty: &DtsType) -> Option<FunctionType> {
    call_signature_at(resolver, ty, 0)
}

fn call_signature_at(resolver: &dyn TypeResolver, ty: &DtsType, depth: usize) -> Option<FunctionType> {
    if depth > MAX_DEPTH {
        return None;
    }
    match ty.unparen() {
        DtsType::Function(f) => Some((**f).clone()),
        DtsType::TypeOf(path) => {
            let value = value_type(resolver, path)?;
            call_signature_at(resolver, &value, depth + 1)
        }
        DtsType::Intersection(parts) => parts
            .iter()
            .find_map(|part| call_signature_at(resolver, part, depth + 1)),
        DtsType::Named { name, type_args } => match resolver.resolve_type(name)? {
            TypeDecl::Alias(alias) => {
                let body = instantiate(&alias.type_params, type_args, &alias.ty);
                call_signature_at(resolver, &body, depth + 1)
            }
            _ => last_call_signature(&members_at(resolver, ty, depth + 1)?),
        },
        DtsType::Object(members) => last_call_signature(members),
        _ => None,
    }
}

fn last_call_signature(members: &[ObjectMember]) -> Option<FunctionType> {
    members.iter().rev().find_map(|m| match m {
        ObjectMember::CallSignature(sig) => Some(sig.as_function_type()),
        _ => None,
    })
}
