//! AST types for TypeScript declaration files.

use std::fmt;

use crate::jsdoc::JsDoc;

/// A parsed .d.ts file containing multiple declarations.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DtsFile {
    pub items: Vec<DtsItem>,
}

/// A top-level declaration in a .d.ts file.
#[derive(Debug, Clone, PartialEq)]
pub enum DtsItem {
    Function(DtsFunction),
    Interface(DtsInterface),
    TypeAlias(DtsTypeAlias),
    Class(DtsClass),
    Enum(DtsEnum),
    Variable(DtsVariable),
    Namespace(DtsNamespace),
    Module(DtsModule),
    Import(DtsImport),
    Export(DtsExport),
}

impl DtsItem {
    /// Declared name, for items that declare one.
    pub fn name(&self) -> Option<&str> {
        match self {
            DtsItem::Function(f) => Some(&f.name),
            DtsItem::Interface(i) => Some(&i.name),
            DtsItem::TypeAlias(a) => Some(&a.name),
            DtsItem::Class(c) => Some(&c.name),
            DtsItem::Enum(e) => Some(&e.name),
            DtsItem::Variable(v) => Some(&v.name),
            DtsItem::Namespace(n) => Some(&n.name),
            DtsItem::Module(m) => Some(&m.name),
            DtsItem::Import(_) | DtsItem::Export(_) => None,
        }
    }

    /// JSDoc attached to the declaration.
    pub fn doc(&self) -> Option<&JsDoc> {
        match self {
            DtsItem::Function(f) => f.doc.as_ref(),
            DtsItem::Interface(i) => i.doc.as_ref(),
            DtsItem::TypeAlias(a) => a.doc.as_ref(),
            DtsItem::Class(c) => c.doc.as_ref(),
            DtsItem::Enum(e) => e.doc.as_ref(),
            DtsItem::Variable(v) => v.doc.as_ref(),
            _ => None,
        }
    }

    /// Whether the declaration carries an `export` modifier.
    pub fn is_exported(&self) -> bool {
        match self {
            DtsItem::Function(f) => f.exported,
            DtsItem::Interface(i) => i.exported,
            DtsItem::TypeAlias(a) => a.exported,
            DtsItem::Class(c) => c.exported,
            DtsItem::Enum(e) => e.exported,
            DtsItem::Variable(v) => v.exported,
            DtsItem::Namespace(n) => n.exported,
            _ => false,
        }
    }
}

/// A function declaration: `declare function name<T>(params): ReturnType;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsFunction {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<DtsType>,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// An interface declaration: `interface Name<T> extends Base { members }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsInterface {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Vec<DtsType>,
    pub members: Vec<ObjectMember>,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// A type alias: `type Name<T> = Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsTypeAlias {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub ty: DtsType,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// A class declaration. Only its public surface is kept.
#[derive(Debug, Clone, PartialEq)]
pub struct DtsClass {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub extends: Option<DtsType>,
    pub members: Vec<ObjectMember>,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// An enum declaration: `declare enum Name { A = "a", B = 2 }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsEnum {
    pub name: String,
    pub members: Vec<EnumMember>,
    pub is_const: bool,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// A single enum member.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumMember {
    pub name: String,
    pub value: Option<EnumValue>,
}

/// An enum member initializer.
#[derive(Debug, Clone, PartialEq)]
pub enum EnumValue {
    String(String),
    Number(String),
}

/// A variable declaration: `declare const/let/var name: Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsVariable {
    pub name: String,
    pub ty: DtsType,
    pub is_const: bool,
    pub exported: bool,
    pub doc: Option<JsDoc>,
}

/// A namespace declaration: `declare namespace Name { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsNamespace {
    pub name: String,
    pub items: Vec<DtsItem>,
    pub exported: bool,
}

/// A module declaration: `declare module "name" { ... }`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsModule {
    pub name: String,
    pub items: Vec<DtsItem>,
    /// String-literal module names augment existing packages.
    pub is_ambient: bool,
}

/// An import statement: `import { a, b as c } from "m";`
#[derive(Debug, Clone, PartialEq)]
pub struct DtsImport {
    /// `(imported, local)` pairs; default and namespace imports use `default` / `*`.
    pub names: Vec<(String, String)>,
    pub from: String,
}

/// An export statement
#[derive(Debug, Clone, PartialEq)]
pub enum DtsExport {
    /// `export = name;`
    Equals(String),
    /// `export default name;`
    Default(String),
    /// `export { name, name2 as alias } [from "m"];`
    Named {
        names: Vec<(String, Option<String>)>,
        from: Option<String>,
    },
    /// `export * [as ns] from "m";`
    All { from: String, alias: Option<String> },
}

/// A generic type parameter with optional constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeParam {
    pub name: String,
    /// Optional constraint: `T extends Foo`
    pub constraint: Option<DtsType>,
    /// Optional default: `T = DefaultType`
    pub default: Option<DtsType>,
}

/// A function/method parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct Param {
    /// Binding name; empty when `pattern` is set.
    pub name: String,
    pub ty: DtsType,
    pub optional: bool,
    pub rest: bool,
    /// Destructuring binding such as `{ a, b }: Options`.
    pub pattern: bool,
}

/// A member of an object literal type, interface or class.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectMember {
    Property(PropertyMember),
    Method(MethodMember),
    CallSignature(CallSignature),
    ConstructSignature(CallSignature),
    IndexSignature(IndexSignature),
}

impl ObjectMember {
    pub fn name(&self) -> Option<&str> {
        match self {
            ObjectMember::Property(p) => Some(&p.name),
            ObjectMember::Method(m) => Some(&m.name),
            _ => None,
        }
    }

    pub fn doc(&self) -> Option<&JsDoc> {
        match self {
            ObjectMember::Property(p) => p.doc.as_ref(),
            ObjectMember::Method(m) => m.doc.as_ref(),
            ObjectMember::CallSignature(c) => c.doc.as_ref(),
            _ => None,
        }
    }
}

/// A property: `name?: Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyMember {
    pub name: String,
    pub ty: DtsType,
    pub optional: bool,
    pub readonly: bool,
    pub doc: Option<JsDoc>,
}

/// A method: `name<T>(params): ReturnType;`
#[derive(Debug, Clone, PartialEq)]
pub struct MethodMember {
    pub name: String,
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<DtsType>,
    pub optional: bool,
    pub doc: Option<JsDoc>,
}

impl MethodMember {
    /// The method viewed as a function type.
    pub fn as_function_type(&self) -> FunctionType {
        FunctionType {
            type_params: self.type_params.clone(),
            params: self.params.clone(),
            return_type: Box::new(
                self.return_type
                    .clone()
                    .unwrap_or(DtsType::Primitive(Primitive::Any)),
            ),
        }
    }
}

/// A call or construct signature: `(params): ReturnType;`
#[derive(Debug, Clone, PartialEq)]
pub struct CallSignature {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Option<DtsType>,
    pub doc: Option<JsDoc>,
}

impl CallSignature {
    pub fn as_function_type(&self) -> FunctionType {
        FunctionType {
            type_params: self.type_params.clone(),
            params: self.params.clone(),
            return_type: Box::new(
                self.return_type
                    .clone()
                    .unwrap_or(DtsType::Primitive(Primitive::Any)),
            ),
        }
    }
}

/// An index signature: `[key: string]: Type;`
#[derive(Debug, Clone, PartialEq)]
pub struct IndexSignature {
    pub key_name: String,
    pub key_type: DtsType,
    pub value_type: DtsType,
    pub readonly: bool,
}

/// A TypeScript type.
#[derive(Debug, Clone, PartialEq)]
pub enum DtsType {
    /// A named type with optional type arguments: `Promise<T>`, `NS.Foo`,
    /// `import("m").Foo` (the import qualifier is dropped).
    Named {
        name: String,
        type_args: Vec<DtsType>,
    },
    Primitive(Primitive),
    StringLiteral(String),
    NumberLiteral(String),
    BooleanLiteral(bool),
    Union(Vec<DtsType>),
    Intersection(Vec<DtsType>),
    Function(Box<FunctionType>),
    /// A construct type: `new (a: T) => R`
    Constructor(Box<FunctionType>),
    Object(Vec<ObjectMember>),
    Array(Box<DtsType>),
    Tuple(Vec<TupleElement>),
    /// `typeof foo` or `typeof foo.bar`
    TypeOf(String),
    KeyOf(Box<DtsType>),
    IndexAccess {
        object: Box<DtsType>,
        index: Box<DtsType>,
    },
    Conditional {
        check: Box<DtsType>,
        extends: Box<DtsType>,
        true_type: Box<DtsType>,
        false_type: Box<DtsType>,
    },
    Mapped {
        key_name: String,
        key_constraint: Box<DtsType>,
        value_type: Box<DtsType>,
        optional: bool,
    },
    Infer(String),
    /// A template literal type, body kept verbatim.
    TemplateLiteral(String),
    Parenthesized(Box<DtsType>),
    This,
}

impl DtsType {
    /// Strips any number of parentheses.
    pub fn unparen(&self) -> &DtsType {
        match self {
            DtsType::Parenthesized(inner) => inner.unparen(),
            other => other,
        }
    }

    pub fn named(name: &str) -> Self {
        DtsType::Named {
            name: name.to_string(),
            type_args: Vec::new(),
        }
    }
}

/// A primitive TypeScript type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Primitive {
    String,
    Number,
    Boolean,
    Void,
    Null,
    Undefined,
    Any,
    Unknown,
    Never,
    Object,
    Symbol,
    BigInt,
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Primitive::String => "string",
            Primitive::Number => "number",
            Primitive::Boolean => "boolean",
            Primitive::Void => "void",
            Primitive::Null => "null",
            Primitive::Undefined => "undefined",
            Primitive::Any => "any",
            Primitive::Unknown => "unknown",
            Primitive::Never => "never",
            Primitive::Object => "object",
            Primitive::Symbol => "symbol",
            Primitive::BigInt => "bigint",
        };
        f.write_str(s)
    }
}

/// A function type: `(params) => ReturnType`
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub type_params: Vec<TypeParam>,
    pub params: Vec<Param>,
    pub return_type: Box<DtsType>,
}

/// An element in a tuple type.
#[derive(Debug, Clone, PartialEq)]
pub struct TupleElement {
    pub ty: DtsType,
    pub name: Option<String>,
    pub optional: bool,
    pub rest: bool,
}

fn write_list<T: fmt::Display>(f: &mut fmt::Formatter<'_>, items: &[T], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{item}")?;
    }
    Ok(())
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rest {
            f.write_str("...")?;
        }
        if self.pattern {
            f.write_str("{ ... }")?;
        } else {
            f.write_str(&self.name)?;
        }
        if self.optional {
            f.write_str("?")?;
        }
        write!(f, ": {}", self.ty)
    }
}

impl fmt::Display for TypeParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        if let Some(constraint) = &self.constraint {
            write!(f, " extends {constraint}")?;
        }
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

impl fmt::Display for FunctionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.type_params.is_empty() {
            f.write_str("<")?;
            write_list(f, &self.type_params, ", ")?;
            f.write_str(">")?;
        }
        f.write_str("(")?;
        write_list(f, &self.params, ", ")?;
        write!(f, ") => {}", self.return_type)
    }
}

fn write_signature(
    f: &mut fmt::Formatter<'_>,
    params: &[Param],
    return_type: Option<&DtsType>,
) -> fmt::Result {
    f.write_str("(")?;
    write_list(f, params, ", ")?;
    f.write_str(")")?;
    if let Some(ret) = return_type {
        write!(f, ": {ret}")?;
    }
    Ok(())
}

impl fmt::Display for ObjectMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectMember::Property(p) => {
                if p.readonly {
                    f.write_str("readonly ")?;
                }
                write!(f, "{}{}: {}", p.name, if p.optional { "?" } else { "" }, p.ty)
            }
            ObjectMember::Method(m) => {
                write!(f, "{}{}", m.name, if m.optional { "?" } else { "" })?;
                write_signature(f, &m.params, m.return_type.as_ref())
            }
            ObjectMember::CallSignature(c) => write_signature(f, &c.params, c.return_type.as_ref()),
            ObjectMember::ConstructSignature(c) => {
                f.write_str("new ")?;
                write_signature(f, &c.params, c.return_type.as_ref())
            }
            ObjectMember::IndexSignature(i) => {
                write!(f, "[{}: {}]: {}", i.key_name, i.key_type, i.value_type)
            }
        }
    }
}

impl fmt::Display for DtsType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DtsType::Named { name, type_args } => {
                f.write_str(name)?;
                if !type_args.is_empty() {
                    f.write_str("<")?;
                    write_list(f, type_args, ", ")?;
                    f.write_str(">")?;
                }
                Ok(())
            }
            DtsType::Primitive(p) => write!(f, "{p}"),
            DtsType::StringLiteral(s) => write!(f, "\"{s}\""),
            DtsType::NumberLiteral(n) => f.write_str(n),
            DtsType::BooleanLiteral(b) => write!(f, "{b}"),
            DtsType::Union(types) => write_list(f, types, " | "),
            DtsType::Intersection(types) => write_list(f, types, " & "),
            DtsType::Function(func) => write!(f, "{func}"),
            DtsType::Constructor(func) => write!(f, "new {func}"),
            DtsType::Object(members) => {
                if members.is_empty() {
                    return f.write_str("{}");
                }
                f.write_str("{ ")?;
                write_list(f, members, "; ")?;
                f.write_str(" }")
            }
            DtsType::Array(inner) => match inner.as_ref() {
                DtsType::Union(_) | DtsType::Intersection(_) | DtsType::Function(_) => {
                    write!(f, "({inner})[]")
                }
                _ => write!(f, "{inner}[]"),
            },
            DtsType::Tuple(elements) => {
                f.write_str("[")?;
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if el.rest {
                        f.write_str("...")?;
                    }
                    if let Some(name) = &el.name {
                        write!(f, "{name}{}: ", if el.optional { "?" } else { "" })?;
                    }
                    write!(f, "{}", el.ty)?;
                }
                f.write_str("]")
            }
            DtsType::TypeOf(name) => write!(f, "typeof {name}"),
            DtsType::KeyOf(inner) => write!(f, "keyof {inner}"),
            DtsType::IndexAccess { object, index } => write!(f, "{object}[{index}]"),
            DtsType::Conditional {
                check,
                extends,
                true_type,
                false_type,
            } => write!(f, "{check} extends {extends} ? {true_type} : {false_type}"),
            DtsType::Mapped {
                key_name,
                key_constraint,
                value_type,
                optional,
            } => write!(
                f,
                "{{ [{key_name} in {key_constraint}]{}: {value_type} }}",
                if *optional { "?" } else { "" }
            ),
            DtsType::Infer(name) => write!(f, "infer {name}"),
            DtsType::TemplateLiteral(body) => write!(f, "`{body}`"),
            DtsType::Parenthesized(inner) => write!(f, "({inner})"),
            DtsType::This => f.write_str("this"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn displays_function_type() {
        let ty = DtsType::Function(Box::new(FunctionType {
            type_params: Vec::new(),
            params: vec![Param {
                name: "x".to_string(),
                ty: DtsType::Primitive(Primitive::Number),
                optional: false,
                rest: false,
                pattern: false,
            }],
            return_type: Box::new(DtsType::named("Promise")),
        }));
        assert_eq!(ty.to_string(), "(x: number) => Promise");
    }

    #[test]
    fn displays_union_array_with_parens() {
        let ty = DtsType::Array(Box::new(DtsType::Union(vec![
            DtsType::StringLiteral("a".to_string()),
            DtsType::Primitive(Primitive::Null),
        ])));
        assert_eq!(ty.to_string(), "(\"a\" | null)[]");
    }
}
