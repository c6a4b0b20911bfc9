//! Parser for TypeScript declaration files.

use crate::ast::*;
use crate::jsdoc::JsDoc;
use crate::lexer::{Keyword, Lexer, Token, TokenKind};

/// A parse error.
#[derive(Debug, Clone)]
pub struct ParseError {
    pub message: String,
    pub pos: usize,
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "parse error at {}: {}", self.pos, self.message)
    }
}

impl std::error::Error for ParseError {}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Parse a .d.ts source string into a DtsFile.
pub fn parse(src: &str) -> ParseResult<DtsFile> {
    let mut parser = Parser::new(src);
    parser.parse_file()
}

/// Parse a standalone type expression, e.g. `Promise<string | null>`.
pub fn parse_type_str(src: &str) -> ParseResult<DtsType> {
    let mut parser = Parser::new(src);
    let ty = parser.parse_type()?;
    if !parser.check(&TokenKind::Eof) {
        return Err(parser.error(format!("unexpected trailing token {:?}", parser.peek())));
    }
    Ok(ty)
}

/// Spelling of keyword tokens, used where TypeScript accepts any IdentifierName.
fn keyword_text(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Keyword(keyword) => Some(keyword.as_str()),
        _ => None,
    }
}

/// Keywords that may still name a binding.
fn contextual_keyword(kind: &TokenKind) -> Option<&'static str> {
    match kind {
        TokenKind::Keyword(keyword) if keyword.is_contextual() => Some(keyword.as_str()),
        _ => None,
    }
}

/// Parser for TypeScript declaration files.
struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn new(src: &str) -> Self {
        let tokens = Lexer::new(src).tokenize();
        Self { tokens, pos: 0 }
    }

    fn current(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek(&self) -> &TokenKind {
        &self.current().kind
    }

    fn peek_nth(&self, n: usize) -> &TokenKind {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx].kind
    }

    fn advance(&mut self) -> Token {
        let token = self.current().clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        token
    }

    fn check(&self, kind: &TokenKind) -> bool {
        std::mem::discriminant(self.peek()) == std::mem::discriminant(kind)
    }

    fn matches(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            message: message.into(),
            pos: self.current().start,
        }
    }

    fn expect(&mut self, kind: &TokenKind) -> ParseResult<Token> {
        if self.check(kind) {
            Ok(self.advance())
        } else {
            Err(self.error(format!("expected {:?}, found {:?}", kind, self.peek())))
        }
    }

    fn expect_ident(&mut self) -> ParseResult<String> {
        if let TokenKind::Ident(name) = self.peek() {
            let name = name.clone();
            self.advance();
            return Ok(name);
        }
        if let Some(text) = contextual_keyword(self.peek()) {
            self.advance();
            return Ok(text.to_string());
        }
        Err(self.error(format!("expected identifier, found {:?}", self.peek())))
    }

    fn is_ident_like(&self, kind: &TokenKind) -> bool {
        matches!(kind, TokenKind::Ident(_)) || keyword_text(kind).is_some()
    }

    /// Accept any identifier, keyword, string or number as a property name.
    fn expect_property_name(&mut self) -> ParseResult<String> {
        match self.peek().clone() {
            TokenKind::Ident(name) => {
                self.advance();
                Ok(name)
            }
            TokenKind::StringLiteral(s) | TokenKind::NumberLiteral(s) => {
                self.advance();
                Ok(s)
            }
            kind => match keyword_text(&kind) {
                Some(text) => {
                    self.advance();
                    Ok(text.to_string())
                }
                None => Err(self.error(format!("expected property name, found {kind:?}"))),
            },
        }
    }

    /// True when the current keyword is a modifier rather than a member name:
    /// `readonly name: T` versus `readonly: boolean` or `readonly(): void`.
    fn is_modifier_not_property(&self) -> bool {
        !matches!(
            self.peek_nth(1),
            TokenKind::Colon
                | TokenKind::Question
                | TokenKind::LParen
                | TokenKind::LAngle
                | TokenKind::Semicolon
                | TokenKind::Comma
                | TokenKind::RBrace
        )
    }

    fn take_doc(&self) -> Option<JsDoc> {
        self.current().doc.as_deref().map(JsDoc::parse)
    }

    fn skip_member_terminator(&mut self) {
        if !self.matches(&TokenKind::Semicolon) {
            self.matches(&TokenKind::Comma);
        }
    }

    fn skip_until_semicolon(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::Semicolon if depth == 0 => {
                    self.advance();
                    break;
                }
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    if depth == 0 {
                        break;
                    }
                    depth -= 1;
                }
                _ => {}
            }
            self.advance();
        }
    }

    /// Index of the token closing the bracket at `open`, if any.
    fn matching_close(&self, open: usize) -> Option<usize> {
        let mut depth = 0usize;
        for (idx, token) in self.tokens.iter().enumerate().skip(open) {
            match token.kind {
                TokenKind::LParen | TokenKind::LBrace | TokenKind::LBracket => depth += 1,
                TokenKind::RParen | TokenKind::RBrace | TokenKind::RBracket => {
                    depth = depth.checked_sub(1)?;
                    if depth == 0 {
                        return Some(idx);
                    }
                }
                TokenKind::Eof => return None,
                _ => {}
            }
        }
        None
    }

    fn parse_file(&mut self) -> ParseResult<DtsFile> {
        let mut items = Vec::new();

        while !self.check(&TokenKind::Eof) {
            if let Some(item) = self.parse_item()? {
                items.push(item);
            }
        }

        Ok(DtsFile { items })
    }

    fn parse_block_items(&mut self) -> ParseResult<Vec<DtsItem>> {
        self.expect(&TokenKind::LBrace)?;
        let mut items = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            if let Some(item) = self.parse_item()? {
                items.push(item);
            }
        }
        self.expect(&TokenKind::RBrace)?;
        Ok(items)
    }

    fn parse_item(&mut self) -> ParseResult<Option<DtsItem>> {
        let doc = self.take_doc();
        let mut exported = false;

        loop {
            match self.peek() {
                TokenKind::Keyword(Keyword::Export) => {
                    exported = true;
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Declare) => {
                    self.advance();
                }
                TokenKind::Keyword(Keyword::Abstract) if matches!(self.peek_nth(1), TokenKind::Keyword(Keyword::Class)) => {
                    self.advance();
                }
                _ => break,
            }
        }

        if exported {
            if self.matches(&TokenKind::Eq) {
                let name = self.expect_ident()?;
                self.matches(&TokenKind::Semicolon);
                return Ok(Some(DtsItem::Export(DtsExport::Equals(name))));
            }
            if self.check(&TokenKind::Keyword(Keyword::Default)) {
                self.advance();
                if !matches!(
                    self.peek(),
                    TokenKind::Keyword(Keyword::Function) | TokenKind::Keyword(Keyword::Class) | TokenKind::Keyword(Keyword::Interface) | TokenKind::Keyword(Keyword::Abstract)
                ) {
                    let name = self.expect_ident()?;
                    self.matches(&TokenKind::Semicolon);
                    return Ok(Some(DtsItem::Export(DtsExport::Default(name))));
                }
                self.matches(&TokenKind::Keyword(Keyword::Abstract));
            }
            if self.check(&TokenKind::Star) {
                return self.parse_export_all().map(Some);
            }
            if self.check(&TokenKind::LBrace)
                || (self.check(&TokenKind::Keyword(Keyword::Type)) && matches!(self.peek_nth(1), TokenKind::LBrace))
            {
                self.matches(&TokenKind::Keyword(Keyword::Type));
                return self.parse_named_exports().map(Some);
            }
            if self.check(&TokenKind::Keyword(Keyword::As)) {
                // `export as namespace Foo;`
                self.skip_until_semicolon();
                return Ok(None);
            }
            if self.check(&TokenKind::Keyword(Keyword::Import)) {
                // `export import X = require("m");`
                self.skip_until_semicolon();
                return Ok(None);
            }
        }

        let item = match self.peek() {
            TokenKind::Keyword(Keyword::Function) => DtsItem::Function(self.parse_function(exported, doc)?),
            TokenKind::Keyword(Keyword::Interface) => DtsItem::Interface(self.parse_interface(exported, doc)?),
            TokenKind::Keyword(Keyword::Class) => DtsItem::Class(self.parse_class(exported, doc)?),
            TokenKind::Keyword(Keyword::Enum) => DtsItem::Enum(self.parse_enum(false, exported, doc)?),
            TokenKind::Keyword(Keyword::Const) if matches!(self.peek_nth(1), TokenKind::Keyword(Keyword::Enum)) => {
                self.advance();
                DtsItem::Enum(self.parse_enum(true, exported, doc)?)
            }
            TokenKind::Keyword(Keyword::Type) if self.is_ident_like(self.peek_nth(1)) => {
                DtsItem::TypeAlias(self.parse_type_alias(exported, doc)?)
            }
            TokenKind::Keyword(Keyword::Const) | TokenKind::Keyword(Keyword::Let) | TokenKind::Keyword(Keyword::Var) => {
                DtsItem::Variable(self.parse_variable(exported, doc)?)
            }
            TokenKind::Keyword(Keyword::Namespace) => DtsItem::Namespace(self.parse_namespace(exported)?),
            TokenKind::Keyword(Keyword::Module) => DtsItem::Module(self.parse_module()?),
            TokenKind::Ident(name) if name == "global" && matches!(self.peek_nth(1), TokenKind::LBrace) => {
                self.advance();
                let items = self.parse_block_items()?;
                DtsItem::Module(DtsModule {
                    name: "global".to_string(),
                    items,
                    is_ambient: true,
                })
            }
            TokenKind::Keyword(Keyword::Import) => match self.parse_import()? {
                Some(import) => DtsItem::Import(import),
                None => return Ok(None),
            },
            TokenKind::Eof => return Ok(None),
            _ => {
                self.advance();
                return Ok(None);
            }
        };
        Ok(Some(item))
    }

    fn parse_import(&mut self) -> ParseResult<Option<DtsImport>> {
        self.expect(&TokenKind::Keyword(Keyword::Import))?;
        if self.check(&TokenKind::Keyword(Keyword::Type)) && !matches!(self.peek_nth(1), TokenKind::Keyword(Keyword::From) | TokenKind::Eq) {
            self.advance();
        }

        // Side-effect import: `import "m";`
        if let TokenKind::StringLiteral(from) = self.peek().clone() {
            self.advance();
            self.matches(&TokenKind::Semicolon);
            return Ok(Some(DtsImport {
                names: Vec::new(),
                from,
            }));
        }

        let mut names = Vec::new();
        if self.is_ident_like(self.peek()) && !self.check(&TokenKind::Star) {
            let local = self.expect_ident()?;
            if self.check(&TokenKind::Eq) {
                // `import X = require("m");` or `import X = NS.Y;`
                self.skip_until_semicolon();
                return Ok(None);
            }
            names.push(("default".to_string(), local));
            self.matches(&TokenKind::Comma);
        }
        if self.matches(&TokenKind::Star) {
            self.expect(&TokenKind::Keyword(Keyword::As))?;
            let local = self.expect_ident()?;
            names.push(("*".to_string(), local));
        }
        if self.matches(&TokenKind::LBrace) {
            while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
                if self.check(&TokenKind::Keyword(Keyword::Type)) && self.is_ident_like(self.peek_nth(1)) {
                    self.advance();
                }
                let imported = self.expect_property_name()?;
                let local = if self.matches(&TokenKind::Keyword(Keyword::As)) {
                    self.expect_ident()?
                } else {
                    imported.clone()
                };
                names.push((imported, local));
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
            self.expect(&TokenKind::RBrace)?;
        }

        self.expect(&TokenKind::Keyword(Keyword::From))?;
        let from = match self.peek().clone() {
            TokenKind::StringLiteral(s) => {
                self.advance();
                s
            }
            other => return Err(self.error(format!("expected module specifier, found {other:?}"))),
        };
        self.matches(&TokenKind::Semicolon);
        Ok(Some(DtsImport { names, from }))
    }

    fn parse_module_specifier(&mut self) -> ParseResult<Option<String>> {
        if !self.matches(&TokenKind::Keyword(Keyword::From)) {
            return Ok(None);
        }
        match self.peek().clone() {
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(Some(s))
            }
            other => Err(self.error(format!("expected module specifier, found {other:?}"))),
        }
    }

    fn parse_export_all(&mut self) -> ParseResult<DtsItem> {
        self.expect(&TokenKind::Star)?;
        let alias = if self.matches(&TokenKind::Keyword(Keyword::As)) {
            Some(self.expect_ident()?)
        } else {
            None
        };
        let from = self
            .parse_module_specifier()?
            .ok_or_else(|| self.error("expected `from` after `export *`"))?;
        self.matches(&TokenKind::Semicolon);
        Ok(DtsItem::Export(DtsExport::All { from, alias }))
    }

    fn parse_named_exports(&mut self) -> ParseResult<DtsItem> {
        self.expect(&TokenKind::LBrace)?;
        let mut names = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            if self.check(&TokenKind::Keyword(Keyword::Type)) && self.is_ident_like(self.peek_nth(1)) {
                self.advance();
            }
            let name = self.expect_property_name()?;
            let alias = if self.matches(&TokenKind::Keyword(Keyword::As)) {
                Some(self.expect_property_name()?)
            } else {
                None
            };
            names.push((name, alias));

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBrace)?;
        let from = self.parse_module_specifier()?;
        self.matches(&TokenKind::Semicolon);
        Ok(DtsItem::Export(DtsExport::Named { names, from }))
    }

    fn parse_return_annotation(&mut self) -> ParseResult<Option<DtsType>> {
        if self.matches(&TokenKind::Colon) {
            Ok(Some(self.parse_type()?))
        } else {
            Ok(None)
        }
    }

    fn parse_function(&mut self, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsFunction> {
        self.expect(&TokenKind::Keyword(Keyword::Function))?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        let return_type = self.parse_return_annotation()?;
        self.matches(&TokenKind::Semicolon);

        Ok(DtsFunction {
            name,
            type_params,
            params,
            return_type,
            exported,
            doc,
        })
    }

    fn parse_interface(&mut self, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsInterface> {
        self.expect(&TokenKind::Keyword(Keyword::Interface))?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        let mut extends = Vec::new();
        if self.matches(&TokenKind::Keyword(Keyword::Extends)) {
            loop {
                extends.push(self.parse_type_operator()?);
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let members = self.parse_object_body(false)?;

        Ok(DtsInterface {
            name,
            type_params,
            extends,
            members,
            exported,
            doc,
        })
    }

    /// Parses `{ members }` for interfaces, object literal types and classes.
    fn parse_object_body(&mut self, class_body: bool) -> ParseResult<Vec<ObjectMember>> {
        self.expect(&TokenKind::LBrace)?;
        let mut members = Vec::new();

        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            if self.matches(&TokenKind::Semicolon) || self.matches(&TokenKind::Comma) {
                continue;
            }
            if let Some(member) = self.parse_object_member(class_body)? {
                members.push(member);
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(members)
    }

    fn parse_object_member(&mut self, class_body: bool) -> ParseResult<Option<ObjectMember>> {
        let doc = self.take_doc();
        let mut readonly = false;
        let mut private = false;

        loop {
            match self.peek() {
                TokenKind::Keyword(Keyword::Readonly) if self.is_modifier_not_property() => readonly = true,
                TokenKind::Keyword(Keyword::Private) | TokenKind::Keyword(Keyword::Protected)
                    if class_body && self.is_modifier_not_property() =>
                {
                    private = true
                }
                TokenKind::Keyword(Keyword::Public) | TokenKind::Keyword(Keyword::Static) | TokenKind::Keyword(Keyword::Abstract) | TokenKind::Keyword(Keyword::Declare)
                    if class_body && self.is_modifier_not_property() => {}
                TokenKind::Ident(word)
                    if class_body
                        && (word == "override" || word == "accessor")
                        && self.is_modifier_not_property() => {}
                TokenKind::Minus | TokenKind::Plus
                    if matches!(self.peek_nth(1), TokenKind::Keyword(Keyword::Readonly)) =>
                {
                    self.advance();
                    readonly = true;
                }
                _ => break,
            }
            self.advance();
        }

        // Index signature or computed key: [key: Type]: Type / [Symbol.iterator](): T
        if self.check(&TokenKind::LBracket) {
            let is_index = self.is_ident_like(self.peek_nth(1)) && matches!(self.peek_nth(2), TokenKind::Colon);
            if !is_index {
                self.skip_until_member_end();
                return Ok(None);
            }
            let sig = self.parse_index_signature(readonly)?;
            return Ok(if private { None } else { Some(ObjectMember::IndexSignature(sig)) });
        }

        // Call signature: (params): Type
        if self.check(&TokenKind::LParen) || self.check(&TokenKind::LAngle) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let return_type = self.parse_return_annotation()?;
            self.skip_member_terminator();
            return Ok(Some(ObjectMember::CallSignature(CallSignature {
                type_params,
                params,
                return_type,
                doc,
            })));
        }

        // Construct signature: new (params): Type
        if self.check(&TokenKind::Keyword(Keyword::New)) && self.is_modifier_not_property() {
            self.advance();
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let return_type = self.parse_return_annotation()?;
            self.skip_member_terminator();
            return Ok(Some(ObjectMember::ConstructSignature(CallSignature {
                type_params,
                params,
                return_type,
                doc,
            })));
        }

        // Accessors: get name(): T / set name(v: T)
        if let TokenKind::Ident(word) = self.peek() {
            if (word == "get" || word == "set") && self.is_modifier_not_property() {
                let is_get = word == "get";
                self.advance();
                let name = self.expect_property_name()?;
                let params = self.parse_params()?;
                let return_type = self.parse_return_annotation()?;
                self.skip_member_terminator();
                let ty = if is_get {
                    return_type.unwrap_or(DtsType::Primitive(Primitive::Any))
                } else {
                    params
                        .into_iter()
                        .next()
                        .map(|p| p.ty)
                        .unwrap_or(DtsType::Primitive(Primitive::Any))
                };
                if private {
                    return Ok(None);
                }
                return Ok(Some(ObjectMember::Property(PropertyMember {
                    name,
                    ty,
                    optional: false,
                    readonly: is_get,
                    doc,
                })));
            }
        }

        let name = match self.expect_property_name() {
            Ok(n) => n,
            Err(_) => {
                self.advance();
                return Ok(None);
            }
        };

        let optional = self.matches(&TokenKind::Question);

        if class_body && name == "constructor" && self.check(&TokenKind::LParen) {
            let params = self.parse_params()?;
            self.parse_return_annotation()?;
            self.skip_member_terminator();
            return Ok(Some(ObjectMember::ConstructSignature(CallSignature {
                type_params: Vec::new(),
                params,
                return_type: None,
                doc,
            })));
        }

        if self.check(&TokenKind::LParen) || self.check(&TokenKind::LAngle) {
            let type_params = self.parse_type_params()?;
            let params = self.parse_params()?;
            let return_type = self.parse_return_annotation()?;
            self.skip_member_terminator();
            if private {
                return Ok(None);
            }
            return Ok(Some(ObjectMember::Method(MethodMember {
                name,
                type_params,
                params,
                return_type,
                optional,
                doc,
            })));
        }

        let ty = if self.matches(&TokenKind::Colon) {
            self.parse_type()?
        } else {
            DtsType::Primitive(Primitive::Any)
        };
        self.skip_member_terminator();

        if private {
            return Ok(None);
        }
        Ok(Some(ObjectMember::Property(PropertyMember {
            name,
            ty,
            optional,
            readonly,
            doc,
        })))
    }

    fn skip_until_member_end(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek() {
                TokenKind::Eof => break,
                TokenKind::LBrace | TokenKind::LParen | TokenKind::LBracket => depth += 1,
                TokenKind::RBrace if depth == 0 => break,
                TokenKind::RBrace | TokenKind::RParen | TokenKind::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                TokenKind::Semicolon | TokenKind::Comma if depth == 0 => {
                    self.advance();
                    break;
                }
                _ => {}
            }
            self.advance();
        }
    }

    fn parse_index_signature(&mut self, readonly: bool) -> ParseResult<IndexSignature> {
        self.expect(&TokenKind::LBracket)?;
        let key_name = self.expect_property_name()?;
        self.expect(&TokenKind::Colon)?;
        let key_type = self.parse_type()?;
        self.expect(&TokenKind::RBracket)?;
        self.matches(&TokenKind::Question);
        self.expect(&TokenKind::Colon)?;
        let value_type = self.parse_type()?;
        self.skip_member_terminator();

        Ok(IndexSignature {
            key_name,
            key_type,
            value_type,
            readonly,
        })
    }

    fn parse_class(&mut self, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsClass> {
        self.expect(&TokenKind::Keyword(Keyword::Class))?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;

        let extends = if self.matches(&TokenKind::Keyword(Keyword::Extends)) {
            Some(self.parse_type_operator()?)
        } else {
            None
        };

        if self.matches(&TokenKind::Keyword(Keyword::Implements)) {
            loop {
                self.parse_type_operator()?;
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
            }
        }

        let members = self.parse_object_body(true)?;

        Ok(DtsClass {
            name,
            type_params,
            extends,
            members,
            exported,
            doc,
        })
    }

    fn parse_enum(&mut self, is_const: bool, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsEnum> {
        self.expect(&TokenKind::Keyword(Keyword::Enum))?;
        let name = self.expect_ident()?;
        self.expect(&TokenKind::LBrace)?;

        let mut members = Vec::new();
        while !self.check(&TokenKind::RBrace) && !self.check(&TokenKind::Eof) {
            let member_name = self.expect_property_name()?;
            let value = if self.matches(&TokenKind::Eq) {
                let negative = self.matches(&TokenKind::Minus);
                match self.peek().clone() {
                    TokenKind::StringLiteral(s) => {
                        self.advance();
                        Some(EnumValue::String(s))
                    }
                    TokenKind::NumberLiteral(n) => {
                        self.advance();
                        Some(EnumValue::Number(if negative { format!("-{n}") } else { n }))
                    }
                    _ => {
                        // Computed initializer; keep the member without a value.
                        while !matches!(self.peek(), TokenKind::Comma | TokenKind::RBrace | TokenKind::Eof) {
                            self.advance();
                        }
                        None
                    }
                }
            } else {
                None
            };
            members.push(EnumMember {
                name: member_name,
                value,
            });
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBrace)?;
        Ok(DtsEnum {
            name,
            members,
            is_const,
            exported,
            doc,
        })
    }

    fn parse_type_alias(&mut self, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsTypeAlias> {
        self.expect(&TokenKind::Keyword(Keyword::Type))?;
        let name = self.expect_ident()?;
        let type_params = self.parse_type_params()?;
        self.expect(&TokenKind::Eq)?;
        let ty = self.parse_type()?;
        self.matches(&TokenKind::Semicolon);

        Ok(DtsTypeAlias {
            name,
            type_params,
            ty,
            exported,
            doc,
        })
    }

    fn parse_variable(&mut self, exported: bool, doc: Option<JsDoc>) -> ParseResult<DtsVariable> {
        let is_const = self.matches(&TokenKind::Keyword(Keyword::Const));
        if !is_const && !self.matches(&TokenKind::Keyword(Keyword::Let)) {
            self.matches(&TokenKind::Keyword(Keyword::Var));
        }

        let name = self.expect_property_name()?;
        let ty = if self.matches(&TokenKind::Colon) {
            self.parse_type()?
        } else {
            DtsType::Primitive(Primitive::Any)
        };
        if self.check(&TokenKind::Eq) {
            // `const x = 1;` initializers are legal in .d.ts for literals.
            self.skip_until_semicolon();
        } else {
            self.matches(&TokenKind::Semicolon);
        }

        Ok(DtsVariable {
            name,
            ty,
            is_const,
            exported,
            doc,
        })
    }

    fn parse_namespace(&mut self, exported: bool) -> ParseResult<DtsNamespace> {
        self.expect(&TokenKind::Keyword(Keyword::Namespace))?;
        let mut name = self.expect_ident()?;
        while self.matches(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_ident()?);
        }
        let items = self.parse_block_items()?;
        Ok(DtsNamespace {
            name,
            items,
            exported,
        })
    }

    fn parse_module(&mut self) -> ParseResult<DtsModule> {
        self.expect(&TokenKind::Keyword(Keyword::Module))?;

        let (name, is_ambient) = match self.peek().clone() {
            TokenKind::StringLiteral(s) => {
                self.advance();
                (s, true)
            }
            _ => (self.expect_ident()?, false),
        };

        if self.matches(&TokenKind::Semicolon) {
            // Shorthand ambient module: `declare module "foo";`
            return Ok(DtsModule {
                name,
                items: Vec::new(),
                is_ambient,
            });
        }

        let items = self.parse_block_items()?;
        Ok(DtsModule {
            name,
            items,
            is_ambient,
        })
    }

    fn parse_type_params(&mut self) -> ParseResult<Vec<TypeParam>> {
        if !self.matches(&TokenKind::LAngle) {
            return Ok(Vec::new());
        }

        let mut params = Vec::new();
        while !self.check(&TokenKind::RAngle) && !self.check(&TokenKind::Eof) {
            // Variance and const modifiers
            while matches!(self.peek(), TokenKind::Keyword(Keyword::In) | TokenKind::Keyword(Keyword::Out) | TokenKind::Keyword(Keyword::Const))
                && self.is_ident_like(self.peek_nth(1))
            {
                self.advance();
            }

            let name = self.expect_ident()?;

            let constraint = if self.matches(&TokenKind::Keyword(Keyword::Extends)) {
                Some(self.parse_type()?)
            } else {
                None
            };

            let default = if self.matches(&TokenKind::Eq) {
                Some(self.parse_type()?)
            } else {
                None
            };

            params.push(TypeParam {
                name,
                constraint,
                default,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RAngle)?;
        Ok(params)
    }

    fn parse_params(&mut self) -> ParseResult<Vec<Param>> {
        self.expect(&TokenKind::LParen)?;

        let mut params = Vec::new();
        while !self.check(&TokenKind::RParen) && !self.check(&TokenKind::Eof) {
            // `this` parameter: typed receiver, not a real argument.
            if self.check(&TokenKind::Keyword(Keyword::This)) && matches!(self.peek_nth(1), TokenKind::Colon) {
                self.advance();
                self.advance();
                self.parse_type()?;
                if !self.matches(&TokenKind::Comma) {
                    break;
                }
                continue;
            }

            // Constructor parameter properties.
            while matches!(
                self.peek(),
                TokenKind::Keyword(Keyword::Public) | TokenKind::Keyword(Keyword::Private) | TokenKind::Keyword(Keyword::Protected) | TokenKind::Keyword(Keyword::Readonly)
            ) && self.is_ident_like(self.peek_nth(1))
            {
                self.advance();
            }

            let rest = self.matches(&TokenKind::DotDotDot);

            let (name, pattern) = if self.check(&TokenKind::LBrace) || self.check(&TokenKind::LBracket) {
                let close = self
                    .matching_close(self.pos)
                    .ok_or_else(|| self.error("unterminated binding pattern"))?;
                self.pos = close + 1;
                (String::new(), true)
            } else {
                (self.expect_ident()?, false)
            };
            let optional = self.matches(&TokenKind::Question);

            let ty = if self.matches(&TokenKind::Colon) {
                self.parse_type()?
            } else {
                DtsType::Primitive(Primitive::Any)
            };

            if self.matches(&TokenKind::Eq) {
                // Default values are not legal in .d.ts but appear in hand-written files.
                while !matches!(self.peek(), TokenKind::Comma | TokenKind::RParen | TokenKind::Eof) {
                    self.advance();
                }
            }

            params.push(Param {
                name,
                ty,
                optional,
                rest,
                pattern,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RParen)?;
        Ok(params)
    }

    /// Entry point for type expressions, including conditional types.
    fn parse_type(&mut self) -> ParseResult<DtsType> {
        let check = self.parse_union_type()?;
        if self.check(&TokenKind::Keyword(Keyword::Extends)) {
            self.advance();
            let extends = self.parse_union_type()?;
            self.expect(&TokenKind::Question)?;
            let true_type = self.parse_type()?;
            self.expect(&TokenKind::Colon)?;
            let false_type = self.parse_type()?;
            return Ok(DtsType::Conditional {
                check: Box::new(check),
                extends: Box::new(extends),
                true_type: Box::new(true_type),
                false_type: Box::new(false_type),
            });
        }
        Ok(check)
    }

    fn parse_union_type(&mut self) -> ParseResult<DtsType> {
        self.matches(&TokenKind::Pipe);

        let mut types = vec![self.parse_intersection_type()?];

        while self.matches(&TokenKind::Pipe) {
            types.push(self.parse_intersection_type()?);
        }

        if types.len() == 1 {
            Ok(types.remove(0))
        } else {
            Ok(DtsType::Union(types))
        }
    }

    fn parse_intersection_type(&mut self) -> ParseResult<DtsType> {
        self.matches(&TokenKind::Amp);

        let mut types = vec![self.parse_type_operator()?];

        while self.matches(&TokenKind::Amp) {
            types.push(self.parse_type_operator()?);
        }

        if types.len() == 1 {
            Ok(types.remove(0))
        } else {
            Ok(DtsType::Intersection(types))
        }
    }

    /// Prefix operators: `keyof`, `readonly`, `unique`, `infer`.
    fn parse_type_operator(&mut self) -> ParseResult<DtsType> {
        match self.peek() {
            TokenKind::Keyword(Keyword::Keyof) => {
                self.advance();
                let ty = self.parse_type_operator()?;
                Ok(DtsType::KeyOf(Box::new(ty)))
            }
            TokenKind::Keyword(Keyword::Readonly) => {
                self.advance();
                self.parse_type_operator()
            }
            TokenKind::Keyword(Keyword::Unique) => {
                self.advance();
                self.parse_type_operator()
            }
            TokenKind::Keyword(Keyword::Infer) => {
                self.advance();
                let name = self.expect_ident()?;
                // `infer U extends string` inside a conditional's extends clause
                if self.check(&TokenKind::Keyword(Keyword::Extends)) && !matches!(self.peek_nth(2), TokenKind::Question) {
                    self.advance();
                    self.parse_postfix_type()?;
                }
                Ok(DtsType::Infer(name))
            }
            _ => self.parse_postfix_type(),
        }
    }

    fn parse_postfix_type(&mut self) -> ParseResult<DtsType> {
        let mut ty = self.parse_primary_type()?;

        loop {
            if self.check(&TokenKind::LBracket) && self.peek_nth(1) == &TokenKind::RBracket {
                self.advance();
                self.advance();
                ty = DtsType::Array(Box::new(ty));
                continue;
            }

            if self.check(&TokenKind::LBracket) {
                self.advance();
                let index = self.parse_type()?;
                self.expect(&TokenKind::RBracket)?;
                ty = DtsType::IndexAccess {
                    object: Box::new(ty),
                    index: Box::new(index),
                };
                continue;
            }

            break;
        }

        Ok(ty)
    }

    fn parse_primary_type(&mut self) -> ParseResult<DtsType> {
        let primitive = match self.peek() {
            TokenKind::Keyword(Keyword::String) => Some(Primitive::String),
            TokenKind::Keyword(Keyword::Number) => Some(Primitive::Number),
            TokenKind::Keyword(Keyword::Boolean) => Some(Primitive::Boolean),
            TokenKind::Keyword(Keyword::Void) => Some(Primitive::Void),
            TokenKind::Keyword(Keyword::Null) => Some(Primitive::Null),
            TokenKind::Keyword(Keyword::Undefined) => Some(Primitive::Undefined),
            TokenKind::Keyword(Keyword::Any) => Some(Primitive::Any),
            TokenKind::Keyword(Keyword::Unknown) => Some(Primitive::Unknown),
            TokenKind::Keyword(Keyword::Never) => Some(Primitive::Never),
            TokenKind::Keyword(Keyword::Object) => Some(Primitive::Object),
            TokenKind::Keyword(Keyword::Symbol) => Some(Primitive::Symbol),
            TokenKind::Keyword(Keyword::BigInt) => Some(Primitive::BigInt),
            _ => None,
        };
        if let Some(primitive) = primitive {
            self.advance();
            return Ok(DtsType::Primitive(primitive));
        }

        match self.peek().clone() {
            TokenKind::Keyword(Keyword::True) => {
                self.advance();
                Ok(DtsType::BooleanLiteral(true))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.advance();
                Ok(DtsType::BooleanLiteral(false))
            }
            TokenKind::StringLiteral(s) => {
                self.advance();
                Ok(DtsType::StringLiteral(s))
            }
            TokenKind::NumberLiteral(n) => {
                self.advance();
                Ok(DtsType::NumberLiteral(n))
            }
            TokenKind::Minus => {
                self.advance();
                match self.peek().clone() {
                    TokenKind::NumberLiteral(n) => {
                        self.advance();
                        Ok(DtsType::NumberLiteral(format!("-{n}")))
                    }
                    other => Err(self.error(format!("expected number after `-`, found {other:?}"))),
                }
            }
            TokenKind::TemplateString(body) => {
                self.advance();
                Ok(DtsType::TemplateLiteral(body))
            }
            TokenKind::Keyword(Keyword::Typeof) => {
                self.advance();
                if self.check(&TokenKind::Keyword(Keyword::Import)) {
                    return self.parse_import_type();
                }
                let mut name = self.expect_property_name()?;
                while self.check(&TokenKind::Dot) {
                    self.advance();
                    name.push('.');
                    name.push_str(&self.expect_property_name()?);
                }
                Ok(DtsType::TypeOf(name))
            }
            TokenKind::Keyword(Keyword::Import) => self.parse_import_type(),
            TokenKind::Keyword(Keyword::This) => {
                self.advance();
                if self.matches(&TokenKind::Keyword(Keyword::Is)) {
                    self.parse_type()?;
                    return Ok(DtsType::Primitive(Primitive::Boolean));
                }
                Ok(DtsType::This)
            }
            TokenKind::Keyword(Keyword::Asserts) => {
                // `asserts x` / `asserts x is T`
                self.advance();
                self.expect_property_name()?;
                if self.matches(&TokenKind::Keyword(Keyword::Is)) {
                    self.parse_type()?;
                }
                Ok(DtsType::Primitive(Primitive::Void))
            }
            TokenKind::Keyword(Keyword::New) => {
                self.advance();
                match self.parse_function_type()? {
                    DtsType::Function(func) => Ok(DtsType::Constructor(func)),
                    other => Ok(other),
                }
            }
            TokenKind::Keyword(Keyword::Abstract) if matches!(self.peek_nth(1), TokenKind::Keyword(Keyword::New)) => {
                self.advance();
                self.parse_primary_type()
            }
            TokenKind::LParen => self.parse_paren_or_function_type(),
            TokenKind::LBrace => self.parse_object_type(),
            TokenKind::LBracket => self.parse_tuple_type(),
            TokenKind::LAngle => self.parse_function_type(),
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::Keyword(Keyword::Is)) {
                    // Type predicate `x is T` in return position.
                    self.advance();
                    self.parse_type()?;
                    return Ok(DtsType::Primitive(Primitive::Boolean));
                }
                self.parse_named_type(name)
            }
            kind => match contextual_keyword(&kind) {
                Some(text) => {
                    self.advance();
                    self.parse_named_type(text.to_string())
                }
                None => Err(self.error(format!("unexpected token in type position: {kind:?}"))),
            },
        }
    }

    /// `import("module").Name<Args>`; the module qualifier is dropped.
    fn parse_import_type(&mut self) -> ParseResult<DtsType> {
        self.expect(&TokenKind::Keyword(Keyword::Import))?;
        self.expect(&TokenKind::LParen)?;
        match self.peek() {
            TokenKind::StringLiteral(_) => {
                self.advance();
            }
            other => return Err(self.error(format!("expected module specifier, found {other:?}"))),
        }
        self.expect(&TokenKind::RParen)?;
        if !self.matches(&TokenKind::Dot) {
            return Ok(DtsType::Primitive(Primitive::Any));
        }
        let mut name = self.expect_property_name()?;
        while self.matches(&TokenKind::Dot) {
            name.push('.');
            name.push_str(&self.expect_property_name()?);
        }
        self.parse_type_args_for(name)
    }

    fn parse_named_type(&mut self, mut name: String) -> ParseResult<DtsType> {
        while self.check(&TokenKind::Dot) && self.is_ident_like(self.peek_nth(1)) {
            self.advance();
            name.push('.');
            name.push_str(&self.expect_property_name()?);
        }
        self.parse_type_args_for(name)
    }

    fn parse_type_args_for(&mut self, name: String) -> ParseResult<DtsType> {
        let type_args = if self.check(&TokenKind::LAngle) {
            self.parse_type_args()?
        } else {
            Vec::new()
        };
        Ok(DtsType::Named { name, type_args })
    }

    fn parse_type_args(&mut self) -> ParseResult<Vec<DtsType>> {
        self.expect(&TokenKind::LAngle)?;
        let mut args = Vec::new();

        while !self.check(&TokenKind::RAngle) && !self.check(&TokenKind::Eof) {
            args.push(self.parse_type()?);
            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RAngle)?;
        Ok(args)
    }

    /// `(a: T) => R`, `<T>(a: T) => R`.
    fn parse_function_type(&mut self) -> ParseResult<DtsType> {
        let type_params = self.parse_type_params()?;
        let params = self.parse_params()?;
        self.expect(&TokenKind::Arrow)?;
        let return_type = self.parse_type()?;

        Ok(DtsType::Function(Box::new(FunctionType {
            type_params,
            params,
            return_type: Box::new(return_type),
        })))
    }

    fn parse_paren_or_function_type(&mut self) -> ParseResult<DtsType> {
        // A parenthesized group followed by `=>` is a parameter list.
        let is_function = self
            .matching_close(self.pos)
            .map(|close| {
                self.tokens
                    .get(close + 1)
                    .is_some_and(|t| t.kind == TokenKind::Arrow)
            })
            .unwrap_or(false);

        if is_function {
            return self.parse_function_type();
        }

        self.expect(&TokenKind::LParen)?;
        let inner = self.parse_type()?;
        self.expect(&TokenKind::RParen)?;
        Ok(DtsType::Parenthesized(Box::new(inner)))
    }

    fn parse_object_type(&mut self) -> ParseResult<DtsType> {
        // Mapped type: { [K in keyof T]: T[K] }, with optional readonly modifiers.
        let mut offset = 1;
        if matches!(self.peek_nth(offset), TokenKind::Plus | TokenKind::Minus) {
            offset += 1;
        }
        if matches!(self.peek_nth(offset), TokenKind::Keyword(Keyword::Readonly)) {
            offset += 1;
        }
        if matches!(self.peek_nth(offset), TokenKind::LBracket)
            && self.is_ident_like(self.peek_nth(offset + 1))
            && matches!(self.peek_nth(offset + 2), TokenKind::Keyword(Keyword::In))
        {
            return self.parse_mapped_type(offset);
        }

        let members = self.parse_object_body(false)?;
        Ok(DtsType::Object(members))
    }

    fn parse_mapped_type(&mut self, bracket_offset: usize) -> ParseResult<DtsType> {
        for _ in 0..bracket_offset {
            self.advance();
        }
        self.expect(&TokenKind::LBracket)?;
        let key_name = self.expect_ident()?;
        self.expect(&TokenKind::Keyword(Keyword::In))?;
        let key_constraint = self.parse_type()?;
        if self.matches(&TokenKind::Keyword(Keyword::As)) {
            self.parse_type()?;
        }
        self.expect(&TokenKind::RBracket)?;

        let removes_optional = self.matches(&TokenKind::Minus);
        if !removes_optional {
            self.matches(&TokenKind::Plus);
        }
        let optional = self.matches(&TokenKind::Question) && !removes_optional;

        self.expect(&TokenKind::Colon)?;
        let value_type = self.parse_type()?;
        self.matches(&TokenKind::Semicolon);
        self.expect(&TokenKind::RBrace)?;

        Ok(DtsType::Mapped {
            key_name,
            key_constraint: Box::new(key_constraint),
            value_type: Box::new(value_type),
            optional,
        })
    }

    fn parse_tuple_type(&mut self) -> ParseResult<DtsType> {
        self.expect(&TokenKind::LBracket)?;
        let mut elements = Vec::new();

        while !self.check(&TokenKind::RBracket) && !self.check(&TokenKind::Eof) {
            let rest = self.matches(&TokenKind::DotDotDot);

            // Named element: `name: T` or `name?: T`
            let named = self.is_ident_like(self.peek())
                && matches!(self.peek_nth(1), TokenKind::Colon)
                || self.is_ident_like(self.peek())
                    && matches!(self.peek_nth(1), TokenKind::Question)
                    && matches!(self.peek_nth(2), TokenKind::Colon);

            let (name, mut optional) = if named {
                let name = self.expect_property_name()?;
                let optional = self.matches(&TokenKind::Question);
                self.expect(&TokenKind::Colon)?;
                (Some(name), optional)
            } else {
                (None, false)
            };

            let ty = self.parse_type()?;
            if self.matches(&TokenKind::Question) {
                optional = true;
            }

            elements.push(TupleElement {
                ty,
                name,
                optional,
                rest,
            });

            if !self.matches(&TokenKind::Comma) {
                break;
            }
        }

        self.expect(&TokenKind::RBracket)?;
        Ok(DtsType::Tuple(elements))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_function_with_doc() {
        let src = r#"
            /**
             * Returns the clipboard text.
             * @returns the text
             */
            export declare function getClipboardText(): Promise<string>;
        "#;
        let file = parse(src).unwrap();
        assert_eq!(file.items.len(), 1);

        match &file.items[0] {
            DtsItem::Function(f) => {
                assert_eq!(f.name, "getClipboardText");
                assert!(f.exported);
                let doc = f.doc.as_ref().unwrap();
                assert_eq!(doc.description, "Returns the clipboard text.");
                assert_eq!(
                    f.return_type.as_ref().unwrap().to_string(),
                    "Promise<string>"
                );
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_contextual_keywords_name_parameters() {
        let src = "/// <reference types=\"node\" />\n\
                   export declare function track(type: string, from?: number, ...in: string[]): void;";
        let file = parse(src).unwrap();
        assert_eq!(file.items.len(), 1);
        match &file.items[0] {
            DtsItem::Function(f) => {
                let names: Vec<_> = f.params.iter().map(|p| p.name.as_str()).collect();
                assert_eq!(names, ["type", "from", "in"]);
                assert!(f.params[1].optional);
                assert!(f.params[2].rest);
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_destructured_param() {
        let src = "declare function share({ message }: { message: string }): Promise<void>;";
        let file = parse(src).unwrap();
        match &file.items[0] {
            DtsItem::Function(f) => {
                assert_eq!(f.params.len(), 1);
                assert!(f.params[0].pattern);
                assert!(matches!(f.params[0].ty, DtsType::Object(_)));
            }
            other => panic!("expected function, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_callable_const_with_members() {
        let src = r#"
            declare const fetchContacts: {
                (options: { size: number }): Promise<Contact[]>;
                getPermission(): Promise<PermissionStatus>;
                openPermissionDialog(): Promise<"allowed" | "denied">;
            };
        "#;
        let file = parse(src).unwrap();
        match &file.items[0] {
            DtsItem::Variable(v) => match &v.ty {
                DtsType::Object(members) => {
                    assert_eq!(members.len(), 3);
                    assert!(matches!(members[0], ObjectMember::CallSignature(_)));
                    assert_eq!(members[1].name(), Some("getPermission"));
                }
                other => panic!("expected object type, got {other:?}"),
            },
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_event_channel_const() {
        let src = r#"
            export declare const graniteEvent: {
                addEventListener: <K extends keyof GraniteEvents>(event: K, { onEvent, onError, options, }: {
                    onEvent: (data: GraniteEvents[K]["onEvent"]) => void;
                    onError?: (error: Error) => void;
                    options?: GraniteEvents[K]["options"];
                }) => () => void;
            };
        "#;
        let file = parse(src).unwrap();
        match &file.items[0] {
            DtsItem::Variable(v) => {
                assert!(v.exported);
                assert!(v.ty.to_string().contains("addEventListener"));
            }
            other => panic!("expected variable, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_enum_and_alias() {
        let src = r#"
            export declare enum Accuracy { Lowest = 1, Low = 2, Balanced = 3 }
            export type HapticType = "tap" | "softMedium" | "success";
        "#;
        let file = parse(src).unwrap();
        assert_eq!(file.items.len(), 2);
        match &file.items[0] {
            DtsItem::Enum(e) => {
                assert_eq!(e.members.len(), 3);
                assert_eq!(e.members[0].value, Some(EnumValue::Number("1".to_string())));
            }
            other => panic!("expected enum, got {other:?}"),
        }
        match &file.items[1] {
            DtsItem::TypeAlias(a) => assert!(matches!(a.ty, DtsType::Union(_))),
            other => panic!("expected alias, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_exports_and_imports() {
        let src = r#"
            import { Foo, Bar as Baz } from "./foo";
            export { closeView, openURL as openUrl };
            export { share } from "./share";
            export * from "./types";
        "#;
        let file = parse(src).unwrap();
        assert_eq!(file.items.len(), 4);
        assert!(matches!(&file.items[0], DtsItem::Import(i) if i.names.len() == 2 && i.from == "./foo"));
        assert!(matches!(
            &file.items[1],
            DtsItem::Export(DtsExport::Named { names, from: None }) if names.len() == 2
        ));
        assert!(matches!(
            &file.items[2],
            DtsItem::Export(DtsExport::Named { from: Some(_), .. })
        ));
        assert!(matches!(&file.items[3], DtsItem::Export(DtsExport::All { .. })));
    }

    #[test]
    fn test_parse_conditional_and_mapped() {
        let ty = parse_type_str("T extends string ? { [K in keyof T]?: T[K] } : never").unwrap();
        match ty {
            DtsType::Conditional { true_type, .. } => {
                assert!(matches!(*true_type, DtsType::Mapped { optional: true, .. }));
            }
            other => panic!("expected conditional, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_import_type_and_typeof() {
        let ty = parse_type_str(r#"import("./types").Location | typeof foo.bar"#).unwrap();
        match ty {
            DtsType::Union(members) => {
                assert_eq!(members[0], DtsType::named("Location"));
                assert_eq!(members[1], DtsType::TypeOf("foo.bar".to_string()));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_paren_function_type() {
        let ty = parse_type_str("((x: number) => void) | null").unwrap();
        match ty {
            DtsType::Union(members) => {
                assert!(matches!(members[0].unparen(), DtsType::Function(_)));
            }
            other => panic!("expected union, got {other:?}"),
        }
    }

    #[test]
    fn test_error_has_position() {
        let err = parse("declare function (").unwrap_err();
        assert!(err.pos > 0);
    }
}
