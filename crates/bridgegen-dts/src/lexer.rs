//! Lexer for TypeScript declaration files.
//!
//! Comments are trivia, except `/** ... */` blocks: the most recent one is
//! attached to the next token so the parser can hand it to the declaration
//! that follows. `///` directives are plain line comments; references
//! between files are resolved through imports instead.

/// Reserved and contextual words the parser dispatches on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Declare,
    Function,
    Interface,
    Class,
    Enum,
    Type,
    Namespace,
    Module,
    Export,
    Import,
    Const,
    Let,
    Var,
    Readonly,
    Extends,
    Implements,
    New,
    Typeof,
    Keyof,
    Infer,
    As,
    Is,
    From,
    Default,
    Static,
    Public,
    Private,
    Protected,
    Abstract,
    In,
    Out,
    This,
    Unique,
    Asserts,
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
    True,
    False,
}

const KEYWORDS: &[(&str, Keyword)] = &[
    ("declare", Keyword::Declare),
    ("function", Keyword::Function),
    ("interface", Keyword::Interface),
    ("class", Keyword::Class),
    ("enum", Keyword::Enum),
    ("type", Keyword::Type),
    ("namespace", Keyword::Namespace),
    ("module", Keyword::Module),
    ("export", Keyword::Export),
    ("import", Keyword::Import),
    ("const", Keyword::Const),
    ("let", Keyword::Let),
    ("var", Keyword::Var),
    ("readonly", Keyword::Readonly),
    ("extends", Keyword::Extends),
    ("implements", Keyword::Implements),
    ("new", Keyword::New),
    ("typeof", Keyword::Typeof),
    ("keyof", Keyword::Keyof),
    ("infer", Keyword::Infer),
    ("as", Keyword::As),
    ("is", Keyword::Is),
    ("from", Keyword::From),
    ("default", Keyword::Default),
    ("static", Keyword::Static),
    ("public", Keyword::Public),
    ("private", Keyword::Private),
    ("protected", Keyword::Protected),
    ("abstract", Keyword::Abstract),
    ("in", Keyword::In),
    ("out", Keyword::Out),
    ("this", Keyword::This),
    ("unique", Keyword::Unique),
    ("asserts", Keyword::Asserts),
    ("string", Keyword::String),
    ("number", Keyword::Number),
    ("boolean", Keyword::Boolean),
    ("void", Keyword::Void),
    ("null", Keyword::Null),
    ("undefined", Keyword::Undefined),
    ("any", Keyword::Any),
    ("unknown", Keyword::Unknown),
    ("never", Keyword::Never),
    ("object", Keyword::Object),
    ("symbol", Keyword::Symbol),
    ("bigint", Keyword::BigInt),
    ("true", Keyword::True),
    ("false", Keyword::False),
];

impl Keyword {
    pub fn lookup(word: &str) -> Option<Keyword> {
        KEYWORDS
            .iter()
            .find(|(spelling, _)| *spelling == word)
            .map(|(_, keyword)| *keyword)
    }

    pub fn as_str(self) -> &'static str {
        KEYWORDS
            .iter()
            .find(|(_, keyword)| *keyword == self)
            .map_or("", |(spelling, _)| *spelling)
    }

    /// Whether the word can also be used as a binding name
    /// (`declare const type: ...`, `function f(from: string)`).
    pub fn is_contextual(self) -> bool {
        !matches!(
            self,
            Keyword::Function
                | Keyword::Interface
                | Keyword::Class
                | Keyword::Enum
                | Keyword::Export
                | Keyword::Import
                | Keyword::Const
                | Keyword::Let
                | Keyword::Var
                | Keyword::Extends
                | Keyword::Implements
                | Keyword::New
                | Keyword::Typeof
                | Keyword::This
                | Keyword::Void
                | Keyword::Null
                | Keyword::True
                | Keyword::False
        )
    }
}

/// Token kinds for TypeScript declaration files.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Keyword(Keyword),
    /// Unescaped contents, quotes stripped.
    StringLiteral(String),
    /// Source spelling (`0x1F`, `1_000`, `1.5`).
    NumberLiteral(String),
    /// Raw body of a template literal, backticks stripped.
    TemplateString(String),

    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LAngle,
    RAngle,
    Comma,
    Semicolon,
    Colon,
    Dot,
    DotDotDot,
    Question,
    Pipe,
    Amp,
    Arrow,
    Eq,
    Plus,
    Minus,
    Star,

    Eof,
}

/// A token with its kind, byte range and any JSDoc block right before it.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub start: usize,
    pub end: usize,
    pub doc: Option<String>,
}

/// Lexer for TypeScript declaration files.
pub struct Lexer<'src> {
    src: &'src str,
    pos: usize,
    pending_doc: Option<&'src str>,
}

impl<'src> Lexer<'src> {
    pub fn new(src: &'src str) -> Self {
        Self {
            src,
            pos: 0,
            pending_doc: None,
        }
    }

    fn rest(&self) -> &'src str {
        &self.src[self.pos..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    /// Consumes `prefix` if the input continues with it.
    fn eat(&mut self, prefix: &str) -> bool {
        let found = self.rest().starts_with(prefix);
        if found {
            self.pos += prefix.len();
        }
        found
    }

    /// Consumes the longest run of chars matching `pred` and returns it.
    fn eat_while(&mut self, pred: impl Fn(char) -> bool) -> &'src str {
        let start = self.pos;
        let len = self
            .rest()
            .find(|c: char| !pred(c))
            .unwrap_or(self.rest().len());
        self.pos += len;
        &self.src[start..self.pos]
    }

    /// Skips whitespace and comments, remembering the last doc block.
    fn skip_trivia(&mut self) {
        loop {
            self.eat_while(char::is_whitespace);
            if self.eat("//") {
                self.eat_while(|c| c != '\n');
            } else if self.rest().starts_with("/*") {
                let start = self.pos;
                let len = self.rest()[2..].find("*/").map_or(self.rest().len(), |end| end + 4);
                self.pos += len;
                let text = &self.src[start..self.pos];
                // `/**/` is an empty plain comment, not a doc block.
                if text.starts_with("/**") && text.len() > 4 {
                    self.pending_doc = Some(text);
                }
            } else {
                break;
            }
        }
    }

    fn string(&mut self, quote: char) -> String {
        let mut out = String::new();
        while let Some(ch) = self.bump() {
            if ch == quote {
                break;
            }
            if ch != '\\' {
                out.push(ch);
                continue;
            }
            match self.bump() {
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('r') => out.push('\r'),
                Some(c @ ('\\' | '"' | '\'')) => out.push(c),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => break,
            }
        }
        out
    }

    /// Reads up to the closing backtick, skipping over `${ ... }` holes.
    fn template(&mut self) -> String {
        let start = self.pos;
        let mut holes = 0usize;
        let mut end = self.src.len();
        while let Some(ch) = self.bump() {
            match ch {
                '\\' => {
                    self.bump();
                }
                '$' if self.eat("{") => holes += 1,
                '}' if holes > 0 => holes -= 1,
                '`' if holes == 0 => {
                    end = self.pos - 1;
                    break;
                }
                _ => {}
            }
        }
        self.src[start..end].to_string()
    }

    fn punct(&mut self, ch: char) -> Option<TokenKind> {
        let kind = match ch {
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            '{' => TokenKind::LBrace,
            '}' => TokenKind::RBrace,
            '[' => TokenKind::LBracket,
            ']' => TokenKind::RBracket,
            '<' => TokenKind::LAngle,
            '>' => TokenKind::RAngle,
            ',' => TokenKind::Comma,
            ';' => TokenKind::Semicolon,
            ':' => TokenKind::Colon,
            '?' => TokenKind::Question,
            '|' => TokenKind::Pipe,
            '&' => TokenKind::Amp,
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '.' if self.eat("..") => TokenKind::DotDotDot,
            '.' => TokenKind::Dot,
            '=' if self.eat(">") => TokenKind::Arrow,
            '=' => TokenKind::Eq,
            _ => return None,
        };
        Some(kind)
    }

    pub fn next_token(&mut self) -> Token {
        loop {
            self.skip_trivia();
            let start = self.pos;
            let Some(ch) = self.bump() else {
                return self.token(TokenKind::Eof, start);
            };

            let kind = match ch {
                '"' | '\'' => TokenKind::StringLiteral(self.string(ch)),
                '`' => TokenKind::TemplateString(self.template()),
                c if c.is_ascii_digit() => {
                    self.eat_while(|c| c.is_ascii_alphanumeric() || c == '.' || c == '_');
                    TokenKind::NumberLiteral(self.src[start..self.pos].to_string())
                }
                c if c.is_alphabetic() || c == '_' || c == '$' => {
                    self.eat_while(|c| c.is_alphanumeric() || c == '_' || c == '$');
                    let word = &self.src[start..self.pos];
                    Keyword::lookup(word)
                        .map_or_else(|| TokenKind::Ident(word.to_string()), TokenKind::Keyword)
                }
                c => match self.punct(c) {
                    Some(kind) => kind,
                    // Anything else (`@`, `#`, a stray `/`) cannot appear in a
                    // declaration and is dropped.
                    None => continue,
                },
            };
            return self.token(kind, start);
        }
    }

    fn token(&mut self, kind: TokenKind, start: usize) -> Token {
        Token {
            kind,
            start,
            end: self.pos,
            doc: self.pending_doc.take().map(str::to_string),
        }
    }

    /// Collect all tokens into a vector.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return tokens;
            }
        }
    }
}

/// Maps a byte offset to a 1-based `(line, column)` pair.
pub fn line_col(src: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(src.len());
    let before = &src[..offset];
    let line = before.matches('\n').count() + 1;
    let column = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, column)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        Lexer::new(src).tokenize().into_iter().map(|t| t.kind).collect()
    }

    fn ident(name: &str) -> TokenKind {
        TokenKind::Ident(name.to_string())
    }

    #[test]
    fn callback_signature() {
        assert_eq!(
            kinds("declare function share(args: { onSuccess?: () => void }): void;"),
            [
                TokenKind::Keyword(Keyword::Declare),
                TokenKind::Keyword(Keyword::Function),
                ident("share"),
                TokenKind::LParen,
                ident("args"),
                TokenKind::Colon,
                TokenKind::LBrace,
                ident("onSuccess"),
                TokenKind::Question,
                TokenKind::Colon,
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::Arrow,
                TokenKind::Keyword(Keyword::Void),
                TokenKind::RBrace,
                TokenKind::RParen,
                TokenKind::Colon,
                TokenKind::Keyword(Keyword::Void),
                TokenKind::Semicolon,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn doc_comment_attaches_to_next_token() {
        let src = "/* license */\n/** Reads the clipboard. */\nexport declare function getClipboardText(): Promise<string>;";
        let tokens = Lexer::new(src).tokenize();

        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Export));
        assert_eq!(tokens[0].doc.as_deref(), Some("/** Reads the clipboard. */"));
        assert_eq!(tokens[1].doc, None);
    }

    #[test]
    fn empty_block_comment_is_not_doc() {
        let tokens = Lexer::new("/**/ declare const x: number;").tokenize();
        assert_eq!(tokens[0].doc, None);
    }

    #[test]
    fn reference_directives_are_comments() {
        let src = "/// <reference path=\"./types.d.ts\" />\n// plain\ndeclare function foo(): void;";
        let tokens = Lexer::new(src).tokenize();
        assert_eq!(tokens[0].kind, TokenKind::Keyword(Keyword::Declare));
        assert_eq!(tokens[0].start, src.find("declare").unwrap());
    }

    #[test]
    fn rest_and_spread_dots() {
        assert_eq!(
            kinds("...a.b"),
            [TokenKind::DotDotDot, ident("a"), TokenKind::Dot, ident("b"), TokenKind::Eof]
        );
    }

    #[test]
    fn template_keeps_nested_holes() {
        let tokens = kinds("type K = `on${Capitalize<`${E}`>}` | 'x';");
        assert!(tokens.contains(&TokenKind::TemplateString("on${Capitalize<`${E}`>}".to_string())));
        assert!(tokens.contains(&TokenKind::StringLiteral("x".to_string())));
    }

    #[test]
    fn string_escapes() {
        assert_eq!(
            kinds(r#""a\"b" 'it\'s' "x\qy""#)[..3],
            [
                TokenKind::StringLiteral("a\"b".to_string()),
                TokenKind::StringLiteral("it's".to_string()),
                TokenKind::StringLiteral("x\\qy".to_string()),
            ]
        );
    }

    #[test]
    fn numbers_keep_their_spelling() {
        assert_eq!(
            kinds("0x1F 1_000 2.5")[..3],
            [
                TokenKind::NumberLiteral("0x1F".to_string()),
                TokenKind::NumberLiteral("1_000".to_string()),
                TokenKind::NumberLiteral("2.5".to_string()),
            ]
        );
    }

    #[test]
    fn keyword_spellings_round_trip() {
        for (spelling, keyword) in KEYWORDS {
            assert_eq!(Keyword::lookup(spelling), Some(*keyword));
            assert_eq!(keyword.as_str(), *spelling);
        }
        assert_eq!(Keyword::lookup("addEventListener"), None);
        assert!(Keyword::Type.is_contextual());
        assert!(!Keyword::Function.is_contextual());
    }

    #[test]
    fn stray_characters_are_dropped() {
        assert_eq!(kinds("@ a / # b"), [ident("a"), ident("b"), TokenKind::Eof]);
    }

    #[test]
    fn line_col_counts_from_one() {
        let src = "a\nbc\ndef";
        assert_eq!(line_col(src, 0), (1, 1));
        assert_eq!(line_col(src, 3), (2, 2));
        assert_eq!(line_col(src, 5), (3, 1));
    }
}
