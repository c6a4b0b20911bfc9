//! JSDoc block parsing.

/// Structured content of a `/** ... */` block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsDoc {
    /// Free text before the first tag.
    pub description: String,
    /// `@param name text`, in declaration order.
    pub params: Vec<(String, String)>,
    /// `@returns text`
    pub returns: Option<String>,
    /// Each `@example` body, fences kept.
    pub examples: Vec<String>,
    pub deprecated: bool,
    /// `@category Name`; documentation only.
    pub category: Option<String>,
    /// Any other tag as `(name, text)`.
    pub tags: Vec<(String, String)>,
}

impl JsDoc {
    /// Parses the raw comment text including the `/**` and `*/` delimiters.
    pub fn parse(raw: &str) -> Self {
        let body = raw
            .trim()
            .trim_start_matches("/**")
            .trim_end_matches("*/");

        let lines: Vec<&str> = body
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();
                let trimmed = trimmed.strip_prefix('*').unwrap_or(trimmed);
                trimmed.strip_prefix(' ').unwrap_or(trimmed).trim_end()
            })
            .collect();

        let mut doc = JsDoc::default();
        let mut description = Vec::new();
        let mut current: Option<(String, Vec<String>)> = None;

        for line in lines {
            if let Some(rest) = line.trim_start().strip_prefix('@') {
                if let Some((tag, text)) = current.take() {
                    doc.push_tag(&tag, text);
                }
                let (tag, text) = match rest.find(char::is_whitespace) {
                    Some(idx) => (&rest[..idx], rest[idx..].trim()),
                    None => (rest, ""),
                };
                let mut text_lines = Vec::new();
                if !text.is_empty() {
                    text_lines.push(text.to_string());
                }
                current = Some((tag.to_string(), text_lines));
            } else if let Some((_, text)) = current.as_mut() {
                text.push(line.to_string());
            } else {
                description.push(line.trim().to_string());
            }
        }
        if let Some((tag, text)) = current.take() {
            doc.push_tag(&tag, text);
        }

        doc.description = description
            .join("\n")
            .trim_matches('\n')
            .trim()
            .to_string();
        doc
    }

    fn push_tag(&mut self, tag: &str, lines: Vec<String>) {
        let text = lines.join("\n").trim_end().to_string();
        match tag {
            "param" | "arg" | "argument" => {
                let text = strip_type_annotation(&text);
                let (name, rest) = match text.find(char::is_whitespace) {
                    Some(idx) => (&text[..idx], text[idx..].trim()),
                    None => (text, ""),
                };
                let name = name.trim_start_matches('[').trim_end_matches(']');
                let name = name.split('=').next().unwrap_or(name);
                let rest = rest.trim_start_matches('-').trim();
                self.params.push((name.to_string(), rest.to_string()));
            }
            "returns" | "return" => {
                self.returns = Some(strip_type_annotation(&text).trim().to_string());
            }
            "example" => self.examples.push(text.trim_matches('\n').to_string()),
            "deprecated" => self.deprecated = true,
            "category" => self.category = Some(text.trim().to_string()),
            other => self.tags.push((other.to_string(), text)),
        }
    }

    /// Description of a named parameter, if documented.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, text)| text.as_str())
    }
}

/// Drops a leading `{Type}` from tag text.
fn strip_type_annotation(text: &str) -> &str {
    let text = text.trim_start();
    if !text.starts_with('{') {
        return text;
    }
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices() {
        match ch {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return text[idx + 1..].trim_start();
                }
            }
            _ => {}
        }
    }
    text
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_description_and_tags() {
        let raw = r#"/**
         * Saves a file to the device.
         *
         * @category Media
         * @param {SaveOptions} params - what to save
         * @param params.mimeType the mime type
         * @returns nothing useful
         * @example
         * ```ts
         * await saveBase64Data({ data, fileName });
         * ```
         */"#;
        let doc = JsDoc::parse(raw);

        assert_eq!(doc.description, "Saves a file to the device.");
        assert_eq!(doc.category.as_deref(), Some("Media"));
        assert_eq!(doc.param("params"), Some("what to save"));
        assert_eq!(doc.param("params.mimeType"), Some("the mime type"));
        assert_eq!(doc.returns.as_deref(), Some("nothing useful"));
        assert_eq!(doc.examples.len(), 1);
        assert!(doc.examples[0].contains("saveBase64Data"));
        assert!(!doc.deprecated);
    }

    #[test]
    fn detects_deprecated() {
        let doc = JsDoc::parse("/** @deprecated use other */");
        assert!(doc.deprecated);
        assert!(doc.description.is_empty());
    }

    #[test]
    fn single_line_description() {
        let doc = JsDoc::parse("/** Closes the view. */");
        assert_eq!(doc.description, "Closes the view.");
    }
}
