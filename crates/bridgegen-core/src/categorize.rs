//! Category derivation and grouping.
//!
//! A category is the file stem of the declaration an API came from. Nothing
//! else (JSDoc `@category`, namespace names) feeds into it.

use std::path::Path;

use indexmap::IndexMap;

use crate::emit::naming::to_pascal_case;
use crate::error::EmitError;
use crate::ir::ParsedAPI;

const DECLARATION_SUFFIXES: &[&str] = &[".d.ts", ".d.mts", ".d.cts", ".ts"];

/// Whether a file name looks like a declaration file the loader reads.
pub fn is_declaration_file(file_name: &str) -> bool {
    DECLARATION_SUFFIXES[..3]
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
}

/// `a/b/storage.d.ts` -> `storage`.
pub fn category_of(path: &Path) -> String {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    DECLARATION_SUFFIXES
        .iter()
        .find_map(|suffix| file_name.strip_suffix(suffix))
        .unwrap_or(&file_name)
        .to_string()
}

/// PascalCase form used in output file names.
pub fn output_stem(category: &str) -> String {
    to_pascal_case(category)
}

/// Groups APIs by category, keeping first-seen order for both categories
/// and APIs.
pub fn group_by_category(apis: &[ParsedAPI]) -> IndexMap<String, Vec<ParsedAPI>> {
    let mut groups: IndexMap<String, Vec<ParsedAPI>> = IndexMap::new();
    for api in apis {
        groups.entry(api.category.clone()).or_default().push(api.clone());
    }
    groups
}

/// Fails when two categories would render to the same output file.
pub fn check_collisions<'a>(
    categories: impl IntoIterator<Item = &'a str>,
) -> Result<(), EmitError> {
    let mut seen: IndexMap<String, &str> = IndexMap::new();
    for category in categories {
        let stem = output_stem(category);
        match seen.get(&stem) {
            Some(first) if *first != category => {
                return Err(EmitError::CategoryCollision {
                    first: first.to_string(),
                    second: category.to_string(),
                    file: format!("AIT.{stem}.cs"),
                });
            }
            Some(_) => {}
            None => {
                seen.insert(stem, category);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_is_the_stem() {
        assert_eq!(category_of(Path::new("sdk/storage.d.ts")), "storage");
        assert_eq!(category_of(Path::new("other/storage.d.ts")), "storage");
        assert_eq!(category_of(Path::new("game-center.d.mts")), "game-center");
        assert_eq!(category_of(Path::new("index.d.ts")), "index");
        assert_eq!(category_of(Path::new("plain.ts")), "plain");
    }

    #[test]
    fn derivation_is_pure() {
        let path = Path::new("x/y/deviceInfo.d.ts");
        assert_eq!(category_of(path), category_of(path));
        assert_ne!(category_of(Path::new("a/foo.d.ts")), category_of(Path::new("a/bar.d.ts")));
    }

    #[test]
    fn declaration_files_exclude_plain_ts() {
        assert!(is_declaration_file("a.d.ts"));
        assert!(is_declaration_file("a.d.cts"));
        assert!(!is_declaration_file("a.ts"));
    }

    #[test]
    fn detects_output_collisions() {
        assert!(check_collisions(["storage", "media"]).is_ok());
        assert!(check_collisions(["storage", "storage"]).is_ok());
        let err = check_collisions(["game-center", "gameCenter"]).unwrap_err();
        assert!(err.to_string().contains("AIT.GameCenter.cs"));
    }
}
