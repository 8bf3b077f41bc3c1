use crate::scanner::SourceFile;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::{Component, Path, PathBuf};

/// AST (Abstract Syntax Tree) parser for Rust source files.
///
/// Every parsed file also records the module path it defines, derived from where it sits under
/// its source root, so that elements declared in it get stable qualified names.
///
/// # Example
///
/// ```no_run
/// use api_model_from_source::parser::AstParser;
/// use api_model_from_source::scanner::SourceFile;
/// use std::path::PathBuf;
///
/// let file = SourceFile {
///     path: PathBuf::from("src/api/widgets.rs"),
///     root: PathBuf::from("."),
///     local: true,
/// };
/// let parsed = AstParser::parse_file(&file).unwrap();
/// assert_eq!(parsed.module_path, vec!["api", "widgets"]);
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// Module path defined by the file (`src/api/widgets.rs` → `["api", "widgets"]`)
    pub module_path: Vec<String>,
    /// Whether the file belongs to the analyzed project
    pub local: bool,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl ParsedFile {
    /// Parses in-memory source into a local file with the given module path.
    pub fn from_source(module_path: &[&str], source: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(source).context("Failed to parse Rust syntax")?;
        Ok(ParsedFile {
            path: PathBuf::from(format!("{}.rs", module_path.join("/"))),
            module_path: module_path.iter().map(|s| s.to_string()).collect(),
            local: true,
            syntax_tree,
        })
    }

    pub fn with_local(mut self, local: bool) -> Self {
        self.local = local;
        self
    }
}

impl AstParser {
    /// Parses a single Rust source file into an AST.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(file: &SourceFile) -> Result<ParsedFile> {
        let path = &file.path;
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        let syntax_tree = syn::parse_file(&content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        debug!("Successfully parsed file: {}", path.display());

        Ok(ParsedFile {
            path: path.clone(),
            module_path: module_path_for(&file.root, path),
            local: file.local,
            syntax_tree,
        })
    }

    /// Parses multiple Rust source files, continuing even if some fail.
    ///
    /// Files that fail to parse are logged as warnings, but parsing continues for remaining
    /// files, so a model can still be built when some files have syntax errors.
    pub fn parse_files(files: &[SourceFile]) -> Vec<Result<ParsedFile>> {
        debug!("Parsing {} files", files.len());

        let results: Vec<Result<ParsedFile>> = files
            .iter()
            .map(|file| {
                Self::parse_file(file).map_err(|e| {
                    warn!("Failed to parse {}: {}", file.path.display(), e);
                    e
                })
            })
            .collect();

        let success_count = results.iter().filter(|r| r.is_ok()).count();
        debug!(
            "Parsing complete: {} succeeded, {} failed",
            success_count,
            results.len() - success_count
        );

        results
    }
}

/// Derives the module path of `path` relative to `root`.
///
/// A leading `src` directory is dropped, as are `mod.rs`, `lib.rs` and `main.rs` file stems,
/// which name their parent module rather than a child.
pub fn module_path_for(root: &Path, path: &Path) -> Vec<String> {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut segments: Vec<String> = relative
        .with_extension("")
        .components()
        .filter_map(|component| match component {
            Component::Normal(part) => Some(part.to_string_lossy().to_string()),
            _ => None,
        })
        .collect();

    if segments.first().map(String::as_str) == Some("src") {
        segments.remove(0);
    }
    if matches!(
        segments.last().map(String::as_str),
        Some("mod") | Some("lib") | Some("main")
    ) {
        segments.pop();
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::io::Write;
    use tempfile::TempDir;

    /// Helper function to create a temporary file with content
    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> SourceFile {
        let file_path = dir.path().join(name);
        if let Some(parent) = file_path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        SourceFile {
            path: file_path,
            root: dir.path().to_path_buf(),
            local: true,
        }
    }

    #[test]
    fn test_parse_valid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            #[path("/users")]
            pub struct UserResource;

            pub struct User {
                pub id: u32,
                pub name: String,
            }
        "#;

        let file = create_temp_file(&temp_dir, "src/api/users.rs", code);
        let parsed = AstParser::parse_file(&file).unwrap();

        assert_eq!(parsed.path, file.path);
        assert_eq!(parsed.module_path, vec!["api".to_string(), "users".to_string()]);
        assert!(parsed.local);
        assert_eq!(parsed.syntax_tree.items.len(), 2);
    }

    #[test]
    fn test_parse_invalid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = create_temp_file(&temp_dir, "invalid.rs", "fn broken( {");
        let err_msg = AstParser::parse_file(&file).unwrap_err().to_string();
        assert!(err_msg.contains("Failed to parse Rust syntax"));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let file = SourceFile {
            path: PathBuf::from("/nonexistent/file.rs"),
            root: PathBuf::from("/nonexistent"),
            local: true,
        };
        let err_msg = AstParser::parse_file(&file).unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_parse_files_batch_continues_after_failure() {
        let temp_dir = TempDir::new().unwrap();

        let file1 = create_temp_file(&temp_dir, "file1.rs", "pub fn hello() {}");
        let file2 = create_temp_file(&temp_dir, "file2.rs", "pub struct World;");
        let file3 = create_temp_file(&temp_dir, "file3.rs", "pub fn broken( {");

        let results = AstParser::parse_files(&[file1.clone(), file2, file3]);

        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(results[1].is_ok());
        assert!(results[2].is_err());
        assert_eq!(results[0].as_ref().unwrap().path, file1.path);
    }

    #[test]
    fn test_parse_files_keeps_local_flag() {
        let temp_dir = TempDir::new().unwrap();
        let mut file = create_temp_file(&temp_dir, "shared.rs", "pub struct Shared;");
        file.local = false;

        let results = AstParser::parse_files(&[file]);
        assert!(!results[0].as_ref().unwrap().local);
    }

    #[test]
    fn test_module_path_for() {
        let root = Path::new("/project");
        assert_eq!(
            module_path_for(root, Path::new("/project/src/api/widgets.rs")),
            vec!["api", "widgets"]
        );
        assert_eq!(
            module_path_for(root, Path::new("/project/src/api/mod.rs")),
            vec!["api"]
        );
        assert!(module_path_for(root, Path::new("/project/src/lib.rs")).is_empty());
        assert_eq!(
            module_path_for(root, Path::new("/project/model.rs")),
            vec!["model"]
        );
    }

    #[test]
    fn test_from_source() {
        let parsed = ParsedFile::from_source(&["api"], "pub struct A;").unwrap();
        assert_eq!(parsed.module_path, vec!["api".to_string()]);
        assert!(parsed.local);
        assert!(!parsed.with_local(false).local);
        assert!(ParsedFile::from_source(&[], "struct {").is_err());
    }
}
