use anyhow::Result;
use log::warn;
use std::path::PathBuf;
use walkdir::WalkDir;

/// A directory to scan for Rust sources.
///
/// The analyzed project itself is a *local* root; roots added with `--include` are not.
/// Detection strategies use the distinction to decide how much of the API surface to document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRoot {
    pub path: PathBuf,
    pub local: bool,
}

impl SourceRoot {
    pub fn local(path: PathBuf) -> Self {
        Self { path, local: true }
    }

    pub fn included(path: PathBuf) -> Self {
        Self { path, local: false }
    }
}

/// A discovered `.rs` file and the root it was found under.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub root: PathBuf,
    pub local: bool,
}

/// File scanner for traversing source roots.
///
/// The `FileScanner` recursively walks every configured root to find all Rust source files.
/// It automatically skips common directories that should be ignored, such as `target` and hidden
/// directories (those starting with `.`).
///
/// # Example
///
/// ```no_run
/// use api_model_from_source::scanner::{FileScanner, SourceRoot};
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(vec![SourceRoot::local(PathBuf::from("./my-project"))]);
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    roots: Vec<SourceRoot>,
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// All discovered `.rs` files, local roots first, in walk order
    pub rust_files: Vec<SourceFile>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

impl ScanResult {
    pub fn local_count(&self) -> usize {
        self.rust_files.iter().filter(|f| f.local).count()
    }
}

impl FileScanner {
    pub fn new(roots: Vec<SourceRoot>) -> Self {
        Self { roots }
    }

    /// Scans every root and collects all `.rs` files.
    ///
    /// Inaccessible directories or files are logged and recorded as warnings; scanning
    /// continues with the remaining entries.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        let mut roots: Vec<&SourceRoot> = self.roots.iter().collect();
        roots.sort_by_key(|root| !root.local);

        for root in roots {
            for entry in WalkDir::new(&root.path)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| {
                    if e.path() == root.path {
                        return true;
                    }

                    let file_name = e.file_name().to_string_lossy();
                    !file_name.starts_with('.') && file_name != "target"
                })
            {
                match entry {
                    Ok(entry) => {
                        let path = entry.path();
                        if path.is_file()
                            && path.extension().and_then(|s| s.to_str()) == Some("rs")
                        {
                            rust_files.push(SourceFile {
                                path: path.to_path_buf(),
                                root: root.path.clone(),
                                local: root.local,
                            });
                        }
                    }
                    Err(e) => {
                        let warning = format!("Failed to access path: {}", e);
                        warn!("{}", warning);
                        warnings.push(warning);
                    }
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}
