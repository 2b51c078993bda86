use super::{ToolHandler, ToolRegistry};
use crate::types::ToolCallRequest;
use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fs;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

const MAX_READ_BYTES: u64 = 256 * 1024;
const DEFAULT_LIST_ENTRIES: usize = 200;

/// Read-only access to files under one directory, offered to the assistant
/// as `read_file` and `list_files` function tools.
#[derive(Debug, Clone)]
pub struct WorkspaceFiles {
    root: PathBuf,
    canonical_root: PathBuf,
}

#[derive(Debug, Deserialize)]
struct PathArgs {
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    max_entries: Option<usize>,
}

#[derive(Clone, Copy)]
enum Operation {
    Read,
    List,
}

struct WorkspaceTool {
    files: Arc<WorkspaceFiles>,
    operation: Operation,
}

impl WorkspaceFiles {
    pub fn new(root: PathBuf) -> Self {
        let canonical_root = fs::canonicalize(&root).unwrap_or_else(|_| root.clone());
        Self {
            root,
            canonical_root,
        }
    }

    /// Register `read_file` and `list_files` on `registry`.
    pub fn register(self, registry: &mut ToolRegistry) {
        let files = Arc::new(self);
        registry.register(
            "read_file",
            Arc::new(WorkspaceTool {
                files: Arc::clone(&files),
                operation: Operation::Read,
            }),
        );
        registry.register(
            "list_files",
            Arc::new(WorkspaceTool {
                files,
                operation: Operation::List,
            }),
        );
    }

    fn resolve(&self, path: &str) -> Result<PathBuf> {
        let path = path.trim();
        if path.is_empty() || path == "." {
            return Ok(self.canonical_root.clone());
        }
        if path.starts_with('/') || path.contains('\\') {
            bail!("absolute or platform-specific path not allowed: {path}");
        }
        if Path::new(path)
            .components()
            .any(|component| matches!(component, Component::ParentDir))
        {
            bail!("path traversal detected: {path}");
        }

        let requested = self.root.join(path);
        let canonical = fs::canonicalize(&requested)
            .with_context(|| format!("{path} does not exist"))?;
        if !canonical.starts_with(&self.canonical_root) {
            bail!("path escapes the workspace via symlink: {path}");
        }
        Ok(canonical)
    }

    pub fn read_file(&self, path: &str) -> Result<String> {
        let resolved = self.resolve(path)?;
        let metadata = fs::metadata(&resolved).context("Failed to inspect file")?;
        if metadata.is_dir() {
            bail!("{path} is a directory; use list_files");
        }
        if metadata.len() > MAX_READ_BYTES {
            bail!(
                "{path} is {} bytes; read_file is limited to {MAX_READ_BYTES} bytes",
                metadata.len()
            );
        }
        fs::read_to_string(resolved).context("Failed to read file")
    }

    pub fn list_files(&self, path: Option<&str>, max_entries: usize) -> Result<String> {
        let dir = self.resolve(path.unwrap_or("."))?;
        let limit = max_entries.clamp(1, 2000);

        let mut children = fs::read_dir(&dir)
            .with_context(|| format!("Failed to read directory {}", dir.display()))?
            .collect::<std::result::Result<Vec<_>, _>>()
            .with_context(|| format!("Failed to list entries in {}", dir.display()))?;
        children.sort_by_key(|entry| entry.path());

        let mut entries = Vec::new();
        for child in children.into_iter().take(limit) {
            let child_path = child.path();
            let mut display = child_path
                .strip_prefix(&self.canonical_root)
                .unwrap_or(&child_path)
                .to_string_lossy()
                .to_string();
            if child.file_type().map(|t| t.is_dir()).unwrap_or(false) {
                display.push('/');
            }
            entries.push(display);
        }

        if entries.is_empty() {
            Ok("(no files found)".to_string())
        } else {
            Ok(entries.join("\n"))
        }
    }
}

#[async_trait]
impl ToolHandler for WorkspaceTool {
    async fn call(&self, request: &ToolCallRequest) -> Result<String> {
        let args: PathArgs = if request.arguments.trim().is_empty() {
            PathArgs {
                path: None,
                max_entries: None,
            }
        } else {
            serde_json::from_str(&request.arguments)
                .with_context(|| format!("invalid arguments for {}", request.name))?
        };

        let files = Arc::clone(&self.files);
        let operation = self.operation;
        tokio::task::spawn_blocking(move || match operation {
            Operation::Read => {
                let path = args
                    .path
                    .as_deref()
                    .filter(|p| !p.trim().is_empty())
                    .context("read_file requires a non-empty 'path'")?;
                files.read_file(path)
            }
            Operation::List => files.list_files(
                args.path.as_deref(),
                args.max_entries.unwrap_or(DEFAULT_LIST_ENTRIES),
            ),
        })
        .await
        .context("workspace tool task failed")?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ToolCallKind;
    use tempfile::TempDir;

    fn call(name: &str, arguments: &str) -> ToolCallRequest {
        ToolCallRequest {
            id: "call_1".to_string(),
            kind: ToolCallKind::Function,
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_path_traversal_blocked() {
        let temp = TempDir::new().expect("temp dir");
        let files = WorkspaceFiles::new(temp.path().to_path_buf());

        assert!(files.read_file("../../etc/passwd").is_err());
        assert!(files.read_file("/etc/passwd").is_err());
        assert!(files.read_file("..\\windows\\system32").is_err());
    }

    #[test]
    fn test_filename_with_double_dots_allowed() {
        let temp = TempDir::new().expect("temp dir");
        fs::write(temp.path().join("my..file.txt"), "content").expect("seed file");
        let files = WorkspaceFiles::new(temp.path().to_path_buf());

        assert_eq!(files.read_file("my..file.txt").unwrap(), "content");
    }

    #[tokio::test]
    async fn test_registered_tools_read_and_list() {
        let temp = TempDir::new().expect("temp dir");
        fs::create_dir(temp.path().join("docs")).expect("mkdir");
        fs::write(temp.path().join("docs/map.txt"), "admin block: north").expect("seed");
        fs::write(temp.path().join("readme.md"), "hi").expect("seed");

        let mut registry = ToolRegistry::new();
        WorkspaceFiles::new(temp.path().to_path_buf()).register(&mut registry);

        let content = registry
            .call(&call("read_file", r#"{"path":"docs/map.txt"}"#))
            .await
            .unwrap();
        assert_eq!(content, "admin block: north");

        let listing = registry.call(&call("list_files", "")).await.unwrap();
        assert_eq!(listing, "docs/\nreadme.md");

        assert!(registry
            .call(&call("read_file", r#"{"path":""}"#))
            .await
            .is_err());
        assert!(registry.call(&call("read_file", "not json")).await.is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_listing_through_symlinked_root_stays_relative() {
        let temp = TempDir::new().expect("temp dir");
        let real = temp.path().join("real");
        fs::create_dir_all(real.join("notes")).expect("mkdir");
        fs::write(real.join("a.txt"), "a").expect("seed");
        let link = temp.path().join("link");
        std::os::unix::fs::symlink(&real, &link).expect("symlink");

        let files = WorkspaceFiles::new(link);

        assert_eq!(files.list_files(None, 50).unwrap(), "a.txt\nnotes/");
        assert_eq!(files.list_files(Some("."), 50).unwrap(), "a.txt\nnotes/");
        assert_eq!(files.read_file("a.txt").unwrap(), "a");
    }
}
