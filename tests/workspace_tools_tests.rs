use tempfile::TempDir;
use threadchat::tools::{ToolHandler, ToolRegistry, WorkspaceFiles};
use threadchat::types::{ToolCallKind, ToolCallRequest};

fn call(name: &str, arguments: &str) -> ToolCallRequest {
    ToolCallRequest {
        id: format!("call_{name}"),
        kind: ToolCallKind::Function,
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

fn registry_for(dir: &TempDir) -> ToolRegistry {
    let mut registry = ToolRegistry::new();
    WorkspaceFiles::new(dir.path().to_path_buf()).register(&mut registry);
    registry
}

#[tokio::test]
async fn test_read_file_through_registry() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("notes.txt"), "hello workspace").expect("write");
    let registry = registry_for(&dir);

    let output = registry
        .call(&call("read_file", "{\"path\":\"notes.txt\"}"))
        .await
        .expect("read_file");
    assert_eq!(output, "hello workspace");
}

#[tokio::test]
async fn test_path_traversal_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let registry = registry_for(&dir);

    let error = registry
        .call(&call("read_file", "{\"path\":\"../etc/passwd\"}"))
        .await
        .expect_err("escaping the workspace must fail");
    assert!(!error.to_string().is_empty());
}

#[tokio::test]
async fn test_list_files_reports_entries() {
    let dir = TempDir::new().expect("tempdir");
    std::fs::write(dir.path().join("a.txt"), "a").expect("write");
    std::fs::create_dir(dir.path().join("sub")).expect("mkdir");
    let registry = registry_for(&dir);

    let output = registry
        .call(&call("list_files", "{}"))
        .await
        .expect("list_files");
    assert!(output.contains("a.txt"));
    assert!(output.contains("sub"));
}
