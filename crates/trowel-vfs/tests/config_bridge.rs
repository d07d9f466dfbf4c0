use trowel_config::Config;
use trowel_test::prelude::*;

#[tokio::test]
async fn facade_built_from_workspace_config() {
    setup_test_logging("trowel_vfs=debug");
    let workspace = test_dir();
    let root = test_dir();
    let config_file = write_file(
        workspace.path(),
        ".trowel/config.toml",
        &format!(
            "[fs]\nroot = \"{}\"\nread_only = true\n",
            root.path().display()
        ),
    );

    let config = Config::load_file(&config_file).unwrap();
    let fs = SandboxedFs::from_config(&config).unwrap();
    assert_eq!(fs.root(), root.path());
    assert_eq!(fs.mode(), AccessMode::ReadOnly);

    write_file(root.path(), "seed.txt", "seeded");
    assert_eq!(fs.read_text("seed.txt").await.unwrap().as_deref(), Some("seeded"));
    let err = fs.create_text("new.txt", "x").await.unwrap_err();
    assert!(matches!(err, VfsError::ReadOnly(_)));
    assert!(!root.path().join("new.txt").exists());
}
