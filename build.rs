fn main() {
    // Only the bridge commands get generated permissions; the capability
    // file grants them to the main window and nothing else.
    #[cfg(feature = "desktop")]
    tauri_build::try_build(tauri_build::Attributes::new().app_manifest(
        tauri_build::AppManifest::new().commands(&[
            "vault_set",
            "vault_get",
            "vault_delete",
            "environment",
        ]),
    ))
    .expect("failed to run tauri build script");
}
