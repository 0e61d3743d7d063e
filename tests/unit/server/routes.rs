use super::*;

#[test]
fn served_names_are_flat() {
    assert!(is_served_name("composed-1234.mp4"));
    assert!(!is_served_name("../secret"));
    assert!(!is_served_name(".hidden"));
    assert!(!is_served_name("a/b.mp4"));
    assert!(!is_served_name(""));
}

#[test]
fn media_types_by_extension() {
    assert_eq!(media_type_for("x.mp4"), "video/mp4");
    assert_eq!(media_type_for("x.WEBM"), "video/webm");
    assert_eq!(media_type_for("x.mov"), "video/quicktime");
    assert_eq!(media_type_for("x.mkv"), "video/x-matroska");
    assert_eq!(media_type_for("x"), "application/octet-stream");
}

#[tokio::test]
async fn artifacts_are_found_by_uuid_only() {
    let dir = tempfile::tempdir().unwrap();
    let id = Uuid::new_v4();
    let enhanced = dir.path().join(format!("enhanced-{id}.mp4"));
    std::fs::write(&enhanced, b"x").unwrap();

    assert_eq!(
        find_artifact(dir.path(), &id.to_string()).await,
        Some((id, enhanced.clone()))
    );
    // Other spellings of the same uuid resolve to the canonical id.
    for alias in [
        id.simple().to_string(),
        id.urn().to_string(),
        id.braced().to_string().to_uppercase(),
    ] {
        assert_eq!(
            find_artifact(dir.path(), &alias).await,
            Some((id, enhanced.clone()))
        );
    }
    assert_eq!(find_artifact(dir.path(), "../../etc/passwd").await, None);
    assert_eq!(
        find_artifact(dir.path(), &Uuid::new_v4().to_string()).await,
        None
    );
}
