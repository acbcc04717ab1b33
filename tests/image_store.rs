use std::{collections::HashSet, sync::Arc};

use youlan_api::storage::{
    BlobStore, ImageKind, ImageStore, MemoryBlobStore, content_hash, sanitize_group_key,
};

fn store() -> (Arc<MemoryBlobStore>, ImageStore) {
    let blobs = Arc::new(MemoryBlobStore::new());
    let store = ImageStore::new(blobs.clone(), "commodities", "/media/");
    (blobs, store)
}

#[tokio::test]
async fn identical_uploads_share_one_canonical_file() {
    let (blobs, store) = store();
    let bytes = b"red hoodie front".to_vec();

    let first = store
        .store_image(&bytes, ImageKind::Main, "YL24001", "front.JPG")
        .await
        .unwrap();
    let second = store
        .store_image(&bytes, ImageKind::Main, "YL24001", "copy.jpg")
        .await
        .unwrap();

    let expected = format!("commodities/YL24001/{}.jpg", content_hash(&bytes));
    assert_eq!(first.path, expected);
    assert!(!first.reused);
    assert_eq!(second.path, expected);
    assert!(second.reused);
    assert_eq!(blobs.paths(), vec![expected]);
}

#[tokio::test]
async fn different_content_gets_separate_files() {
    let (blobs, store) = store();
    let a = store
        .store_image(b"a", ImageKind::Gallery, "YL1", "a.png")
        .await
        .unwrap();
    let b = store
        .store_image(b"b", ImageKind::Gallery, "YL1", "b.png")
        .await
        .unwrap();
    assert_ne!(a.path, b.path);
    assert!(a.path.starts_with("commodities/YL1/images/"));
    assert_eq!(blobs.paths().len(), 2);
}

#[tokio::test]
async fn legacy_files_are_matched_by_content() {
    let (blobs, store) = store();
    blobs
        .write("commodities/colors/red/legacy.png", b"swatch")
        .await
        .unwrap();

    let stored = store
        .store_image(b"swatch", ImageKind::Color, "red", "new.png")
        .await
        .unwrap();
    assert_eq!(stored.path, "commodities/colors/red/legacy.png");
    assert!(stored.reused);
    assert_eq!(
        store
            .find_existing(b"swatch", ImageKind::Color, "red")
            .await
            .unwrap(),
        Some("commodities/colors/red/legacy.png".to_string())
    );
}

#[tokio::test]
async fn unreadable_staging_keeps_the_staged_name() {
    let (blobs, store) = store();
    blobs.set_fail_reads(true);

    let stored = store
        .store_image(b"bytes", ImageKind::Promo, "YL2", "promo.webp")
        .await
        .unwrap();
    assert!(stored.degraded);
    assert!(stored.hash.is_none());
    assert!(stored.path.starts_with("commodities/temp/promo/"));
    assert!(stored.path.ends_with(".webp"));
    assert!(blobs.exists(&stored.path).await.unwrap());
}

#[tokio::test]
async fn prune_keeps_only_the_canonical_file() {
    let (blobs, store) = store();
    blobs.write("commodities/YL3/old-1.jpg", b"1").await.unwrap();
    blobs.write("commodities/YL3/old-2.jpg", b"2").await.unwrap();
    blobs.write("commodities/YL3/images/g.jpg", b"g").await.unwrap();
    let kept = store
        .store_image(b"main", ImageKind::Main, "YL3", "main.jpg")
        .await
        .unwrap();

    let removed = store
        .prune_group(ImageKind::Main, "YL3", &kept.path, &HashSet::new())
        .await
        .unwrap();
    assert_eq!(removed, 2);
    let mut paths = blobs.paths();
    paths.sort();
    let mut expected = vec![kept.path.clone(), "commodities/YL3/images/g.jpg".to_string()];
    expected.sort();
    assert_eq!(paths, expected);
}

#[tokio::test]
async fn prune_spares_files_still_referenced() {
    let (blobs, store) = store();
    // Two creates for a new style each stored their own main image.
    let a = store
        .store_image(b"first upload", ImageKind::Main, "X", "a.jpg")
        .await
        .unwrap();
    let b = store
        .store_image(b"second upload", ImageKind::Main, "X", "b.jpg")
        .await
        .unwrap();
    let referenced: HashSet<String> = [a.path.clone(), b.path.clone()].into();

    let removed_a = store
        .prune_group(ImageKind::Main, "X", &a.path, &referenced)
        .await
        .unwrap();
    let removed_b = store
        .prune_group(ImageKind::Main, "X", &b.path, &referenced)
        .await
        .unwrap();
    assert_eq!(removed_a + removed_b, 0);
    assert!(blobs.exists(&a.path).await.unwrap());
    assert!(blobs.exists(&b.path).await.unwrap());
}

#[tokio::test]
async fn styles_sharing_a_folder_keep_each_others_images() {
    let (blobs, store) = store();
    let dotted = store
        .store_image(b"dotted style", ImageKind::Main, "A.1", "a.jpg")
        .await
        .unwrap();
    let plain = store
        .store_image(b"plain style", ImageKind::Main, "A1", "b.jpg")
        .await
        .unwrap();
    assert_eq!(store.group_dir(ImageKind::Main, "A.1"), store.group_dir(ImageKind::Main, "A1"));
    blobs.write("commodities/A1/stray.jpg", b"stray").await.unwrap();

    let referenced: HashSet<String> = [dotted.path.clone()].into();
    let removed = store
        .prune_group(ImageKind::Main, "A1", &plain.path, &referenced)
        .await
        .unwrap();
    assert_eq!(removed, 1);
    assert!(blobs.exists(&dotted.path).await.unwrap());
    assert!(blobs.exists(&plain.path).await.unwrap());
    assert!(!blobs.exists("commodities/A1/stray.jpg").await.unwrap());
}

#[tokio::test]
async fn group_keys_are_sanitized_and_urls_prefixed() {
    let (_, store) = store();
    assert_eq!(sanitize_group_key("YL/../24 001"), "YL24001");
    assert_eq!(
        store.group_dir(ImageKind::Main, "../.."),
        None
    );
    assert_eq!(
        store.public_url("commodities/YL1/x.jpg"),
        "/media/commodities/YL1/x.jpg"
    );
    let activities = store.with_namespace("activities");
    let stored = activities
        .store_image(b"banner", ImageKind::Main, "7", "banner.png")
        .await
        .unwrap();
    assert!(stored.path.starts_with("activities/7/"));
}
