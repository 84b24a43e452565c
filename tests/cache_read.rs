//! End-to-end tests for the read path: extraction on demand, cached reads,
//! page ordering, self-healing, and deletion safety.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::sync::Arc;

use galcache::{CacheConfig, GalleryCache, GalleryId};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;

const SAMPLE_ID: &str = "11111111-1111-4111-8111-111111111111";

fn write_cbz(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut writer = zip::ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in entries {
        if name.ends_with('/') {
            writer.add_directory(*name, options).unwrap();
        } else {
            writer.start_file(*name, options).unwrap();
            writer.write_all(data).unwrap();
        }
    }
    writer.finish().unwrap();
}

fn setup() -> (TempDir, GalleryCache) {
    let tmp = tempfile::tempdir().unwrap();
    let config = CacheConfig::new(tmp.path());
    config.init_cache_dir().unwrap();
    let cache = GalleryCache::new(&config);
    (tmp, cache)
}

#[tokio::test]
async fn sample_cbz_end_to_end() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("sample.cbz");
    write_cbz(
        &archive,
        &[
            ("cover.jpg", b"jpegdata".as_slice()),
            ("page2.jpg", b"jpegdata".as_slice()),
            ("notes.txt", b"not a page".as_slice()),
        ],
    );

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let (pages, count) = cache.read(&archive, id).await;

    assert_eq!(count, 2);
    assert_eq!(pages, vec!["cover.jpg", "page2.jpg"]);

    let dir = cache.gallery_dir(id);
    assert!(dir.join("cover.jpg").exists());
    assert!(!dir.join("notes.txt").exists());
}

#[tokio::test]
async fn double_read_is_idempotent() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("gallery.cbz");
    write_cbz(
        &archive,
        &[
            ("a.jpg", b"x".as_slice()),
            ("b.png", b"y".as_slice()),
            ("c.webp", b"z".as_slice()),
        ],
    );

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let first = cache.read(&archive, id).await;
    // The second call takes the cached-directory branch.
    let second = cache.read(&archive, id).await;

    assert_eq!(first.1, 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn pages_are_naturally_sorted() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("pages.cbz");
    // Deliberately shuffled insertion order.
    write_cbz(
        &archive,
        &[
            ("page10.jpg", b"x".as_slice()),
            ("page1.jpg", b"x".as_slice()),
            ("page11.jpg", b"x".as_slice()),
            ("page2.jpg", b"x".as_slice()),
        ],
    );

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let (pages, _) = cache.read(&archive, id).await;
    assert_eq!(
        pages,
        vec!["page1.jpg", "page2.jpg", "page10.jpg", "page11.jpg"]
    );

    // The disk-read branch must sort identically.
    let (pages, _) = cache.read(&archive, id).await;
    assert_eq!(
        pages,
        vec!["page1.jpg", "page2.jpg", "page10.jpg", "page11.jpg"]
    );
}

#[tokio::test]
async fn non_image_entries_never_reach_disk() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("mixed.zip");
    write_cbz(
        &archive,
        &[
            ("vol1/", b"".as_slice()),
            ("vol1/p1.jpg", b"x".as_slice()),
            ("vol1/p2.gif", b"x".as_slice()),
            ("info.json", b"{}".as_slice()),
            ("readme.txt", b"hi".as_slice()),
        ],
    );

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let (pages, count) = cache.read(&archive, id).await;

    assert_eq!(count, 2);
    assert_eq!(pages, vec!["vol1/p1.jpg", "vol1/p2.gif"]);

    // Nothing but images anywhere under the gallery dir.
    let mut on_disk = Vec::new();
    for entry in walk(&cache.gallery_dir(id)) {
        on_disk.push(entry);
    }
    on_disk.sort();
    assert_eq!(on_disk, vec!["vol1/p1.jpg", "vol1/p2.gif"]);
}

fn walk(root: &Path) -> Vec<String> {
    let mut files = Vec::new();
    let mut stack = vec![root.to_path_buf()];
    while let Some(dir) = stack.pop() {
        for entry in fs::read_dir(&dir).unwrap().flatten() {
            let path = entry.path();
            if path.is_dir() {
                stack.push(path);
            } else {
                files.push(
                    path.strip_prefix(root)
                        .unwrap()
                        .to_string_lossy()
                        .replace('\\', "/"),
                );
            }
        }
    }
    files
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_cold_reads_extract_once() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("gallery.cbz");
    let entries: Vec<(String, Vec<u8>)> = (1..=20)
        .map(|i| (format!("page{i}.jpg"), vec![b'x'; 512]))
        .collect();
    let borrowed: Vec<(&str, &[u8])> = entries
        .iter()
        .map(|(n, d)| (n.as_str(), d.as_slice()))
        .collect();
    write_cbz(&archive, &borrowed);

    let cache = Arc::new(cache);
    let id = GalleryId::parse(SAMPLE_ID).unwrap();

    let a = tokio::spawn({
        let cache = cache.clone();
        let archive = archive.clone();
        async move { cache.read(&archive, id).await }
    });
    let b = tokio::spawn({
        let cache = cache.clone();
        let archive = archive.clone();
        async move { cache.read(&archive, id).await }
    });

    let (ra, rb) = (a.await.unwrap(), b.await.unwrap());
    assert_eq!(ra.1, 20);
    assert_eq!(ra, rb);

    // No duplicate or partial extraction: exactly the 20 pages on disk,
    // each intact.
    let on_disk = walk(&cache.gallery_dir(id));
    assert_eq!(on_disk.len(), 20);
    for file in on_disk {
        let data = fs::read(cache.gallery_dir(id).join(file)).unwrap();
        assert_eq!(data.len(), 512);
    }
}

#[tokio::test]
async fn empty_cache_dir_self_heals() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("gallery.cbz");
    write_cbz(&archive, &[("p1.jpg", b"x".as_slice())]);

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    // A corrupted, empty leftover from a previous run.
    fs::create_dir_all(cache.gallery_dir(id)).unwrap();

    let (pages, count) = cache.read(&archive, id).await;
    assert_eq!(count, 1);
    assert_eq!(pages, vec!["p1.jpg"]);
}

#[tokio::test]
async fn unreadable_archive_degrades_to_empty_result() {
    let (tmp, cache) = setup();
    let id = GalleryId::parse(SAMPLE_ID).unwrap();

    let (pages, count) = cache.read(&tmp.path().join("missing.cbz"), id).await;
    assert_eq!(count, 0);
    assert!(pages.is_empty());

    // Unsupported format as well.
    let bogus = tmp.path().join("gallery.pdf");
    fs::write(&bogus, b"%PDF").unwrap();
    let (_, count) = cache.read(&bogus, id).await;
    assert_eq!(count, 0);
}

#[tokio::test]
async fn plain_directory_gallery_flows_through_read_path() {
    let (tmp, cache) = setup();
    let source = tmp.path().join("loose");
    fs::create_dir_all(source.join("ch1")).unwrap();
    fs::write(source.join("ch1/p2.jpg"), b"x").unwrap();
    fs::write(source.join("ch1/p10.jpg"), b"x").unwrap();
    fs::write(source.join("meta.txt"), b"x").unwrap();

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let (pages, count) = cache.read(&source, id).await;

    assert_eq!(count, 2);
    assert_eq!(pages, vec!["ch1/p2.jpg", "ch1/p10.jpg"]);
}

#[tokio::test]
async fn tar_gallery_is_supported() {
    let (tmp, cache) = setup();
    let archive = tmp.path().join("gallery.tar");
    let file = File::create(&archive).unwrap();
    let mut builder = tar::Builder::new(file);

    for (name, data) in [("p1.jpg", b"img".as_slice()), ("skip.txt", b"no".as_slice())] {
        let mut header = tar::Header::new_gnu();
        header.set_size(data.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append_data(&mut header, name, data).unwrap();
    }
    builder.finish().unwrap();

    let id = GalleryId::parse(SAMPLE_ID).unwrap();
    let (pages, count) = cache.read(&archive, id).await;

    assert_eq!(count, 1);
    assert_eq!(pages, vec!["p1.jpg"]);
}

#[tokio::test]
async fn remove_refuses_non_uuid_identifiers() {
    let (tmp, cache) = setup();

    // A directory a traversal would reach if validation failed.
    let outside = tmp.path().join("etc");
    fs::create_dir_all(&outside).unwrap();

    assert!(cache.remove("../etc").is_err());
    assert!(cache.remove("not-a-uuid").is_err());
    assert!(outside.exists());
}

#[tokio::test]
async fn remove_is_a_noop_for_absent_directories() {
    let (_tmp, cache) = setup();
    // Valid UUID, never extracted: store and disk are already consistent.
    assert!(cache.remove(SAMPLE_ID).is_ok());
}

#[tokio::test]
async fn adoption_only_picks_up_uuid_directories() {
    let (tmp, cache) = setup();

    let root = cache.root().to_path_buf();
    fs::create_dir_all(root.join(SAMPLE_ID)).unwrap();
    fs::create_dir_all(root.join("thumbnails")).unwrap();
    fs::write(root.join("stray.txt"), b"x").unwrap();

    assert_eq!(cache.adopt_existing(), 1);
    let entries = cache.entries();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].0, GalleryId::parse(SAMPLE_ID).unwrap());

    let _ = tmp;
}
