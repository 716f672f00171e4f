//! Integration tests for broccoli-rs library

use broccoli_rs::{
    archive::text, pack, ArchiveWriter, BroccoliError, Entry, LoadOptions, PackOptions, Vfs,
    Whence,
};
use std::io::Read;
use std::path::Path;

/// Helper: Pack the given (path, contents) files, no directory entries
fn pack_files(files: &[(&str, &[u8])]) -> Vec<u8> {
    let entries = files
        .iter()
        .map(|(path, data)| Entry::file(path, data.to_vec(), 1_700_000_000).unwrap())
        .collect();
    pack(entries, 9).unwrap()
}

/// Helper: Read an open file to the end
fn read_all(vfs: &Vfs, path: &str) -> Vec<u8> {
    let mut file = vfs.open(path).unwrap();
    let mut out = Vec::new();
    file.read_to_end(&mut out).unwrap();
    out
}

/// Helper: Collect every path visited by a walk
fn walk_paths(vfs: &Vfs, root: &str) -> Vec<String> {
    let mut paths = Vec::new();
    vfs.walk(root, |path, _| {
        paths.push(path.to_string());
        Ok::<_, BroccoliError>(())
    })
    .unwrap();
    paths
}

#[test]
fn test_basic_archive_roundtrip() {
    let files: &[(&str, &[u8])] = &[
        ("index.html", b"<html><body>Hello</body></html>"),
        ("css/site.css", b"body { color: red; }"),
        ("js/app.js", b"console.log('hi');"),
        ("empty.txt", b""),
        ("data/blob.bin", &[0u8, 1, 2, 3, 255, 254]),
    ];
    let archive = pack_files(files);

    let vfs = Vfs::load(&archive, false).unwrap();
    assert_eq!(vfs.len(), files.len());

    for (path, data) in files {
        assert!(vfs.exists(path), "{} missing", path);
        assert_eq!(read_all(&vfs, path), *data, "content mismatch for {}", path);
    }
}

#[test]
fn test_walk_is_sorted() {
    let archive = pack_files(&[
        ("z.txt", b"z"),
        ("a/b/c.txt", b"c"),
        ("a.txt", b"a"),
        ("a/b.txt", b"b"),
        ("m/n.txt", b"n"),
    ]);
    let vfs = Vfs::load(&archive, false).unwrap();

    let paths = walk_paths(&vfs, "");
    assert_eq!(paths.len(), 5);
    assert!(paths.windows(2).all(|w| w[0] < w[1]), "not ascending: {:?}", paths);
}

#[test]
fn test_walk_prefix_scoping() {
    let archive = pack_files(&[("a/x", b"1"), ("a/y", b"2"), ("b/z", b"3")]);
    let vfs = Vfs::load(&archive, false).unwrap();

    assert_eq!(walk_paths(&vfs, "a"), vec!["a/x", "a/y"]);
    assert_eq!(walk_paths(&vfs, "./b"), vec!["b/z"]);
    assert!(walk_paths(&vfs, "c").is_empty());
}

#[test]
fn test_walk_visits_directories_first() {
    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(3));
    writer.add_file("docs/guide/intro.md", b"# Intro", 5).unwrap();
    writer.add_directory("docs/guide", 4).unwrap();
    writer.add_directory("docs", 3).unwrap();
    let vfs = Vfs::load(&writer.finish().unwrap(), false).unwrap();

    let mut visited = Vec::new();
    vfs.walk("docs", |path, meta| {
        visited.push((path.to_string(), meta.is_dir()));
        Ok::<_, BroccoliError>(())
    })
    .unwrap();

    assert_eq!(
        visited,
        vec![
            ("docs".to_string(), true),
            ("docs/guide".to_string(), true),
            ("docs/guide/intro.md".to_string(), false),
        ]
    );
}

#[test]
fn test_readdir_pagination() {
    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(3));
    writer.add_directory("dir", 1).unwrap();
    writer.add_file("dir/1.txt", b"one", 1).unwrap();
    writer.add_file("dir/2.txt", b"two", 1).unwrap();
    writer.add_file("dir/3.txt", b"three", 1).unwrap();
    writer.add_file("dirt.txt", b"not a child", 1).unwrap();
    let vfs = Vfs::load(&writer.finish().unwrap(), false).unwrap();

    let mut dir = vfs.open_dir("dir").unwrap();
    for expected in ["1.txt", "2.txt", "3.txt"] {
        let page = dir.readdir(1).unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name(), expected);
    }
    assert!(matches!(dir.readdir(1), Err(BroccoliError::Exhausted)));

    for count in [-1, 0] {
        let mut dir = vfs.open_dir("dir/").unwrap();
        let names: Vec<String> = dir
            .readdir(count)
            .unwrap()
            .iter()
            .map(|m| m.name().to_string())
            .collect();
        assert_eq!(names, vec!["1.txt", "2.txt", "3.txt"]);
        assert!(dir.readdir(0).unwrap().is_empty());
    }
}

#[test]
fn test_readdir_skips_nested_descendants() {
    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(3));
    writer.add_directory("site", 1).unwrap();
    writer.add_directory("site/img", 1).unwrap();
    writer.add_file("site/img/logo.png", b"png", 1).unwrap();
    writer.add_file("site/index.html", b"html", 1).unwrap();
    let vfs = Vfs::load(&writer.finish().unwrap(), false).unwrap();

    let mut dir = vfs.open_dir("site").unwrap();
    let listing = dir.readdir(10).unwrap();
    let names: Vec<&str> = listing.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["img", "index.html"]);
    assert!(listing[0].is_dir());
    assert!(dir.readdir(10).unwrap_err().is_exhausted());
}

#[test]
fn test_listing_files_without_directory_records() {
    let archive = pack_files(&[("index.html", b"<h1>home</h1>"), ("css/site.css", b"h1 {}")]);
    let vfs = Vfs::load(&archive, false).unwrap();

    let mut root = vfs.open_dir("").unwrap();
    let listing = root.readdir(0).unwrap();
    let names: Vec<&str> = listing.iter().map(|m| m.name()).collect();
    assert_eq!(names, vec!["css", "index.html"]);
    assert!(listing[0].is_dir());

    let css = vfs.stat("css").unwrap();
    assert!(css.is_dir());
    assert_eq!(css.unix_mod_time(), 0);

    let mut dir = vfs.open_dir("css").unwrap();
    let page = dir.readdir(1).unwrap();
    assert_eq!(page[0].path(), "css/site.css");
    assert_eq!(read_all(&vfs, page[0].path()), b"h1 {}");
    assert!(dir.readdir(1).unwrap_err().is_exhausted());

    // Walk still reports only what was packed
    assert_eq!(walk_paths(&vfs, ""), vec!["css/site.css", "index.html"]);
}

#[test]
fn test_seek_bounds() {
    let data = b"0123456789";
    let archive = pack_files(&[("digits.txt", data)]);
    let vfs = Vfs::load(&archive, false).unwrap();
    let mut file = vfs.open("digits.txt").unwrap();
    let len = data.len() as i64;

    assert!(matches!(
        file.seek(len, Whence::Start),
        Err(BroccoliError::BadOffset(_))
    ));

    assert_eq!(file.seek(len - 1, Whence::Start).unwrap(), 9);
    let mut buf = [0u8; 4];
    assert_eq!(file.read(&mut buf).unwrap(), 1);
    assert_eq!(buf[0], b'9');
    assert_eq!(file.read(&mut buf).unwrap(), 0);

    assert!(matches!(
        Whence::try_from(-1),
        Err(BroccoliError::BadWhence(-1))
    ));

    assert_eq!(file.seek(3, Whence::End).unwrap(), 7);
    assert_eq!(file.seek(1, Whence::Current).unwrap(), 8);
    assert_eq!(file.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf[..2], b"89");
}

#[test]
fn test_closed_handle_discipline() {
    let archive = pack_files(&[("a.txt", b"abc")]);
    let vfs = Vfs::load(&archive, false).unwrap();

    let mut file = vfs.open("a.txt").unwrap();
    let mut buf = [0u8; 2];
    file.read(&mut buf).unwrap();
    file.close().unwrap();

    assert!(matches!(file.read(&mut buf), Err(BroccoliError::Closed)));
    assert!(matches!(file.seek(0, Whence::Start), Err(BroccoliError::Closed)));
    assert!(matches!(file.close(), Err(BroccoliError::AlreadyClosed)));

    // A fresh open starts over at offset 0
    let mut reopened = vfs.open("a.txt").unwrap();
    assert_eq!(reopened.read(&mut buf).unwrap(), 2);
    assert_eq!(&buf, b"ab");
}

#[test]
fn test_independent_cursors() {
    let archive = pack_files(&[("a.txt", b"abcdef")]);
    let vfs = Vfs::load(&archive, false).unwrap();

    let mut first = vfs.open("a.txt").unwrap();
    let mut second = vfs.open("a.txt").unwrap();
    first.seek(4, Whence::Start).unwrap();

    let mut buf = [0u8; 2];
    second.read(&mut buf).unwrap();
    assert_eq!(&buf, b"ab");
    first.read(&mut buf).unwrap();
    assert_eq!(&buf, b"ef");
}

#[test]
fn test_stat_metadata() {
    let mut writer = ArchiveWriter::new(PackOptions::default());
    writer.add_directory("assets", 1_600_000_000).unwrap();
    writer
        .add_file("assets/logo.svg", b"<svg/>", 1_650_000_000)
        .unwrap();
    let vfs = Vfs::load(&writer.finish().unwrap(), false).unwrap();

    let file = vfs.stat("assets/logo.svg").unwrap();
    assert_eq!(file.name(), "logo.svg");
    assert_eq!(file.size(), 6);
    assert_eq!(file.mode().bits(), 0o444);
    assert_eq!(file.unix_mod_time(), 1_650_000_000);
    assert!(!file.is_dir());

    let dir = vfs.stat("./assets").unwrap();
    assert!(dir.is_dir());
    assert_eq!(dir.size(), 0);
    assert_eq!(dir.unix_mod_time(), 1_600_000_000);

    assert!(vfs.stat("nope").unwrap_err().is_not_found());
}

#[test]
fn test_errors_do_not_poison_handle() {
    let archive = pack_files(&[("a.txt", b"abc")]);
    let vfs = Vfs::load(&archive, false).unwrap();

    assert!(vfs.open("missing.txt").is_err());
    let mut file = vfs.open("a.txt").unwrap();
    assert!(file.seek(100, Whence::Start).is_err());

    let mut buf = [0u8; 3];
    assert_eq!(file.read(&mut buf).unwrap(), 3);
    assert_eq!(read_all(&vfs, "a.txt"), b"abc");
}

#[test]
fn test_text_wrapped_archive() {
    let archive = pack_files(&[("hello.txt", b"Hello, World!")]);
    let wrapped = text::encode(&archive);

    let vfs = Vfs::load_text(&wrapped, &LoadOptions::eager()).unwrap();
    assert_eq!(read_all(&vfs, "hello.txt"), b"Hello, World!");
}

/// Helper: Recursively gather a directory tree (stand-in for the discovery layer)
fn gather(root: &Path, dir: &Path, writer: &mut ArchiveWriter) {
    for entry in std::fs::read_dir(dir).unwrap() {
        let path = entry.unwrap().path();
        writer.add_from_disk(root, &path).unwrap();
        if path.is_dir() {
            gather(root, &path, writer);
        }
    }
}

#[test]
fn test_pack_directory_from_disk() {
    let temp_dir = tempfile::tempdir().unwrap();
    let root = temp_dir.path();
    std::fs::create_dir_all(root.join("public/css")).unwrap();
    std::fs::write(root.join("public/index.html"), b"<h1>home</h1>").unwrap();
    std::fs::write(root.join("public/css/site.css"), b"h1 { font-size: 2em; }").unwrap();

    let mut writer = ArchiveWriter::new(PackOptions::default().with_workers(2));
    gather(root, root, &mut writer);
    let vfs = Vfs::load(&writer.finish().unwrap(), true).unwrap();

    assert_eq!(
        walk_paths(&vfs, "public"),
        vec![
            "public",
            "public/css",
            "public/css/site.css",
            "public/index.html"
        ]
    );
    assert!(vfs.stat("public/css").unwrap().is_dir());
    assert_eq!(read_all(&vfs, "public/index.html"), b"<h1>home</h1>");
}
