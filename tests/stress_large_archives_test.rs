//! Large Archive Stress Tests
//!
//! Run with: cargo test --release -- --ignored

use broccoli_rs::{ArchiveWriter, BroccoliError, PackOptions, Vfs};
use std::io::Read;
use std::time::Instant;

#[test]
#[ignore]
fn test_many_small_files() {
    println!("\n🏋️ Packing 20,000 small files...");
    let start = Instant::now();

    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(3));
    for d in 0..100 {
        writer.add_directory(&format!("dir{:03}", d), 1).unwrap();
        for f in 0..200 {
            let data = format!("directory {} file {}\n", d, f).repeat(10);
            writer
                .add_file(&format!("dir{:03}/file{:03}.txt", d, f), data.as_bytes(), 2)
                .unwrap();
        }
    }
    let archive = writer.finish().unwrap();
    println!("  Packed {} KB in {:?}", archive.len() / 1024, start.elapsed());

    let start = Instant::now();
    let vfs = Vfs::load(&archive, false).unwrap();
    println!("  Lazy load in {:?}", start.elapsed());
    assert_eq!(vfs.len(), 100 + 100 * 200);

    let mut count = 0;
    vfs.walk("dir050", |_, meta| {
        if !meta.is_dir() {
            count += 1;
        }
        Ok::<_, BroccoliError>(())
    })
    .unwrap();
    assert_eq!(count, 200);

    let mut data = Vec::new();
    vfs.open("dir099/file199.txt").unwrap().read_to_end(&mut data).unwrap();
    assert_eq!(data, "directory 99 file 199\n".repeat(10).into_bytes());

    let start = Instant::now();
    let eager = Vfs::load(&archive, true).unwrap();
    println!("  Eager load in {:?}", start.elapsed());
    assert_eq!(eager.len(), vfs.len());
}

#[test]
#[ignore]
fn test_large_single_file() {
    println!("\n🏋️ Packing one 64MB file...");

    let data: Vec<u8> = (0..64 * 1024 * 1024u32)
        .map(|i| (i.wrapping_mul(2_654_435_761) >> 24) as u8)
        .collect();

    let start = Instant::now();
    let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(1));
    writer.add_file("big.bin", &data, 0).unwrap();
    let archive = writer.finish().unwrap();
    println!("  Packed in {:?}", start.elapsed());

    let vfs = Vfs::load(&archive, false).unwrap();
    let mut file = vfs.open("big.bin").unwrap();
    file.seek(32 * 1024 * 1024, broccoli_rs::Whence::Start).unwrap();
    let mut buf = [0u8; 4096];
    let n = file.read(&mut buf).unwrap();
    assert_eq!(&buf[..n], &data[32 * 1024 * 1024..32 * 1024 * 1024 + n]);
}
