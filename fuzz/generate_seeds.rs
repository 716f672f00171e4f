//! Generate seed corpus for fuzzing

use broccoli_rs::{pack, ArchiveWriter, Entry, PackOptions};
use std::fs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let corpus_dir = "fuzz/corpus/fuzz_archive_parse";
    fs::create_dir_all(corpus_dir)?;

    println!("Generating seed corpus...");

    // Seed 1: Empty archive (no entries)
    {
        let path = format!("{}/seed_empty.broc", corpus_dir);
        fs::write(&path, pack(Vec::new(), 3)?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 2: Single small file
    {
        let path = format!("{}/seed_single_small.broc", corpus_dir);
        let archive = pack(vec![Entry::file("test.txt", b"Hello, World!".to_vec(), 0)?], 3)?;
        fs::write(&path, archive)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 3: Nested directories
    {
        let path = format!("{}/seed_nested.broc", corpus_dir);
        let mut writer = ArchiveWriter::new(PackOptions::default().with_quality(3));
        writer.add_directory("dir", 1)?;
        writer.add_directory("dir/sub", 0)?;
        writer.add_file("dir/file1.txt", b"First file", 2)?;
        writer.add_file("dir/sub/file2.txt", b"Second file", 3)?;
        writer.add_file("file3.txt", b"Third file", 4)?;
        fs::write(&path, writer.finish()?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 4: Large compressible file
    {
        let path = format!("{}/seed_large.broc", corpus_dir);
        let large_data = b"This is test data for compression. ".repeat(1000);
        fs::write(&path, pack(vec![Entry::file("large.txt", large_data, 0)?], 11)?)?;
        println!("✓ Generated: {}", path);
    }

    // Seed 5: Binary data and a zero-length file
    {
        let path = format!("{}/seed_binary.broc", corpus_dir);
        let binary_data: Vec<u8> = (0..=255).collect();
        let archive = pack(
            vec![
                Entry::file("binary.bin", binary_data, 0)?,
                Entry::file("empty.txt", Vec::new(), 0)?,
            ],
            6,
        )?;
        fs::write(&path, archive)?;
        println!("✓ Generated: {}", path);
    }

    println!("\nGenerated 5 seed files in {}", corpus_dir);
    Ok(())
}
