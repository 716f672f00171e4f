#![no_main]

use broccoli_rs::{BroccoliError, Vfs, Whence};
use libfuzzer_sys::fuzz_target;
use std::io::Read;

fuzz_target!(|data: &[u8]| {
    // Lazy load keeps payloads compressed until opened; eager decodes all
    for eager in [false, true] {
        // Try to load - should never panic
        let vfs = match Vfs::load(data, eager) {
            Ok(vfs) => vfs,
            Err(_) => continue, // Expected for invalid data
        };

        // Try to open and read every file - should never panic
        let paths: Vec<String> = vfs.paths().map(str::to_string).collect();
        for path in &paths {
            let _ = vfs.stat(path);
            if let Ok(mut file) = vfs.open(path) {
                let mut buf = Vec::new();
                let _ = file.read_to_end(&mut buf);
                let _ = file.seek(1, Whence::End);
                let _ = file.close();
            }
        }

        // Try walking and listing from the root - should never panic
        let _ = vfs.walk("", |_, _| Ok::<_, BroccoliError>(()));
        if let Ok(mut root) = vfs.open_dir("") {
            while root.readdir(8).is_ok() {}
        }

        // Try lookups with hostile paths - should never panic
        let _ = vfs.exists("test.txt");
        let _ = vfs.stat("/");
        let _ = vfs.open("../../../etc/passwd");
    }
});
