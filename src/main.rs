use std::fs::File;

mod zipdir;
use zipdir::ZipRoFs;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).ok_or("usage: zipdir <archive.zip> [dir]")?;
    let dir = std::env::args().nth(2).unwrap_or_default();
    let limit_bytes: u64 = 100 * 1024 * 1024;  // 100 MiB

    let file = File::open(&path)?;
    let fs = ZipRoFs::new(file, None, Some(limit_bytes))?;

    let node = fs.dir(&dir)?;
    for name in node.list_subdirectories() {
        println!("{name}/");
    }
    for name in node.list_files() {
        println!("{name}");
    }

    Ok(())
}
