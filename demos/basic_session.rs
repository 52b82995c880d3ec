//! Basic usage of an anystorage session.
//!
//! This example opens a session on the in-memory drive, sets a policy,
//! creates directories and files, and then searches, sorts and filters.
//!
//! Run with: `cargo run --example basic_session`

use anystorage::*;
use std::fs;

fn main() {
    println!("=== anystorage Basic Session Example ===\n");

    // The cloud backend over an in-process drive, wrapped in a logging layer
    let backend = CloudDriveBackend::new(MemoryDrive::new()).layer(LoggingLayer::new("demo"));
    let mut session = StorageSession::open(Box::new(backend), "storage").unwrap();

    // --- Policy ---
    println!("1. Saving a configuration...");
    session
        .create_config(Configuration::new(1_000_000.0, ["exe", "bat"]).unwrap())
        .unwrap();
    println!(
        "   forbidden extensions: {:?}",
        session.config().forbidden_extensions()
    );

    // --- Directories ---
    println!("\n2. Creating directories...");
    session.create_directory_with_limit("inbox", 2).unwrap();
    let weeks = session.create_directory_prefixed_range("week", 1, 3).unwrap();
    println!("   created inbox (limit 2) and {} week directories", weeks.len());

    // --- Files ---
    println!("\n3. Uploading files...");
    let scratch = std::env::temp_dir().join("anystorage-basic-session");
    fs::create_dir_all(&scratch).unwrap();
    let notes = scratch.join("notes.txt");
    let setup = scratch.join("setup.exe");
    fs::write(&notes, b"remember the milk").unwrap();
    fs::write(&setup, b"MZ").unwrap();

    session.enter_directory("inbox").unwrap();
    session.add_file(&notes).unwrap();
    println!("   uploaded notes.txt into inbox");
    match session.add_file(&setup) {
        Err(e) => println!("   setup.exe refused: {e}"),
        Ok(_) => println!("   setup.exe unexpectedly accepted"),
    }
    session.return_back_from_directory().unwrap();

    // --- Search, sort, filter ---
    println!("\n4. Searching...");
    let tokens = session.search_all().unwrap();
    println!("   everything, names descending:");
    for path in session.sort_results(&tokens, SortKey::Name, SortOrder::Descending) {
        println!("     - {path}");
    }
    println!("   name and creation date:");
    for row in session.filter_results(&tokens, &[FilterKey::Name, FilterKey::CreationDate]) {
        println!("     - {row}");
    }

    fs::remove_dir_all(&scratch).unwrap();
    println!("\n=== Done ===");
}
