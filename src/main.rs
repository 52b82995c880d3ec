//! `anystorage` console binary.

use std::io;
use std::process::ExitCode;

use log::{error, info};

use anystorage::console::{Cli, Console};
use anystorage::{
    BackendKind, CloudDriveBackend, LayerExt, LocalDiskBackend, LoggingLayer, MemoryDrive,
    StorageBackend, StorageError, StorageSession,
};

fn main() -> ExitCode {
    // Initialize the logger (env_logger picks up RUST_LOG environment variable)
    env_logger::init();

    let cli = Cli::parse_args();
    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<(), StorageError> {
    info!("opening {} storage at {}", cli.backend, cli.root);
    match cli.backend {
        BackendKind::Local => {
            let backend = LocalDiskBackend::new().layer(LoggingLayer::new("local"));
            let mut session = StorageSession::open(Box::new(backend), &cli.root)?;
            interact(&mut session)
        }
        BackendKind::Cloud => {
            let drive = MemoryDrive::load(&cli.drive_state)?;
            let backend = CloudDriveBackend::new(drive).layer(LoggingLayer::new("cloud"));
            let mut session = StorageSession::open(Box::new(backend), &cli.root)?;
            let result = interact(&mut session);
            session.backend().inner().client().save(&cli.drive_state)?;
            result
        }
    }
}

fn interact<B: StorageBackend>(session: &mut StorageSession<B>) -> Result<(), StorageError> {
    let stdin = io::stdin();
    let stdout = io::stdout();
    Console::new(session, stdin.lock(), stdout.lock())
        .run()
        .map_err(|e| StorageError::io("console", "stdio", e))
}
