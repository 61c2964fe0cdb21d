//! Version command

/// Run the version command.
pub fn run() {
    println!("routectl {}", env!("CARGO_PKG_VERSION"));
}
