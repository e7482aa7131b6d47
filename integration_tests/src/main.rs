//! Integration tests for head tracker firmware.
//!
//! Run against a connected tracker to check the serial protocol end to end.

mod device;

use clap::Parser;
use colored::Colorize;
use headtracker_link::config::firmware::VERSION;
use headtracker_link::config::serial::BAUD_RATE;

use device::{resolve_port, DeviceClient};
use tests::{print_results, run_all_tests};

#[derive(Parser)]
#[command(name = "integration-tests")]
#[command(about = "Integration tests for head tracker firmware")]
struct Args {
    /// Serial port for the device (use "auto" to auto-detect)
    #[arg(short, long, default_value = "auto")]
    port: String,

    /// Baud rate
    #[arg(short, long, default_value_t = BAUD_RATE)]
    baud: u32,

    /// Show protocol logging and device log frames
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let level = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();

    // Resolve port (auto-detect if "auto")
    let port = resolve_port(&args.port, args.baud)?;

    println!("{} (link {})", "Head Tracker Integration Tests".bold(), VERSION);
    println!("Port: {}", port);
    println!("Baud: {}", args.baud);
    println!();

    println!("Connecting to device...");
    let mut device = DeviceClient::new(&port, args.baud)?;

    // Wait for boot output to finish, then clear buffer
    std::thread::sleep(std::time::Duration::from_secs(1));
    device.clear_buffer()?;
    let info = device.connect()?;
    println!(
        "{} {} firmware {} ({})",
        "Connected!".green(),
        info.hardware,
        info.version,
        info.git
    );

    println!("\nRunning tests...\n");

    let results = run_all_tests(&mut device);
    print_results(&results);

    // Exit with error code if any tests failed
    let failed = results.iter().filter(|r| !r.passed).count();
    if failed > 0 {
        std::process::exit(1);
    }

    Ok(())
}
