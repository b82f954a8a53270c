//! Smart Counter - Serial Telemetry Bridge Binary
//!
//! Reads telemetry from a serial/Bluetooth counter device and serves the latest
//! reading over HTTP.

use anyhow::Context;
use clap::{Parser, Subcommand};
use smart_counter::{
    available_ports, start_web_server, DeviceConfig, ReaderLoop, SerialDeviceLink, StateStore,
    WebConfig, DEFAULT_BAUD_RATE, DEFAULT_DEVICE_ADDRESS, DEFAULT_POLL_INTERVAL_MS,
    DEFAULT_READ_TIMEOUT_MS, DEFAULT_WEB_PORT,
};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "smart_counter")]
#[command(about = "Smart Counter - serial telemetry bridge")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = "Reads COUNT/USAGE_S/LIGHT telemetry from a serial or Bluetooth device and serves the latest reading over HTTP")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Serial port of the counter device (e.g. /dev/rfcomm0, COM8)
    #[arg(long, default_value = DEFAULT_DEVICE_ADDRESS)]
    device: String,

    /// Serial speed in bits per second
    #[arg(short, long, default_value_t = DEFAULT_BAUD_RATE)]
    baud: u32,

    /// Web server bind address
    #[arg(long, default_value = "0.0.0.0")]
    host: String,

    /// Web server port
    #[arg(short, long, default_value_t = DEFAULT_WEB_PORT)]
    port: u16,

    /// Upper bound on a single device line read in milliseconds
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    read_timeout_ms: u64,

    /// Pause between polls of a silent device in milliseconds
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL_MS)]
    poll_interval_ms: u64,

    /// Disable CORS headers
    #[arg(long)]
    no_cors: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read from the device and serve the latest reading (default)
    Serve,

    /// List available serial ports and exit
    Ports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing/logging
    init_logging(&cli)?;

    match &cli.command {
        Some(Commands::Ports) => ports_command(),
        Some(Commands::Serve) | None => {
            print_banner();
            serve_command(&cli).await
        }
    }
}

fn init_logging(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.debug {
        "debug"
    } else if cli.verbose {
        "info"
    } else {
        "warn"
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

fn print_banner() {
    println!("Smart Counter - Serial Telemetry Bridge");
    println!("   Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
}

fn device_config(cli: &Cli) -> DeviceConfig {
    DeviceConfig::new(&cli.device, cli.baud)
        .with_read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .with_poll_interval(Duration::from_millis(cli.poll_interval_ms))
}

fn web_config(cli: &Cli) -> WebConfig {
    WebConfig::default()
        .with_host(&cli.host)
        .with_port(cli.port)
        .with_cors(!cli.no_cors)
        .with_device_label(&cli.device)
}

async fn serve_command(cli: &Cli) -> anyhow::Result<()> {
    let device_config = device_config(cli);
    let web_config = web_config(cli);

    // Without a device there is nothing to serve
    let device = SerialDeviceLink::open(&device_config.address, device_config.baud_rate)
        .with_context(|| {
            format!(
                "Could not open serial port {}. Is the device paired and connected?",
                device_config.address
            )
        })?;
    println!(
        "--- Connected to {} at {} bps ---",
        device_config.address, device_config.baud_rate
    );

    let store = StateStore::new();
    let (stop_tx, stop_rx) = watch::channel(false);
    let reader =
        ReaderLoop::new(device, store.clone(), device_config.reader_config()).spawn(stop_rx);

    info!("Web server configuration:");
    info!("  - Bind address: {}", web_config.bind_address());
    info!("  - CORS enabled: {}", web_config.enable_cors);
    info!("  - Poll interval: {}ms", cli.poll_interval_ms);
    println!("Accessible at http://<YOUR_LAN_IP>:{}/", web_config.port);

    let served = start_web_server(web_config, store, shutdown_signal()).await;

    // Stop the reader whether the server exited cleanly or not
    let _ = stop_tx.send(true);
    if let Err(e) = reader.await {
        warn!("Reader task ended abnormally: {}", e);
    }

    served.context("Web server failed")
}

fn ports_command() -> anyhow::Result<()> {
    let ports = available_ports().context("Failed to list serial ports")?;

    if ports.is_empty() {
        println!("No serial ports found");
        return Ok(());
    }

    println!("Available serial ports:");
    for port in ports {
        match port.product {
            Some(product) => println!("  {} ({}: {})", port.name, port.kind, product),
            None => println!("  {} ({})", port.name, port.kind),
        }
    }

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli =
            Cli::try_parse_from(["smart_counter", "--port", "9090", "--device", "COM8"]).unwrap();
        assert_eq!(cli.port, 9090);
        assert_eq!(cli.device, "COM8");
    }

    #[test]
    fn test_default_values() {
        let cli = Cli::try_parse_from(["smart_counter"]).unwrap();
        assert_eq!(cli.port, DEFAULT_WEB_PORT);
        assert_eq!(cli.baud, DEFAULT_BAUD_RATE);
        assert_eq!(cli.device, DEFAULT_DEVICE_ADDRESS);
        assert_eq!(cli.host, "0.0.0.0");
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_configs_from_cli() {
        let cli = Cli::try_parse_from([
            "smart_counter",
            "--device",
            "/dev/ttyACM0",
            "-b",
            "115200",
            "--poll-interval-ms",
            "20",
            "--no-cors",
            "--host",
            "127.0.0.1",
            "-p",
            "8080",
            "serve",
        ])
        .unwrap();

        let device = device_config(&cli);
        assert_eq!(device.address, "/dev/ttyACM0");
        assert_eq!(device.baud_rate, 115200);
        assert_eq!(device.poll_interval, Duration::from_millis(20));

        let web = web_config(&cli);
        assert!(!web.enable_cors);
        assert_eq!(web.bind_address(), "127.0.0.1:8080");
        assert_eq!(web.device_label, "/dev/ttyACM0");
        assert!(matches!(cli.command, Some(Commands::Serve)));
    }
}
