//! Si7006 Control Tool
//!
//! Probes the sensor on an I2C bus and reads its attributes directly.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use si7006_hw::hwmon::{self, AttributeFile};
use si7006_hw::{HwmonChip, Quantity, Si7006};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "si7006ctl")]
#[command(about = "Probe and read the Si7006 humidity/temperature sensor")]
#[command(version)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// I2C bus device node
    #[arg(long, default_value = si7006_hw::DEFAULT_BUS)]
    bus: String,

    /// 7-bit I2C address (decimal or 0x-prefixed hex)
    #[arg(long, default_value = "0x40", value_parser = parse_address)]
    address: u8,

    /// Staleness window in milliseconds
    #[arg(long, default_value = "1000")]
    refresh: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the chip and list its attribute files
    Info,
    /// Read one or more attribute files (e.g., temp1_input humidity1_label)
    Read {
        /// Attribute file names
        #[arg(required = true)]
        files: Vec<String>,
    },
    /// Read every attribute file
    Dump {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show one quantity with its extrema (temperature/temp, humidity/rh)
    Show {
        /// Quantity to sample
        quantity: Quantity,
    },
}

fn parse_address(s: &str) -> std::result::Result<u8, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => s.parse(),
    };
    let address = parsed.map_err(|e| format!("invalid address '{}': {}", s, e))?;
    if address > 0x7F {
        return Err(format!("address {:#04x} is not a 7-bit address", address));
    }
    Ok(address)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let device = Si7006::open(
        si7006_hw::DEFAULT_NAME,
        &cli.bus,
        cli.address,
        Duration::from_millis(cli.refresh),
    )
    .with_context(|| format!("Failed to attach Si7006 at {}:{:#04x}", cli.bus, cli.address))?;

    match cli.command {
        Commands::Info => {
            println!("Chip: {}", HwmonChip::name(&device));
            println!("Bus: {}", cli.bus);
            println!("Address: {:#04x}", cli.address);
            println!("Refresh: {:?}", device.sampler().refresh_interval());
            println!("Attributes:");
            for file in hwmon::attribute_files(&device) {
                println!("  {}", file);
            }
        }
        Commands::Read { files } => {
            for name in files {
                let file: AttributeFile = name.parse()?;
                let value = hwmon::read_file(&device, &file)
                    .with_context(|| format!("Failed to read {}", name))?;
                println!("{}", value);
            }
        }
        Commands::Dump { json } => {
            let readings: Vec<(String, String)> = hwmon::attribute_files(&device)
                .into_iter()
                .map(|file| {
                    let value = match hwmon::read_file(&device, &file) {
                        Ok(value) => value,
                        Err(e) => format!("error: {}", e),
                    };
                    (file.to_string(), value)
                })
                .collect();

            if json {
                let map: serde_json::Map<String, serde_json::Value> = readings
                    .into_iter()
                    .map(|(file, value)| (file, serde_json::Value::String(value)))
                    .collect();
                println!("{}", serde_json::to_string_pretty(&map)?);
            } else {
                for (file, value) in readings {
                    println!("{}: {}", file, value);
                }
            }
        }
        Commands::Show { quantity } => {
            let sampler = device.sampler();
            let current = sampler
                .current(quantity)
                .with_context(|| format!("Failed to read {}", quantity))?;
            println!("{} ({}): {}", quantity, quantity.label(), current);
            println!("Min: {}", sampler.min(quantity)?);
            println!("Max: {}", sampler.max(quantity)?);
            if let Some(at) = sampler.snapshot().measurement(quantity).last_updated() {
                println!("Sampled: {:?} ago", at.elapsed());
            }
        }
    }

    Ok(())
}
