use clap::{Parser, Subcommand};
use imgpress::compress::compress_to_target;
use imgpress::imaging::RustBackend;
use imgpress::naming::{Operation, derived_name};
use imgpress::{config, output, server, telemetry};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "imgpress")]
#[command(about = "Image upload and compression service")]
#[command(long_about = "\
Image upload and compression service

Runs an HTTP API that stores uploaded images and resizes, rotates, crops
or compresses them. Compression can target a file size: quality steps down
from 90 by 5 and dimensions shrink by 10% per pass until the result fits
or quality 5 is reached.

API (under /api/images):
  POST upload              multipart field `image`
  GET  download/{filename} returns the file, then deletes it
  POST resize              {filename, width, height}
  POST compress            {filename, targetSizeKB} or {filename, quality}
  POST rotate              {filename, angle}
  POST crop                {filename, width, height, left, top}

Run 'imgpress gen-config' to generate a documented imgpress.toml.")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP service
    Serve {
        /// Config file (missing file means defaults)
        #[arg(long, default_value = "imgpress.toml")]
        config: PathBuf,

        /// Listen address (overrides config)
        #[arg(long)]
        host: Option<String>,

        /// Listen port (overrides config)
        #[arg(long)]
        port: Option<u16>,

        /// Upload directory (overrides config)
        #[arg(long)]
        upload_dir: Option<PathBuf>,
    },
    /// Compress a single file to a target size
    Compress {
        /// Image to compress
        input: PathBuf,

        /// Size budget in kilobytes
        #[arg(long, allow_negative_numbers = true)]
        target_kb: i64,

        /// Output path (default: compressed-<name> next to the input)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Config file for compression tuning
        #[arg(long, default_value = "imgpress.toml")]
        config: PathBuf,
    },
    /// Print a stock imgpress.toml with all options documented
    GenConfig,
}

fn default_output(input: &Path) -> PathBuf {
    let name = input
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    input.with_file_name(derived_name(Operation::Compress, &name))
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Command::Serve {
            config: config_path,
            host,
            port,
            upload_dir,
        } => {
            telemetry::init_tracing("info")?;
            let mut service_config = config::load_config(&config_path)?;
            if let Some(host) = host {
                service_config.server.host = host;
            }
            if let Some(port) = port {
                service_config.server.port = port;
            }
            if let Some(dir) = upload_dir {
                service_config.storage.upload_dir = dir;
            }
            service_config.validate()?;

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(&service_config))?;
        }
        Command::Compress {
            input,
            target_kb,
            output: output_path,
            config: config_path,
        } => {
            telemetry::init_tracing("warn")?;
            let service_config = config::load_config(&config_path)?;
            let source = std::fs::read(&input)?;
            let result = compress_to_target(
                &RustBackend::new(),
                &source,
                target_kb,
                &service_config.compression,
            )?;
            let output_path = output_path.unwrap_or_else(|| default_output(&input));
            std::fs::write(&output_path, &result.bytes)?;
            output::print_compression_report(&result, target_kb as u64, &output_path);
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
