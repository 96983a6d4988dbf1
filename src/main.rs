use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use hart_rs::util::{decode_hex, format_hex_compact, parse_byte};
use hart_rs::{
    init_logger, init_logger_with_level, log_info, BusConfig, FrameFormat, HartBus, HartMaster,
    ResponseStatus, UnitCode,
};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "hart-sim")]
#[command(about = "Simulated HART multidrop bus with a demo device fleet")]
struct Cli {
    /// JSON bus configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Turnaround delay in milliseconds, overriding the configuration
    #[arg(long, global = true)]
    delay_ms: Option<u64>,

    /// Log at debug level, including every frame on the wire
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every device on the bus
    Scan,
    /// Send one command and print the reply
    Send {
        #[arg(value_parser = parse_byte)]
        address: u8,
        #[arg(value_parser = parse_byte)]
        command: u8,
        /// Request data as hex
        #[arg(short, long, default_value = "")]
        data: String,
        /// Address the device by its unique identifier
        #[arg(short, long)]
        long: bool,
        #[arg(short, long)]
        preambles: Option<usize>,
    },
    /// Read the primary variable of every device
    Fleet,
}

fn load_config(cli: &Cli) -> anyhow::Result<BusConfig> {
    let mut config = match &cli.config {
        Some(path) => BusConfig::load(path)
            .with_context(|| format!("loading bus configuration from {}", path.display()))?,
        None => BusConfig::default(),
    };
    if let Some(delay_ms) = cli.delay_ms {
        config.delay_ms = delay_ms;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        init_logger_with_level(log::LevelFilter::Debug);
    } else {
        init_logger();
    }

    let config = load_config(&cli)?;
    let bus = Arc::new(HartBus::with_demo_fleet(config));
    let mut master = HartMaster::new(bus);

    match cli.command {
        Commands::Scan => {
            for device in master.scan().await {
                log_info(&format!(
                    "{:>2}  {}  {:<12} {}",
                    device.address,
                    device.unique_id_hex(),
                    device.model,
                    device.manufacturer
                ));
            }
        }
        Commands::Send {
            address,
            command,
            data,
            long,
            preambles,
        } => {
            let data = decode_hex(&data).context("parsing --data")?;
            if let Some(preambles) = preambles {
                master.set_preambles(preambles);
            }
            if long {
                master.set_frame_format(FrameFormat::Long);
                master.scan().await;
            }

            let request = master.build_request(address, command, &data)?;
            log_info(&format!("TX {}", format_hex_compact(&request)));
            let hint = long.then_some(address);
            let reply = master.transact(&request, hint).await;
            if reply.is_empty() {
                bail!("no device answered at polling address {address}");
            }
            log_info(&format!("RX {}", format_hex_compact(&reply)));

            let Some(parsed) = master.parse_response(&reply) else {
                bail!("reply could not be decoded");
            };
            let status = parsed
                .status()
                .and_then(|(s1, s2)| ResponseStatus::from_bytes(s1, s2))
                .map_or_else(|| "unknown".to_string(), |s| s.to_string());
            log_info(&format!("{}", parsed.frame));
            log_info(&format!(
                "status {status}, payload {}",
                format_hex_compact(&parsed.payload)
            ));
        }
        Commands::Fleet => {
            for device in master.scan().await {
                let Some(reply) = master.request(device.address, 1, &[]).await? else {
                    log_info(&format!("{:>2}  no reply", device.address));
                    continue;
                };
                let reading = match reply.payload.as_slice() {
                    [unit, a, b, c, d, ..] => {
                        let value = f32::from_be_bytes([*a, *b, *c, *d]);
                        let symbol = UnitCode::from_code(*unit).map_or("?", UnitCode::symbol);
                        format!("{value:.3} {symbol}")
                    }
                    _ => "malformed reply".to_string(),
                };
                log_info(&format!(
                    "{:>2}  {:<12} {}",
                    device.address, device.model, reading
                ));
            }
        }
    }

    Ok(())
}
