use async_trait::async_trait;
use clap::Parser;
use lora_geoloc::buffer::InMemoryBufferStore;
use lora_geoloc::facade::{CorrelationContext, EventSink, GeolocationIntegration, Vars};
use lora_geoloc::model::{AntennaLocation, DeviceId, LocationEvent, UplinkEvent, UplinkReception};
use lora_geoloc::resolver::HttpResolverClient;
use lora_geoloc::Config;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Demo harness for the geolocation integration: loads a config, wires
/// an in-memory buffer and an HTTP resolver client, and runs one
/// synthetic uplink through the facade so the wiring can be exercised
/// by hand against a real or test-double resolver.
#[derive(Parser)]
#[command(name = "lora-geoloc")]
#[command(about = "LoRaWAN egress geolocation integration")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the resolver base URL (the HTTP test seam from spec.md §9)
    #[arg(long)]
    base_url: Option<String>,
}

struct LoggingSink;

#[async_trait]
impl EventSink for LoggingSink {
    async fn handle_location_event(
        &self,
        _ctx: &CorrelationContext,
        _vars: &Vars,
        event: LocationEvent,
    ) -> anyhow::Result<()> {
        info!(
            device = %event.dev_eui,
            source = ?event.location.source,
            lat = event.location.latitude,
            lon = event.location.longitude,
            "resolved location"
        );
        Ok(())
    }
}

fn demo_uplink() -> UplinkEvent {
    let reception = |id: u8, ts: u64| UplinkReception {
        gateway_id: [id; 8],
        uplink_id: vec![id],
        rssi: id as i32,
        snr: id as f64 + 0.1,
        antenna_location: AntennaLocation {
            latitude: 1.111,
            longitude: 2.222,
            altitude: 3.333,
        },
        fine_timestamp: Some(ts),
    };

    UplinkEvent {
        application_id: 1,
        application_name: "test-app".to_string(),
        device_name: "test-device".to_string(),
        dev_eui: DeviceId([1, 2, 3, 4, 5, 6, 7, 8]),
        f_cnt: 1,
        rx_info: vec![reception(1, 111), reception(2, 222), reception(3, 333)],
        object_json: String::new(),
        tags: Default::default(),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(&cli.config).unwrap_or_else(|e| {
        eprintln!("warning: failed to load config from {:?}: {}", cli.config, e);
        eprintln!("using default configuration");
        Config::default()
    });

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    if let Some(base_url) = cli.base_url {
        config.geolocation_server = base_url;
    }

    info!("lora-geoloc v{}", env!("CARGO_PKG_VERSION"));
    info!(enabled = config.geolocation, server = %config.geolocation_server, "geolocation integration configured");

    let buffer = Arc::new(InMemoryBufferStore::new());
    let resolver = Arc::new(HttpResolverClient::new(
        config.geolocation_server.clone(),
        config.geolocation_token.clone(),
    ));
    let integration = GeolocationIntegration::new(config, buffer, resolver);
    let sink = LoggingSink;

    integration
        .handle_uplink_event(
            &CorrelationContext::new(),
            &sink,
            &Vars::new(),
            demo_uplink(),
        )
        .await?;

    integration.close().await?;
    Ok(())
}
