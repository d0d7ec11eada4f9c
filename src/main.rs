//! wispub command-line entry point

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::process;
use tokio::signal;
use tracing::{debug, error, info, warn};
use url::Url;
use wispub::cancel::CancelToken;
use wispub::commands::{publish, PreparedNotification};
use wispub::config::{
    client_id_for_center, BrokerOverrides, ConfigFile, DataRequest, MetadataRequest, RunOptions,
};
use wispub::error::{error_chain, PublishResult};
use wispub::notification::{metadata_topic, TemporalExtent};
use wispub::observability::{init_logging, LogSettings};

/// Config file picked up from the working directory when `--config` is absent
const DEFAULT_CONFIG_PATH: &str = "wispub.toml";

/// Publish WIS 2.0 notification messages to an MQTT broker
#[derive(Parser)]
#[command(name = "wispub")]
#[command(version)]
#[command(after_help = "Broker credentials are read from WISPUB_BROKER_USER and WISPUB_BROKER_PASSWD.")]
struct Cli {
    /// Configuration file path
    #[arg(long, value_name = "FILE", global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(long, global = true)]
    verbose: bool,

    /// Generate and print the message and topic, but don't send
    #[arg(long, global = true)]
    dryrun: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Publish a data notification message
    #[command(visible_aliases = ["d", "dat"])]
    Data(DataArgs),
    /// Publish a metadata notification message (WCMP2 record)
    #[command(visible_aliases = ["meta", "m"])]
    Metadata(MetadataArgs),
}

#[derive(Args)]
struct BrokerArgs {
    /// MQTT broker URL, tcp:// or ssl://; port defaults to 1883 for tcp and 8883 for ssl
    #[arg(long, value_name = "URL")]
    broker: Option<String>,

    /// PEM file with additional CA certificates to trust
    #[arg(long, value_name = "FILE")]
    ca_cert: Option<PathBuf>,

    /// If using TLS, don't verify the remote server certificate
    #[arg(long)]
    insecure: bool,
}

impl BrokerArgs {
    fn overrides(self, center: Option<&str>) -> BrokerOverrides {
        BrokerOverrides {
            url: self.broker,
            ca_cert: self.ca_cert,
            insecure: self.insecure.then_some(true),
            client_id: client_id_for_center(center),
            ..Default::default()
        }
    }
}

#[derive(Args)]
struct DataArgs {
    #[command(flatten)]
    broker: BrokerArgs,

    /// Topic to publish the message to
    #[arg(short, long)]
    topic: String,

    /// Publicly available URL where the data can be downloaded
    #[arg(short = 'u', long, value_name = "URL")]
    download_url: Url,

    /// Path to the file to announce
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Mime-type of the input; determined from the file extension when omitted
    #[arg(short, long)]
    mime_type: Option<String>,

    /// Previously registered metadata identifier for the data product
    #[arg(short = 'e', long = "meta-id", value_name = "ID")]
    meta_id: Option<String>,

    /// RFC 3339 timestamp, or comma separated start,end pair
    #[arg(short = 'D', long)]
    datetime: Option<String>,

    /// Value for properties.dataDomain; pass an empty value to omit it
    #[arg(short = 'd', long, default_value = "DBNet")]
    data_domain: String,

    /// WMO center identifier, used as the MQTT client id
    #[arg(short, long)]
    center: Option<String>,
}

impl DataArgs {
    fn into_request(self) -> PublishResult<(BrokerOverrides, DataRequest)> {
        let temporal = TemporalExtent::parse(self.datetime.as_deref().unwrap_or(""))?;
        let overrides = self.broker.overrides(self.center.as_deref());

        let request = DataRequest {
            input: self.input,
            topic: self.topic,
            download_url: self.download_url,
            mime_type: self.mime_type,
            metadata_id: self.meta_id,
            temporal,
            data_domain: Some(self.data_domain),
        };
        Ok((overrides, request))
    }
}

#[derive(Args)]
struct MetadataArgs {
    #[command(flatten)]
    broker: BrokerArgs,

    /// WMO center identifier used to generate the topic and client id
    #[arg(short, long)]
    center: String,

    /// Path to a JSON file containing a WCMP2 metadata record
    #[arg(short, long, value_name = "FILE")]
    input: PathBuf,

    /// Topic to use instead of origin/a/wis2/<center>/metadata/core/wcmp2
    #[arg(short, long)]
    topic: Option<String>,
}

impl MetadataArgs {
    fn into_request(self) -> (BrokerOverrides, MetadataRequest) {
        let topic = self.topic.unwrap_or_else(|| metadata_topic(&self.center));
        let overrides = self.broker.overrides(Some(&self.center));
        (
            overrides,
            MetadataRequest {
                input: self.input,
                topic,
            },
        )
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_logging(&LogSettings::from_env().with_verbose(cli.verbose));
    debug!("wispub v{}", env!("CARGO_PKG_VERSION"));

    let cancel = CancelToken::new();
    spawn_interrupt_listener(cancel.clone());

    if let Err(e) = run(cli, cancel).await {
        error!("{}", error_chain(&e));
        process::exit(1);
    }
}

fn spawn_interrupt_listener(cancel: CancelToken) {
    tokio::spawn(async move {
        match signal::ctrl_c().await {
            Ok(()) => {
                warn!("Received interrupt, cancelling");
                cancel.cancel();
            }
            Err(e) => error!("Failed to listen for interrupt: {}", e),
        }
    });
}

async fn run(cli: Cli, cancel: CancelToken) -> PublishResult<()> {
    let file_settings = load_configuration(cli.config.as_deref())?;
    let options = RunOptions {
        dry_run: cli.dryrun,
        verbose: cli.verbose,
    };

    let (overrides, prepared) = match cli.command {
        Commands::Data(args) => {
            let (overrides, request) = args.into_request()?;
            (overrides, PreparedNotification::data(&request)?)
        }
        Commands::Metadata(args) => {
            let (overrides, request) = args.into_request();
            (overrides, PreparedNotification::metadata(&request)?)
        }
    };

    if options.dry_run {
        return prepared.write_dry_run(&mut std::io::stdout().lock(), &mut std::io::stderr().lock());
    }

    let broker = overrides.or(file_settings.broker).resolve()?;
    let report = publish(&prepared, &broker, cancel, options).await?;
    if report.accepted() {
        info!(topic = %report.topic, "Notification published");
    } else {
        warn!(
            topic = %report.topic,
            code = report.ack.code,
            reason = report.reason,
            "Notification sent but not accepted by broker"
        );
    }
    Ok(())
}

fn load_configuration(config_path: Option<&Path>) -> PublishResult<ConfigFile> {
    match config_path {
        Some(path) => {
            info!("Loading configuration from: {}", path.display());
            Ok(ConfigFile::load_from_file(path)?)
        }
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                info!("Loading configuration from: {}", default_path.display());
                Ok(ConfigFile::load_from_file(default_path)?)
            } else {
                Ok(ConfigFile::default())
            }
        }
    }
}
