use tracing_subscriber::EnvFilter;

use transferlogic_scanner::config::Config;
use transferlogic_scanner::indexer::client::connect_http;
use transferlogic_scanner::indexer::decoder::PayloadDecoder;
use transferlogic_scanner::indexer::driver::ScanDriver;
use transferlogic_scanner::indexer::selector::SelectorRegistry;
use transferlogic_scanner::output::TransferWriter;
use transferlogic_scanner::tokens::registry::build_known_tokens;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    color_eyre::install()?;

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    let config = Config::load(&config_path)?;

    // Structured logging goes to stderr; stdout carries the transfer lines
    // (set RUST_LOG=debug to see every chunk query)
    init_tracing(config.logging.json);

    tracing::info!(
        contract = %config.contract.address,
        lookback = config.scan.lookback,
        chunk_size = config.scan.chunk_size,
        "Configuration loaded from {}",
        config_path
    );

    let registry = SelectorRegistry::standard()?;
    tracing::info!(selectors = registry.len(), "Selector registry built");

    let known_tokens = build_known_tokens(&config.tokens);
    let decoder = PayloadDecoder::new(registry, config.native_asset())
        .with_tokens(known_tokens, config.default_token_decimals);

    let client = connect_http(&config.node.rpc_http)?;
    let driver = ScanDriver::new(client, decoder, config.scan_settings()?);

    let stdout = std::io::stdout();
    let mut writer = TransferWriter::new(config.output.format, stdout.lock());

    let report = tokio::select! {
        result = driver.run(|transfer| writer.write(&transfer)) => result?,
        _ = tokio::signal::ctrl_c() => {
            return Err(eyre::eyre!("Interrupted before the scan completed"));
        }
    };

    writer.finish()?;

    tracing::info!(
        facts = report.facts,
        records = report.records,
        chunks = report.chunks,
        "Scanner finished"
    );
    Ok(())
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}
