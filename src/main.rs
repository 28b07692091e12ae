//! Jobhound composition root
//!
//! Wires the configuration, proxy rotation, stealth layer, and adapter
//! registry together, runs one search from the command line, and prints
//! the result as JSON.

use anyhow::Result;
use jobhound::{
    adapters::{AdapterContext, AdapterLoader},
    config,
    network::{HttpClient, RetryPolicy},
    proxy::{HttpProber, ProxyRotator},
    search::{SearchManager, SearchRequest},
    stealth::SessionManager,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    info!("Starting jobhound v{}", jobhound::VERSION);

    let mut args = std::env::args().skip(1);
    let keyword = match args.next() {
        Some(arg) if arg != "-h" && arg != "--help" => arg,
        _ => {
            print_usage();
            return Ok(());
        }
    };
    let location = args.next().unwrap_or_default();
    let limit = args.next().and_then(|a| a.parse().ok());

    // Load configuration
    let settings = config::load()?;
    info!(
        "Loaded configuration for instance: {}",
        settings.general.instance_name
    );

    // Shared services
    let http = HttpClient::with_settings(&settings.outgoing)?;
    let proxies = Arc::new(ProxyRotator::new(
        settings.proxy.clone(),
        settings.outgoing.clone(),
    ));
    let sessions = Arc::new(SessionManager::new(&settings.stealth));
    info!(
        "Proxy pool: {} endpoints ({} active)",
        proxies.len(),
        proxies.active_count()
    );

    // Scheduled health re-checks for quarantined endpoints
    if !proxies.is_empty() {
        let pool = proxies.clone();
        let prober = HttpProber::new(settings.proxy.probe_url.clone(), settings.outgoing.clone());
        let every = Duration::from_secs(settings.proxy.recheck_after_secs.max(30));
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let readmitted = pool.run_health_checks(&prober).await;
                if readmitted > 0 {
                    info!("Re-admitted {} proxy endpoints", readmitted);
                }
            }
        });
    }

    // Load adapters
    let ctx = AdapterContext {
        http,
        proxies,
        sessions,
        stealth: settings.stealth.clone(),
        retry: RetryPolicy::from_settings(&settings.search),
    };
    let registry = Arc::new(AdapterLoader::load(&settings, ctx).await?);
    info!("Loaded {} adapters", registry.len());

    // Execute the search
    let manager = SearchManager::new(registry.clone(), &settings);
    let mut request = SearchRequest::new(keyword, location);
    if let Some(limit) = limit {
        request = request.with_limit(limit);
    }

    let result = manager.execute_search(&request).await;
    info!(
        "Search finished: {} records from {} adapters in {}ms",
        result.jobs.len(),
        result.outcomes.len(),
        result.duration_ms
    );

    println!("{}", serde_json::to_string_pretty(&result)?);

    // Adapter health summary for operators
    for status in registry.statuses() {
        info!(
            "adapter {}: {} ({} ok / {} failed)",
            status.name,
            status.state.as_str(),
            status.total_successes,
            status.total_failures
        );
    }

    registry.shutdown_all().await;

    Ok(())
}

/// Print usage information
fn print_usage() {
    println!(
        r#"
jobhound v{}
A stealth-capable job posting metasearch engine written in Rust

USAGE:
    jobhound <KEYWORD> [LOCATION] [LIMIT]

EXAMPLES:
    jobhound "rust engineer"
    jobhound "backend" "berlin" 20

ENVIRONMENT VARIABLES:
    JOBHOUND_SETTINGS_PATH      Path to settings.yml
    JOBHOUND_DEBUG              Enable debug mode (true/false)
    JOBHOUND_MAX_CONCURRENCY    Maximum adapters searching at once
    JOBHOUND_PROXY_STRATEGY     round_robin | random | quality_ranked | geographic
"#,
        jobhound::VERSION
    );
}
