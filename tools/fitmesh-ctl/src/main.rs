// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! fitmesh runtime file tool
//!
//! # Usage
//!
//! ```bash
//! # Write an example runtime file
//! fitmesh-ctl gen-config --output fitmesh.toml
//!
//! # Check a runtime file
//! fitmesh-ctl validate --config fitmesh.toml
//!
//! # Show where a call would go (no invocation)
//! fitmesh-ctl resolve --config fitmesh.toml --generic orderSvc
//! fitmesh-ctl resolve --config fitmesh.toml --generic orderSvc --alias fast --worker worker-2
//! ```

use clap::{Parser, Subcommand};
use fitmesh::config::{
    AddressEntry, InvokeSettings, TraceSettings, TrustSettings, WorkerSettings,
};
use fitmesh::{
    Broker, CallContext, FormatterRegistry, GenericableSettings, InMemoryDiscovery,
    InvokerFactory, Route, RuntimeFile, StaticConfigProvider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// fitmesh runtime file tool
#[derive(Parser, Debug)]
#[command(name = "fitmesh-ctl")]
#[command(about = "Generate, validate and dry-run fitmesh runtime files")]
#[command(version)]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Generate example runtime file
    GenConfig {
        /// Output file path
        #[arg(short, long, default_value = "fitmesh.toml")]
        output: PathBuf,
    },

    /// Validate a runtime file
    Validate {
        /// Runtime file path
        #[arg(short, long)]
        config: PathBuf,
    },

    /// Resolve the fitable and endpoint a call would use
    Resolve {
        /// Runtime file path
        #[arg(short, long)]
        config: PathBuf,

        /// Generic service id
        #[arg(short, long)]
        generic: String,

        /// Generic service version
        #[arg(long, default_value = "1.0.0")]
        generic_version: String,

        /// Explicit fitable id
        #[arg(long, conflicts_with_all = ["alias", "random"])]
        fitable: Option<String>,

        /// Fitable alias
        #[arg(long, conflicts_with = "random")]
        alias: Option<String>,

        /// Random pick among the configured fitables
        #[arg(long)]
        random: bool,

        /// Pin to a worker id
        #[arg(short, long)]
        worker: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Initialize logging (library `log` records are bridged by tracing-subscriber)
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match args.command {
        Commands::GenConfig { output } => cmd_gen_config(&output),
        Commands::Validate { config } => cmd_validate(&config),
        Commands::Resolve {
            config,
            generic,
            generic_version,
            fitable,
            alias,
            random,
            worker,
        } => {
            let route = route_from_args(fitable, alias, random);
            cmd_resolve(&config, &generic, &generic_version, &route, worker)
        }
    }
}

fn route_from_args(fitable: Option<String>, alias: Option<String>, random: bool) -> Route {
    match (fitable, alias) {
        (Some(id), _) => Route::Fitable(id),
        (None, Some(alias)) => Route::Alias(alias),
        (None, None) if random => Route::Random,
        (None, None) => Route::Default,
    }
}

fn example_runtime() -> RuntimeFile {
    let mut orders = GenericableSettings::new("orderSvc")
        .with_default("impl-A")
        .with_degradation("impl-A", "impl-B")
        .with_alias("fast", "impl-B")
        .with_trust(TrustSettings {
            enabled: true,
            validate: "order-validate".into(),
            before: String::new(),
            after: "order-audit".into(),
            error: "order-audit".into(),
        });
    orders.fitables = vec!["impl-A".into(), "impl-B".into()];

    let address = |fitable: &str, worker: &str, host: &str, port| AddressEntry {
        generic_id: "orderSvc".into(),
        generic_version: "1.0.0".into(),
        fitable_id: fitable.into(),
        application: "orders".into(),
        worker_id: worker.into(),
        environment: String::new(),
        host: host.into(),
        port,
        protocol: 0,
        formats: vec![0],
    };

    RuntimeFile {
        worker: WorkerSettings {
            worker_id: "worker-1".into(),
            application: "orders".into(),
            application_version: "1.0.0".into(),
            host: Some("127.0.0.1".into()),
            port: 8001,
            ..Default::default()
        },
        trace: TraceSettings {
            local: true,
            global: false,
        },
        invoke: InvokeSettings {
            timeout_ms: 3000,
            retry: 2,
        },
        genericables: vec![orders],
        addresses: vec![
            address("impl-A", "worker-2", "10.0.0.2", 8002),
            address("impl-A", "worker-3", "10.0.0.3", 8003),
            address("impl-B", "worker-2", "10.0.0.2", 8002),
        ],
    }
}

fn cmd_gen_config(output: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let toml_str = example_runtime().to_toml()?;

    // Add comments
    let content = format!(
        r#"# fitmesh runtime configuration
# Generated by fitmesh-ctl gen-config

{}
"#,
        toml_str
    );

    std::fs::write(output, content)?;
    println!("Generated configuration file: {}", output.display());
    Ok(())
}

fn cmd_validate(config_path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    match RuntimeFile::from_file(config_path) {
        Ok(file) => {
            println!("Configuration valid!");
            println!();
            println!(
                "Worker: {} ({}) port {}",
                file.worker.worker_id,
                if file.worker.application.is_empty() {
                    "-"
                } else {
                    file.worker.application.as_str()
                },
                file.worker.port
            );
            println!(
                "Invoke defaults: timeout {}ms, retry {}",
                file.invoke.timeout_ms, file.invoke.retry
            );
            println!("Genericables: {}", file.genericables.len());
            for generic in &file.genericables {
                println!(
                    "  {} default='{}' trust={} degradation={}",
                    generic.generic_id,
                    generic.default_fitable,
                    generic.trust.enabled,
                    generic.degradation.len()
                );
            }
            println!("Addresses: {}", file.addresses.len());
            Ok(())
        }
        Err(e) => {
            eprintln!("Configuration invalid: {}", e);
            Err(e.into())
        }
    }
}

fn cmd_resolve(
    config_path: &Path,
    generic_id: &str,
    generic_version: &str,
    route: &Route,
    worker: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    let file = RuntimeFile::from_file(config_path)?;
    let broker = broker_for(&file);

    let mut ctx = CallContext::new();
    ctx.target_worker = worker;

    let (coordinate, endpoint) = broker.resolve(generic_id, generic_version, route, &ctx)?;
    println!("Route: {} -> {}", route, coordinate);
    match endpoint {
        Some(endpoint) => {
            let location = if broker.factory().local_endpoint().is_local(&endpoint) {
                "local"
            } else {
                "remote"
            };
            println!("Endpoint: {} [{}]", endpoint, location);
        }
        None => println!("Endpoint: none (call would fail NOT_FOUND)"),
    }
    Ok(())
}

/// Broker over the file's worker, policies and static address table.
fn broker_for(file: &RuntimeFile) -> Broker {
    let discovery = Arc::new(InMemoryDiscovery::new());
    for entry in &file.addresses {
        discovery.add_address(&entry.fitable(), entry.to_flat());
    }
    tracing::debug!("Seeded {} static addresses", file.addresses.len());

    let factory = InvokerFactory::new(
        file.worker.clone(),
        discovery,
        Arc::new(FormatterRegistry::new()),
    )
    .with_trace(file.trace);
    Broker::new(
        Arc::new(factory),
        Arc::new(StaticConfigProvider::from_runtime(file)),
    )
    .with_defaults(file.invoke)
}
