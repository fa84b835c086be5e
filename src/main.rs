use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use failover_counter::{
    DispatchOutcome, FailoverClientConfig, FailoverOptions, LogicalRequest, ReplicaAddress, ReplicaConfig,
    ReplicaExit, ReplicaOptions, RunReport,
};
use slog::Drain;
use std::error::Error;
use std::fs::OpenOptions;
use std::io;
use std::net::{IpAddr, SocketAddr};
use std::path::{Path, PathBuf};
use tokio::time::Duration;

#[derive(Parser)]
#[command(name = "failover-counter", about = "Counter replicas and a failover client to query them")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve a counter on one port, crashing at random.
    Replica(ReplicaArgs),
    /// Fetch counter values from a list of replicas with retry and failover.
    Client(ClientArgs),
}

#[derive(Args)]
struct ReplicaArgs {
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,
    #[arg(long)]
    port: u16,
    #[arg(long)]
    replica_id: String,
    #[arg(long, default_value_t = 0.3)]
    crash_probability: f64,
    /// Write logs to a timestamped file in this directory instead of the terminal.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[derive(Args)]
struct ClientArgs {
    /// Replica address as host:port. Repeat to list several; order is the failover order.
    #[arg(long = "replica", default_values = ["127.0.0.1:5000", "127.0.0.1:5001", "127.0.0.1:5002"])]
    replicas: Vec<ReplicaAddress>,
    #[arg(long, default_value_t = 50)]
    requests: u64,
    #[arg(long, default_value_t = 10)]
    max_in_flight: usize,
    /// Issue requests one at a time instead of concurrently.
    #[arg(long)]
    sequential: bool,
    #[arg(long, default_value_t = 500)]
    timeout_ms: u64,
    #[arg(long, default_value_t = 3)]
    max_rounds: u32,
    #[arg(long, default_value_t = 200)]
    inter_round_delay_ms: u64,
    #[arg(long, default_value_t = 0)]
    request_interval_ms: u64,
    #[arg(long, default_value = failover_counter::GET_COUNTER)]
    command: String,
    /// Write logs to a timestamped file in this directory instead of the terminal.
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Replica(args) => run_replica(args).await,
        Command::Client(args) => run_client(args).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(2);
    }
}

async fn run_replica(args: ReplicaArgs) -> Result<(), Box<dyn Error>> {
    let (drain, guard) = build_drain(args.log_dir.as_deref(), &format!("replica_{}", args.replica_id))?;
    let logger = slog::Logger::root(drain.ignore_res(), slog::o!());

    let server = failover_counter::try_create_replica(ReplicaConfig {
        replica_id: args.replica_id,
        bind_addr: SocketAddr::new(args.host, args.port),
        info_logger: logger.clone(),
        options: ReplicaOptions {
            crash_probability: Some(args.crash_probability),
        },
    })
    .await?;

    let (shutdown_handle, shutdown_signal) = failover_counter::shutdown_signal();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        shutdown_handle.shutdown();
    });

    let exit = server.run(shutdown_signal).await;
    drop(logger);
    drop(guard);

    if exit == ReplicaExit::Crashed {
        // Process-level fault: no cleanup, no goodbye.
        std::process::exit(1);
    }

    Ok(())
}

async fn run_client(args: ClientArgs) -> Result<(), Box<dyn Error>> {
    let (drain, guard) = build_drain(args.log_dir.as_deref(), "client")?;
    let logger = slog::Logger::root(drain.ignore_res(), slog::o!("component" => "client"));

    let requests = build_requests(args.requests, &args.command);
    let client = failover_counter::try_create_failover_client(FailoverClientConfig {
        replicas: args.replicas,
        info_logger: logger.clone(),
        options: FailoverOptions {
            attempt_timeout: Some(Duration::from_millis(args.timeout_ms)),
            max_rounds: Some(args.max_rounds),
            inter_round_delay: Some(Duration::from_millis(args.inter_round_delay_ms)),
            max_in_flight: Some(args.max_in_flight),
            request_interval: Some(Duration::from_millis(args.request_interval_ms)),
        },
    })?;

    let report = if args.sequential {
        client.run_sequential(requests).await
    } else {
        client.run_all(requests).await
    };

    drop(client);
    drop(logger);
    drop(guard);

    print_report(&report);
    Ok(())
}

fn build_requests(count: u64, command: &str) -> Vec<LogicalRequest> {
    (1..=count).map(|id| LogicalRequest::new(id, command)).collect()
}

fn print_report(report: &RunReport) {
    for request in &report.requests {
        match &request.outcome {
            Ok(DispatchOutcome::Success { reply, served_by }) => {
                println!("Request {} served by {} with reply \"{}\"", request.request_id, served_by, reply);
            }
            Ok(DispatchOutcome::Exhausted {
                total_attempts,
                last_error,
            }) => {
                println!(
                    "Request {} failed: all replicas failed after {} attempts. Last error: {}",
                    request.request_id, total_attempts, last_error
                );
            }
            Err(aborted) => println!("Request {} failed: {}", request.request_id, aborted),
        }
    }

    let rule = "=".repeat(50);
    println!();
    println!("{}", rule);
    println!("PER-REPLICA STATISTICS");
    println!("{}", rule);
    for tally in &report.replica_stats {
        println!("Replica {} served {} successful requests", tally.replica, tally.successes);
    }
    println!();
    println!("Total succeeded: {}, Total failed: {}", report.succeeded, report.failed);
    println!("{}", rule);
}

fn build_drain(log_dir: Option<&Path>, file_stem: &str) -> io::Result<(slog_async::Async, slog_async::AsyncGuard)> {
    match log_dir {
        Some(dir) => {
            let now = Utc::now().format("%Y-%m-%dT%H:%M:%SZ");
            let log_path = dir.join(format!("{}_{}.log", file_stem, now));
            let file = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(log_path)?;

            let decorator = slog_term::PlainDecorator::new(file);
            let drain = slog_term::FullFormat::new(decorator).build().fuse();
            Ok(slog_async::Async::new(drain).build_with_guard())
        }
        None => {
            let decorator = slog_term::TermDecorator::new().build();
            let drain = slog_term::FullFormat::new(decorator).use_file_location().build().fuse();
            Ok(slog_async::Async::new(drain).build_with_guard())
        }
    }
}
