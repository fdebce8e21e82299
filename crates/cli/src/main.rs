use clap::Parser;
use ferrous_lookup_domain::{CliOverrides, DnsClass, Question, RecordType};
use ferrous_lookup_infrastructure::dns::LookupClient;
use std::net::IpAddr;
use std::process::ExitCode;
use tracing::{debug, error};

mod bootstrap;

#[derive(Parser)]
#[command(name = "ferrous-lookup")]
#[command(version)]
#[command(about = "Ferrous Lookup - DNS lookup client with caching and TCP fallback")]
struct Cli {
    /// Name to resolve, or an IP address with -x
    name: String,

    /// Record type (A, AAAA, MX, TXT, ...)
    #[arg(default_value = "A")]
    record_type: String,

    /// Query class
    #[arg(default_value = "IN")]
    class: String,

    /// Reverse lookup of an IP address
    #[arg(short = 'x', long)]
    reverse: bool,

    /// Name server address, repeatable (IP or IP:port)
    #[arg(short = 's', long = "server", value_name = "ADDR")]
    servers: Vec<String>,

    /// Query over TCP only
    #[arg(long)]
    tcp: bool,

    /// Disable the response cache
    #[arg(long)]
    no_cache: bool,

    /// Retries per server after the first try
    #[arg(long)]
    retries: Option<u32>,

    /// Per-attempt timeout in milliseconds
    #[arg(long)]
    timeout_ms: Option<u64>,

    /// Clear the recursion-desired bit
    #[arg(long)]
    no_recurse: bool,

    /// Set the DNSSEC OK bit
    #[arg(long)]
    dnssec: bool,

    /// Print the audit trail of the lookup
    #[arg(long)]
    audit: bool,

    /// Configuration file path
    #[arg(short = 'c', long, value_name = "FILE")]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,
}

impl Cli {
    fn overrides(&self) -> CliOverrides {
        CliOverrides {
            name_servers: self.servers.clone(),
            retries: self.retries,
            timeout_ms: self.timeout_ms,
            use_tcp_only: self.tcp,
            no_cache: self.no_cache,
            no_recursion: self.no_recurse,
            request_dnssec_records: self.dnssec,
            enable_audit_trail: self.audit,
            log_level: self.log_level.clone(),
        }
    }

    fn question(&self) -> anyhow::Result<Question> {
        if self.reverse {
            let ip: IpAddr = self
                .name
                .parse()
                .map_err(|e| anyhow::anyhow!("invalid address '{}': {}", self.name, e))?;
            return Ok(Question::reverse(ip));
        }

        let record_type: RecordType = self.record_type.parse().map_err(anyhow::Error::msg)?;
        let class: DnsClass = self.class.parse().map_err(anyhow::Error::msg)?;
        Ok(Question::parse(&self.name, record_type, class)?)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "Lookup failed");
            eprintln!(";; {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = bootstrap::load_config(cli.config.as_deref(), cli.overrides())?;
    bootstrap::init_logging(&config.logging);

    let question = cli.question()?;
    let client = LookupClient::new(&config.lookup)?;
    debug!(question = %question, "Resolving");

    match client.query(&question).await {
        Ok(response) => {
            match response.audit_trail() {
                Some(trail) => print!("{}", trail),
                None => println!("{}", response.message()),
            }
            Ok(if response.has_error() {
                ExitCode::from(1)
            } else {
                ExitCode::SUCCESS
            })
        }
        Err(e) => {
            if let Some(trail) = e.audit_trail() {
                eprint!("{}", trail);
            }
            Err(e.into())
        }
    }
}
