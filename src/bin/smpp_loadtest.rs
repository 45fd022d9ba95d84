// ABOUTME: Command line load generator: binds as a transceiver and submits messages at a fixed rate
// ABOUTME: Asks for confirmation first unless -y is given; Ctrl-C stops submission at the next tick

use argh::FromArgs;
use smpp_loadtest::client::TcpConnector;
use smpp_loadtest::config::{SendConfig, SessionConfig};
use smpp_loadtest::encoding::Encoding;
use smpp_loadtest::runner;
use std::error::Error;
use std::io::{self, BufRead, Write};
use std::process::ExitCode;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{Level, debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Send SMPP traffic at a fixed rate and report what comes back
#[derive(FromArgs)]
struct CliArgs {
    /// messages per second (default: 50)
    #[argh(option, short = 's', default = "50")]
    speed: i64,

    /// the hostname or IP address of the SMSC (default: localhost)
    #[argh(option, short = 'H', default = "String::from(\"localhost\")")]
    host: String,

    /// the port to use when connecting to the SMSC (default: 2775)
    #[argh(option, short = 'P', default = "2775")]
    port: u16,

    /// the system id
    #[argh(option, short = 'u')]
    system_id: String,

    /// the password
    #[argh(option, short = 'p')]
    password: String,

    /// do not ask for confirmation before sending
    #[argh(switch, short = 'y')]
    skip_confirm: bool,

    /// message text (default: load-test)
    #[argh(option, short = 't', default = "String::from(\"load-test\")")]
    text: String,

    /// ucs2, gsm7bit, gsm7bit_packed, latin1, ascii, cyrillic, hebrew,
    /// binary8bit1 or binary8bit2 (default: ucs2)
    #[argh(option, short = 'e', default = "String::from(\"ucs2\")")]
    encoding: String,

    /// stop after this many messages, zero or less for no limit (default: -1)
    #[argh(option, short = 'm', default = "-1")]
    max_count: i64,

    /// seconds to wait for deliver_sm after sending (default: 10)
    #[argh(option, short = 'w', default = "10")]
    wait_deliver_sm: u64,

    /// source address (default: test)
    #[argh(option, short = 'F', default = "String::from(\"test\")")]
    from: String,

    /// destination address (default: test)
    #[argh(option, short = 'T', default = "String::from(\"test\")")]
    to: String,

    /// validity period in seconds from now (default: 60)
    #[argh(option, default = "60")]
    ttl: u32,

    /// split long text into concatenated segments
    #[argh(switch, short = 'c')]
    multi_segment: bool,

    /// enable debug logging
    #[argh(switch, short = 'd')]
    debug: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli_args: CliArgs = argh::from_env();

    let subscriber = FmtSubscriber::builder()
        .with_max_level(if cli_args.debug { Level::DEBUG } else { Level::INFO })
        .finish();

    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    match run(cli_args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli_args: CliArgs) -> Result<(), Box<dyn Error>> {
    let encoding = Encoding::select(&cli_args.encoding);
    if !encoding.name().eq_ignore_ascii_case(cli_args.encoding.trim()) {
        debug!(
            requested = %cli_args.encoding,
            "unknown encoding, using {encoding}"
        );
    }

    let send_config = SendConfig::builder()
        .rate(cli_args.speed)
        .source(cli_args.from)
        .destination(cli_args.to)
        .text(cli_args.text)
        .encoding(encoding)
        .ttl_secs(cli_args.ttl)
        .multi_segment(cli_args.multi_segment)
        .max_count(cli_args.max_count)
        .drain(Duration::from_secs(cli_args.wait_deliver_sm))
        .build()?;

    let session_config = SessionConfig::new(
        cli_args.host,
        cli_args.port,
        cli_args.system_id,
        cli_args.password,
    );
    info!("{}", session_config.addr());

    if !cli_args.skip_confirm && !ask_for_confirmation("Do you really want to send smpp traffic?")? {
        println!("Exiting...");
        return Err("not confirmed".into());
    }

    let (stop, shutdown) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupted, finishing current message (Ctrl-C again to quit)");
            stop.send_replace(true);
        }
        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(130);
        }
    });

    let connector = TcpConnector::new(session_config);
    let stats = runner::run(&connector, send_config, shutdown).await?;
    println!("{stats}");
    Ok(())
}

/// Ask until the answer is yes or no. End of input counts as no.
fn ask_for_confirmation(question: &str) -> io::Result<bool> {
    let stdin = io::stdin();
    let mut input = stdin.lock();
    loop {
        print!("{question} [y/n]: ");
        io::stdout().flush()?;

        let mut answer = String::new();
        if input.read_line(&mut answer)? == 0 {
            return Ok(false);
        }
        match answer.trim().to_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => {}
        }
    }
}
