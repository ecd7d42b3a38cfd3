//! Beeconnect CLI - inspect chains and the persisted session
//!
//!   beeconnect chains [--chains <file>]   → Chain registry as JSON
//!   beeconnect session [--app <name>]     → Persisted {account, chainId}
//!   beeconnect forget [--app <name>]      → Clear the persisted session
//!   beeconnect demo [--app <name>]        → Scripted session against an in-memory wallet
//!
//! Output format:
//!   --json     Output raw JSON (default for non-tty)
//!   --pretty   Pretty-print JSON (default for tty)

use anyhow::{Context, Result};
use beeconnect::logging::init_logging;
use beeconnect::store::SessionPersistence;
use beeconnect::{
    ChainRegistry, FileStore, MemoryProvider, MemoryStore, SessionConfig, SessionStore,
    TokioScheduler, WalletSession,
};
use serde_json::{json, Value};
use std::env;
use std::io::IsTerminal;
use std::rc::Rc;
use tracing::{debug, info};

const DEFAULT_APP: &str = "beeconnect";
const DEMO_ALICE: &str = "0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed";
const DEMO_BOB: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";

fn main() {
    init_logging();

    let args: Vec<String> = env::args().collect();
    let opts = ParsedArgs::parse(&args[1..]);

    if opts.help {
        print_usage();
        return;
    }

    if opts.version {
        println!("beeconnect {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    let result = match opts.command.as_deref() {
        Some("chains") => cmd_chains(&opts),
        Some("session") => cmd_session(&opts),
        Some("forget") => cmd_forget(&opts),
        Some("demo") => cmd_demo(&opts),
        Some(cmd) => Err(anyhow::anyhow!("Unknown command: {}", cmd)),
        None => {
            print_usage();
            return;
        }
    };

    let pretty = !opts.json && (opts.pretty || std::io::stdout().is_terminal());
    let render = |value: &Value| {
        if pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        }
        .unwrap_or_else(|_| value.to_string())
    };

    match result {
        Ok(output) => println!("{}", render(&output)),
        Err(e) => {
            eprintln!("{}", render(&json!({ "error": format!("{:#}", e) })));
            std::process::exit(1);
        }
    }
}

#[derive(Default)]
struct ParsedArgs {
    command: Option<String>,
    app: Option<String>,
    chains: Option<String>,
    json: bool,
    pretty: bool,
    help: bool,
    version: bool,
}

impl ParsedArgs {
    fn parse(args: &[String]) -> Self {
        let mut opts = ParsedArgs::default();
        let mut positional = Vec::new();
        let mut i = 0;

        while i < args.len() {
            let arg = &args[i];
            match arg.as_str() {
                "--help" | "-h" => opts.help = true,
                "--version" | "-V" => opts.version = true,
                "--json" => opts.json = true,
                "--pretty" => opts.pretty = true,
                "--app" | "-a" => {
                    if i + 1 < args.len() {
                        opts.app = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                "--chains" | "-c" => {
                    if i + 1 < args.len() {
                        opts.chains = Some(args[i + 1].clone());
                        i += 1;
                    }
                }
                _ if !arg.starts_with('-') => positional.push(arg.clone()),
                _ => {} // Ignore unknown flags
            }
            i += 1;
        }

        if !positional.is_empty() {
            opts.command = Some(positional.remove(0));
        }

        if opts.app.is_none() {
            opts.app = env::var("BEECONNECT_APP").ok().filter(|s| !s.is_empty());
        }

        opts
    }

    fn app(&self) -> &str {
        self.app.as_deref().unwrap_or(DEFAULT_APP)
    }
}

fn print_usage() {
    println!(
        r#"beeconnect - wallet session manager

USAGE:
    beeconnect <command> [options]

COMMANDS:
    chains                  Print the chain registry
    session                 Print the persisted session hint
    forget                  Clear the persisted session hint
    demo                    Run a scripted session against an in-memory wallet

OPTIONS:
    --app, -a <name>        Application name (default: beeconnect, env: BEECONNECT_APP)
    --chains, -c <file>     Chain registry JSON (array of EIP-3085 descriptors)
    --json                  Raw JSON output
    --pretty                Pretty-print JSON
    --version, -V           Print version

ENVIRONMENT:
    BEECONNECT_ROOT         Session store root (default: platform data dir)
    BEECONNECT_LOG_JSON=1   JSON logs on stderr
    RUST_LOG                Log filter (default: info)

EXAMPLES:
    beeconnect chains --chains ./chains.json
    beeconnect demo && beeconnect session
    beeconnect forget --app myapp
"#
    );
}

fn load_registry(opts: &ParsedArgs) -> Result<ChainRegistry> {
    match &opts.chains {
        Some(path) => {
            let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            ChainRegistry::from_json(&raw).with_context(|| format!("parsing {}", path))
        }
        None => Ok(ChainRegistry::default()),
    }
}

fn cmd_chains(opts: &ParsedArgs) -> Result<Value> {
    let registry = load_registry(opts)?;
    let chains: Vec<_> = registry.iter().collect();
    Ok(serde_json::to_value(chains)?)
}

fn cmd_session(opts: &ParsedArgs) -> Result<Value> {
    let store = FileStore::for_app(opts.app())?;
    let path = store.path().display().to_string();
    let persistence = SessionPersistence::new(Rc::new(store));
    Ok(match persistence.load() {
        Some(saved) => json!({ "account": saved.account, "chainId": saved.chain_id, "path": path }),
        None => json!({ "account": null, "chainId": null, "path": path }),
    })
}

fn cmd_forget(opts: &ParsedArgs) -> Result<Value> {
    let store = FileStore::for_app(opts.app())?;
    let path = store.path().display().to_string();
    SessionPersistence::new(Rc::new(store)).clear();
    info!(path = %path, "session forgotten");
    Ok(json!({ "cleared": true, "path": path }))
}

fn cmd_demo(opts: &ParsedArgs) -> Result<Value> {
    let registry = load_registry(opts)?;
    let store: Rc<dyn SessionStore> = match FileStore::for_app(opts.app()) {
        Ok(store) => Rc::new(store),
        Err(e) => {
            debug!("file store unavailable, demo will not persist: {}", e);
            Rc::new(MemoryStore::new())
        }
    };

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    let scheduler = TokioScheduler::new();
    runtime.block_on(scheduler.run_until(run_demo(opts.app().to_string(), registry, store, scheduler.clone())))
}

async fn run_demo(
    app: String,
    registry: ChainRegistry,
    store: Rc<dyn SessionStore>,
    scheduler: TokioScheduler,
) -> Result<Value> {
    let wallet = Rc::new(
        MemoryProvider::new(&[DEMO_ALICE], "0x1").with_balance(DEMO_ALICE, 1_234_567_890_000_000_000),
    );
    let session = WalletSession::new(Some(wallet.clone()), store, Rc::new(scheduler))
        .with_registry(registry)
        .with_config(SessionConfig::new(app));

    let events = session.start().await?;
    let pump = session.clone();
    tokio::task::spawn_local(async move { pump.run_events(events).await });

    let account = session.connect().await?;
    session.refresh_balance().await?;
    info!(account = %account, balance = %session.balance().display, "demo connected");

    // 0x89 is not known to the wallet yet, so this goes through add-then-switch
    session.switch_network("0x89").await?;
    wallet.set_balance(DEMO_ALICE, 2_000_000_000_000_000_000);
    session.refresh_balance().await?;

    let hash = session.send(DEMO_BOB, "0.25").await?;

    // The user flips network inside the wallet
    wallet.set_chain("0x1");
    tokio::task::yield_now().await;
    tokio::task::yield_now().await;

    let snapshot = session.snapshot();
    session.shutdown();

    Ok(json!({
        "snapshot": snapshot,
        "transaction": hash,
        "calls": wallet.calls(),
    }))
}
