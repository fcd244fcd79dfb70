//! shellroute - interactive front end for the dispatch core
//!
//! Reads lines from stdin, dispatches them, and prints whatever the
//! dispatcher and its background tasks emit.

use std::env;
use std::io::Write;
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

use anyhow::Context as _;
use chrono::Local;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use shellroute::{
    ChannelInput, ChannelSink, Color, Config, Dispatcher, ExecutionContext, HintListener,
    InteractiveShell, OutputEvent, RedirectionListener, Rooter,
};

const ANSI_RESET: &str = "\x1b[0m";

/// Command line options
#[derive(Debug, Default)]
struct AppArgs {
    /// Configuration file path
    config_path: Option<PathBuf>,
    /// Enable debug logging
    debug: bool,
}

impl AppArgs {
    fn parse() -> Result<Self, String> {
        let args: Vec<String> = env::args().collect();
        let mut app_args = AppArgs::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--config" | "-c" => {
                    if i + 1 < args.len() {
                        app_args.config_path = Some(PathBuf::from(&args[i + 1]));
                        i += 1;
                    } else {
                        return Err("Missing config file path".to_string());
                    }
                }
                "--debug" | "-d" => {
                    app_args.debug = true;
                }
                "--help" | "-h" => {
                    print_help();
                    process::exit(0);
                }
                "--version" | "-v" => {
                    println!("{} v{}", shellroute::NAME, shellroute::VERSION);
                    process::exit(0);
                }
                arg if arg.starts_with('-') => {
                    return Err(format!("Unknown option: {}", arg));
                }
                _ => {
                    warn!("Ignoring positional argument: {}", args[i]);
                }
            }
            i += 1;
        }

        Ok(app_args)
    }
}

fn print_help() {
    println!("shellroute - command dispatch shell");
    println!();
    println!("USAGE:");
    println!("    shellroute [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -c, --config <PATH>    Path to configuration file");
    println!("    -d, --debug            Enable debug logging");
    println!("    -h, --help             Print this help message");
    println!("    -v, --version          Print version information");
    println!();
    println!("INPUT:");
    println!("    :back                  Send the back gesture (an empty line)");
    println!("    :grant / :deny         Answer a pending permission request");
    println!("    exit, quit             Leave the shell");
    println!();
    println!("ENVIRONMENT:");
    println!("    SHELLROUTE_CONFIG      Path to configuration file");
    println!("    SHELLROUTE_DEBUG       Enable debug logging (1 or true)");
    println!("    RUST_LOG               Set logging level (error, warn, info, debug, trace)");
}

/// Host hooks for the terminal front end
struct TerminalHooks;

impl Rooter for TerminalHooks {
    fn on_root(&self) {
        info!("Elevated privileges requested");
    }
}

impl HintListener for TerminalHooks {
    fn update_hint(&self) {
        debug!("Working directory changed, prompt will refresh");
    }
}

impl RedirectionListener for TerminalHooks {
    fn on_redirection_request(&self, hint: Option<&str>) {
        if let Some(hint) = hint {
            debug!("Waiting for {}", hint);
        }
    }

    fn on_redirection_end(&self) {
        debug!("Prompt finished");
    }
}

fn colorize(color: Color, text: &str) -> String {
    format!("{}{}{}", color.ansi_foreground(), text, ANSI_RESET)
}

fn print_prompt(context: &ExecutionContext, redirecting: bool) {
    let theme = context.theme();
    let time = Local::now().format(&context.behavior().time_format).to_string();
    let location = context
        .current_directory()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "?".to_string());
    let marker = if redirecting { "?" } else { "$" };

    print!("{} {} {} ", colorize(theme.time_color, &time), location, marker);
    let _ = std::io::stdout().flush();
}

fn load_configuration(args: &AppArgs) -> anyhow::Result<Config> {
    match &args.config_path {
        Some(path) => shellroute::init_with_config(path)
            .with_context(|| format!("loading {}", path.display())),
        None => Ok(shellroute::init()?),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = AppArgs::parse().unwrap_or_else(|e| {
        eprintln!("Failed to parse arguments: {}", e);
        print_help();
        process::exit(1);
    });

    let log_level = if args.debug
        || env::var("SHELLROUTE_DEBUG").is_ok_and(|v| v == "1" || v.eq_ignore_ascii_case("true"))
    {
        "debug"
    } else {
        "info"
    };
    let env_filter = env::var("RUST_LOG").unwrap_or_else(|_| log_level.to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from(env_filter))
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .init();

    info!("Starting {} v{}", shellroute::NAME, shellroute::VERSION);
    debug!("Debug mode enabled");

    let config = load_configuration(&args)?;
    let output_color = config.theme.output_color;

    let (sink, mut output) = ChannelSink::new();
    let sink = Arc::new(sink);
    let (input_source, mut injected) = ChannelInput::new();
    let shell = InteractiveShell::spawn(&config.shell, sink.clone())?;
    let hooks = Arc::new(TerminalHooks);

    let dispatcher = Dispatcher::builder(config)
        .output(sink)
        .shell(Arc::new(shell))
        .input_source(Arc::new(input_source))
        .rooter(hooks.clone())
        .hint_listener(hooks.clone())
        .redirection_listener(hooks)
        .current_directory(env::current_dir().context("reading current directory")?)
        .build()?;

    let printer = tokio::spawn(async move {
        while let Some(event) = output.recv().await {
            match event {
                OutputEvent::Text(text) => println!("{}", colorize(output_color, &text)),
                OutputEvent::Colored { color, text } => println!("{}", colorize(color, &text)),
            }
        }
    });

    let (line_tx, mut lines) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut stdin = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match stdin.next_line().await {
                Ok(Some(line)) => {
                    if line_tx.send(line).is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!("Failed to read input: {}", e);
                    break;
                }
            }
        }
    });

    loop {
        print_prompt(dispatcher.context(), dispatcher.is_redirecting());

        let line = tokio::select! {
            line = lines.recv() => line,
            line = injected.recv() => line,
        };
        let Some(line) = line else {
            break;
        };

        match line.trim() {
            "exit" | "quit" if !dispatcher.is_redirecting() => break,
            ":back" => dispatcher.on_long_back(),
            ":grant" => {
                dispatcher.permission_granted();
            }
            ":deny" => {
                dispatcher.permission_denied();
            }
            _ => {
                let report = dispatcher.dispatch(&line, None);
                debug!("{:?}", report.claimed_by());
            }
        }
    }

    println!();
    if let Err(e) = dispatcher.destroy().await {
        error!("Teardown task failed: {}", e);
    }
    drop(dispatcher);
    printer.abort();

    info!("{} shutdown complete", shellroute::NAME);
    Ok(())
}
