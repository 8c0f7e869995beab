use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use shopadmin::app::App;
use shopadmin::cli;
use shopadmin::config::Config;

fn print_usage(program: &str) {
    eprintln!(
        "Usage:\n  {program} [--base <url>] [--state-dir <path>] [--open <path>]\n  {program} --repl [--base <url>] [--state-dir <path>]\n\nFlags:\n  --base <url>         Backend API base URL (default from SHOPADMIN_API_BASE)\n  --state-dir <path>   Directory for persisted session state (default from SHOPADMIN_STATE_DIR)\n  --open <path>        One-shot navigation: run the guard for <path> and exit\n  --repl               Start the interactive shell\n  -h, --help           Show this help"
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap();
    fmt().with_env_filter(filter).init();

    let mut args: Vec<String> = std::env::args().collect();
    let program = args.remove(0);

    let mut config = Config::from_env();
    let mut open: Option<String> = None;
    let mut repl = false;

    let mut i = 0;
    while i < args.len() {
        match args[i].as_str() {
            "--base" => {
                if i + 1 >= args.len() { eprintln!("--base requires a value"); print_usage(&program); std::process::exit(2); }
                config.api_base = args[i + 1].clone();
                i += 2; continue;
            }
            "--state-dir" => {
                if i + 1 >= args.len() { eprintln!("--state-dir requires a value"); print_usage(&program); std::process::exit(2); }
                config.state_dir = args[i + 1].clone();
                i += 2; continue;
            }
            "--open" => {
                if i + 1 >= args.len() { eprintln!("--open requires a path"); print_usage(&program); std::process::exit(2); }
                open = Some(args[i + 1].clone());
                i += 2; continue;
            }
            "--repl" => { repl = true; i += 1; continue; }
            "-h" | "--help" => { print_usage(&program); return Ok(()); }
            unk => {
                eprintln!("Unrecognized argument: {}", unk);
                print_usage(&program);
                std::process::exit(2);
            }
        }
    }

    // Startup banner at info level so something always prints at default verbosity
    let rust_log = std::env::var("RUST_LOG").unwrap_or_else(|_| "<unset>".to_string());
    info!(
        target: "shopadmin",
        "shopadmin starting: RUST_LOG='{}', api_base='{}', state_dir='{}'",
        rust_log, config.api_base, config.state_dir
    );

    let app = App::bootstrap(config).await?;

    if let Some(path) = open {
        cli::print_navigation(&app, &path).await;
        // --repl after a one-shot open drops into the shell anyway
        if !repl {
            return Ok(());
        }
    }

    println!("shopadmin console - type 'help' for commands");
    cli::run_repl(&app).await?;
    Ok(())
}
