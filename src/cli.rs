//! Interactive console shell: a line-oriented front over the session
//! lifecycle and the navigation guard.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::app::App;
use crate::error::AppError;
use crate::guard::{Decision, NavOutcome};

pub fn print_help() {
    println!(
        "Commands:\n  login <user> <password>   authenticate and hydrate the session\n  logout                    end the session (local state is cleared even if the server call fails)\n  whoami                    show the active identity\n  switch-role <name>        switch the active role\n  open <path>               navigate; prints the guard decision and route title\n  routes                    list the route table\n  status                    connection and session summary\n  help                      show this help\n  quit | exit               leave the shell"
    );
}

/// Run the interactive loop over stdin. Returns when the operator quits or
/// input ends.
pub async fn run_repl(app: &App) -> Result<()> {
    let stdin = io::stdin();
    let mut out = io::stdout();
    loop {
        print!("shopadmin> ");
        out.flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        if !run_command(app, line.trim()).await {
            break;
        }
    }
    Ok(())
}

/// Execute one command line. Returns false when the shell should exit.
pub async fn run_command(app: &App, line: &str) -> bool {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else { return true };
    match cmd {
        "quit" | "exit" => return false,
        "help" => print_help(),
        "login" => {
            let (user, pass) = (parts.next(), parts.next());
            match (user, pass) {
                (Some(u), Some(p)) => match app.login(u, p).await {
                    Ok(()) => println!("logged in as {}", u),
                    Err(e) => report_error(&e),
                },
                _ => println!("usage: login <user> <password>"),
            }
        }
        "logout" => {
            app.logout().await;
            println!("logged out");
        }
        "whoami" => {
            if let Some(name) = app.store.username() {
                let role = app.store.role().unwrap_or_default();
                let nick = app.store.nick_name().unwrap_or_default();
                let active = if app.store.is_active() { "active" } else { "inactive" };
                println!("{} ({}) role={} [{}]", name, nick, role, active);
                let roles: Vec<String> = app.store.roles().into_iter().map(|r| r.name).collect();
                println!("roles: {}", roles.join(", "));
            } else {
                println!("not logged in");
            }
        }
        "switch-role" => match parts.next() {
            Some(role) => match app.switch_role(role).await {
                Ok(()) => println!("active role is now {}", role),
                Err(e) => report_error(&e),
            },
            None => println!("usage: switch-role <name>"),
        },
        "open" => match parts.next() {
            Some(path) => print_navigation(app, path).await,
            None => println!("usage: open <path>"),
        },
        "routes" => {
            for r in app.guard.table().iter() {
                println!("{:<20} {:<24} {}", r.name(), r.path(), r.title());
            }
        }
        "status" => {
            println!("api base: {}", app.api.base());
            println!("state dir: {}", app.config.state_dir);
            println!(
                "session: {}",
                if app.store.is_logged_in() { "present" } else { "none" }
            );
        }
        unk => println!("unknown command '{}'; try 'help'", unk),
    }
    true
}

pub async fn print_navigation(app: &App, path: &str) {
    match app.navigate(path).await {
        NavOutcome::Stale => println!("navigation superseded"),
        NavOutcome::Done(nav) => {
            let table = app.guard.table();
            match nav.decision {
                Decision::Authorized => {
                    let title = table.by_name(&nav.route_name).map(|r| r.title().to_string()).unwrap_or_default();
                    if nav.params.is_empty() {
                        println!("authorized: {} — {}", nav.route_name, title);
                    } else {
                        let params: Vec<String> =
                            nav.params.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
                        println!("authorized: {} — {} ({})", nav.route_name, title, params.join(", "));
                    }
                }
                Decision::RedirectLogin => println!("redirected to /login (no valid session)"),
                Decision::RedirectForbidden => println!("redirected to /403 (not permitted)"),
            }
        }
    }
}

fn report_error(e: &anyhow::Error) {
    match e.downcast_ref::<AppError>() {
        Some(app_err) if !app_err.user_visible() => println!("request failed (see logs)"),
        _ => println!("error: {}", e),
    }
}
