//! Interactive browsing session.

use colored::*;
use pkgdocs::Router;
use std::io::{self, Write};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::render::{
    RenderOptions, render_navigation, render_package_list, render_search, render_status,
};

/// Paths visited in this session, most recent last.
#[derive(Debug, Default)]
struct History {
    paths: Vec<String>,
}

impl History {
    fn visit(&mut self, path: &str) {
        if self.paths.last().map(String::as_str) != Some(path) {
            self.paths.push(path.to_string());
        }
    }

    /// The path before the current one.
    fn previous(&self) -> Option<&str> {
        let len = self.paths.len();
        if len < 2 {
            return None;
        }
        self.paths.get(len - 2).map(String::as_str)
    }

    /// Record a successful `back`: drop the current path, then land on `rendered`.
    fn went_back(&mut self, rendered: &str) {
        self.paths.pop();
        self.visit(rendered);
    }
}

fn print_help() {
    println!("Commands:");
    println!(
        "  {}                 - Open a page (/, /docs/<package>/, /docs/<package>/<type>)",
        "/<path>".green()
    );
    println!("  {}                    - Go to the previous page", "back".green());
    println!("  {}                - List all packages", "packages".green());
    println!("  {} <query>          - Search type names", "search".green());
    println!("  {}                  - Show index load state", "status".green());
    println!("  {}                    - Exit", "quit".green());
    println!();
}

/// Navigate and print the result. Returns the path that was rendered.
async fn show(router: &Router, path: &str, opts: &RenderOptions) -> Option<String> {
    match router.navigate(path).await {
        Ok(nav) => {
            print!("{}", render_navigation(&nav, opts));
            Some(nav.path)
        }
        Err(e) => {
            println!("{} {}", "❌".red(), e.to_string().red());
            None
        }
    }
}

pub async fn browse(
    router: &Router,
    start: Option<&str>,
    opts: &RenderOptions,
) -> Result<(), String> {
    let mut history = History::default();

    if let Some(path) = show(router, start.unwrap_or("/"), opts).await {
        history.visit(&path);
    }
    println!();
    print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("{} ", "pkgdocs>".blue().bold());
        stdout.flush().map_err(|e| e.to_string())?;

        let Some(input) = lines.next_line().await.map_err(|e| e.to_string())? else {
            println!();
            break;
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('/') {
            if let Some(path) = show(router, input, opts).await {
                history.visit(&path);
            }
            continue;
        }

        let (command, arg) = match input.split_once(char::is_whitespace) {
            Some((command, arg)) => (command, arg.trim()),
            None => (input, ""),
        };

        match command {
            "quit" | "exit" | "q" => {
                println!("Goodbye! 👋");
                break;
            }
            "help" | "?" => print_help(),
            "back" => match history.previous().map(str::to_string) {
                Some(previous) => {
                    // History only moves once the previous page actually rendered.
                    if let Some(path) = show(router, &previous, opts).await {
                        history.went_back(&path);
                    }
                }
                None => println!("{} Nothing to go back to", "ℹ️".blue()),
            },
            "packages" => match router.loader().load().await {
                Ok(index) => print!("{}", render_package_list(&index)),
                Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
            },
            "search" => {
                if arg.is_empty() {
                    println!("{} Usage: search <query>", "⚠️".yellow());
                    continue;
                }
                match router.loader().load().await {
                    Ok(index) => print!("{}", render_search(&index, arg)),
                    Err(e) => println!("{} {}", "❌".red(), e.to_string().red()),
                }
            }
            "status" => {
                let loader = router.loader();
                print!(
                    "{}",
                    render_status(&loader.status(), loader.location(), loader.fetch_count())
                );
            }
            _ => {
                println!(
                    "{} Unknown command '{}'. Type {} for a list of commands.",
                    "⚠️".yellow(),
                    command,
                    "help".green()
                );
            }
        }
    }

    Ok(())
}
