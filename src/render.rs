//! Terminal rendering of activated views.

use colored::*;
use pkgdocs::docs::{LoadStatus, PackageEntry, PackageIndex};
use pkgdocs::{FrontView, Navigation, PackageView, TypeView, View};
use std::fmt::Write;
use terminal_size::{Width, terminal_size};

use crate::syntax::highlight_json;

const SEARCH_LIMIT: usize = 20;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub highlight: bool,
    pub theme: String,
}

/// Get the current terminal width, defaulting to 80 if unable to detect
fn get_terminal_width() -> usize {
    if let Some((Width(w), _)) = terminal_size() {
        w as usize
    } else {
        80
    }
}

fn separator() -> String {
    "─".repeat(get_terminal_width().clamp(40, 120))
}

pub fn render_navigation(nav: &Navigation, opts: &RenderOptions) -> String {
    let mut out = String::new();
    if let Some(from) = nav.redirects.first() {
        let _ = writeln!(
            out,
            "{}",
            format!("↪ {} redirected to {}", from, nav.path).dimmed()
        );
    }
    out.push_str(&render_view(&nav.view, opts));
    out
}

pub fn render_view(view: &View, opts: &RenderOptions) -> String {
    match view {
        View::Front(front) => render_front(front),
        View::Package(package) => render_package(package),
        View::Type(ty) => render_type(ty, opts),
    }
}

fn render_front(view: &FrontView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", "╔═══════════════════════════════════════════╗".cyan());
    let _ = writeln!(out, "{}", "║   Package Documentation                   ║".cyan());
    let _ = writeln!(out, "{}", "╚═══════════════════════════════════════════╝".cyan());

    match view.packages() {
        Some(index) => out.push_str(&render_package_list(index)),
        None => {
            let _ = writeln!(
                out,
                "\n{} Open {} to browse a package",
                "ℹ️".blue(),
                "/docs/<package>/".green()
            );
        }
    }
    out
}

pub fn render_package_list(index: &PackageIndex) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{} {} package(s):\n", "📚".cyan(), index.len());
    for (name, entry) in index.packages() {
        let _ = writeln!(
            out,
            "  {} {} {}",
            "•".cyan(),
            name.green(),
            format!("({} types)", entry.len()).dimmed()
        );
    }
    out
}

fn render_package(view: &PackageView) -> String {
    let mut out = String::new();
    let Some(pkg) = view.pkg() else {
        let _ = writeln!(
            out,
            "{} Package '{}' not found",
            "❌".red(),
            view.package_name()
        );
        return out;
    };

    let _ = writeln!(
        out,
        "\n{} Package {}\n{}",
        "📦".cyan(),
        view.package_name().yellow().bold(),
        separator().dimmed()
    );

    if pkg.is_empty() {
        let _ = writeln!(out, "  {} No types documented", "ℹ️".blue());
        return out;
    }

    for (key, _) in pkg.types() {
        let name = pkg.route_name(view.package_name(), key);
        let _ = writeln!(
            out,
            "  {} {}  {}",
            "•".cyan(),
            name.green(),
            format!("/docs/{}/{}", view.package_name(), name).dimmed()
        );
    }

    let _ = writeln!(
        out,
        "\n{} Total: {} type(s)",
        "✓".green(),
        pkg.len().to_string().bold()
    );
    out
}

fn render_type(view: &TypeView, opts: &RenderOptions) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "\n{} {} {} {}\n{}",
        "📄".cyan(),
        view.package_name().yellow(),
        "›".dimmed(),
        view.name().green().bold(),
        separator().dimmed()
    );

    if view.pkg().is_none() {
        let _ = writeln!(
            out,
            "{} Package '{}' not found",
            "❌".red(),
            view.package_name()
        );
        return out;
    }

    let Some(cls) = view.cls() else {
        let _ = writeln!(
            out,
            "{} Type '{}' not found in {}",
            "❌".red(),
            view.name(),
            view.package_name()
        );
        return out;
    };

    let json = cls.to_pretty_json();
    if opts.highlight {
        out.push_str(&highlight_json(&json, &opts.theme));
    } else {
        out.push_str(&json);
    }
    out.push('\n');
    out
}

pub fn render_search(index: &PackageIndex, query: &str) -> String {
    let mut out = String::new();
    let results = index.search_types(query);
    if results.is_empty() {
        let _ = writeln!(out, "{} No results found for '{}'", "ℹ️".blue(), query);
        return out;
    }

    let _ = writeln!(out, "\n{} Found {} result(s):\n", "🔍".cyan(), results.len());
    for (package, key) in results.iter().take(SEARCH_LIMIT) {
        let name = PackageEntry::display_name(package, key);
        let link = index
            .package(package)
            .map_or(name, |pkg| pkg.route_name(package, key));
        let _ = writeln!(
            out,
            "  {} {}.{}  {}",
            "•".cyan(),
            package.yellow(),
            name.green(),
            format!("/docs/{}/{}", package, link).dimmed()
        );
    }
    if results.len() > SEARCH_LIMIT {
        let _ = writeln!(out, "\n  ... and {} more", results.len() - SEARCH_LIMIT);
    }
    out
}

pub fn render_status(status: &LoadStatus, location: &str, fetches: usize) -> String {
    let state = match status {
        LoadStatus::Empty => "not loaded".normal(),
        LoadStatus::Pending => "loading".yellow(),
        LoadStatus::Resolved { packages, types } => {
            format!("loaded ({} packages, {} types)", packages, types).green()
        }
        LoadStatus::Failed(err) => format!("failed: {}", err).red(),
    };
    format!(
        "{} Index: {}\n  {} source: {}\n  {} fetches: {}\n",
        "📚".cyan(),
        state,
        "•".blue(),
        location,
        "•".blue(),
        fetches
    )
}
