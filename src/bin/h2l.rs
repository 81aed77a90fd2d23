//! htlatex CLI - CSS-aware HTML to LaTeX converter

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};
#[cfg(feature = "cli")]
use htlatex::{
    diagnostics::{check_html_str, format_diagnostics},
    html_to_latex_with_options, ConversionWarning, H2LOptions, ImageResolver,
    PassthroughImageResolver, StdImageResolver,
};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "h2l")]
#[command(version)]
#[command(about = "htlatex - CSS-aware HTML to LaTeX converter", long_about = None)]
struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    command: Option<Commands>,

    /// Input file path (reads from stdin if not provided)
    input_file: Option<String>,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long)]
    output: Option<String>,

    /// Wrap the output in a complete LaTeX document
    #[arg(short = 'f', long)]
    full_document: bool,

    /// Document class for full documents
    #[arg(long, default_value = "article")]
    class: String,

    /// Document title (defaults to the HTML <title>)
    #[arg(long)]
    title: Option<String>,

    /// Document author
    #[arg(long)]
    author: Option<String>,

    /// Directory that image paths are resolved against
    #[arg(long)]
    image_dir: Option<String>,

    /// Draw tables without rules
    #[arg(long)]
    no_borders: bool,

    /// Check mode - report constructs that would be dropped, without converting
    #[arg(long)]
    check: bool,

    /// Use colored output (for check mode and warnings)
    #[arg(long, default_value_t = true)]
    color: bool,

    /// Strict mode: exit with error if any conversion warnings occur
    #[arg(long)]
    strict: bool,

    /// Quiet mode: suppress warning output to stderr
    #[arg(short, long)]
    quiet: bool,

    /// Embed warnings as comments in the output file
    #[arg(long)]
    embed_warnings: bool,

    /// Log converter decisions (`RUST_LOG` overrides)
    #[arg(short, long)]
    verbose: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Check HTML for constructs the converter drops or degrades
    Check {
        /// Input file to check
        input: Option<String>,

        /// Disable colored output
        #[arg(long)]
        no_color: bool,
    },

    /// Show version and feature info
    Info,
}

#[cfg(feature = "cli")]
fn read_input(path: Option<&str>) -> io::Result<String> {
    match path {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn run_check(input: &str, use_color: bool) -> io::Result<()> {
    let result = check_html_str(input).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    println!("{}", format_diagnostics(&result, use_color));
    if result.has_errors() {
        std::process::exit(1);
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn main() -> io::Result<()> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Some(cmd) = cli.command {
        return match cmd {
            Commands::Check { input, no_color } => run_check(&read_input(input.as_deref())?, !no_color),
            Commands::Info => {
                print_info();
                Ok(())
            }
        };
    }

    let input = read_input(cli.input_file.as_deref())?;

    if cli.check {
        return run_check(&input, cli.color);
    }

    let options = H2LOptions {
        full_document: cli.full_document,
        document_class: cli.class.clone(),
        title: cli.title.clone(),
        author: cli.author.clone(),
        table_borders: !cli.no_borders,
        ..Default::default()
    };

    let resolver: Box<dyn ImageResolver> = match cli.image_dir {
        Some(ref dir) => Box::new(StdImageResolver::with_base_dir(dir)),
        None => Box::new(PassthroughImageResolver),
    };

    let out = match html_to_latex_with_options(&input, &options, resolver.as_ref()) {
        Ok(out) => out,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if !cli.quiet && out.has_warnings() {
        print_warnings_to_stderr(&out.warnings, cli.color);
    }

    if cli.strict && out.has_warnings() {
        eprintln!(
            "Error: {} conversion warning(s) in strict mode",
            out.warnings.len()
        );
        std::process::exit(1);
    }

    let result = if cli.embed_warnings && out.has_warnings() {
        embed_warnings_as_comments(&out.content, &out.warnings)
    } else {
        out.content
    };

    match cli.output {
        Some(path) => {
            let mut file = fs::File::create(&path)?;
            writeln!(file, "{}", result)?;
            if out.warnings.is_empty() {
                eprintln!("✓ Output written to: {}", path);
            } else {
                eprintln!(
                    "⚠ Output written to: {} ({} warning(s))",
                    path,
                    out.warnings.len()
                );
            }
        }
        None => {
            println!("{}", result);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn print_info() {
    println!("htlatex - CSS-aware HTML to LaTeX converter");
    println!("Version: {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("Features:");
    println!("  ✓ Inline CSS cascade (color, background, weight, style, decoration, size, family)");
    println!("  ✓ Headings, lists, links, preformatted text");
    println!("  ✓ Tables with colspan, nested tables, image grids");
    println!("  ✓ Images as figures with captions and labels");
    println!("  ✓ HTML diagnostics and checking");
    println!();
    println!("Packages used by the output:");
    println!("  - graphicx, hyperref, xcolor, textcomp");
    println!();
}

/// Print warnings to stderr with optional color coding
#[cfg(feature = "cli")]
fn print_warnings_to_stderr(warnings: &[ConversionWarning], use_color: bool) {
    let (yellow, reset) = if use_color {
        ("\x1b[33m", "\x1b[0m")
    } else {
        ("", "")
    };
    eprintln!();
    eprintln!("{}Conversion Warnings ({}):{}", yellow, warnings.len(), reset);
    eprintln!();
    for warning in warnings {
        eprintln!("  {}", warning);
    }
    eprintln!();
}

/// Append warnings as LaTeX comments
#[cfg(feature = "cli")]
fn embed_warnings_as_comments(output: &str, warnings: &[ConversionWarning]) -> String {
    let mut result = output.to_string();
    result.push_str("\n\n% ===============================================================\n");
    result.push_str("% Conversion Warnings\n");
    result.push_str("% ===============================================================\n");
    for warning in warnings {
        result.push_str(&format!("% {}\n", warning.to_string().replace('\n', " ")));
    }
    result
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install htlatex --features cli");
    eprintln!("  h2l [OPTIONS] [INPUT_FILE]");
}
