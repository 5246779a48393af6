mod color;
mod dates;
mod error;
mod model;
mod parser;
mod render;
mod roam;
mod settings;
mod source;

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};

use color::{Color, ColorIndex};
use model::Highlight;
use render::Format;
use roam::{RoamClient, RoamSaver};
use settings::Settings;
use source::SourceDocument;

#[derive(Parser)]
#[command(name = "highlights", about = "Export Google Play Books highlights from a notes document")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct SourceArgs {
    /// Notes export: .html (with images/ beside it), .zip, or - for stdin
    file: PathBuf,
    /// Book name, appended to the source reference
    #[arg(short, long)]
    book_name: String,
    /// Starting point to take highlights from (e.g. 2020-06-01, "2 weeks ago")
    #[arg(long, default_value = "1970-01-01")]
    since: String,
    /// Keep only these highlight colors (repeatable: blue, red, yellow, green)
    #[arg(long = "color", value_parser = parse_color)]
    colors: Vec<Color>,
}

fn parse_color(name: &str) -> Result<Color, String> {
    Color::from_name(name).ok_or_else(|| {
        let known: Vec<&str> = Color::ALL.iter().map(|c| c.name()).collect();
        format!("unknown color {:?} (expected one of {})", name, known.join(", "))
    })
}

#[derive(Subcommand)]
enum Commands {
    /// Output results locally
    Local {
        #[command(flatten)]
        source: SourceArgs,
        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
        #[arg(short = 't', long, value_enum, default_value_t = Format::Md)]
        export_type: Format,
        /// Create callout blocks styled by highlight color (emd only)
        #[arg(short, long)]
        custom_css: bool,
    },
    /// Store highlights to a Roam graph
    Roam {
        #[command(flatten)]
        source: SourceArgs,
        /// The name of the Roam graph to store highlights to
        #[arg(short, long)]
        graph: String,
        /// Roam API key
        #[arg(long, env = "ROAM_API_KEY", hide_env_values = true)]
        api_key: String,
        /// Roam graph token
        #[arg(long, env = "ROAM_GRAPH_TOKEN", hide_env_values = true)]
        graph_token: String,
    },
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(io::stderr)
        .try_init();
}

fn main() -> Result<()> {
    init_tracing();
    let t0 = Instant::now();
    let cli = Cli::parse();
    let settings = Settings::load()?;
    info!(settings_loaded = ?settings, msg = "Starting highlights export");

    match cli.command {
        Commands::Local {
            source,
            output,
            export_type,
            custom_css,
        } => {
            let highlights = load_highlights(&source)?;
            match output {
                Some(path) => {
                    let file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
                    let mut out = BufWriter::new(file);
                    render::render(export_type, &highlights, custom_css, &mut out)?;
                    out.flush()?;
                    info!("Wrote {} highlights to {}", highlights.len(), path.display());
                }
                None => {
                    let stdout = io::stdout();
                    let mut out = stdout.lock();
                    render::render(export_type, &highlights, custom_css, &mut out)?;
                    out.flush()?;
                }
            }
        }
        Commands::Roam {
            source,
            graph,
            api_key,
            graph_token,
        } => {
            let highlights = load_highlights(&source)?;
            let client = RoamClient::new(&settings, &graph, &api_key, &graph_token)?;
            let saver = RoamSaver::new(client, settings.header_block.clone());
            saver.save(&source.book_name, &highlights)?;
        }
    }

    info!("Done in {:.1}s", t0.elapsed().as_secs_f64());
    Ok(())
}

/// Resolve the cutoff first so a bad `--since` fails before any parsing.
fn load_highlights(args: &SourceArgs) -> Result<Vec<Highlight>> {
    let today = chrono::Local::now().date_naive();
    let since = dates::parse_since(&args.since, today).context("Invalid --since")?;

    let doc = SourceDocument::load(&args.file)?;
    let colors = ColorIndex::from_images(&doc.images);
    if colors.is_empty() {
        warn!("No marker image matched a highlight color; every highlight will be dropped");
    } else {
        info!("Resolved {} marker colors from {} images", colors.len(), doc.images.len());
    }

    let mut highlights = parser::find_highlights(&doc.html, &args.book_name, &colors, since);
    if !args.colors.is_empty() {
        highlights.retain(|h| args.colors.contains(&h.color));
        info!("{} highlights left after color filter", highlights.len());
    }
    Ok(highlights)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn local_defaults() {
        let cli = Cli::try_parse_from(["highlights", "local", "notes.html", "-b", "Dune"]).unwrap();
        match cli.command {
            Commands::Local {
                source,
                output,
                export_type,
                custom_css,
            } => {
                assert_eq!(source.book_name, "Dune");
                assert_eq!(source.since, "1970-01-01");
                assert!(output.is_none());
                assert_eq!(export_type, Format::Md);
                assert!(!custom_css);
            }
            Commands::Roam { .. } => panic!("expected local"),
        }
    }

    #[test]
    fn local_requires_book_name() {
        assert!(Cli::try_parse_from(["highlights", "local", "notes.html"]).is_err());
    }

    #[test]
    fn roam_takes_credentials_from_flags() {
        let cli = Cli::try_parse_from([
            "highlights", "roam", "notes.zip", "-b", "Dune", "-g", "books",
            "--api-key", "k", "--graph-token", "t", "--since", "2 weeks ago",
        ])
        .unwrap();
        match cli.command {
            Commands::Roam {
                source, graph, api_key, graph_token,
            } => {
                assert_eq!(graph, "books");
                assert_eq!(api_key, "k");
                assert_eq!(graph_token, "t");
                assert_eq!(source.since, "2 weeks ago");
            }
            Commands::Local { .. } => panic!("expected roam"),
        }
    }

    #[test]
    fn bad_since_fails_before_reading_file() {
        let args = SourceArgs {
            file: PathBuf::from("/definitely/not/here.html"),
            book_name: "Dune".into(),
            since: "someday".into(),
            colors: Vec::new(),
        };
        let err = load_highlights(&args).unwrap_err();
        assert!(err.to_string().contains("--since"));
    }

    /// Sample export on disk: a blue highlight on June 1 and a red one on June 5.
    fn export_dir() -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.html"), parser::tests::sample_document()).unwrap();
        std::fs::create_dir(dir.path().join("images")).unwrap();
        for (n, c) in [(1, Color::Blue), (2, Color::Red)] {
            let m = color::tests::marker("x", c);
            std::fs::write(dir.path().join(format!("images/image{}.png", n)), m.bytes).unwrap();
        }
        dir
    }

    #[test]
    fn color_flag_is_repeatable_and_case_insensitive() {
        let cli = Cli::try_parse_from([
            "highlights", "local", "notes.html", "-b", "Dune", "--color", "RED", "--color", "green",
        ])
        .unwrap();
        let Commands::Local { source, .. } = cli.command else {
            panic!("expected local");
        };
        assert_eq!(source.colors, vec![Color::Red, Color::Green]);

        let err = Cli::try_parse_from(["highlights", "local", "notes.html", "-b", "Dune", "--color", "purple"])
            .err()
            .unwrap();
        assert!(err.to_string().contains("unknown color"));
    }

    #[test]
    fn color_filter_keeps_only_selected() {
        let dir = export_dir();
        let args = SourceArgs {
            file: dir.path().join("notes.html"),
            book_name: "Dune".into(),
            since: "1970-01-01".into(),
            colors: vec![Color::Blue],
        };
        let found = load_highlights(&args).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Good point");
    }

    #[test]
    fn end_to_end_from_directory_export() {
        let dir = export_dir();
        let args = SourceArgs {
            file: dir.path().join("notes.html"),
            book_name: "Dune".into(),
            since: "June 2, 2020".into(),
            colors: Vec::new(),
        };
        let found = load_highlights(&args).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text, "Careful here");
        assert_eq!(found[0].color, Color::Red);
    }
}
