//! Command-line arguments and tracing setup.

use std::path::PathBuf;

use clap::Parser;
use mailfilter_core::atom::{AuthorPolicy, Generation};
use mailfilter_core::{ConvertOptions, Format};

/// Convert mail filter documents between the Atom export and flat files.
#[derive(Debug, Parser)]
#[command(name = "mailfilter", version, about, long_about = None)]
pub struct Cli {
    /// Input format: hierarchical (xml, atom) or flat (ini).
    #[arg(short = 'f', long = "from", value_name = "FORMAT", default_value = "hierarchical")]
    pub from: Format,

    /// Output format: hierarchical (xml, atom) or flat (ini).
    #[arg(short = 't', long = "to", value_name = "FORMAT", default_value = "flat")]
    pub to: Format,

    /// Read the Atom export (same as --from hierarchical).
    #[arg(short = 'x', conflicts_with_all = ["from", "from_flat"])]
    pub from_xml: bool,

    /// Read a flat file (same as --from flat).
    #[arg(short = 'i', conflicts_with = "from")]
    pub from_flat: bool,

    /// Write the Atom export (same as --to hierarchical).
    #[arg(short = 'X', conflicts_with_all = ["to", "to_flat"])]
    pub to_xml: bool,

    /// Write a flat file (same as --to flat).
    #[arg(short = 'I', conflicts_with = "to")]
    pub to_flat: bool,

    /// Input file [default: stdin].
    #[arg(long, visible_alias = "in", value_name = "PATH")]
    pub input: Option<PathBuf>,

    /// Output file [default: stdout].
    #[arg(long, visible_alias = "out", value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Feed generation: by-id or by-title.
    #[arg(long, value_name = "GENERATION", default_value = "by-id")]
    pub generation: Generation,

    /// Reject feeds without an author block.
    #[arg(long)]
    pub require_author: bool,

    /// Enable debug logging.
    #[arg(short, long)]
    pub debug: bool,
}

impl Cli {
    /// Effective input format.
    #[must_use]
    pub const fn source(&self) -> Format {
        if self.from_flat {
            Format::Flat
        } else if self.from_xml {
            Format::Hierarchical
        } else {
            self.from
        }
    }

    /// Effective output format.
    #[must_use]
    pub const fn target(&self) -> Format {
        if self.to_flat {
            Format::Flat
        } else if self.to_xml {
            Format::Hierarchical
        } else {
            self.to
        }
    }

    /// Conversion options selected by the arguments.
    #[must_use]
    pub fn convert_options(&self) -> ConvertOptions {
        let policy = if self.require_author {
            AuthorPolicy::Required
        } else {
            AuthorPolicy::Optional
        };
        ConvertOptions::new(self.source(), self.target())
            .generation(self.generation)
            .author_policy(policy)
    }
}

/// Installs the stderr log subscriber.
///
/// `RUST_LOG` takes precedence over `--debug`.
pub fn init_tracing(debug: bool) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let default = if debug {
        "mailfilter=debug,mailfilter_core=debug"
    } else {
        "mailfilter=info,mailfilter_core=info"
    };

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("mailfilter").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_defaults() {
        let cli = parse(&[]);
        assert_eq!(cli.source(), Format::Hierarchical);
        assert_eq!(cli.target(), Format::Flat);
        assert_eq!(cli.generation, Generation::ById);
        assert!(cli.input.is_none());
        assert!(!cli.debug);
    }

    #[test]
    fn test_long_formats() {
        let cli = parse(&["--from", "ini", "--to", "xml"]);
        assert_eq!(cli.source(), Format::Flat);
        assert_eq!(cli.target(), Format::Hierarchical);
    }

    #[test]
    fn test_shorthand_flags() {
        let cli = parse(&["-i", "-X"]);
        assert_eq!(cli.source(), Format::Flat);
        assert_eq!(cli.target(), Format::Hierarchical);

        let cli = parse(&["-x", "-I"]);
        assert_eq!(cli.source(), Format::Hierarchical);
        assert_eq!(cli.target(), Format::Flat);
    }

    #[test]
    fn test_conflicting_flags() {
        assert!(Cli::try_parse_from(["mailfilter", "-i", "-x"]).is_err());
        assert!(Cli::try_parse_from(["mailfilter", "-X", "--to", "flat"]).is_err());
    }

    #[test]
    fn test_unknown_format() {
        assert!(Cli::try_parse_from(["mailfilter", "--from", "yaml"]).is_err());
    }

    #[test]
    fn test_paths_and_aliases() {
        let cli = parse(&["--in", "filters.ini", "--out", "mailFilters.xml", "-i", "-X"]);
        assert_eq!(cli.input, Some(PathBuf::from("filters.ini")));
        assert_eq!(cli.output, Some(PathBuf::from("mailFilters.xml")));
    }

    #[test]
    fn test_convert_options() {
        let options = parse(&["--generation", "by-title", "--require-author"]).convert_options();
        assert_eq!(options.generation, Generation::ByTitle);
        assert_eq!(options.author_policy, AuthorPolicy::Required);
    }
}
