use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tripleops_core::{FormatSpec, Notation};

#[derive(Parser, Debug)]
#[command(name = "tripleops", version, about = "Load, convert and export RDF triple stores")]
pub struct Cli {
    /// Configuration file (ron)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Offer Ctrl-C as a cancel button while an operation runs
    #[arg(long, global = true)]
    pub cancellable: bool,

    /// Read containers fully into memory instead of mapping them
    #[arg(long, global = true)]
    pub materialize: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a container and print its statistics
    Load { container: PathBuf },

    /// Convert an exchange-format file into a container
    Import {
        input: PathBuf,
        output: PathBuf,
        /// Input notation; guessed from the file name when omitted
        #[arg(long)]
        notation: Option<Notation>,
        /// Base IRI for relative references
        #[arg(long, default_value = "")]
        base: String,
        /// Parser options, `key=value;key=value`
        #[arg(long)]
        spec: Option<FormatSpec>,
    },

    /// Write a container out in an exchange format
    Export {
        container: PathBuf,
        output: PathBuf,
        #[arg(long)]
        notation: Option<Notation>,
    },

    /// Export the triples matching a pattern
    Query {
        container: PathBuf,
        output: PathBuf,
        #[arg(long)]
        subject: Option<String>,
        #[arg(long)]
        predicate: Option<String>,
        #[arg(long)]
        object: Option<String>,
        #[arg(long)]
        notation: Option<Notation>,
    },
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn command_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn import_accepts_notation_and_spec() {
        let cli = Cli::try_parse_from([
            "tripleops",
            "--cancellable",
            "import",
            "in.ttl",
            "out.hdt",
            "--notation",
            "nt",
            "--spec",
            "parser.strict=false",
        ])
        .unwrap();
        assert!(cli.cancellable);
        match cli.command {
            Command::Import { notation, spec, base, .. } => {
                assert_eq!(notation, Some(Notation::NTriples));
                assert_eq!(spec.unwrap().get_bool("parser.strict"), Some(false));
                assert_eq!(base, "");
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn unknown_notation_is_rejected() {
        let result = Cli::try_parse_from(["tripleops", "export", "a.hdt", "b.x", "--notation", "csv"]);
        assert!(result.is_err());
    }
}
