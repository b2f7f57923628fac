use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "nest",
    about = "Browse and edit nested bucket stores",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Store file to open
    #[arg(long, global = true, default_value = "test.db")]
    pub db: PathBuf,

    /// How long to wait for a locked store file, in milliseconds
    #[arg(long, global = true)]
    pub timeout_ms: Option<u64>,

    /// TOML file with store settings
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Print the bucket tree
    Tree(TreeArgs),
    /// Print the value of a key
    Get(GetArgs),
    /// Create a bucket and any missing parents
    Mkbucket(PathArgs),
    /// Add a new key to a bucket
    Put(PutArgs),
    /// Overwrite the value of a key
    Update(UpdateArgs),
    /// Delete a bucket or key
    Rm(PathArgs),
    /// Delete everything inside a bucket
    Empty(PathArgs),
    /// Rename a bucket or key in place
    Rename(RenameArgs),
    /// Copy a bucket or key
    Cp(TransferArgs),
    /// Move a bucket or key
    Mv(TransferArgs),
}

#[derive(Args)]
pub struct TreeArgs {
    /// Only show the subtree under this path
    pub path: Option<String>,
}

#[derive(Args)]
pub struct GetArgs {
    pub path: String,
    /// Print the stored bytes without JSON formatting
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct PathArgs {
    pub path: String,
}

#[derive(Args)]
pub struct PutArgs {
    pub parent: String,
    pub name: String,
    pub value: String,
    /// Store the value as given instead of compacting JSON
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct UpdateArgs {
    pub path: String,
    pub value: String,
    #[arg(long)]
    pub raw: bool,
}

#[derive(Args)]
pub struct RenameArgs {
    pub path: String,
    pub new_name: String,
}

#[derive(Args)]
pub struct TransferArgs {
    pub src: String,
    pub dst: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_tree() {
        let cli = Cli::try_parse_from(["nest", "tree"]).unwrap();
        if let Command::Tree(args) = cli.command {
            assert_eq!(args.path, None);
        } else {
            panic!("wrong command");
        }
        assert_eq!(cli.db, PathBuf::from("test.db"));
    }

    #[test]
    fn parse_get_raw() {
        let cli = Cli::try_parse_from(["nest", "get", "a/b/k", "--raw"]).unwrap();
        if let Command::Get(args) = cli.command {
            assert_eq!(args.path, "a/b/k");
            assert!(args.raw);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_put() {
        let cli = Cli::try_parse_from(["nest", "put", "a/b", "k", "{\"x\": 1}"]).unwrap();
        if let Command::Put(args) = cli.command {
            assert_eq!(args.parent, "a/b");
            assert_eq!(args.name, "k");
            assert_eq!(args.value, "{\"x\": 1}");
            assert!(!args.raw);
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_rename() {
        let cli = Cli::try_parse_from(["nest", "rename", "a/b", "c"]).unwrap();
        if let Command::Rename(args) = cli.command {
            assert_eq!(args.path, "a/b");
            assert_eq!(args.new_name, "c");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_mv() {
        let cli = Cli::try_parse_from(["nest", "mv", "a/b/k", "a/c/k"]).unwrap();
        if let Command::Mv(args) = cli.command {
            assert_eq!(args.src, "a/b/k");
            assert_eq!(args.dst, "a/c/k");
        } else {
            panic!("wrong command");
        }
    }

    #[test]
    fn parse_global_options() {
        let cli = Cli::try_parse_from([
            "nest", "rm", "a", "--db", "/tmp/x.db", "--timeout-ms", "250", "-v",
        ])
        .unwrap();
        assert_eq!(cli.db, PathBuf::from("/tmp/x.db"));
        assert_eq!(cli.timeout_ms, Some(250));
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Rm(_)));
    }

    #[test]
    fn parse_json_format() {
        let cli = Cli::try_parse_from(["nest", "--format", "json", "tree"]).unwrap();
        assert!(matches!(cli.format, OutputFormat::Json));
    }

    #[test]
    fn put_requires_value() {
        assert!(Cli::try_parse_from(["nest", "put", "a", "k"]).is_err());
    }
}
