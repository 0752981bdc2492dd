use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use sqlcheck::config::{DEFAULT_CHECK_PREFIX, DEFAULT_DIALECT, DEFAULT_MOCK_PREFIX};
use sqlcheck::{generate_checks, mock_file, CheckOptions, CheckTemplate, GenerateOptions};

#[derive(Parser)]
#[command(name = "sqlcheck")]
#[command(author, version, about = "Generate test queries from SQL files with check and mock blocks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Args)]
struct TransformArgs {
    /// Name prefix of check blocks
    #[arg(long, default_value = DEFAULT_CHECK_PREFIX)]
    check_prefix: String,

    /// Name prefix of mock blocks
    #[arg(long, default_value = DEFAULT_MOCK_PREFIX)]
    mock_prefix: String,

    /// SQL dialect (bigquery, generic, postgresql, ...)
    #[arg(long, default_value = DEFAULT_DIALECT)]
    dialect: String,

    /// Aggregation appended for each check block
    #[arg(long, value_enum, default_value_t = CheckTemplate::CountIf)]
    template: CheckTemplate,

    /// Add a `limit` to the aggregation
    #[arg(long)]
    limit: Option<u32>,

    /// Fail on files that cannot be parsed instead of skipping them
    #[arg(long)]
    strict: bool,
}

impl TransformArgs {
    fn check_options(&self) -> CheckOptions {
        CheckOptions {
            check_prefix: self.check_prefix.clone(),
            mock_prefix: self.mock_prefix.clone(),
            template: self.template,
            limit: self.limit,
            dialect: self.dialect.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// List the check blocks found in SQL files
    List {
        /// SQL files, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        #[command(flatten)]
        args: TransformArgs,
    },

    /// Print or write the check queries of SQL files
    Generate {
        /// SQL files, directories or glob patterns
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Write queries to <DIR>/<file stem>/<label>.sql instead of printing them
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        args: TransformArgs,
    },

    /// Print a SQL file with its mock blocks applied
    Mock {
        /// Path to the SQL file
        file: PathBuf,

        #[command(flatten)]
        args: TransformArgs,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    sqlcheck::logging::init(cli.verbose);

    match cli.command {
        Commands::List { inputs, args } => {
            let options = GenerateOptions {
                inputs,
                check: args.check_options(),
                output_dir: None,
                strict: args.strict,
            };

            for file in generate_checks(&options)? {
                for check in &file.checks {
                    println!("{}: {}", file.path.display(), check.label);
                }
                for diagnostic in &file.diagnostics {
                    eprintln!("{}: warning: {}", file.path.display(), diagnostic);
                }
            }
        }
        Commands::Generate {
            inputs,
            output_dir,
            args,
        } => {
            let print = output_dir.is_none();
            let options = GenerateOptions {
                inputs,
                check: args.check_options(),
                output_dir,
                strict: args.strict,
            };

            for file in generate_checks(&options)? {
                if print {
                    for check in &file.checks {
                        println!("-- {}: {}", file.path.display(), check.label);
                        println!("{}", check.sql());
                        println!();
                    }
                }
                for diagnostic in &file.diagnostics {
                    eprintln!("{}: warning: {}", file.path.display(), diagnostic);
                }
            }
        }
        Commands::Mock { file, args } => {
            let resolution = mock_file(&file, &args.check_options())?;
            for diagnostic in &resolution.diagnostics {
                eprintln!("{}: warning: {}", file.display(), diagnostic);
            }
            print!("{}", resolution.statement);
        }
    }

    Ok(())
}
