//! Command-line entry point of the IAM permission validator

mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use futures::future::join_all;
use iam_permission_validator_engine::{
    AwsIamClient, IamApi, IamRule, IamRuleService, IamSnapshot, RulesFile,
};
use log::{debug, info};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::output::RuleReport;

#[derive(Parser, Debug)]
#[command(name = "iam-permission-validator", version)]
#[command(about = "Check IAM principals against the permissions they are required to have")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate every rule of a rules file
    Validate {
        /// Rules file (JSON)
        #[arg(long)]
        rules: PathBuf,

        /// AWS region, overriding the rules file's defaultRegion
        #[arg(long, env = "AWS_REGION")]
        region: Option<String>,

        /// AWS credential profile
        #[arg(long, env = "AWS_PROFILE")]
        profile: Option<String>,

        /// Evaluate against an offline IAM snapshot instead of live IAM
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Output format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Print the JSON schema of the rules file
    Schema {
        /// Pretty-print the schema
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Text,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

async fn evaluate<C: IamApi>(service: &IamRuleService<C>, rules: &[IamRule]) -> Vec<RuleReport> {
    join_all(rules.iter().map(|rule| async move {
        debug!("Evaluating {}", rule.validation_rule());
        RuleReport::from(service.reconcile(rule).await)
    }))
    .await
}

async fn run_validate(
    rules_path: &Path,
    region: Option<String>,
    profile: Option<String>,
    snapshot: Option<&Path>,
) -> Result<Vec<RuleReport>> {
    let rules_file = RulesFile::load(rules_path)
        .with_context(|| format!("Failed to load rules from {}", rules_path.display()))?;
    let rules = rules_file.rules();
    if rules.is_empty() {
        output::note(&format!("no rules found in {}", rules_path.display()));
        return Ok(Vec::new());
    }

    let reports = if let Some(snapshot_path) = snapshot {
        let snapshot = IamSnapshot::load(snapshot_path).with_context(|| {
            format!("Failed to load IAM snapshot from {}", snapshot_path.display())
        })?;
        info!("Evaluating {} rules against snapshot {}", rules.len(), snapshot_path.display());
        evaluate(&IamRuleService::new(snapshot), &rules).await
    } else {
        let region = region.or(rules_file.default_region);
        info!("Evaluating {} rules against IAM (region {:?})", rules.len(), region);
        let client = AwsIamClient::from_env(region, profile).await;
        evaluate(&IamRuleService::new(client), &rules).await
    };

    Ok(reports)
}

fn print_schema(pretty: bool) -> Result<()> {
    let schema = schemars::schema_for!(RulesFile);
    let json = if pretty {
        serde_json::to_string_pretty(&schema)
    } else {
        serde_json::to_string(&schema)
    }
    .context("Failed to serialize rules file schema")?;
    println!("{json}");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Validate {
            rules,
            region,
            profile,
            snapshot,
            format,
            pretty,
        } => {
            let reports = run_validate(&rules, region, profile, snapshot.as_deref()).await?;
            match format {
                OutputFormat::Json => output::print_json(&reports, pretty)?,
                OutputFormat::Text => output::print_text(&reports),
            }

            if reports.iter().all(RuleReport::passed) {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Schema { pretty } => {
            print_schema(pretty)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}
