//! Fidei CLI - Main entry point

use clap::{Parser, Subcommand};
use fidei_cli::{commands, AppConfig, AppContext};
use fidei_core::{AssetType, ComplianceStatus, Role, VoteChoice};
use fidei_governance::RegisterAsset;
use rust_decimal::Decimal;
use serde_json::Value;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "fidei")]
#[command(about = "Fidei - trust asset compliance and exception governance", long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Data directory path (overrides the config file)
    #[arg(short, long)]
    data: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and migrate the database
    Init,

    /// Manage trusts
    #[command(subcommand)]
    Trust(TrustCommand),

    /// Manage actors
    #[command(subcommand)]
    Actor(ActorCommand),

    /// Manage trust memberships
    #[command(subcommand)]
    Member(MemberCommand),

    /// Record fiduciary fees
    #[command(subcommand)]
    Fee(FeeCommand),

    /// Register and query assets
    #[command(subcommand)]
    Asset(AssetCommand),

    /// Decide and vote on pending exceptions
    #[command(subcommand)]
    Exception(ExceptionCommand),

    /// Generate a credential issuer key
    Keygen {
        /// Output file path (defaults to <data>/issuer.key)
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum TrustCommand {
    /// Create a trust
    Create {
        id: String,
        name: String,
        /// Initial capital in MXN
        capital: Decimal,
        /// Government bond limit (percent of capital)
        #[arg(long)]
        bond_limit: Option<Decimal>,
        /// Other-assets limit (percent of capital)
        #[arg(long)]
        other_limit: Option<Decimal>,
        /// Exceptions are decided by committee majority
        #[arg(long)]
        consensus: bool,
    },
}

#[derive(Subcommand)]
enum ActorCommand {
    /// Add an actor
    Add {
        id: String,
        name: String,
        /// Global role (FIDUCIARY, COMMITTEE_MEMBER, BENEFICIARY, ...)
        role: Role,
        #[arg(long)]
        super_admin: bool,
    },
}

#[derive(Subcommand)]
enum MemberCommand {
    /// Assign an actor to a trust
    Assign { actor: String, trust: String, role: Role },
    /// Deactivate a membership
    Remove { actor: String, trust: String },
}

#[derive(Subcommand)]
enum FeeCommand {
    /// Set the fee schedule and study fee state
    Study {
        trust: String,
        /// Study and acceptance fee amount
        amount: Decimal,
        /// Annual management fee
        annual: Decimal,
        /// Mark the study fee as paid
        #[arg(long)]
        paid: bool,
    },
    /// Record a monthly installment as paid
    Month {
        trust: String,
        year: i32,
        month: u32,
        /// Amount paid (defaults to annual fee / 12)
        #[arg(long)]
        amount: Option<Decimal>,
    },
}

#[derive(Subcommand)]
enum AssetCommand {
    /// Register an asset and classify it
    Register {
        trust: String,
        /// GovernmentBond, MortgageLoan, InsuranceReserve, CNBVApproved, SocialHousing
        asset_type: AssetType,
        /// Value in MXN
        value: Decimal,
        /// Registering actor
        #[arg(long = "by")]
        registered_by: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        document_hash: Option<String>,
        #[arg(long)]
        beneficiary: Option<String>,
        /// JSON file with mortgage loan terms
        #[arg(long)]
        loan_file: Option<PathBuf>,
    },
    /// Show one asset
    Show {
        asset_id: String,
        /// Viewing actor (beneficiaries only see their own assets)
        #[arg(long = "as")]
        viewer: Option<String>,
    },
    /// List assets of a trust, newest first
    List {
        trust: String,
        #[arg(long = "type")]
        asset_type: Option<AssetType>,
        #[arg(long)]
        status: Option<ComplianceStatus>,
        #[arg(long)]
        beneficiary: Option<String>,
        #[arg(long)]
        limit: Option<i64>,
        #[arg(long)]
        offset: Option<i64>,
        #[arg(long = "as")]
        viewer: Option<String>,
    },
}

#[derive(Subcommand)]
enum ExceptionCommand {
    /// Approve a pending exception (a vote on consensus trusts)
    Approve {
        asset_id: String,
        #[arg(long = "by")]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Reject a pending exception (a vote on consensus trusts)
    Reject {
        asset_id: String,
        #[arg(long = "by")]
        actor: String,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Cast a committee vote
    Vote {
        asset_id: String,
        #[arg(long = "by")]
        voter: String,
        /// APPROVE or REJECT
        choice: VoteChoice,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the voting status of an asset
    Status { asset_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref())?;
    if let Some(data) = cli.data {
        config.data_dir = data;
    }

    // Keygen needs no database
    let out = match cli.command {
        Commands::Keygen { output } => commands::keygen(&config, output.as_deref())?,
        command => {
            let ctx = AppContext::new(config).await?;
            run(&ctx, command).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&out)?);
    Ok(())
}

async fn run(ctx: &AppContext, command: Commands) -> anyhow::Result<Value> {
    let out = match command {
        Commands::Init => commands::init(ctx).await?,

        Commands::Trust(TrustCommand::Create {
            id,
            name,
            capital,
            bond_limit,
            other_limit,
            consensus,
        }) => {
            commands::create_trust(ctx, &id, &name, capital, bond_limit, other_limit, consensus)
                .await?
        }

        Commands::Actor(ActorCommand::Add {
            id,
            name,
            role,
            super_admin,
        }) => commands::add_actor(ctx, &id, &name, role, super_admin).await?,

        Commands::Member(MemberCommand::Assign { actor, trust, role }) => {
            commands::assign_member(ctx, &actor, &trust, role).await?
        }
        Commands::Member(MemberCommand::Remove { actor, trust }) => {
            commands::remove_member(ctx, &actor, &trust).await?
        }

        Commands::Fee(FeeCommand::Study {
            trust,
            amount,
            annual,
            paid,
        }) => commands::set_fees(ctx, &trust, amount, annual, paid).await?,
        Commands::Fee(FeeCommand::Month {
            trust,
            year,
            month,
            amount,
        }) => commands::record_month(ctx, &trust, year, month, amount).await?,

        Commands::Asset(AssetCommand::Register {
            trust,
            asset_type,
            value,
            registered_by,
            description,
            document_hash,
            beneficiary,
            loan_file,
        }) => {
            let loan = loan_file.as_deref().map(commands::read_loan).transpose()?;
            let request = RegisterAsset {
                trust_id: trust,
                asset_type,
                value_mxn: value,
                description,
                document_hash,
                beneficiary_id: beneficiary,
                loan,
                registered_by,
            };
            commands::register_asset(ctx, request).await?
        }
        Commands::Asset(AssetCommand::Show { asset_id, viewer }) => {
            commands::show_asset(ctx, &asset_id, viewer.as_deref()).await?
        }
        Commands::Asset(AssetCommand::List {
            trust,
            asset_type,
            status,
            beneficiary,
            limit,
            offset,
            viewer,
        }) => {
            commands::list_assets(
                ctx,
                &trust,
                asset_type,
                status,
                beneficiary,
                limit,
                offset,
                viewer.as_deref(),
            )
            .await?
        }

        Commands::Exception(ExceptionCommand::Approve { asset_id, actor, reason }) => {
            commands::approve(ctx, &asset_id, &actor, reason).await?
        }
        Commands::Exception(ExceptionCommand::Reject { asset_id, actor, reason }) => {
            commands::reject(ctx, &asset_id, &actor, reason).await?
        }
        Commands::Exception(ExceptionCommand::Vote {
            asset_id,
            voter,
            choice,
            reason,
        }) => commands::vote(ctx, &asset_id, &voter, choice, reason).await?,
        Commands::Exception(ExceptionCommand::Status { asset_id }) => {
            commands::voting_status(ctx, &asset_id).await?
        }

        Commands::Keygen { output } => commands::keygen(&ctx.config, output.as_deref())?,
    };
    Ok(out)
}
