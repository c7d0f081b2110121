//! CLI administration tool for linkcore.
//!
//! Runs the same management services as the HTTP API, acting as an admin,
//! directly against PostgreSQL.
//!
//! # Usage
//!
//! ```bash
//! # List URLs, most clicked first
//! cargo run --bin admin -- urls list --sort-by clicks
//!
//! # Flag a code for moderation
//! cargo run --bin admin -- urls flag promo42 --reason "phishing"
//!
//! # Orphan the URLs of a deleted user
//! cargo run --bin admin -- users release user-123
//!
//! # Load demo data
//! cargo run --bin admin -- seed
//!
//! # Check database connection
//! cargo run --bin admin -- db check
//! ```
//!
//! # Environment Variables
//!
//! - `DATABASE_URL` or `DB_*` (required): PostgreSQL connection
//! - `REDIS_URL` or `REDIS_*` (optional): cache entries are invalidated on change

use linkcore::application::services::{
    CodeArbiter, CodePolicy, ManagementService, ShorteningService,
};
use linkcore::config::{Config, mask_connection_string};
use linkcore::domain::entities::{Identity, UrlRecord};
use linkcore::domain::repositories::{ListQuery, OwnerFilter, SortDir, SortKey, UrlRepository};
use linkcore::error::AppError;
use linkcore::infrastructure::cache::{CacheService, NullCache, RedisCache};
use linkcore::infrastructure::persistence::PgUrlRepository;
use linkcore::utils::code_generator::RandomCodeGenerator;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use colored::*;
use dialoguer::Confirm;
use rand::Rng;
use sqlx::PgPool;
use std::sync::Arc;

/// Identity used for every CLI operation.
const CLI_ADMIN: &str = "admin-cli";

/// Fixed aliases created by `seed`.
const SEED_FIXTURES: &[(&str, &str)] = &[
    ("github", "https://github.com"),
    ("nextjs", "https://nextjs.org"),
    ("tailwind", "https://tailwindcss.com"),
    ("react", "https://react.dev"),
    ("typescript", "https://www.typescriptlang.org"),
    ("example", "https://example.com"),
    ("google", "https://www.google.com"),
];

/// CLI tool for managing linkcore.
#[derive(Parser)]
#[command(name = "admin")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Top-level command groups.
#[derive(Subcommand)]
enum Commands {
    /// Inspect and moderate short URLs
    Urls {
        #[command(subcommand)]
        action: UrlAction,
    },

    /// User lifecycle operations
    Users {
        #[command(subcommand)]
        action: UserAction,
    },

    /// Show statistics
    Stats,

    /// Insert demo records
    Seed {
        /// Number of additional records with random codes
        #[arg(short, long, default_value_t = 10)]
        random: u32,

        /// Owner of the seeded records
        #[arg(short, long, default_value = "demo-user")]
        owner: String,
    },

    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbAction,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum SortArg {
    CreatedAt,
    Clicks,
    ShortCode,
}

impl From<SortArg> for SortKey {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::CreatedAt => SortKey::CreatedAt,
            SortArg::Clicks => SortKey::Clicks,
            SortArg::ShortCode => SortKey::ShortCode,
        }
    }
}

/// URL subcommands. Records are addressed by short code.
#[derive(Subcommand)]
enum UrlAction {
    /// List URLs
    List {
        /// Only this owner's URLs (`anonymous` for unowned)
        #[arg(long)]
        owner: Option<String>,

        /// Substring of the original URL or code
        #[arg(short, long)]
        search: Option<String>,

        #[arg(long, value_enum, default_value_t = SortArg::CreatedAt)]
        sort_by: SortArg,

        /// Ascending order (default is descending)
        #[arg(long)]
        asc: bool,

        #[arg(short, long, default_value_t = 1)]
        page: u32,

        #[arg(long, default_value_t = 25)]
        page_size: u32,
    },

    /// Flag a URL; it stops redirecting
    Flag {
        code: String,

        #[arg(short, long)]
        reason: Option<String>,
    },

    /// Lift a flag
    Unflag { code: String },

    /// Permanently delete a URL and free its code
    Delete {
        code: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserAction {
    /// Detach a deleted user's URLs (they become anonymous, never deleted)
    Release {
        user_id: String,

        /// Skip confirmation prompt
        #[arg(short = 'y', long)]
        yes: bool,
    },
}

/// Database operation subcommands.
#[derive(Subcommand)]
enum DbAction {
    /// Check database connection
    Check,

    /// Show database info
    Info,
}

/// Services wired for an admin session.
struct Admin {
    repository: Arc<PgUrlRepository>,
    management: ManagementService<PgUrlRepository>,
    shortening: ShorteningService<PgUrlRepository>,
    identity: Identity,
}

impl Admin {
    async fn connect(pool: &PgPool) -> Self {
        let repository = Arc::new(PgUrlRepository::new(Arc::new(pool.clone())));
        let cache = connect_cache().await;
        let arbiter = Arc::new(CodeArbiter::new(
            repository.clone(),
            Arc::new(RandomCodeGenerator::default()),
            CodePolicy::default(),
        ));

        Self {
            management: ManagementService::new(repository.clone(), arbiter.clone(), cache),
            shortening: ShorteningService::new(arbiter),
            repository,
            identity: Identity::admin(CLI_ADMIN),
        }
    }

    async fn find(&self, code: &str) -> Result<UrlRecord> {
        self.repository
            .find_by_code(code)
            .await
            .map_err(|e| anyhow::anyhow!("Database error: {}", e))?
            .with_context(|| format!("No URL with code '{}'", code))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let database_url = Config::load_database_url().context("Failed to load database configuration")?;

    let pool = PgPool::connect(&database_url)
        .await
        .with_context(|| {
            format!(
                "Failed to connect to database at {}",
                mask_connection_string(&database_url)
            )
        })?;

    match cli.command {
        Commands::Urls { action } => {
            handle_url_action(action, &Admin::connect(&pool).await).await?
        }
        Commands::Users { action } => {
            handle_user_action(action, &Admin::connect(&pool).await).await?
        }
        Commands::Stats => handle_stats(&Admin::connect(&pool).await).await?,
        Commands::Seed { random, owner } => {
            handle_seed(&Admin::connect(&pool).await, &pool, random, owner).await?
        }
        Commands::Db { action } => handle_db_action(action, &pool).await?,
    }

    Ok(())
}

/// Redis when configured and reachable, otherwise no invalidation.
async fn connect_cache() -> Arc<dyn CacheService> {
    let Some(redis_url) = Config::load_redis_url() else {
        return Arc::new(NullCache::new());
    };

    match RedisCache::connect(&redis_url, 3600).await {
        Ok(redis) => Arc::new(redis),
        Err(e) => {
            println!(
                "{}",
                format!("⚠️  Redis unavailable ({}), cache entries will expire on their own", e)
                    .yellow()
            );
            Arc::new(NullCache::new())
        }
    }
}

fn service_error(e: AppError) -> anyhow::Error {
    anyhow::anyhow!("{} ({})", e, e.code())
}

/// Dispatches URL commands.
async fn handle_url_action(action: UrlAction, admin: &Admin) -> Result<()> {
    match action {
        UrlAction::List {
            owner,
            search,
            sort_by,
            asc,
            page,
            page_size,
        } => {
            let owner = match owner.as_deref() {
                None => OwnerFilter::Any,
                Some("anonymous") => OwnerFilter::Anonymous,
                Some(id) => OwnerFilter::User(id.to_string()),
            };
            let query = ListQuery {
                search,
                page,
                page_size,
                sort_by: sort_by.into(),
                sort_dir: if asc { SortDir::Asc } else { SortDir::Desc },
            };
            list_urls(admin, owner, query).await?;
        }
        UrlAction::Flag { code, reason } => {
            let record = admin.find(&code).await?;
            let record = admin
                .management
                .flag(record.id, reason, &admin.identity)
                .await
                .map_err(service_error)?;

            println!(
                "{} {} {}",
                "🚩 Flagged".red().bold(),
                record.short_code.cyan(),
                record.flag_reason.unwrap_or_default().bright_black()
            );
        }
        UrlAction::Unflag { code } => {
            let record = admin.find(&code).await?;
            let record = admin
                .management
                .unflag(record.id, &admin.identity)
                .await
                .map_err(service_error)?;

            println!("{} {}", "✅ Unflagged".green().bold(), record.short_code.cyan());
        }
        UrlAction::Delete { code, yes } => {
            let record = admin.find(&code).await?;

            println!("  Code:   {}", record.short_code.cyan());
            println!("  Target: {}", record.original_url.bright_white());
            println!("  Clicks: {}", record.clicks.to_string().bright_black());
            println!();

            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt("Delete this URL permanently?")
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            admin
                .management
                .remove(record.id, &admin.identity)
                .await
                .map_err(service_error)?;

            println!("{}", "✅ URL deleted, code is free again".green().bold());
        }
    }

    Ok(())
}

/// Prints one page of URLs as a table.
async fn list_urls(admin: &Admin, owner: OwnerFilter, query: ListQuery) -> Result<()> {
    println!("{}", "📋 URLs".bright_blue().bold());
    println!();

    let page = query.page;
    let (records, total) = admin
        .management
        .list(owner, query)
        .await
        .map_err(service_error)?;

    if records.is_empty() {
        println!("{}", "  No URLs found".yellow());
        return Ok(());
    }

    println!(
        "  {:<6} {:<20} {:<8} {:<16} {:<8} {}",
        "ID".bright_white().bold(),
        "Code".bright_white().bold(),
        "Clicks".bright_white().bold(),
        "Owner".bright_white().bold(),
        "Status".bright_white().bold(),
        "Target".bright_white().bold()
    );
    println!("  {}", "─".repeat(90).bright_black());

    for record in &records {
        let status = if record.flagged {
            "FLAGGED".red()
        } else {
            "LIVE".green()
        };

        println!(
            "  {:<6} {:<20} {:<8} {:<16} {:<8} {}",
            record.id.to_string().bright_black(),
            record.short_code.cyan(),
            record.clicks,
            record.owner_id.as_deref().unwrap_or("-"),
            status,
            record.original_url
        );
    }

    println!();
    println!(
        "  Page {} · showing {} of {}",
        page,
        records.len().to_string().bright_white().bold(),
        total.to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

async fn handle_user_action(action: UserAction, admin: &Admin) -> Result<()> {
    match action {
        UserAction::Release { user_id, yes } => {
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!(
                        "Detach all URLs owned by '{}'? They stay live as anonymous URLs",
                        user_id
                    ))
                    .default(false)
                    .interact()?;

                if !confirmed {
                    println!("{}", "❌ Cancelled".red());
                    return Ok(());
                }
            }

            let released = admin
                .management
                .release_owner(&user_id, &admin.identity)
                .await
                .map_err(service_error)?;

            println!(
                "{} {} URL(s) released from {}",
                "✅".green(),
                released.to_string().bright_white().bold(),
                user_id.cyan()
            );
        }
    }

    Ok(())
}

/// Displays store totals.
async fn handle_stats(admin: &Admin) -> Result<()> {
    println!("{}", "📊 Statistics".bright_blue().bold());
    println!();

    let summary = admin
        .management
        .summary(&admin.identity)
        .await
        .map_err(service_error)?;

    println!(
        "  URLs:       {}",
        summary.total_urls.to_string().bright_green().bold()
    );
    println!(
        "  Clicks:     {}",
        summary.total_clicks.to_string().bright_green().bold()
    );
    println!(
        "  Flagged:    {}",
        summary.flagged_urls.to_string().bright_red().bold()
    );
    println!(
        "  Anonymous:  {}",
        summary.anonymous_urls.to_string().bright_black().bold()
    );
    println!();

    Ok(())
}

/// Inserts fixed aliases plus `random` generated codes, with random click counts.
///
/// Aliases that already exist are skipped, so seeding is repeatable.
async fn handle_seed(admin: &Admin, pool: &PgPool, random: u32, owner: String) -> Result<()> {
    println!("{}", "🌱 Seeding demo data".bright_blue().bold());
    println!();

    let mut created = Vec::new();

    for &(code, url) in SEED_FIXTURES {
        match admin
            .shortening
            .shorten(url, Some(code), Some(owner.clone()))
            .await
        {
            Ok(record) => created.push(record),
            Err(AppError::CodeTaken { .. }) => {
                println!("  {} {} (exists)", "·".bright_black(), code.bright_black());
            }
            Err(e) => return Err(service_error(e)),
        }
    }

    for i in 0..random {
        let url = format!("https://example.com/demo/{}", i + 1);
        let record = admin
            .shortening
            .shorten(&url, None, Some(owner.clone()))
            .await
            .map_err(service_error)?;
        created.push(record);
    }

    let clicks: Vec<(i64, i64)> = {
        let mut rng = rand::rng();
        created
            .iter()
            .map(|record| (record.id, rng.random_range(0..500)))
            .collect()
    };

    for (id, count) in clicks {
        sqlx::query("UPDATE urls SET clicks = $2 WHERE id = $1")
            .bind(id)
            .bind(count)
            .execute(pool)
            .await?;
    }

    for record in &created {
        println!("  {} {}", "+".green(), record.short_code.cyan());
    }

    println!();
    println!(
        "{} {} URL(s) created",
        "✅".green(),
        created.len().to_string().bright_white().bold()
    );
    println!();

    Ok(())
}

/// Handles database diagnostic commands.
async fn handle_db_action(action: DbAction, pool: &PgPool) -> Result<()> {
    match action {
        DbAction::Check => {
            println!("{}", "🔍 Checking database connection...".bright_blue());

            sqlx::query("SELECT 1").fetch_one(pool).await?;

            println!("{}", "✅ Database connection OK".green().bold());
        }
        DbAction::Info => {
            println!("{}", "ℹ️  Database Information".bright_blue().bold());
            println!();

            let version: String = sqlx::query_scalar("SELECT version()")
                .fetch_one(pool)
                .await?;

            let migrations: i64 = sqlx::query_scalar(
                "SELECT COUNT(*) FROM _sqlx_migrations WHERE success",
            )
            .fetch_one(pool)
            .await
            .unwrap_or(0);

            println!("  PostgreSQL: {}", version.bright_white());
            println!("  Migrations: {}", migrations.to_string().bright_white());
            println!();
        }
    }

    Ok(())
}
