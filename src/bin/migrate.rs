use anyhow::{anyhow, Result};
use konkur_countdown_bot::config::Config;
use konkur_countdown_bot::database::connection::DatabaseManager;
use std::env;
use std::io;
use std::path::Path;

const TABLES: [&str; 3] = ["subscribers", "reminder_rules", "study_entries"];

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize basic logging for the migration
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("migrate");

    match command {
        "migrate" | "up" => run_migrations().await,
        "check" => check_database().await,
        "reset" => reset_database().await,
        "help" | "--help" | "-h" => {
            print_help();
            Ok(())
        }
        _ => {
            eprintln!("Unknown command: {command}");
            print_help();
            std::process::exit(1);
        }
    }
}

fn load_database_url() -> Result<String> {
    dotenvy::dotenv().ok();
    Ok(Config::from_env()?.database_url)
}

fn sqlite_path(database_url: &str) -> Option<&str> {
    database_url.strip_prefix("sqlite:")
}

async fn connect(database_url: &str) -> Result<DatabaseManager> {
    DatabaseManager::new(database_url)
        .await
        .map_err(|e| anyhow!("Failed to connect to database: {}", e))
}

async fn run_migrations() -> Result<()> {
    println!("🔧 Konkur Countdown Bot - Database Migration Tool");
    println!("=================================================");

    let database_url = load_database_url()?;
    println!("📊 Database URL: {}", mask_url(&database_url));

    // SQLite will not create missing parent directories
    if let Some(parent) = sqlite_path(&database_url).and_then(|p| Path::new(p).parent()) {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            println!("📁 Creating directory: {}", parent.display());
            std::fs::create_dir_all(parent)?;
        }
    }

    println!("🚀 Running database migrations...");
    let db_manager = connect(&database_url).await?;

    if let Err(e) = db_manager.run_migrations().await {
        eprintln!("❌ Migration failed: {e}");
        std::process::exit(1);
    }
    println!("✅ Migrations completed successfully!");
    Ok(())
}

async fn check_database() -> Result<()> {
    println!("🔍 Checking database connection and schema...");

    let database_url = load_database_url()?;
    println!("📊 Database URL: {}", mask_url(&database_url));
    let db_manager = connect(&database_url).await?;

    let found = match list_tables(&db_manager).await {
        Ok(found) => found,
        Err(e) => {
            println!("⚠️  Database check failed: {e}");
            return Ok(());
        }
    };

    println!("✅ Database connection successful!");
    for table in TABLES {
        if found.iter().any(|t| t == table) {
            let rows = count_rows(&db_manager, table).await?;
            println!("  • {table}: {rows} rows");
        } else {
            println!("  • {table}: missing");
        }
    }
    if TABLES.iter().any(|t| !found.iter().any(|f| f == t)) {
        println!("💡 Try running 'migrate up' to create the schema");
    }
    Ok(())
}

async fn reset_database() -> Result<()> {
    println!("⚠️  WARNING: This will delete ALL subscribers, reminders and study logs!");
    println!("🤔 Are you sure you want to continue? (yes/no)");

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    if input.trim().to_lowercase() != "yes" {
        println!("❌ Reset cancelled.");
        return Ok(());
    }

    let database_url = load_database_url()?;
    let Some(db_path) = sqlite_path(&database_url) else {
        return Err(anyhow!("Reset is only supported for SQLite databases"));
    };
    if Path::new(db_path).exists() {
        std::fs::remove_file(db_path)?;
        println!("🗑️  Deleted database file: {db_path}");
    }

    println!("🔄 Recreating database schema...");
    run_migrations().await?;
    println!("✅ Database reset completed!");
    Ok(())
}

async fn list_tables(db_manager: &DatabaseManager) -> Result<Vec<String>> {
    let names = sqlx::query_scalar::<_, String>(
        "SELECT name FROM sqlite_master WHERE type='table' ORDER BY name",
    )
    .fetch_all(&db_manager.pool)
    .await?;

    Ok(names)
}

async fn count_rows(db_manager: &DatabaseManager, table: &str) -> Result<i64> {
    // `table` only ever comes from TABLES
    let query = format!("SELECT COUNT(*) FROM {table}");
    let count = sqlx::query_scalar::<_, i64>(&query)
        .fetch_one(&db_manager.pool)
        .await?;
    Ok(count)
}

fn mask_url(url: &str) -> String {
    match sqlite_path(url).and_then(|p| Path::new(p).file_name()) {
        Some(filename) => format!("sqlite:.../{}", filename.to_string_lossy()),
        None => url.to_string(),
    }
}

fn print_help() {
    println!("📚 Konkur Countdown Bot - Database Migration Tool");
    println!();
    println!("USAGE:");
    println!("    migrate [COMMAND]");
    println!();
    println!("COMMANDS:");
    println!("    migrate, up    Run database migrations (default)");
    println!("    check          Check the schema and count rows per table");
    println!("    reset          Reset database (SQLite only) - DESTRUCTIVE!");
    println!("    help           Show this help message");
    println!();
    println!("ENVIRONMENT:");
    println!("    DATABASE_URL        Database connection string (default: sqlite:./data/countdown.db)");
    println!("    TELEGRAM_BOT_TOKEN  Required, since the bot configuration is loaded");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_url() {
        assert_eq!(mask_url("sqlite:./data/countdown.db"), "sqlite:.../countdown.db");
        assert_eq!(mask_url("postgres://x"), "postgres://x");
    }
}
