use anyhow::{anyhow, Context, Result};
use clap::Args;
use std::path::PathBuf;

use seekpage::config::{Config, DatabaseConfig};
use seekpage::database::create_pool;
use seekpage::handlers::{PageQuery, PageResponse};
use seekpage::keyset::{SortSpec, TotalsMode};
use seekpage::observability::init_tracing;
use seekpage::postgres::PgExecutor;

use crate::utils::filter::parse_filter;

#[derive(Args, Debug)]
pub struct PageArgs {
    /// Table or view to page through
    #[arg(short, long)]
    pub table: String,

    /// Sort spec: comma separated `column[:asc|desc[:date|number|string]]`;
    /// the last column must be unique
    #[arg(short, long, default_value = "id:asc")]
    pub sort: String,

    /// Page size (clamped to the configured maximum)
    #[arg(short, long)]
    pub limit: Option<u32>,

    /// Cursor token from a previous page's `nextToken`
    #[arg(short, long)]
    pub after: Option<String>,

    /// Filter, e.g. `status=active`, `age>=18`, `name~Proj%`, `deleted_at=null`
    #[arg(short, long = "filter", value_name = "FILTER")]
    pub filter: Vec<String>,

    /// Follow cursors to the last page and print every row as a JSON line
    #[arg(long)]
    pub all: bool,

    /// Do not run count queries
    #[arg(long)]
    pub no_totals: bool,

    /// Pretty-print the page
    #[arg(long)]
    pub pretty: bool,

    /// Config file (defaults to the standard search path)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Database URL, overriding the config file
    #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
    pub database_url: Option<String>,
}

pub async fn execute(args: PageArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => Config::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::load().context("Failed to load config")?,
    };
    init_tracing(&config)?;

    let db = database_config(&config, args.database_url.as_deref())?;
    let spec = SortSpec::parse(&args.sort)?;
    let filters = args
        .filter
        .iter()
        .map(|f| parse_filter(f))
        .collect::<Result<Vec<_>>>()?;

    let query = PageQuery {
        after: args.after.clone(),
        limit: args.limit,
    };
    let request = query.to_request_for(&config.pagination, &spec, filters)?;

    let mut paginator = config.pagination.paginator(spec.clone());
    if args.no_totals {
        paginator = paginator.with_totals(TotalsMode::Skip);
    }

    let pool = create_pool(&db).await?;
    let executor = PgExecutor::new(pool, &args.table, &spec)?;

    tracing::debug!(table = %args.table, sort = %spec.to_order_clause(), "Paging");

    if args.all {
        let rows = paginator.collect_all(&executor, request).await?;
        for row in rows {
            println!("{}", serde_json::to_string(&row)?);
        }
        return Ok(());
    }

    let page = paginator.paginate(&executor, request).await?;
    let response = PageResponse::from(page);
    let body = if args.pretty {
        serde_json::to_string_pretty(&response)?
    } else {
        serde_json::to_string(&response)?
    };
    println!("{}", body);
    Ok(())
}

/// Database settings from the config file, with the URL optionally replaced
fn database_config(config: &Config, url: Option<&str>) -> Result<DatabaseConfig> {
    match (config.database.clone(), url) {
        (Some(mut db), Some(url)) => {
            db.url = url.to_string();
            Ok(db)
        }
        (Some(db), None) => Ok(db),
        (None, Some(url)) => Ok(DatabaseConfig::new(url)),
        (None, None) => Err(anyhow!(
            "No database configured: pass --database-url, set DATABASE_URL, \
             or add a [database] section to config.toml"
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_database_url_override() {
        let mut config = Config::default();
        assert!(database_config(&config, None).is_err());

        let db = database_config(&config, Some("postgres://localhost/a")).unwrap();
        assert_eq!(db.url, "postgres://localhost/a");

        config.database = Some(DatabaseConfig {
            max_connections: 3,
            ..DatabaseConfig::new("postgres://localhost/b")
        });
        assert_eq!(database_config(&config, None).unwrap().url, "postgres://localhost/b");

        let overridden = database_config(&config, Some("postgres://localhost/c")).unwrap();
        assert_eq!(overridden.url, "postgres://localhost/c");
        assert_eq!(overridden.max_connections, 3);
    }
}
