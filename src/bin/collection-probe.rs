//! # collection-probe
//!
//! Loads one page of a remote collection and logs what came back.
//!
//! ```bash
//! RUST_LOG=info collection-probe http://127.0.0.1:8000 /facet/docente/ \
//!     --filter nombre__icontains=Juan --show-all --page 2
//! ```

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use remote_collection::tracing::setup_tracing;
use remote_collection::{
    CollectionConfig, CollectionController, CursorStyle, FilterRules, FilterSet, HttpConfig, HttpTransport,
    RewriteRule,
};
use serde_json::Value;
use tracing::{error, info, Instrument};

#[derive(Parser, Debug)]
#[command(name = "collection-probe", about = "Fetch one page of a paginated REST collection")]
struct Args {
    /// Server origin, e.g. http://127.0.0.1:8000
    origin: String,

    /// Collection path, e.g. /facet/area/
    path: String,

    /// Mount prefix added on the wire and stripped from returned links, e.g. /api
    #[arg(long)]
    mount_prefix: Option<String>,

    #[arg(long, default_value_t = 10)]
    page_size: u32,

    /// Use limit/offset cursors instead of page numbers
    #[arg(long)]
    offset: bool,

    /// Filter as key=value; repeatable
    #[arg(long = "filter", value_parser = parse_filter)]
    filters: Vec<(String, String)>,

    /// Include inactive records (estado=todos)
    #[arg(long)]
    show_all: bool,

    /// Page to load after applying filters
    #[arg(long, default_value_t = 1)]
    page: u32,

    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn parse_filter(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))
}

#[tokio::main]
async fn main() -> Result<(), String> {
    setup_tracing();
    let args = Args::parse();

    let mut http = HttpConfig::new(&args.origin)
        .map_err(|e| e.to_string())?
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let mut config = CollectionConfig::new(&args.path)
        .with_page_size(args.page_size)
        .with_filter_rules(FilterRules::new().with_rewrite(RewriteRule::show_all_statuses()));
    if let Some(prefix) = &args.mount_prefix {
        http = http.with_mount_prefix(prefix);
        config = config.with_api_prefix(prefix);
    }
    if args.offset {
        config = config.with_cursor_style(CursorStyle::Offset);
    }

    let transport = HttpTransport::new(http).map_err(|e| e.to_string())?;
    let controller = CollectionController::<Value>::new(config, Arc::new(transport)).map_err(|e| e.to_string())?;

    let mut filters: FilterSet = args.filters.into_iter().collect();
    if args.show_all {
        filters.insert("estado", "todos");
    }

    let span = tracing::info_span!("probe", path = %args.path);
    let result = async {
        controller.apply_filters(&filters).await?;
        if args.page > 1 {
            controller.go_to_page(args.page).await?;
        }
        Ok::<_, remote_collection::CollectionError>(controller.view())
    }
    .instrument(span)
    .await;

    match result {
        Ok(view) => {
            info!(
                page = view.current_page,
                total_pages = view.total_pages,
                total = view.total_count,
                items = view.items.len(),
                has_next = view.has_next,
                has_previous = view.has_previous,
                "Probe complete"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, kind = ?e.kind(), retryable = e.is_retryable(), "Probe failed");
            Err(e.to_string())
        }
    }
}
