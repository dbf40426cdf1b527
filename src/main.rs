use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use feedkeeper::app::AppContext;
use feedkeeper::cli::{commands, Cli, Commands, FeedsAction};
use feedkeeper::domain::FeedSource;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("feedkeeper=info")))
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config).await?;

    match cli.command {
        Commands::Run => commands::run(&ctx).await?,
        Commands::Sync => commands::sync(&ctx).await?,
        Commands::List { search } => {
            commands::list_items(&ctx, search.as_deref().unwrap_or("")).await?
        }
        Commands::Read { link } => commands::mark_read(&ctx, &link).await?,
        Commands::ReadFeed { url } => commands::mark_feed_read(&ctx, &url).await?,
        Commands::ReadAll => commands::mark_all_read(&ctx).await?,
        Commands::Open { link } => commands::open_item(&ctx, &link).await?,
        Commands::Feeds { action } => match action {
            FeedsAction::List => commands::list_feeds(&ctx).await?,
            FeedsAction::Add {
                url,
                title,
                interval,
                max_items,
                retention,
            } => {
                let mut source = FeedSource::new(title.unwrap_or_default(), url, interval)
                    .with_retention(retention);
                source.max_items = max_items;
                commands::add_feed(&ctx, source).await?
            }
            FeedsAction::Remove { url } => commands::remove_feed(&ctx, &url).await?,
        },
    }

    Ok(())
}
