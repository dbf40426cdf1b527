use crate::app::{AppContext, FeedkeeperError, Result};
use crate::daemon::Daemon;
use crate::domain::FeedSource;
use crate::query::Projection;

pub async fn run(ctx: &AppContext) -> Result<()> {
    Daemon::new(ctx.aggregator.clone(), ctx.settings.clone())
        .run()
        .await
}

pub async fn sync(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.aggregator.load().await?;

    if feeds.is_empty() {
        println!("No feeds to sync");
        return Ok(());
    }

    println!("Syncing {} feeds...", feeds.len());

    let mut total_new = 0;
    let mut errors = 0;

    for (feed, result) in ctx.aggregator.sync_all().await {
        match result {
            Ok(count) => {
                total_new += count;
                if count > 0 {
                    println!("  {} new items from {}", count, feed.display_title());
                }
            }
            Err(e) => {
                errors += 1;
                eprintln!("  Error syncing {}: {}", feed.display_title(), e);
            }
        }
    }

    println!("Sync complete: {} new items, {} errors", total_new, errors);
    Ok(())
}

pub async fn list_items(ctx: &AppContext, search: &str) -> Result<()> {
    ctx.aggregator.load().await?;
    let projection = ctx.aggregator.query(search);

    if projection.is_empty() {
        println!("No items");
        return Ok(());
    }

    print!("{}", render(&projection));
    Ok(())
}

/// Unread group first, each newest first.
fn render(projection: &Projection) -> String {
    let mut out = String::new();

    for read in [false, true] {
        let mut group = projection
            .entries
            .iter()
            .filter(|item| item.entry.is_read == read)
            .peekable();
        let Some(first) = group.peek() else {
            continue;
        };
        out.push_str(&projection.group_label(first));
        out.push('\n');

        for item in group {
            out.push_str(&format!(
                "  {} {} [{}]\n    {}\n",
                item.entry.published_at.format("%Y-%m-%d %H:%M"),
                item.entry.display_title(),
                item.feed.display_title(),
                item.entry.link
            ));
        }
    }

    out
}

pub async fn mark_read(ctx: &AppContext, link: &str) -> Result<()> {
    ctx.aggregator.load().await?;
    if ctx.aggregator.mark_as_read(link).await? {
        println!("Marked as read: {}", link);
    } else {
        println!("Nothing to mark: {}", link);
    }
    Ok(())
}

pub async fn mark_feed_read(ctx: &AppContext, url: &str) -> Result<()> {
    ctx.aggregator.load().await?;
    if !ctx.aggregator.feeds().iter().any(|f| f.url == url) {
        return Err(FeedkeeperError::FeedNotFound(url.to_string()));
    }
    let count = ctx.aggregator.mark_all_as_read_in_feed(url).await?;
    println!("Marked {} items as read", count);
    Ok(())
}

pub async fn mark_all_read(ctx: &AppContext) -> Result<()> {
    ctx.aggregator.load().await?;
    let count = ctx.aggregator.mark_all_as_read().await?;
    println!("Marked {} items as read", count);
    Ok(())
}

pub async fn open_item(ctx: &AppContext, link: &str) -> Result<()> {
    ctx.aggregator.load().await?;
    if !ctx.aggregator.contains(link) {
        return Err(FeedkeeperError::ItemNotFound(link.to_string()));
    }
    ctx.aggregator.open_link(link).await?;
    Ok(())
}

pub async fn list_feeds(ctx: &AppContext) -> Result<()> {
    let feeds = ctx.aggregator.load().await?;

    if feeds.is_empty() {
        println!("No feeds");
        return Ok(());
    }

    let projection = ctx.aggregator.query("");
    for feed in feeds {
        let unread = projection
            .entries
            .iter()
            .filter(|i| i.feed.url == feed.url && !i.entry.is_read)
            .count();
        println!(
            "{} ({} unread, every {}m, keeps {})\n  {}",
            feed.display_title(),
            unread,
            feed.refresh_interval,
            feed.retention_count,
            feed.url
        );
    }

    Ok(())
}

pub async fn add_feed(ctx: &AppContext, source: FeedSource) -> Result<()> {
    source.validate()?;
    let mut feeds = ctx.aggregator.load().await?;

    if feeds.iter().any(|f| f.url == source.url) {
        println!("Feed already exists: {}", source.url);
        return Ok(());
    }

    println!("Added feed: {}", source.url);
    feeds.push(source);
    ctx.aggregator.set_feeds(&feeds).await
}

pub async fn remove_feed(ctx: &AppContext, url: &str) -> Result<()> {
    let mut feeds = ctx.aggregator.load().await?;
    let before = feeds.len();
    feeds.retain(|f| f.url != url);

    if feeds.len() == before {
        return Err(FeedkeeperError::FeedNotFound(url.to_string()));
    }

    ctx.aggregator.set_feeds(&feeds).await?;
    println!("Removed feed: {}", url);
    Ok(())
}
