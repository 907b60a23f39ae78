use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc::unbounded_channel;
use tokio::time::{interval, MissedTickBehavior};

use crate::app::{AppContext, EddyError, Result};
use crate::config::format_interval;
use crate::domain::{check_channel, Item};
use crate::feed::{LoadOlder, ScrollState};
use crate::store::TrackedChannels;

pub fn track_add(ctx: &AppContext, channel: &str) -> Result<()> {
    let mut tracked = TrackedChannels::load(ctx.store.as_ref())?;
    if tracked.add(channel)? {
        println!("Tracking {}", channel);
    } else {
        println!("Already tracking {}", channel);
    }
    Ok(())
}

pub fn track_remove(ctx: &AppContext, channel: &str) -> Result<()> {
    let mut tracked = TrackedChannels::load(ctx.store.as_ref())?;
    if !tracked.remove(channel)? {
        return Err(EddyError::NotFound(format!("{} is not tracked", channel)));
    }
    println!("Stopped tracking {}", channel);
    Ok(())
}

pub fn track_list(ctx: &AppContext) -> Result<()> {
    let tracked = TrackedChannels::load(ctx.store.as_ref())?;

    if tracked.channels().is_empty() {
        println!("No tracked channels");
        return Ok(());
    }

    for channel in tracked.channels() {
        match ctx.channels.peek(channel) {
            Some(meta) => println!("{} ({})", channel, meta.display_title()),
            None => println!("{}", channel),
        }
    }
    Ok(())
}

pub async fn show_info(ctx: &AppContext, channel: &str) -> Result<()> {
    check_channel(channel)?;

    let meta = ctx
        .channels
        .get(channel.to_string())
        .await
        .ok_or_else(|| EddyError::NotFound(format!("channel {} unavailable", channel)))?;

    println!("{}", meta.display_title());
    println!("  @{}", meta.name);
    if let Some(subscribers) = meta.subscribers {
        println!("  {} subscribers", subscribers);
    }
    if let Some(description) = &meta.description {
        println!("\n{}", description);
    }
    Ok(())
}

pub async fn history(ctx: &AppContext, channel: &str, pages: usize) -> Result<()> {
    check_channel(channel)?;

    let (tx, _notices) = unbounded_channel();
    let sync = ctx.synchronizer(channel, Arc::new(ScrollState::default()), tx);
    sync.initialize().await?;

    for _ in 0..pages {
        match sync.load_more().await? {
            LoadOlder::Appended(count) => tracing::debug!("{}: +{} older posts", channel, count),
            LoadOlder::Exhausted | LoadOlder::Skipped => break,
        }
    }

    let items = sync.pager().items();
    if items.is_empty() {
        println!("No posts");
        return Ok(());
    }
    for item in &items {
        println!("{}", render_item(item));
    }
    if sync.status().no_more_older {
        println!("-- beginning of channel --");
    }
    Ok(())
}

pub async fn watch(ctx: &AppContext, channel: &str) -> Result<()> {
    check_channel(channel)?;

    let (tx, mut notices) = unbounded_channel();
    // Output only ever grows at the bottom, so the reader is always at the top
    let scroll = Arc::new(ScrollState::new(true));
    let sync = ctx.synchronizer(channel, scroll, tx);

    let initial = sync.initialize().await?;
    let mut items = sync.pager().items();
    items.reverse();
    show(ctx, &items);

    println!(
        "Watching {} ({} posts, polling every {})",
        channel,
        initial,
        format_interval(ctx.config.sync.poll_interval().as_secs())
    );

    sync.start();
    let scheduler = ctx.start_analytics();

    let mut ticker = interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => break,
            Some(notice) = notices.recv() => eprintln!("{}", notice),
            _ = ticker.tick() => {
                let applied = sync.apply_staged();
                if applied > 0 {
                    let mut fresh: Vec<Item> = sync.pager().items().into_iter().take(applied).collect();
                    fresh.reverse();
                    show(ctx, &fresh);
                }
            }
        }
    }

    sync.shutdown();
    scheduler.cancel();
    ctx.analytics.shutdown();
    match ctx.analytics.flush().await {
        Ok(0) => {}
        Ok(sent) => tracing::info!("Reported {} views", sent),
        Err(e) => tracing::warn!("Final view delivery failed: {}", e),
    }
    Ok(())
}

/// Print posts oldest first and tell analytics they are on screen.
fn show(ctx: &AppContext, items: &[Item]) {
    ctx.channels
        .preload(items.iter().filter_map(|item| item.forwarded_from.clone()));

    for item in items {
        println!("{}", render_item(item));
        if let Some(token) = &item.view_token {
            ctx.analytics.on_visibility_change(item.id, token, true);
        }
    }
}

fn render_item(item: &Item) -> String {
    let mut line = format!("[{}] #{}", item.date.format("%Y-%m-%d %H:%M"), item.id);
    if let Some(source) = &item.forwarded_from {
        line.push_str(&format!(" (fwd @{})", source));
    }
    if let Some(views) = item.views {
        line.push_str(&format!(" {} views", views));
    }
    if item.has_playable_media() {
        line.push_str(&format!(" [{} media, playable]", item.media.len()));
    } else if !item.media.is_empty() {
        line.push_str(&format!(" [{} media]", item.media.len()));
    }
    format!("{}\n  {}", line, item.display_text())
}
