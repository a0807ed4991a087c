//! `kisan tip ...` commands: ask for a tip and manage the local tip cache.

use anyhow::Result;

use kisan_sathi_core::generation::TipGenerator;
use kisan_sathi_core::models::{FarmProfile, Tip, TipRequest};

use crate::app::App;

/// Ask the tip endpoint for one tip, optionally appending it to the cache.
pub async fn run_tip_ask(app: &App, profile: &FarmProfile, save: bool) -> Result<()> {
    let request = TipRequest::from(profile);
    let text = match app.generator.generate_tip(&request).await {
        Ok(text) => text,
        Err(e) if e.is_rate_limited() => {
            eprintln!("Too many requests right now. Try again in a little while.");
            std::process::exit(2);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    println!("{}", text);

    if save {
        let tip = Tip::new(profile, text, app.clock.now_utc());
        let id = tip.id.clone();
        app.tips.save(tip).await?;
        println!();
        println!("saved tip {} ({} cached)", id, app.tips.count().await);
    }
    Ok(())
}

/// Append a tip written by hand.
pub async fn run_tip_add(app: &App, profile: &FarmProfile, text: &str) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("tip text must not be empty");
    }
    let tip = Tip::new(profile, text.trim(), app.clock.now_utc());
    let id = tip.id.clone();
    app.tips.save(tip).await?;
    println!("saved tip {} ({} cached)", id, app.tips.count().await);
    Ok(())
}

pub async fn run_tip_list(app: &App, limit: Option<usize>) -> Result<()> {
    let tips = app.tips.load().await;
    if tips.is_empty() {
        println!("No cached tips.");
        return Ok(());
    }
    let skip = limit.map(|n| tips.len().saturating_sub(n)).unwrap_or(0);
    for tip in tips.iter().skip(skip) {
        let place = tip
            .location
            .as_deref()
            .map(|l| format!(" @ {}", l))
            .unwrap_or_default();
        println!("[{}] {} / {}{}", tip.created_at, tip.crop, tip.stage, place);
        println!("  {}", tip.text);
    }
    println!();
    println!("{} of {} tips (max {})", tips.len() - skip, tips.len(), app.tips.capacity());
    Ok(())
}

pub async fn run_tip_count(app: &App) -> Result<()> {
    println!("{}", app.tips.count().await);
    Ok(())
}

pub async fn run_tip_clear(app: &App) -> Result<()> {
    let before = app.tips.count().await;
    app.tips.clear().await?;
    println!("Cleared {} tips.", before);
    Ok(())
}
