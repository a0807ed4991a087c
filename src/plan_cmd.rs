//! `kisan plan ...` commands: show, generate, speak, and watch the
//! tomorrow plan.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use kisan_sathi_core::models::FarmProfile;
use kisan_sathi_core::orchestrator::{GenerateOutcome, PlanCardView};
use kisan_sathi_core::speech::SpeechToggle;

use crate::app::App;
use crate::card::PlanCard;

pub async fn run_plan_show(app: &App) -> Result<()> {
    let night = app.plans.is_night_time();
    println!("date:  {}", app.plans.today_key());
    println!("night: {}", if night { "yes" } else { "no" });
    println!();
    match app.plans.get_today().await {
        Some(plan) => println!("{}", plan),
        None => println!("No plan for today yet."),
    }
    Ok(())
}

fn report(outcome: &GenerateOutcome) -> Option<&str> {
    match outcome {
        GenerateOutcome::Cached(text) | GenerateOutcome::Generated(text) => Some(text.as_str()),
        GenerateOutcome::InProgress => {
            eprintln!("A plan is already being generated.");
            None
        }
        GenerateOutcome::Failed(e) if e.is_rate_limited() => {
            eprintln!("Too many requests right now. Try again in a little while.");
            None
        }
        GenerateOutcome::Failed(e) => {
            eprintln!("No plan generated: {}", e);
            None
        }
        GenerateOutcome::Discarded => None,
    }
}

pub async fn run_plan_generate(app: &App, profile: &FarmProfile) -> Result<()> {
    let orchestrator = app.orchestrator();
    if !orchestrator.is_night_time() {
        eprintln!("Note: tomorrow plans are usually made after 20:00.");
    }
    let outcome = orchestrator.generate(profile).await;
    match report(&outcome) {
        Some(text) => {
            if matches!(outcome, GenerateOutcome::Cached(_)) {
                println!("(already planned today)");
            }
            println!("{}", text);
            Ok(())
        }
        None => std::process::exit(1),
    }
}

/// Speak today's plan (generating it if needed) until it ends or Ctrl-C.
pub async fn run_plan_speak(app: &App, profile: &FarmProfile) -> Result<()> {
    let orchestrator = app.orchestrator();
    if report(&orchestrator.generate(profile).await).is_none() {
        std::process::exit(1);
    }

    match orchestrator.speak_plan() {
        SpeechToggle::Started => {}
        SpeechToggle::Unavailable => {
            eprintln!("Speech is not configured (set [speech].program).");
            std::process::exit(1);
        }
        SpeechToggle::Failed(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        SpeechToggle::NothingToSay | SpeechToggle::Stopped => return Ok(()),
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                orchestrator.speak_plan();
                println!("stopped");
                break;
            }
            _ = tokio::time::sleep(Duration::from_millis(200)) => {
                if !orchestrator.is_speaking() {
                    break;
                }
            }
        }
    }
    orchestrator.shutdown();
    Ok(())
}

fn print_view(view: &PlanCardView) {
    let now = chrono::Local::now().format("%H:%M");
    if !view.visible {
        println!("[{}] (card hidden: not night-time, no plan today)", now);
        return;
    }
    match &view.plan {
        Some(plan) => println!("[{}] tomorrow's plan:\n{}", now, plan),
        None if view.generating => println!("[{}] generating...", now),
        None => println!("[{}] night-time: a plan can be generated", now),
    }
}

/// Mount the plan card and print every change until Ctrl-C.
///
/// With `auto_generate`, the first refresh that finds the card visible
/// and empty triggers one generation.
pub async fn run_plan_watch(app: &App, profile: &FarmProfile, auto_generate: bool) -> Result<()> {
    let orchestrator = Arc::new(app.orchestrator());
    let refresh = Duration::from_secs(app.config.card.refresh_secs);
    let mut card = PlanCard::mount(orchestrator, refresh).await;
    let mut updates = card.subscribe();

    print_view(&card.view());
    let mut attempted = false;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    loop {
        let view = card.view();
        if auto_generate && !attempted && view.visible && view.plan.is_none() {
            attempted = true;
            let outcome = card.orchestrator().generate(profile).await;
            report(&outcome);
            print_view(&card.refresh_now().await);
            // The refresh above already updated the receiver.
            updates.borrow_and_update();
        }

        tokio::select! {
            _ = &mut ctrl_c => break,
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let view = updates.borrow_and_update().clone();
                if !view.visible {
                    attempted = false;
                }
                print_view(&view);
            }
        }
    }

    card.unmount();
    Ok(())
}
