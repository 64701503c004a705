mod args;
mod view;

use std::sync::Mutex;

use anyhow::{Result, anyhow, bail};
use clap::Parser;
use futures::future::join_all;
use log::{error, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::EnvFilter;

use imagefeed::builder::{DefaultSession, SessionBuilder};
use imagefeed::config;
use imagefeed::message::{FeedEvent, Subscription};
use imagefeed::presenter::ImagesListPresenter;

use args::{Args, Command};
use view::{TerminalView, format_row};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logger(args.log_stderr)?;

    info!("start running...");
    let res = start(args).await;
    if let Err(e) = &res {
        error!("{e}");
    }
    info!("done");
    res
}

async fn start(args: Args) -> Result<()> {
    match &args.config {
        Some(path) => config::init_from(path)?,
        None => config::init()?,
    }
    info!("Config initialized.");

    let session = SessionBuilder::new().build()?;

    match args.command {
        Command::Login { code } => login(&session, &code).await,
        Command::Profile => profile(&session).await,
        Command::Feed { pages } => feed(&session, pages).await,
        Command::Like { ids } => set_likes(&session, &ids, true).await,
        Command::Unlike { ids } => set_likes(&session, &ids, false).await,
        Command::Logout => {
            session.logout().await?;
            println!("Logged out.");
            Ok(())
        }
    }
}

async fn login(session: &DefaultSession, code: &str) -> Result<()> {
    if config::get_config()
        .read()
        .map_err(|e| anyhow!("{e}"))?
        .access_key
        .is_empty()
    {
        warn!("access_key is empty, the token exchange will most likely be refused");
    }
    let profile = session.authenticate(code).await?;
    println!(
        "Logged in as {} ({})",
        profile.display_name,
        profile.login_name()
    );
    Ok(())
}

async fn profile(session: &DefaultSession) -> Result<()> {
    let Some(profile) = session.restore().await? else {
        bail!("not logged in, run `imagefeed login --code <CODE>` first");
    };
    println!("{}", profile.display_name);
    println!("{}", profile.login_name());
    if let Some(bio) = &profile.bio {
        println!("{bio}");
    }
    match session.refresh_avatar().await {
        Ok(url) => println!("avatar: {url}"),
        Err(e) => warn!("avatar not available: {e}"),
    }
    Ok(())
}

async fn feed(session: &DefaultSession, pages: u32) -> Result<()> {
    if !session.is_authenticated()? {
        bail!("not logged in, run `imagefeed login --code <CODE>` first");
    }
    let mut events = session.feed().subscribe().await?;
    let mut presenter = ImagesListPresenter::new(session.feed().clone(), TerminalView::default());

    presenter.fetch_photos().await?;
    render(&mut presenter, &mut events).await?;
    for _ in 1..pages {
        let Some(last) = presenter.rows().checked_sub(1) else {
            break;
        };
        // scrolling onto the last row loads the next page
        presenter.will_display_row(last).await?;
        if !render(&mut presenter, &mut events).await? {
            info!("no more photos after {} rows", presenter.rows());
            break;
        }
    }
    session.feed().unsubscribe(events.id).await?;
    Ok(())
}

/// Applies pending feed events and prints the rows they inserted. Returns
/// whether anything was printed.
async fn render(
    presenter: &mut ImagesListPresenter<TerminalView>,
    events: &mut Subscription<FeedEvent>,
) -> Result<bool> {
    while let Some(event) = events.try_recv() {
        presenter.handle_event(event).await?;
    }
    let view = presenter.view_mut();
    let reloaded = view.take_reloaded();
    let inserted = view.take_inserted();
    let updated = view.take_updated();

    let mut rows: Vec<usize> = if reloaded {
        (0..presenter.rows()).collect()
    } else {
        inserted.into_iter().flatten().chain(updated).collect()
    };
    rows.sort_unstable();
    rows.dedup();
    for &row in &rows {
        if let Some(photo) = presenter.photo(row) {
            println!("{}", format_row(row, photo));
        }
    }
    Ok(!rows.is_empty())
}

async fn set_likes(session: &DefaultSession, ids: &[String], like: bool) -> Result<()> {
    if ids.is_empty() {
        bail!("no photo ids given");
    }
    let feed = session.feed();
    let results = join_all(ids.iter().map(|id| feed.toggle_like(id, !like))).await;

    let mut failed = 0;
    for (id, result) in ids.iter().zip(results) {
        match result {
            Ok(liked) => println!("{id}: {}", if liked { "liked" } else { "not liked" }),
            Err(e) => {
                failed += 1;
                eprintln!("{id}: {e}");
            }
        }
    }
    if failed > 0 {
        bail!("{failed} of {} photos could not be updated", ids.len());
    }
    Ok(())
}

fn init_logger(to_stderr: bool) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if to_stderr {
        let subscriber = builder.with_writer(std::io::stderr).finish();
        tracing::subscriber::set_global_default(subscriber)?;
    } else {
        let log_path = std::env::current_exe()?;
        let log_path = log_path
            .parent()
            .ok_or(anyhow!(
                "the executable: {:?} should have parent, maybe bugs in there",
                std::env::current_exe()
            ))?
            .join("imagefeed.log");
        let log_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(log_path)?;
        let subscriber = builder
            .with_ansi(false)
            .with_writer(Mutex::new(log_file))
            .finish();
        tracing::subscriber::set_global_default(subscriber)?;
    }
    LogTracer::init()?;
    Ok(())
}
