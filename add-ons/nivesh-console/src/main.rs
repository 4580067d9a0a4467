//! Terminal front end: market movers, company pages, search and voice chat.

use nivesh_core::{
    ChartPeriod, InvestApi, MoverCategory, MoversBoard, NiveshConfig, OrderSide, RecentSearches,
};
use nivesh_voice::{
    Capture, HttpAssistant, NullSink, RodioSink, SessionEvent, SpeechSink, VoiceSession,
};
use std::io::{BufRead, Write};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::warn;

const USAGE: &str = "\
nivesh-console

USAGE:
    nivesh-console --movers [gainers|losers] [COUNT]
    nivesh-console --search QUERY
    nivesh-console --company SYMBOL [1M|3M|6M|1Y|ALL]
    nivesh-console --chat

Chat commands: /mic toggles recording, /health probes the backend, /quit exits.

Configuration comes from NIVESH_* environment variables with optional
user_config.toml overrides.";

type CliResult = Result<(), Box<dyn std::error::Error>>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> CliResult {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = NiveshConfig::load();

    match args.first().map(String::as_str) {
        Some("--movers") => {
            let category = args
                .get(1)
                .and_then(|s| MoverCategory::parse(s))
                .unwrap_or(MoverCategory::Gainers);
            let count = args
                .get(2)
                .and_then(|s| s.parse().ok())
                .unwrap_or(nivesh_core::DEFAULT_MOVER_COUNT);
            show_movers(&config, category, count).await
        }
        Some("--search") => match args.get(1) {
            Some(query) => run_search(&config, query).await,
            None => usage(),
        },
        Some("--company") => match args.get(1) {
            Some(symbol) => {
                let period = args
                    .get(2)
                    .and_then(|s| ChartPeriod::parse(s))
                    .unwrap_or(ChartPeriod::M1);
                show_company(&config, symbol, period).await
            }
            None => usage(),
        },
        Some("--chat") => run_chat(&config).await,
        Some("--help") | None => usage(),
        Some(other) => {
            eprintln!("unknown option: {other}\n\n{USAGE}");
            std::process::exit(2);
        }
    }
}

fn usage() -> CliResult {
    println!("{USAGE}");
    Ok(())
}

async fn show_movers(config: &NiveshConfig, category: MoverCategory, count: usize) -> CliResult {
    let api = InvestApi::from_config(config)?;
    let mut board = MoversBoard::new(category, count);
    board.refresh(&api).await?;
    println!("Top {category}:");
    for row in board.rows() {
        println!(
            "  {:<12} {:<32} {:>10.2} {:>+7.2}%",
            row.symbol, row.name, row.last_price, row.change
        );
    }
    Ok(())
}

async fn run_search(config: &NiveshConfig, query: &str) -> CliResult {
    let api = InvestApi::from_config(config)?;
    let hits = api.search(query).await?;
    if hits.is_empty() {
        println!("No matches for '{query}'.");
        return Ok(());
    }
    for hit in hits {
        println!("  {:<12} {}", hit.symbol, hit.name);
    }
    Ok(())
}

async fn show_company(config: &NiveshConfig, symbol: &str, period: ChartPeriod) -> CliResult {
    let api = InvestApi::from_config(config)?;
    let data = api.company(symbol).await?;

    let name = data
        .info
        .company_name
        .clone()
        .unwrap_or_else(|| symbol.to_uppercase());
    println!("{name}");
    if let Some(ref industry) = data.metadata.industry {
        println!("  {industry}");
    }
    let p = &data.price_info;
    println!(
        "  Last {:.2}  ({:+.2}, {:+.2}%)  O {:.2}  H {:.2}  L {:.2}  Prev {:.2}",
        p.last_price, p.change, p.p_change, p.open, p.day_high, p.day_low, p.previous_close
    );
    println!(
        "  52w {:.2}-{:.2}  Vol {:.0}  MCap {:.0}  P/E {:.2}",
        p.week_low, p.week_high, p.total_traded_volume, p.market_cap, p.pe
    );

    let bars = data.close_series(period);
    if let (Some(first), Some(last)) = (bars.first(), bars.last()) {
        println!(
            "  Chart window: {} bars, {} .. {}, close {:.2} -> {:.2}",
            bars.len(),
            first.date,
            last.date,
            first.close,
            last.close
        );
    }

    let bids = data.orders(OrderSide::Buy);
    let asks = data.orders(OrderSide::Sell);
    if !bids.is_empty() || !asks.is_empty() {
        println!("  Order book: {} bid levels, {} ask levels", bids.len(), asks.len());
    }

    for a in data.recent_announcements(5) {
        println!("  [{}] {}", a.date, a.title);
    }

    // Visits feed the recent-search list the chat and search views show.
    let recent = RecentSearches::open(config.data_dir.join("recent"))?;
    recent.record(symbol, &name)?;
    let symbols: Vec<_> = recent
        .list()?
        .into_iter()
        .map(|e| e.symbol)
        .collect();
    println!("Recently viewed: {}", symbols.join(", "));
    Ok(())
}

async fn run_chat(config: &NiveshConfig) -> CliResult {
    let backend = Arc::new(HttpAssistant::from_config(config)?);
    let sink: Box<dyn SpeechSink> = match RodioSink::try_default() {
        Ok(sink) => Box::new(sink),
        Err(e) => {
            warn!("no audio output, replies will be text only: {}", e);
            Box::new(NullSink)
        }
    };
    let mut session = VoiceSession::new(Capture::cpal(), sink, backend);
    let mut events = session
        .take_event_receiver()
        .ok_or("event receiver already taken")?;

    match session.check_health().await {
        Ok(true) => {}
        Ok(false) => println!("Backend is not ready; queries may fail."),
        Err(e) => println!("Health check failed: {e}"),
    }
    print_events(&mut events);

    let recent = RecentSearches::open(config.data_dir.join("recent"))?;
    let remembered = recent.list()?;
    if !remembered.is_empty() {
        let symbols: Vec<_> = remembered.iter().map(|e| e.symbol.as_str()).collect();
        println!("Recently viewed: {}", symbols.join(", "));
    }

    println!("Type a question, /mic to talk, /quit to exit.");
    let stdin = std::io::stdin();
    loop {
        print!("> ");
        std::io::stdout().flush()?;
        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        match line.trim() {
            "/quit" => break,
            "/mic" => {
                if let Err(e) = session.toggle_mic().await {
                    println!("Microphone error: {e}");
                }
            }
            "/health" => {
                if let Err(e) = session.check_health().await {
                    println!("Health check failed: {e}");
                }
            }
            "" => {}
            text => {
                if !session.send_text(text).await {
                    println!("(busy, try again in a moment)");
                }
            }
        }
        print_events(&mut events);
    }
    Ok(())
}

fn print_events(events: &mut mpsc::UnboundedReceiver<SessionEvent>) {
    while let Ok(event) = events.try_recv() {
        match event {
            SessionEvent::Status(status) => println!("[{status}]"),
            SessionEvent::UserTurn(text) => println!("You: {text}"),
            SessionEvent::BotTurn(text) => println!("Assistant: {text}"),
            SessionEvent::TurnFailed(failure) => println!("[turn failed: {failure:?}]"),
            SessionEvent::Interrupted => println!("[interrupted]"),
        }
    }
}
