//! Concierge server entry point.

use std::sync::Arc;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use concierge::{
    compose, create_rest_router, AvailabilityResolver, BookingAgent, CalendarProvider, Config,
    InMemoryCalendar, InMemorySessionStore, LlmNlu, NluProvider, PatternNlu, RestApiConfig,
    RestCalendar,
};
use concierge::config::{CalendarBackend, NluBackend};

/// Concierge: Conversational Calendar Booking Agent
#[derive(Parser, Debug)]
#[command(name = "concierge")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default)
    Serve,
    /// Run one conversation turn against an in-process agent
    Chat {
        /// User message
        message: String,
        /// Conversation id (a fresh one is generated when omitted)
        #[arg(short = 'i', long)]
        conversation: Option<String>,
    },
    /// Search for free slots directly
    Slots {
        /// Date to search from (YYYY-MM-DD)
        date: NaiveDate,
        /// Slot duration in minutes
        #[arg(short, long, default_value = "60")]
        duration: u32,
        /// Number of slots to return
        #[arg(short = 'n', long, default_value = "3")]
        count: usize,
    },
}

fn build_calendar(config: &Config) -> anyhow::Result<Arc<dyn CalendarProvider>> {
    Ok(match config.calendar.backend {
        CalendarBackend::Memory => Arc::new(InMemoryCalendar::new()),
        CalendarBackend::Rest => Arc::new(RestCalendar::new(
            &config.calendar.base_url,
            config.calendar.timeout_secs,
        )?),
    })
}

fn build_nlu(config: &Config) -> anyhow::Result<Arc<dyn NluProvider>> {
    Ok(match config.nlu.backend {
        NluBackend::Pattern => Arc::new(PatternNlu::new()),
        NluBackend::Llm => Arc::new(LlmNlu::new(&config.nlu)?),
    })
}

fn build_agent(config: &Config) -> anyhow::Result<(Arc<BookingAgent>, Arc<dyn CalendarProvider>)> {
    let calendar = build_calendar(config)?;
    let agent = Arc::new(BookingAgent::new(
        build_nlu(config)?,
        calendar.clone(),
        Arc::new(InMemorySessionStore::new()),
        config.scheduling.clone(),
    ));
    Ok((agent, calendar))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::load()?,
    };

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => {
            let (agent, calendar) = build_agent(&config)?;
            let router = create_rest_router(
                agent,
                calendar,
                &RestApiConfig {
                    enable_cors: config.server.enable_cors,
                    ..Default::default()
                },
            );

            let addr = format!("{}:{}", config.server.bind, config.server.http_port);
            tracing::info!("Listening on {addr}");
            let listener = tokio::net::TcpListener::bind(&addr).await?;
            axum::serve(listener, router).await?;
        }
        Command::Chat {
            message,
            conversation,
        } => {
            let (agent, _) = build_agent(&config)?;
            let conversation_id =
                conversation.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let outcome = agent.handle_turn(&conversation_id, &message).await;
            let response = compose(&outcome, &conversation_id);

            if args.json {
                println!("{}", serde_json::to_string_pretty(&response)?);
            } else {
                println!("{}", response.response);
            }
        }
        Command::Slots {
            date,
            duration,
            count,
        } => {
            let calendar = build_calendar(&config)?;
            let resolver =
                AvailabilityResolver::with_params(calendar, config.scheduling.params());
            let slots = resolver
                .find_free_slots(date, duration, count, config.scheduling.horizon_days)
                .await?;

            if args.json {
                println!("{}", serde_json::to_string_pretty(&slots)?);
            } else if slots.is_empty() {
                println!("No free slots found.");
            } else {
                for (i, slot) in slots.iter().enumerate() {
                    println!(
                        "{}. {} at {}-{}",
                        i + 1,
                        slot.date,
                        slot.start_time.format("%H:%M"),
                        slot.end_time.format("%H:%M"),
                    );
                }
            }
        }
    }

    Ok(())
}
