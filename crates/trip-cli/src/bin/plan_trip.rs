use anyhow::Result;
use clap::Parser;
use trip_cli::{parse_coordinate, render_plan};
use trip_core::models::Coordinate;
use trip_sdk::{ConversationState, TripClient};

#[derive(Parser, Debug)]
#[command(author, version, about = "Plan a trip through the chat API", long_about = None)]
struct Args {
    /// Trip Server URL
    #[arg(long, default_value = "http://localhost:3000")]
    url: String,

    /// Starting point as lat,lng
    #[arg(long, value_parser = parse_coordinate, default_value = "47.92,106.92")]
    start: Coordinate,

    /// Destination as lat,lng
    #[arg(long, value_parser = parse_coordinate, default_value = "47.92,107.92")]
    end: Coordinate,

    /// Free-text trip description (days and interests)
    #[arg(long, default_value = "I want a 3 day trip to see museums and history")]
    message: String,

    /// Print the raw JSON plan instead of a summary
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let mut client = TripClient::new(args.url);

    let greeting = client.start().await?;
    println!("Assistant: {}", greeting.message.unwrap_or_default());

    println!(
        "Pins: ({}, {}) -> ({}, {})",
        args.start.lat, args.start.lng, args.end.lat, args.end.lng
    );
    let prompt = client.set_pins(args.start, args.end).await?;
    println!("Assistant: {}", prompt.message.unwrap_or_default());
    if client.stage() != ConversationState::WaitingForInfo {
        anyhow::bail!("Server did not accept the pins (stage {})", client.stage());
    }

    println!("You: {}", args.message);
    println!("Generating plan...");
    let plan = client.describe_trip(&args.message).await?;
    if client.stage() != ConversationState::Completed {
        anyhow::bail!(
            "Plan not completed: {}",
            plan.message.as_deref().unwrap_or("no message")
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print!("{}", render_plan(&plan));
    }
    Ok(())
}
