//! Manual check against the live API.
//!
//! REDDIT_CLIENT_ID=... REDDIT_CLIENT_SECRET=... \
//!     cargo run -p reddit-client --example fetch_profile -- https://www.reddit.com/user/kojied/ 25

use persona_core::AppConfig;
use reddit_client::{fetch_content, parse_profile_identifier, RedditClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter("reddit_client=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let profile = args.next().unwrap_or_else(|| "u/spez".to_string());
    let depth: usize = args.next().and_then(|d| d.parse().ok()).unwrap_or(10);

    let config = AppConfig::load(None)?;
    let username = parse_profile_identifier(&profile)?;
    let client = RedditClient::from_config(&config)?;

    println!("Fetching up to {} items for u/{}", depth, username);
    let items = fetch_content(&client, &username, depth).await?;

    for item in &items {
        let preview: String = item.text.chars().take(80).collect();
        println!(
            "{} {:<8} r/{:<20} {} {}",
            item.timestamp.format("%Y-%m-%d"),
            item.kind.label(),
            item.subreddit,
            item.id,
            preview.replace('\n', " ")
        );
    }
    println!("{} items", items.len());
    Ok(())
}
