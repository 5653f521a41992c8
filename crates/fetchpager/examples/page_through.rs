//! Example: Fetch a URL window by window until the content runs out
//!
//! Run with: cargo run -p fetchpager --example page_through -- https://example.com 500

use fetchpager::{FetchRequest, Tool};
use std::time::Duration;

#[tokio::main]
async fn main() {
    let mut args = std::env::args().skip(1);
    let url = args.next().unwrap_or_else(|| "https://example.com".to_string());
    let max_length = args
        .next()
        .and_then(|n| n.parse().ok())
        .unwrap_or(1000);

    // Cache the document so each window after the first is served locally
    let tool = match Tool::builder()
        .min_interval(Duration::from_secs(1))
        .cache(Duration::from_secs(60), 8)
        .build()
    {
        Ok(tool) => tool,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    let mut start_index = 0;
    let mut page = 1;
    loop {
        let request = FetchRequest::new(&url)
            .max_length(max_length)
            .start_index(start_index);

        let response = match tool.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        };

        println!(
            "--- page {} ({}..{} of {}) ---",
            page,
            start_index,
            response.next_index.unwrap_or(response.total_length),
            response.total_length
        );
        println!("{}", response.content);

        match response.next_index {
            Some(next) => start_index = next,
            None => break,
        }
        page += 1;
    }
}
