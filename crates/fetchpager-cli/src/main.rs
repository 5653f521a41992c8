//! FetchPager CLI - Command-line interface for paged web content fetching

mod mcp;

use clap::{Parser, Subcommand, ValueEnum};
use fetchpager::{FetchRequest, FetchResponse, Tool, ToolOutput, DEFAULT_MAX_LENGTH, TOOL_LLMTXT};
use std::io::{self, Write};
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// Output format for fetch subcommand
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
enum OutputFormat {
    /// Tool text, exactly as an agent would receive it
    #[default]
    Md,
    /// JSON format
    Json,
}

/// FetchPager - rate-limited web fetching with resumable pagination
#[derive(Parser, Debug)]
#[command(name = "fetchpager")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Print full help with examples (llmtxt)
    #[arg(long)]
    llmtxt: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run as MCP (Model Context Protocol) server over stdio
    Mcp {
        /// Minimum milliseconds between requests to one origin
        #[arg(long, default_value_t = 0)]
        min_interval_ms: u64,

        /// Keep fetched documents for this many seconds so later pages skip the refetch
        #[arg(long)]
        cache_ttl_secs: Option<u64>,
    },
    /// Fetch one window of a URL's content
    Fetch {
        /// URL to fetch
        url: String,

        /// Maximum characters to return
        #[arg(long, default_value_t = DEFAULT_MAX_LENGTH)]
        max_length: usize,

        /// Character offset to start from
        #[arg(long, default_value_t = 0)]
        start_index: usize,

        /// Return the page without simplification
        #[arg(long)]
        raw: bool,

        /// Custom User-Agent
        #[arg(long)]
        user_agent: Option<String>,

        /// Minimum milliseconds between requests to one origin
        #[arg(long, default_value_t = 0)]
        min_interval_ms: u64,

        /// Request timeout in seconds
        #[arg(long)]
        timeout_secs: Option<u64>,

        /// Output format
        #[arg(long, short, default_value = "md")]
        output: OutputFormat,
    },
}

#[tokio::main]
async fn main() {
    // Logs go to stderr; stdout carries results and MCP frames
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.llmtxt {
        writeln_safe(TOOL_LLMTXT);
        std::process::exit(0);
    }

    match cli.command {
        Some(Commands::Mcp {
            min_interval_ms,
            cache_ttl_secs,
        }) => {
            let mut builder = Tool::builder().min_interval(Duration::from_millis(min_interval_ms));
            if let Some(ttl) = cache_ttl_secs {
                builder = builder.cache(
                    Duration::from_secs(ttl),
                    fetchpager::DEFAULT_CACHE_ENTRIES,
                );
            }
            let tool = build_or_exit(builder);
            mcp::run_server(tool).await;
        }
        Some(Commands::Fetch {
            url,
            max_length,
            start_index,
            raw,
            user_agent,
            min_interval_ms,
            timeout_secs,
            output,
        }) => {
            let mut builder = Tool::builder().min_interval(Duration::from_millis(min_interval_ms));
            if let Some(ua) = user_agent {
                builder = builder.user_agent(ua);
            }
            if let Some(secs) = timeout_secs {
                builder = builder.timeout(Duration::from_secs(secs));
            }
            let tool = build_or_exit(builder);

            let mut request = FetchRequest::new(url)
                .max_length(max_length)
                .start_index(start_index);
            if raw {
                request = request.raw();
            }

            run_fetch(&tool, request, output).await;
        }
        None => {
            eprintln!("Usage: fetchpager fetch <URL>");
            eprintln!("   or: fetchpager mcp");
            eprintln!("   or: fetchpager --help");
            std::process::exit(1);
        }
    }
}

fn build_or_exit(builder: fetchpager::ToolBuilder) -> Tool {
    builder.build().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

async fn run_fetch(tool: &Tool, request: FetchRequest, output: OutputFormat) {
    match tool.execute(request).await {
        Ok(response) => match output {
            OutputFormat::Md => writeln_safe(&format_md(&response)),
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(&response).unwrap_or_else(|e| {
                    eprintln!("Error serializing response: {}", e);
                    std::process::exit(1);
                });
                writeln_safe(&json);
            }
        },
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}

/// Format response the way the tool renders it for an agent
fn format_md(response: &FetchResponse) -> String {
    ToolOutput::success(response).text
}

/// Write to stdout, exit silently on broken pipe
fn writeln_safe(s: &str) {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    if let Err(e) = writeln!(handle, "{}", s) {
        if e.kind() == io::ErrorKind::BrokenPipe {
            std::process::exit(0);
        }
        eprintln!("Error writing to stdout: {}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use fetchpager::ContentFormat;

    fn response(content: &str, notice: Option<&str>) -> FetchResponse {
        FetchResponse {
            url: "https://example.com".to_string(),
            final_url: None,
            status_code: 200,
            content_type: Some("text/html".to_string()),
            format: ContentFormat::Markdown,
            notice: notice.map(|s| s.to_string()),
            content: content.to_string(),
            total_length: content.chars().count(),
            start_index: 0,
            next_index: None,
            has_more: false,
            no_more_content: false,
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_args_parse() {
        let cli = Cli::try_parse_from([
            "fetchpager",
            "fetch",
            "https://example.com",
            "--max-length",
            "100",
            "--start-index",
            "200",
            "--raw",
            "--min-interval-ms",
            "500",
            "-o",
            "json",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Fetch {
                url,
                max_length,
                start_index,
                raw,
                min_interval_ms,
                output,
                ..
            }) => {
                assert_eq!(url, "https://example.com");
                assert_eq!(max_length, 100);
                assert_eq!(start_index, 200);
                assert!(raw);
                assert_eq!(min_interval_ms, 500);
                assert!(matches!(output, OutputFormat::Json));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_fetch_defaults() {
        let cli = Cli::try_parse_from(["fetchpager", "fetch", "https://example.com"]).unwrap();

        match cli.command {
            Some(Commands::Fetch {
                max_length,
                start_index,
                raw,
                timeout_secs,
                output,
                ..
            }) => {
                assert_eq!(max_length, DEFAULT_MAX_LENGTH);
                assert_eq!(start_index, 0);
                assert!(!raw);
                assert!(timeout_secs.is_none());
                assert!(matches!(output, OutputFormat::Md));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_mcp_args_parse() {
        let cli = Cli::try_parse_from([
            "fetchpager",
            "mcp",
            "--min-interval-ms",
            "1000",
            "--cache-ttl-secs",
            "300",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::Mcp {
                min_interval_ms,
                cache_ttl_secs,
            }) => {
                assert_eq!(min_interval_ms, 1000);
                assert_eq!(cache_ttl_secs, Some(300));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_format_md_basic() {
        let output = format_md(&response("# Hello World", None));
        assert_eq!(output, "Contents of https://example.com:\n# Hello World");
    }

    #[test]
    fn test_format_md_notice_first() {
        let notice = "Content type application/json cannot be simplified to markdown, \
                      but here is the raw content:\n";
        let output = format_md(&response("{}", Some(notice)));
        assert!(output.starts_with("Content type application/json"));
        assert!(output.ends_with("Contents of https://example.com:\n{}"));
    }
}
