use crate::CLAP_STYLING;
use clap::{arg, command};

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("tomograph")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("tomograph")
        .about("Crawl a website and diagnose its link structure and page health")
        .styles(CLAP_STYLING)
        .arg(
            arg!(-q --"quiet" "Suppress banner and non-essential output")
                .required(false)
                .global(true),
        )
        .arg(
            arg!(-v --"verbose" "Show debug logging on stderr")
                .required(false)
                .global(true),
        )
        .subcommand_required(false)
        .subcommand(
            command!("crawl")
                .about(
                    "Crawl a site breadth-first within its origin and report dead links, slow \
                pages and orphans.",
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("The URL to crawl (https:// is assumed when no scheme is given)")
                        .conflicts_with("hosts-file"),
                )
                .arg(
                    arg!(-H --"hosts-file" <PATH>)
                        .required(false)
                        .help("Path to a newline-delimited file of URLs to crawl one after another")
                        .value_parser(clap::value_parser!(std::path::PathBuf))
                        .conflicts_with("url"),
                )
                .arg(
                    arg!(--"max-depth" <N>)
                        .required(false)
                        .help("Maximum link depth from the start page (default: 3)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"max-pages" <N>)
                        .required(false)
                        .help("Maximum number of pages to fetch (default: 50)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"concurrency" <N>)
                        .required(false)
                        .help("Maximum number of in-flight requests, 1-64 (default: 3)")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"latency-threshold" <MS>)
                        .required(false)
                        .help("Pages slower than this many milliseconds are flagged (default: 2000)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"delay" <MS>)
                        .required(false)
                        .help("Pause between pages in milliseconds (default: 500)")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"retries" <N>)
                        .required(false)
                        .help("Attempts per page for server errors and timeouts (default: 3)")
                        .value_parser(clap::value_parser!(u32)),
                )
                .arg(
                    arg!(--"ignore-robots")
                        .required(false)
                        .help("Do not consult robots.txt")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(--"events")
                        .required(false)
                        .help("Stream crawl events to stdout as JSON lines instead of a report")
                        .action(clap::ArgAction::SetTrue),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: print to stdout)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                )
                .arg(
                    arg!(-c --"config" <PATH>)
                        .required(false)
                        .help("Config file (default: ~/.config/tomograph/config.toml if present)")
                        .value_parser(clap::value_parser!(std::path::PathBuf)),
                ),
        )
        .subcommand(
            command!("check")
                .about("Check whether a URL passes the safety rules without crawling it")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The URL to check"),
                ),
        )
}
