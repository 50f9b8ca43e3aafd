//! Runs the demos against a DeepSeek-compatible endpoint.

#[macro_use]
extern crate tracing;

use std::env;
use std::process::ExitCode;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use steerline::Config;
use steerline::core::conversation::AgentState;
use steerline::demos::{Demo, Reporter};
use steerline_model::Turn;
use steerline_openai_model::OpenAIProvider;

const BAR_CHAR: &str = "▎";

/// Prints demo results to the terminal, with a spinner while waiting.
struct TerminalReporter {
    progress_style: ProgressStyle,
    progress_bar: Option<ProgressBar>,
    printed_turns: usize,
}

impl TerminalReporter {
    fn new() -> Self {
        let progress_style =
            ProgressStyle::with_template("{spinner} {wide_msg}")
                .unwrap()
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        Self {
            progress_style,
            progress_bar: None,
            printed_turns: 0,
        }
    }

    fn clear_progress(&mut self) {
        // Finish the progress bar before printing anything else.
        if let Some(progress_bar) = self.progress_bar.take() {
            progress_bar.finish_and_clear();
        }
    }

    fn print_turn(turn: &Turn) {
        match turn {
            Turn::User { content } => {
                println!("{}🙂 {}", BAR_CHAR.bright_green(), content);
            }
            Turn::Assistant {
                content,
                tool_calls,
            } => {
                if !content.is_empty() {
                    println!(
                        "{}🤖 {}",
                        BAR_CHAR.bright_cyan(),
                        content.bright_white()
                    );
                }
                for call in tool_calls {
                    println!(
                        "{}🔧 {}({})",
                        BAR_CHAR.bright_yellow(),
                        call.name.bold(),
                        call.arguments.dimmed()
                    );
                }
            }
            Turn::Tool(result) => {
                println!(
                    "{}📎 {}",
                    BAR_CHAR.bright_yellow(),
                    result.content.dimmed()
                );
            }
        }
    }
}

impl Reporter for TerminalReporter {
    fn begin(&mut self, demo: Demo) {
        self.clear_progress();
        println!(
            "\n{} {}",
            format!("=== {demo} ===").bright_magenta().bold(),
            demo.description().dimmed()
        );
    }

    fn waiting(&mut self, label: &str) {
        self.clear_progress();
        println!("\n{}", label.bold());
        let progress_bar = ProgressBar::new_spinner();
        progress_bar.set_style(self.progress_style.clone());
        progress_bar.set_message("🤔 Thinking...");
        progress_bar.enable_steady_tick(Duration::from_millis(100));
        self.progress_bar = Some(progress_bar);
        self.printed_turns = 0;
    }

    fn finished(&mut self, _label: &str, state: &AgentState) {
        self.clear_progress();
        let turns = state.log().turns();
        for turn in turns.iter().skip(self.printed_turns) {
            Self::print_turn(turn);
        }
        self.printed_turns = turns.len();
        for (name, value) in state.extensions() {
            println!("{}{name}: {value}", BAR_CHAR.dimmed());
        }
        if let Some(answer) = state.structured_response() {
            println!("{}📋 {}", BAR_CHAR.bright_magenta(), answer.bold());
        }
    }

    fn snapshot(&mut self, state: &AgentState) {
        let turns = state.log().turns();
        let new_turns = turns.iter().skip(self.printed_turns);
        match &self.progress_bar {
            Some(progress_bar) => progress_bar.suspend(|| {
                new_turns.for_each(Self::print_turn);
            }),
            None => new_turns.for_each(Self::print_turn),
        }
        self.printed_turns = turns.len();
    }
}

fn print_usage() {
    eprintln!("Usage: steerline <demo>\n\nDemos:");
    for demo in Demo::ALL {
        eprintln!("  {:<16}{}", demo.name(), demo.description());
    }
    eprintln!("  {:<16}run every demo in order", "all");
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let selection = env::args().nth(1).unwrap_or_else(|| "all".to_owned());
    if selection == "-h" || selection == "--help" {
        print_usage();
        return ExitCode::SUCCESS;
    }
    let demos = match Demo::select(&selection) {
        Ok(demos) => demos,
        Err(err) => {
            eprintln!("{err}\n");
            print_usage();
            return ExitCode::FAILURE;
        }
    };

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("{}: {err}", "error".bright_red().bold());
            return ExitCode::FAILURE;
        }
    };
    debug!("loaded config: {config:?}");
    let model_provider = OpenAIProvider::new(config.provider_config());

    let mut reporter = TerminalReporter::new();
    for demo in demos {
        if let Err(err) = demo.run(model_provider.clone(), &mut reporter).await
        {
            reporter.clear_progress();
            error!("demo `{demo}` failed: {err:?}");
            eprintln!("{}: {err}", "error".bright_red().bold());
            return ExitCode::FAILURE;
        }
    }
    ExitCode::SUCCESS
}
