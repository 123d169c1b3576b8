//! An interactive terminal chat with the persona.

#[macro_use]
extern crate tracing;

use std::env;
use std::io::Write as _;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use persona_chat::command::{self, Command, HELP};
use persona_chat::config::{self, FileConfig};
use persona_chat::render::{
    BAR_CHAR, render_message, render_notice, render_outgoing,
};
use persona_chat_core::conversation::Role;
use persona_chat_core::mode::Mode;
use persona_chat_core::notice::NoticeLevel;
use persona_chat_core::orchestrator::Update;
use persona_chat_core::persona::{
    DEFAULT_SYSTEM_PROMPT, format_aside, quick_scene,
};
use persona_chat_core::storage::FileStore;
use persona_chat_core::{Session, SessionBuilder};
use persona_chat_openai_model::OpenAIProvider;
use tokio::io::{self, AsyncBufReadExt, BufReader, Stdin};
use tokio::select;
use tokio::sync::mpsc;
use tokio::time::sleep;

type Input = BufReader<Stdin>;
type UpdateReceiver = mpsc::UnboundedReceiver<Update>;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let file_config = FileConfig::load()?;
    let provider_config =
        config::provider_config(&file_config, |name| env::var(name).ok());
    let data_dir = config::data_dir(|name| env::var(name).ok())?;
    info!(
        "using model {} at {}, data in {}",
        provider_config.model(),
        provider_config.base_url(),
        data_dir.display()
    );
    if !provider_config.has_api_key() {
        println!(
            "{}",
            "No API key configured. Set API_KEY or add api_key to config.json."
                .yellow()
        );
    }

    let (update_tx, update_rx) = mpsc::unbounded_channel();
    let session = SessionBuilder::with_model_provider(OpenAIProvider::new(
        provider_config,
    ))
    .with_store(FileStore::new(data_dir))
    .on_update(move |update| {
        update_tx.send(update).ok();
    })
    .build();

    let Some(snapshot) = session.snapshot().await else {
        anyhow::bail!("session stopped unexpectedly");
    };
    for message in &snapshot.history {
        println!("{}", render_message(message));
    }
    if snapshot.system_prompt.is_empty() {
        println!(
            "No system prompt yet. Use /default then /save, or /save <text>. \
             Type /help for all commands."
        );
    }

    let mut repl = Repl {
        session,
        update_rx,
        input: BufReader::new(io::stdin()),
        draft: snapshot.system_prompt,
        mode: snapshot.mode,
    };
    repl.run().await
}

struct Repl {
    session: Session,
    update_rx: UpdateReceiver,
    input: Input,
    /// The prompt being edited; applied by `/save`.
    draft: String,
    mode: Mode,
}

impl Repl {
    async fn run(&mut self) -> Result<()> {
        loop {
            print!("> ");
            std::io::stdout().flush()?;

            let Some(line) = read_line(&mut self.input).await else {
                break;
            };
            let command = match command::parse(&line) {
                Ok(command) => command,
                Err(err) => {
                    println!("{}", err.to_string().yellow());
                    continue;
                }
            };

            if !self.execute(command).await? {
                break;
            }
        }
        Ok(())
    }

    /// Returns `false` when the REPL should stop.
    async fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Send(text) => return Ok(self.send(text).await),
            Command::Aside(text) => match format_aside(&text) {
                Some(aside) => {
                    println!("{}", render_outgoing(&aside));
                    return Ok(self.send(aside).await);
                }
                None => println!("{}", "Nothing to send.".yellow()),
            },
            Command::Scene => {
                let scene = quick_scene(seed());
                println!("{}", render_outgoing(scene));
                return Ok(self.send(scene.to_owned()).await);
            }
            Command::Save(text) => {
                if let Some(text) = text {
                    self.draft = text;
                }
                self.session.save_system_prompt(self.draft.clone());
                return Ok(self.wait_for_reset().await);
            }
            Command::LoadDefault => {
                let question = "Replace the draft with the default persona?";
                if self.confirm(question).await {
                    self.draft = DEFAULT_SYSTEM_PROMPT.to_owned();
                    println!("Default persona loaded. Use /save to apply it.");
                }
            }
            Command::ShowPrompt => {
                let Some(snapshot) = self.session.snapshot().await else {
                    return Ok(false);
                };
                print_prompt("Active prompt", &snapshot.system_prompt);
                if self.draft != snapshot.system_prompt {
                    print_prompt("Draft (unsaved)", &self.draft);
                }
            }
            Command::Clear => {
                if self.confirm("Clear the whole conversation?").await {
                    self.session.clear_history(true);
                    return Ok(self.wait_for_reset().await);
                }
            }
            Command::Status => {
                let Some(snapshot) = self.session.snapshot().await else {
                    return Ok(false);
                };
                println!(
                    "{} messages, mode: {}",
                    snapshot.history.len(),
                    snapshot.mode.label().bright_white()
                );
            }
            Command::Help => println!("{HELP}"),
            Command::Quit => return Ok(false),
        }
        Ok(true)
    }

    async fn send(&mut self, text: String) -> bool {
        self.session.send_message(text);
        self.wait_for(true, |update| {
            matches!(update, Update::Busy(false) | Update::Rejected(_))
        })
        .await
    }

    /// Waits for the outcome of a prompt save or a history clear.
    async fn wait_for_reset(&mut self) -> bool {
        self.wait_for(false, |update| match update {
            Update::Notice(notice) => notice.level() == NoticeLevel::Success,
            Update::Rejected(_) => true,
            _ => false,
        })
        .await
    }

    /// Prints updates until `done` matches one. Returns `false` if the
    /// session is gone.
    async fn wait_for(
        &mut self,
        spinner: bool,
        done: impl Fn(&Update) -> bool,
    ) -> bool {
        let progress_style = ProgressStyle::with_template("{spinner} {wide_msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
        let mut progress_bar: Option<ProgressBar> = None;

        loop {
            if spinner {
                progress_bar
                    .get_or_insert_with(|| {
                        let progress_bar = ProgressBar::new_spinner();
                        progress_bar.set_style(progress_style.clone());
                        progress_bar.set_message("He is thinking...");
                        progress_bar
                    })
                    .inc(1);
            }

            let sleep = sleep(Duration::from_millis(100));
            let update = select! {
                update = self.update_rx.recv() => {
                    let Some(update) = update else {
                        return false;
                    };
                    update
                },
                _ = sleep => {
                    continue;
                }
            };

            // Finish the progress bar before printing anything else.
            if let Some(progress_bar) = progress_bar.take() {
                progress_bar.finish_and_clear();
            }

            let finished = done(&update);
            self.print_update(update);
            if finished {
                return true;
            }
        }
    }

    fn print_update(&mut self, update: Update) {
        match update {
            Update::MessageAppended(message) => {
                // The user already sees what they typed.
                if message.role() == Role::Assistant {
                    println!("{}", render_message(&message));
                }
            }
            Update::HistoryReset => {
                println!("{}", "History cleared.".bright_black());
            }
            Update::ModeChanged(mode) => {
                if mode != self.mode && mode != Mode::Unrecognized {
                    println!(
                        "{}{}",
                        BAR_CHAR.bright_black(),
                        format!("mode: {}", mode.label()).bright_black()
                    );
                }
                self.mode = mode;
            }
            Update::Busy(_) => {}
            Update::Notice(notice) => println!("{}", render_notice(&notice)),
            Update::Rejected(err) => println!("{}", err.to_string().yellow()),
        }
    }

    async fn confirm(&mut self, question: &str) -> bool {
        print!("{question} [y/N]: ");
        if std::io::stdout().flush().is_err() {
            return false;
        }
        let Some(line) = read_line(&mut self.input).await else {
            return false;
        };
        line.trim().eq_ignore_ascii_case("y")
    }
}

async fn read_line(input: &mut Input) -> Option<String> {
    let mut line = String::new();

    match input.read_line(&mut line).await {
        Ok(count) => {
            if count == 0 {
                return None;
            }
            Some(line)
        }
        Err(err) => {
            error!("error reading input: {}", err);
            None
        }
    }
}

fn print_prompt(title: &str, prompt: &str) {
    println!("{}", title.bold());
    if prompt.is_empty() {
        println!("{}", "(empty)".bright_black());
    } else {
        println!("{prompt}");
    }
}

#[inline]
fn seed() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.subsec_nanos() as usize)
        .unwrap_or_default()
}
