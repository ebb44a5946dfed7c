use colored::*;
use rustyline::error::ReadlineError;
use structopt::StructOpt;
use yiqi::{
    conversation::{Conversation, GeneratorTransport, HttpTransport, MessageRole, MessageStatus, QueryTransport},
    core::{config::YiqiConfig, init},
    repl::{self, Command},
    session::{self, SessionDescriptor},
    tickers,
};

#[derive(Debug, StructOpt)]
#[structopt(name = "yiqi-cli", about = "Create and chat in YiqiAI spaces")]
enum Opt {
    /// Encode tickers and context into a shareable space token
    Encode {
        /// Comma separated ticker symbols, e.g. AAPL,MSFT
        #[structopt(short, long)]
        tickers: String,
        /// What the assistant should focus on
        #[structopt(short, long, default_value = "")]
        context: String,
        #[structopt(long, default_value = "http://127.0.0.1:3000")]
        base_url: String,
    },
    /// Print the tickers and context behind a space token
    Decode { token: String },
    /// Chat inside a space
    Chat {
        token: String,
        /// Server to send queries to
        #[structopt(long, default_value = "http://127.0.0.1:3000")]
        server: String,
        /// Call Gemini from this process instead of going through a server
        #[structopt(long)]
        direct: bool,
    },
}

fn print_descriptor(descriptor: &SessionDescriptor) {
    println!("{} {}", "Tickers:".bold(), descriptor.tickers.join(", ").green());
    println!("{} {}", "Context:".bold(), descriptor.context);
}

fn print_tickers<T: QueryTransport>(conversation: &Conversation<T>) {
    for ticker in &conversation.session().tickers {
        if conversation.selected().contains(ticker) {
            println!("  [x] {}", ticker.green().bold());
        } else {
            println!("  [ ] {}", ticker);
        }
    }
}

fn print_history<T: QueryTransport>(conversation: &Conversation<T>) {
    let messages = conversation.transcript().messages();
    if messages.is_empty() {
        println!("No messages yet.");
        return;
    }

    for message in messages {
        let label = match message.role {
            MessageRole::User => message.role.to_string().cyan(),
            MessageRole::Assistant => message.role.to_string().green(),
        };
        let content = match message.status {
            MessageStatus::Failed => message.content.red().to_string(),
            MessageStatus::Pending => "...".dimmed().to_string(),
            MessageStatus::Resolved => message.content.clone(),
        };
        println!("\n{}: {}", label, content);
    }
    println!();
}

async fn chat<T: QueryTransport>(descriptor: SessionDescriptor, transport: T) -> anyhow::Result<()> {
    let mut rl = repl::create_editor(descriptor.tickers.clone())?;
    let mut conversation = Conversation::new(descriptor, transport);

    print_descriptor(conversation.session());
    println!("Use @TICKER to focus on a ticker, /select to toggle, /tickers, /history. Enter 'quit' to exit");

    loop {
        let line = match rl.readline(&format!("{}", "> ".green().bold())) {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("Error: {:?}", err);
                break;
            }
        };

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::History => print_history(&conversation),
            Command::Tickers => print_tickers(&conversation),
            Command::Select(symbols) => {
                for symbol in symbols {
                    if !conversation.session().tickers.iter().any(|t| t.eq_ignore_ascii_case(&symbol)) {
                        eprintln!("{} is not part of this space", symbol);
                        continue;
                    }
                    conversation.toggle_ticker(&symbol);
                }
                print_tickers(&conversation);
            }
            Command::Query(text) => {
                for ticker in repl::mentioned_tickers(&text) {
                    conversation.select_ticker(&ticker);
                }

                println!("{}", "YiqiAI is thinking...".dimmed());
                match conversation.submit(&text).await {
                    Ok(reply) => println!("\n{}\n", reply.content),
                    Err(e) => eprintln!("{} {}", "Something went wrong:".red(), e),
                }
            }
        }
    }

    if let Err(e) = rl.save_history() {
        log::debug!("Failed to save history: {}", e);
    }
    println!("Goodbye!");
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    env_logger::init();

    match Opt::from_args() {
        Opt::Encode {
            tickers: list,
            context,
            base_url,
        } => {
            let descriptor = SessionDescriptor::new(tickers::parse_list(&list)?, context);
            let token = session::encode(&descriptor);
            let url = url::Url::parse(&base_url)?.join(&session::view_path(&token))?;
            println!("{}", token);
            println!("{}", url.to_string().blue().underline());
        }
        Opt::Decode { token } => {
            let descriptor = session::decode(&token)?;
            print_descriptor(&descriptor);
        }
        Opt::Chat {
            token,
            server,
            direct,
        } => {
            let descriptor = session::decode(&token)?;
            let http_client = init::initialize_http_client()?;

            if direct {
                let config = YiqiConfig::from_env()?;
                let generator = init::initialize_gemini(&config, http_client)?;
                chat(descriptor, GeneratorTransport::new(generator)).await?;
            } else {
                chat(descriptor, HttpTransport::new(http_client, &server)?).await?;
            }
        }
    }

    Ok(())
}
