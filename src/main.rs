//! Terminal chat host for the school assistant

use school_assistant::{
    metrics::METRICS, school_knowledge_base, telemetry, Config, ConversationSession,
    SchoolAssistant,
};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

const HELP: &str = "Ask a question about school, or use /clear, /history, /metrics, /quit";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Optional config path as the only argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = Config::load(config_path.as_deref())?;
    telemetry::init_tracing(&config.logging)?;

    let assistant = SchoolAssistant::from_config(&config, school_knowledge_base()?).await?;
    let mut session = ConversationSession::new();
    info!(session = %session.id(), "Chat session started");

    println!("School Assistant");
    println!("{}", HELP);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };

        match line.trim() {
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                println!("Chat history cleared.");
            }
            "/history" => {
                if session.is_empty() {
                    println!("(no messages yet)");
                }
                for turn in session.turns() {
                    println!(
                        "[{}] {}: {}",
                        turn.created_at.format("%H:%M:%S"),
                        turn.role,
                        turn.content
                    );
                }
            }
            "/metrics" => print!("{}", METRICS.export_prometheus()),
            "/help" => println!("{}", HELP),
            question => {
                if let Some(reply) = assistant.handle_turn(&mut session, question).await {
                    println!("{}", reply.content);
                }
            }
        }
    }

    info!(session = %session.id(), turns = session.len(), "Chat session ended");
    Ok(())
}
