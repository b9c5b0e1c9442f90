//! `baton chat` — interactive or single-message consultation.

use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};

use baton_core::SessionId;

pub async fn run(message: Option<String>) -> anyhow::Result<()> {
    let (_config, manager) = super::build_runtime()?;
    let session_id = SessionId::new().to_string();

    if let Some(text) = message {
        let turn = manager.process(&session_id, &text).await?;
        println!("[{}] {}", turn.agent, turn.reply);
        return Ok(());
    }

    println!("Baton — driver insurance consultation");
    println!("Type 'reset' to start over, 'exit' to quit.\n");

    let stdin = io::stdin();
    let mut lines = BufReader::new(stdin).lines();
    let mut stdout = io::stdout();

    loop {
        stdout.write_all(b"you> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        match input {
            "exit" | "quit" => break,
            "reset" => {
                if manager.reset(&session_id).await.is_ok() {
                    println!("(session reset — back with {})\n", manager.entry_agent());
                } else {
                    println!("(nothing to reset yet)\n");
                }
                continue;
            }
            _ => {}
        }

        match manager.process(&session_id, input).await {
            Ok(turn) => println!("[{}] {}\n", turn.agent, turn.reply),
            Err(e) => eprintln!("error: {e} (your message was not recorded, try again)\n"),
        }
    }

    println!("Goodbye.");
    Ok(())
}
