//! A line-based terminal chat client.
//!
//! ```text
//! lanmsg-chat [--accept] [server-addr]
//! ```
//!
//! Type a line to chat. `/nick NAME` renames, `/send PATH` offers a file
//! to the room, `/quit` leaves. With `--accept`, offered files are saved
//! as `received-<name>` in the current directory; otherwise they are
//! refused.

use std::sync::Arc;

use lanmsg_client::{ChatClient, ChatUi, ClientConfig, DiskStore, FileDecision};
use lanmsg_protocol::DEFAULT_PORT;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::Notify;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

struct Terminal {
    auto_accept: bool,
    closed: Arc<Notify>,
}

impl ChatUi for Terminal {
    fn on_status(&self, text: &str) {
        println!("* {text}");
    }

    fn on_nickname_changed(&self, nickname: &str) {
        println!("* Your nickname is now \"{nickname}\"");
    }

    fn on_chat(&self, sender: &str, text: &str) {
        println!("<{sender}> {text}");
    }

    async fn on_file_transfer_request(&self, sender: &str, file_name: &str) -> FileDecision {
        if self.auto_accept {
            let destination = format!("received-{file_name}");
            println!("* Saving \"{file_name}\" from \"{sender}\" as {destination}");
            FileDecision::accept(destination)
        } else {
            println!("* Refusing \"{file_name}\" from \"{sender}\" (start with --accept to take files)");
            FileDecision::reject()
        }
    }

    fn on_connection_closed(&self) {
        println!("* Disconnected! Bye!");
        self.closed.notify_one();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let mut auto_accept = false;
    let mut addr = format!("127.0.0.1:{DEFAULT_PORT}");
    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "--accept" => auto_accept = true,
            "-h" | "--help" => {
                eprintln!("usage: lanmsg-chat [--accept] [server-addr]   (default {addr})");
                return Ok(());
            }
            _ => addr = arg,
        }
    }

    let closed = Arc::new(Notify::new());
    let ui = Terminal {
        auto_accept,
        closed: Arc::clone(&closed),
    };
    println!("* Connecting to {addr}...");
    let client = ChatClient::connect(&addr, ui, DiskStore, ClientConfig::default()).await?;
    println!("* Welcome! /nick NAME, /send PATH, /quit");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    client.disconnect()?;
                    break;
                };
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "/quit" {
                    client.disconnect()?;
                    break;
                } else if let Some(name) = line.strip_prefix("/nick ") {
                    client.set_nickname(name.trim())?;
                } else if let Some(path) = line.strip_prefix("/send ") {
                    client.send_file(path.trim())?;
                } else {
                    client.send_chat_message(line)?;
                }
            }
            () = closed.notified() => break,
        }
    }

    client.closed().await?;
    Ok(())
}
