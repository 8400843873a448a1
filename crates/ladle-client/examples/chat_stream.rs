use std::io::Write as _;
use std::time::Duration;

use ladle_client::prelude::*;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let content = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "What can I cook with leftover rice?".to_string());

    let client = LadleClient::from_env()?;
    let (end_tx, mut end_rx) = mpsc::unbounded_channel();
    let err_tx = end_tx.clone();

    let handlers = ChatHandlers::new()
        .on_delta(|delta, _message_id| {
            print!("{delta}");
            let _ = std::io::stdout().flush();
        })
        .on_block(|block, _| println!("\n[block] {block}"))
        .on_tool_proposed(|action| {
            println!(
                "\n[proposal {}] {} {}",
                action.proposal_id, action.action_kind, action.parameters
            );
        })
        .on_done(move |conversation_id| {
            let _ = end_tx.send(Ok(conversation_id.to_string()));
        })
        .on_error(move |error| {
            let _ = err_tx.send(Err(error.clone()));
        });

    let handle = client.send_message(None, content, handlers).await?;

    match tokio::time::timeout(Duration::from_secs(120), end_rx.recv()).await {
        Ok(Some(Ok(conversation_id))) => println!("\n(conversation {conversation_id})"),
        Ok(Some(Err(error))) => eprintln!("\nchat failed: {error}"),
        _ => {
            eprintln!("\nno terminal event, canceling");
            handle.cancel();
        }
    }
    Ok(())
}
