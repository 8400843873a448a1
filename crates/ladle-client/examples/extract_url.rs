use std::io::Write as _;
use std::time::Duration;

use ladle_client::prelude::*;
use tokio::sync::mpsc;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), ClientError> {
    let source_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "https://example.com/recipe".to_string());

    let client = LadleClient::from_env()?;
    let (done_tx, mut done_rx) = mpsc::unbounded_channel();
    let err_tx = done_tx.clone();

    let handlers = ExtractionHandlers::new()
        .on_progress(|event| {
            println!(
                "[{:?}] {}",
                event.status,
                event.detail.as_deref().unwrap_or("")
            );
            let _ = std::io::stdout().flush();
        })
        .on_complete(move |signed_url, draft_id| {
            let _ = done_tx.send(Ok((signed_url.to_string(), draft_id.to_string())));
        })
        .on_error(move |error| {
            let _ = err_tx.send(Err(error.clone()));
        });

    let handle = client
        .extract_recipe_from_url(source_url, None, handlers)
        .await?;
    println!("stream {} started", handle.id());

    match tokio::time::timeout(Duration::from_secs(300), done_rx.recv()).await {
        Ok(Some(Ok((signed_url, draft_id)))) => {
            println!("extracted draft {draft_id} ({signed_url})");
            if signed_url.is_empty() {
                let draft = client.materialize_draft(&draft_id).await?;
                println!("materialized draft: {draft}");
            }
        }
        Ok(Some(Err(error))) => eprintln!("extraction failed: {error}"),
        _ => {
            eprintln!("no terminal event, canceling");
            handle.cancel();
        }
    }
    Ok(())
}
