//! Sending a built request and printing its result.

use console::style;
use tokio::sync::mpsc;

use jsonpedia::render::ElementFilter;
use jsonpedia::Dispatcher;

/// Dispatch the request and print the body, or exit non-zero with the failure message.
pub async fn cmd_send(
    dispatcher: &Dispatcher,
    filter: Option<&ElementFilter>,
) -> anyhow::Result<()> {
    let url = dispatcher.url()?;
    let (tx, mut rx) = mpsc::unbounded_channel();
    let fail_tx = tx.clone();

    dispatcher
        .done(move |body| {
            let _ = tx.send(Ok(body));
        })
        .fail(move |message| {
            let _ = fail_tx.send(Err(message));
        });

    match rx.recv().await {
        Some(Ok(body)) => {
            eprintln!("{} {}", style("✓").green(), url);
            match filter {
                Some(filter) => {
                    let report = filter.apply(&body);
                    for element in &report.matches {
                        println!(
                            "{}\t{}\t{}",
                            element.tag,
                            element.item_type.as_deref().unwrap_or("-"),
                            element.name.as_deref().unwrap_or("-")
                        );
                    }
                    eprintln!("{}", style(report.summary()).dim());
                }
                None => println!("{}", pretty(&body)),
            }
            Ok(())
        }
        Some(Err(message)) => {
            eprintln!("{} {}", style("✗").red(), url);
            eprintln!("  {}", message);
            std::process::exit(1);
        }
        None => anyhow::bail!("request to {} finished without a result", url),
    }
}

/// Pretty-print JSON bodies; anything else is returned as-is.
fn pretty(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| serde_json::to_string_pretty(&value).ok())
        .unwrap_or_else(|| body.to_string())
}
