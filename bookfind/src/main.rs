use anyhow::{Context, Result};
use dotenv::dotenv;
use tokio::io::{AsyncBufReadExt, BufReader};

use bookfind::controller::SearchController;
use bookfind::presenter::{self, BounceGuard, TextPresenter};
use bookfind_client::{connect, CatalogClient, CatalogEndpoint};

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    // Config via env (avoid extra deps):
    // BOOKFIND_ENDPOINT (default https://www.googleapis.com/books/v1/volumes)
    let endpoint = match std::env::var("BOOKFIND_ENDPOINT") {
        Ok(raw) => CatalogEndpoint::parse(&raw)
            .ok()
            .with_context(|| format!("unusable BOOKFIND_ENDPOINT: {raw}"))?,
        Err(_) => CatalogEndpoint::default(),
    };
    eprintln!(
        "[catalog] endpoint: {}:{}{}",
        endpoint.host, endpoint.port, endpoint.base_path
    );

    #[cfg(feature = "tls_client")]
    let connector = if endpoint.tls {
        connect::rustls_connector_insecure()
    } else {
        connect::tcp_connector()
    };
    #[cfg(not(feature = "tls_client"))]
    let connector = {
        if endpoint.tls {
            anyhow::bail!(
                "endpoint {} needs TLS; rebuild with --features tls_client or point \
                 BOOKFIND_ENDPOINT at an http:// host",
                endpoint.host
            );
        }
        connect::tcp_connector()
    };

    let client = CatalogClient::new_with_connector(endpoint, connector);
    let mut controller = SearchController::new();
    let mut bounce = BounceGuard::default();

    println!("Book Search");
    println!("Search by author, title, and/or keywords:");

    if let Some(ticket) = controller.on_activate() {
        println!("{}", TextPresenter::render(controller.state()));
        controller.run(&client, ticket).await;
    }
    println!("{}", TextPresenter::render(controller.state()));

    eprintln!("[input] type a query and press enter; blank line resubmits; 'again' clicks the empty-state button; ctrl-d quits");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        if line.trim() == "again" {
            let fx = presenter::on_search_again(&mut controller, &mut bounce);
            if fx.start_bounce {
                // terminal has no animation-end event; the pulse is instant
                bounce.on_end();
            }
            println!("{}", TextPresenter::render(controller.state()));
            continue;
        }
        if !line.is_empty() {
            controller.on_query_change(&line);
        }
        match controller.on_submit() {
            Ok(ticket) => {
                println!("{}", TextPresenter::render(controller.state()));
                controller.run(&client, ticket).await;
            }
            Err(reason) => eprintln!("[input] submit refused: {reason:?}"),
        }
        println!("{}", TextPresenter::render(controller.state()));
    }
    Ok(())
}
