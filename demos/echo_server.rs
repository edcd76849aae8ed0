//! An echo server showing routing, streamed request bodies and streamed responses.
//!
//! Try it with curl:
//!
//! ```text
//! curl -X POST --data Hello http://127.0.0.1:8081/echo/World
//! curl -N http://127.0.0.1:8081/count/5
//! curl http://127.0.0.1:8081/broken
//! ```

use std::time::Duration;

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use log::info;

use flowhttp_rs::{HttpResponse, HttpServer, Router, ServerConfig, ServerError, StatusCode};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = ServerConfig {
        addr: "127.0.0.1:8081".parse()?,
        ..ServerConfig::default()
    };

    let router = Router::builder()
        .get("/", |_req| async {
            Ok::<_, ServerError>(
                HttpResponse::new(StatusCode::Ok)
                    .with_content_type("text/plain")
                    .with_body_string("flowhttp-rs echo server\n"),
            )
        })
        // "<body> <name>!"
        .post("/echo/{name}", |mut req| async move {
            let name = req.param("name").unwrap_or_default().to_string();
            let text = req.text().await?;
            Ok::<_, ServerError>(
                HttpResponse::new(StatusCode::Ok)
                    .with_content_type("text/plain")
                    .with_body_string(format!("{text} {name}!")),
            )
        })
        // one chunk per number, paced so the chunks are visible
        .get("/count/{n}", |req| async move {
            let n: u64 = req.param("n").and_then(|n| n.parse().ok()).unwrap_or(10);
            let numbers = stream::iter(1..=n).then(|i| async move {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok::<_, std::io::Error>(Bytes::from(format!("{i}\n")))
            });
            Ok::<_, ServerError>(
                HttpResponse::new(StatusCode::Ok)
                    .with_content_type("text/plain")
                    .with_body_stream(numbers),
            )
        })
        // fails after the status is sent: the client sees an aborted transfer
        .get("/broken", |_req| async {
            let chunks = stream::iter(0..5).map(|i| {
                if i == 3 {
                    return Err(std::io::Error::new(std::io::ErrorKind::Other, "producer gave up"));
                }
                Ok(Bytes::from(format!("chunk {i}\n")))
            });
            Ok::<_, ServerError>(HttpResponse::new(StatusCode::Ok).with_body_stream(chunks))
        })
        .build()?;

    let server = HttpServer::new(config, router);
    info!("Starting server on http://127.0.0.1:8081");
    server.start().await?;

    let counters = server.counters();
    info!(
        "Served {} exchanges, aborted {}",
        counters.completed(),
        counters.aborted()
    );
    Ok(())
}
