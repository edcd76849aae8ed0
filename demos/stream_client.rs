//! A client streaming a request body and reading the response chunk by chunk.
//!
//! Run `echo_server` first.

use bytes::Bytes;
use futures_util::{stream, StreamExt};
use log::{error, info};

use flowhttp_rs::{ClientConfig, HttpClient};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let client = HttpClient::new(ClientConfig::new("127.0.0.1:8081".parse()?));

    let parts = ["Hel", "lo"].map(|part| Ok::<_, std::io::Error>(Bytes::from_static(part.as_bytes())));
    let mut response = client.post("/echo/World").body_stream(stream::iter(parts)).send().await?;
    info!("POST /echo/World -> {} {}", response.status(), response.reason());
    info!("  body: {}", response.text().await?);

    let mut response = client.get("/count/5").send().await?;
    info!("GET /count/5 -> {}", response.status());
    let mut body = response.body()?;
    while let Some(chunk) = body.next().await {
        info!("  chunk: {:?}", chunk?);
    }

    let mut response = client.get("/broken").send().await?;
    info!("GET /broken -> {}", response.status());
    let mut body = response.body()?;
    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => info!("  chunk: {chunk:?}"),
            Err(e) if e.is_incomplete() => {
                error!("  server aborted the body: {e}");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
