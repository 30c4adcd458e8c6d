use appbridge_executor::engine::OsaScriptRunner;
use appbridge_executor::handler;
use tokio::io::AsyncReadExt;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> std::io::Result<()> {
    // Stdout is the response document; all diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut input = Vec::new();
    tokio::io::stdin().read_to_end(&mut input).await?;

    let response = handler::process(&input, &OsaScriptRunner).await;

    let body = serde_json::to_string(&response).unwrap_or_else(|_| {
        // Last resort: a hand-built failure document.
        format!(
            "{{\"requestId\":\"{}\",\"ok\":false,\"error\":{{\"code\":\"UNKNOWN_ERROR\",\"message\":\"Failed to encode response\"}}}}",
            response.request_id()
        )
    });

    let mut stdout = tokio::io::stdout();
    stdout.write_all(body.as_bytes()).await?;
    stdout.flush().await?;
    Ok(())
}
