//! Streaming runs: partial forwarding, terminal stream records and the
//! polling fallback.

mod common;

use common::{bridge_config, discover, first_text, web_search_listing};
use runbridge_core::{ContentBlock, InvocationContext};
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::sync::mpsc;

async fn listing(server: &mut mockito::ServerGuard) {
    server
        .mock("GET", "/tools")
        .with_status(200)
        .with_body(web_search_listing())
        .create_async()
        .await;
}

#[tokio::test]
async fn test_partials_reach_the_sink_and_become_outputs() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    listing(&mut server).await;
    server
        .mock("POST", "/runs")
        .with_status(200)
        .with_body(r#"{"runId":"r3","streamUrl":"runs/r3/stream"}"#)
        .create_async()
        .await;
    let stream = server
        .mock("GET", "/runs/r3/stream")
        .match_header("authorization", "Bearer test-api-key")
        .with_status(200)
        .with_header("content-type", "application/x-ndjson")
        .with_body(concat!(
            "[2026-10-18T10:00:00Z] [INFO] [worker-1] booting model\n",
            "\n",
            "{\"partial\":\"Hel\"}\n",
            "INFO: halfway there\n",
            "data: {\"partial\":\"lo\"}\n",
        ))
        .expect(1)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/runs/r3")
        .with_status(200)
        .with_body(r#"{"status":"completed"}"#)
        .expect(1)
        .create_async()
        .await;

    let (registry, _) = discover(&bridge_config(&server.url())).await?;
    let (tx, mut rx) = mpsc::unbounded_channel::<Value>();
    let ctx = InvocationContext::new().with_sink(Arc::new(tx));
    let output = registry
        .invoke("Web_Search", json!({"input": "hello"}), ctx)
        .await;

    stream.assert_async().await;
    status.assert_async().await;

    let mut forwarded = Vec::new();
    while let Ok(partial) = rx.try_recv() {
        forwarded.push(partial);
    }
    assert_eq!(forwarded, vec![json!({"partial": "Hel"}), json!({"partial": "lo"})]);

    assert!(!output.is_error);
    let text = first_text(&output);
    assert!(text.contains("Hel"), "{}", text);
    assert!(text.contains("lo"), "{}", text);
    assert!(!text.contains("booting"), "{}", text);
    Ok(())
}

#[tokio::test]
async fn test_terminal_stream_record_skips_polling() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    listing(&mut server).await;
    server
        .mock("POST", "/runs")
        .with_status(200)
        .with_body(r#"{"runId":"r4","streamUrl":"/runs/r4/events"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/runs/r4/events")
        .with_status(200)
        .with_body(concat!(
            "{\"partial\":\"draft\"}\n",
            "{\"status\":\"completed\",\"outputs\":{\"markdown\":\"**final**\"}}\n",
        ))
        .create_async()
        .await;
    let status = server
        .mock("GET", "/runs/r4")
        .expect(0)
        .create_async()
        .await;

    let (registry, _) = discover(&bridge_config(&server.url())).await?;
    let output = registry
        .invoke("Web_Search", json!({"input": "x"}), InvocationContext::new())
        .await;

    status.assert_async().await;
    assert!(!output.is_error);
    assert_eq!(output.content, vec![ContentBlock::text("**final**")]);
    Ok(())
}

#[tokio::test]
async fn test_unopenable_stream_falls_back_to_polling() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    listing(&mut server).await;
    server
        .mock("POST", "/runs")
        .with_status(200)
        .with_body(r#"{"runId":"r5","streamUrl":"runs/r5/stream"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/runs/r5/stream")
        .with_status(404)
        .create_async()
        .await;
    let status = server
        .mock("GET", "/runs/r5")
        .with_status(200)
        .with_body(r#"{"status":"completed","outputs":"polled result"}"#)
        .expect(1)
        .create_async()
        .await;

    let (registry, _) = discover(&bridge_config(&server.url())).await?;
    let output = registry
        .invoke("Web_Search", json!({"input": "x"}), InvocationContext::new())
        .await;

    status.assert_async().await;
    assert!(!output.is_error);
    assert_eq!(output.content, vec![ContentBlock::text("polled result")]);
    Ok(())
}

#[tokio::test]
async fn test_stream_failure_record_fails_the_run() -> anyhow::Result<()> {
    let mut server = mockito::Server::new_async().await;
    listing(&mut server).await;
    server
        .mock("POST", "/runs")
        .with_status(200)
        .with_body(r#"{"runId":"r6","streamUrl":"runs/r6/stream"}"#)
        .create_async()
        .await;
    server
        .mock("GET", "/runs/r6/stream")
        .with_status(200)
        .with_body("{\"status\":\"failed\",\"error\":\"out of memory\"}\n")
        .create_async()
        .await;

    let (registry, _) = discover(&bridge_config(&server.url())).await?;
    let output = registry
        .invoke("Web_Search", json!({"input": "x"}), InvocationContext::new())
        .await;

    assert!(output.is_error);
    assert_eq!(
        first_text(&output),
        "Tool 'Web_Search' failed during execution: out of memory"
    );
    Ok(())
}
