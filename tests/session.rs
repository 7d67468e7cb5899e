//! End-to-end session tests against an in-process grading server.
//!
//! These tests stand up a real WebSocket listener (and, for discovery, a
//! canned HTTP responder) on a loopback port and drive the adapter through
//! the full connect → challenge → response → result → dispatch sequence.

use std::time::Duration;

use anyhow::{bail, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;
use tokio_tungstenite::accept_hdr_async;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::WebSocketStream;

use gradelink::auth::compute_auth_code;
use gradelink::catalog::CatalogClient;
use gradelink::{Adapter, AdapterEvent, ConnectionConfig, ConnectionState, Status};

const WAIT: Duration = Duration::from_secs(5);

fn challenge_frame(nonce: &str) -> Message {
    Message::Text(
        json!({
            "type": "authentication",
            "subtype": "challenge",
            "arguments": { "challenge": nonce }
        })
        .to_string()
        .into(),
    )
}

fn result_frame(success: bool) -> Message {
    Message::Text(
        json!({
            "type": "authentication",
            "subtype": "result",
            "arguments": { "success": success }
        })
        .to_string()
        .into(),
    )
}

/// Reads the next text frame, skipping control frames.
async fn next_text(ws: &mut WebSocketStream<TcpStream>) -> Result<Value> {
    loop {
        match timeout(WAIT, ws.next()).await? {
            Some(Ok(Message::Text(text))) => return Ok(serde_json::from_str(&text)?),
            Some(Ok(_)) => continue,
            Some(Err(e)) => bail!("server-side channel error: {e}"),
            None => bail!("channel ended before a text frame arrived"),
        }
    }
}

/// Waits until the peer closes the channel.
async fn expect_close(ws: &mut WebSocketStream<TcpStream>) -> Result<()> {
    loop {
        match timeout(WAIT, ws.next()).await? {
            Some(Ok(Message::Close(_))) | None => return Ok(()),
            Some(Ok(_)) => continue,
            Some(Err(_)) => return Ok(()),
        }
    }
}

/// Accepts one client, echoing (and capturing) the requested sub-protocol.
async fn accept_client(listener: &TcpListener) -> Result<(WebSocketStream<TcpStream>, String)> {
    let (stream, _) = timeout(WAIT, listener.accept()).await??;
    let mut subprotocol = String::new();
    let ws = accept_hdr_async(stream, |req: &Request, mut resp: Response| {
        if let Some(proto) = req.headers().get("Sec-WebSocket-Protocol") {
            subprotocol = proto.to_str().unwrap_or_default().to_string();
            resp.headers_mut()
                .insert("Sec-WebSocket-Protocol", proto.clone());
        }
        Ok(resp)
    })
    .await?;
    Ok((ws, subprotocol))
}

/// Polls until the handshake has completed.
async fn wait_ready(adapter: &Adapter) -> Result<()> {
    timeout(WAIT, async {
        while adapter.state() != ConnectionState::Ready {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await?;
    Ok(())
}

async fn next_status(events: &mut tokio::sync::mpsc::UnboundedReceiver<AdapterEvent>) -> Result<Status> {
    loop {
        match timeout(WAIT, events.recv()).await? {
            Some(AdapterEvent::Status(status)) => return Ok(status),
            Some(AdapterEvent::ActionsChanged(_)) => continue,
            None => bail!("event stream ended"),
        }
    }
}

#[tokio::test]
async fn handshake_then_dispatch() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let server = tokio::spawn(async move {
        let (mut ws, subprotocol) = accept_client(&listener).await?;

        ws.send(challenge_frame("nonce-42")).await?;
        let response = next_text(&mut ws).await?;
        ws.send(result_frame(true)).await?;

        let first = next_text(&mut ws).await?;
        let second = next_text(&mut ws).await?;
        Ok::<_, anyhow::Error>((subprotocol, response, first, second))
    });

    let (adapter, mut events) = Adapter::new();
    adapter.start(ConnectionConfig::new("127.0.0.1").with_port(port.to_string()));

    assert_eq!(next_status(&mut events).await?, Status::Connecting);
    assert_eq!(next_status(&mut events).await?, Status::Ok);

    // Dispatch only once the handshake is done, so the command pair is the
    // next thing on the wire after the authentication response.
    wait_ready(&adapter).await?;
    adapter.apply_grade(3, "uid-xyz").await?;

    let (subprotocol, response, first, second) = timeout(WAIT, server).await???;

    assert_eq!(subprotocol, "lgremote");
    assert_eq!(
        response,
        json!({
            "type": "authentication",
            "subtype": "response",
            "arguments": {
                "response": compute_auth_code("nonce-42"),
                "device": "Companion"
            }
        })
    );
    assert_eq!(
        first,
        json!({
            "type": "command",
            "subtype": "changeDevice",
            "arguments": { "index": 3 }
        })
    );
    assert_eq!(
        second,
        json!({
            "type": "command",
            "subtype": "applyGrade",
            "arguments": { "uid": "uid-xyz" }
        })
    );

    adapter.stop();
    assert_eq!(adapter.status(), Status::Disconnected);
    Ok(())
}

#[tokio::test]
async fn rejected_auth_closes_channel() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_client(&listener).await?;

        ws.send(challenge_frame("n")).await?;
        let _response = next_text(&mut ws).await?;
        ws.send(result_frame(false)).await?;

        // The adapter must close the channel, not keep talking.
        expect_close(&mut ws).await
    });

    let (adapter, mut events) = Adapter::new();
    adapter.start(ConnectionConfig::new("127.0.0.1").with_port(port.to_string()));

    assert_eq!(next_status(&mut events).await?, Status::Connecting);
    assert_eq!(next_status(&mut events).await?, Status::Ok);

    timeout(WAIT, server).await???;

    adapter.stop();
    Ok(())
}

#[tokio::test]
async fn malformed_frames_leave_session_usable() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let server = tokio::spawn(async move {
        let (mut ws, _) = accept_client(&listener).await?;

        ws.send(Message::Text("not json at all".into())).await?;
        ws.send(Message::Text(r#"{"type":"update","payload":{}}"#.into()))
            .await?;
        ws.send(challenge_frame("after-noise")).await?;
        next_text(&mut ws).await
    });

    let (adapter, mut events) = Adapter::new();
    adapter.start(ConnectionConfig::new("127.0.0.1").with_port(port.to_string()));

    assert_eq!(next_status(&mut events).await?, Status::Connecting);
    assert_eq!(next_status(&mut events).await?, Status::Ok);

    // The noise is discarded and the handshake still answers the challenge.
    let response = timeout(WAIT, server).await???;
    assert_eq!(
        response["arguments"]["response"],
        json!(compute_auth_code("after-noise"))
    );

    adapter.stop();
    Ok(())
}

#[tokio::test]
async fn stop_prevents_reconnect() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let (adapter, mut events) = Adapter::new();
    adapter.start(ConnectionConfig::new("127.0.0.1").with_port(port.to_string()));

    let (ws, _) = accept_client(&listener).await?;
    assert_eq!(next_status(&mut events).await?, Status::Connecting);
    assert_eq!(next_status(&mut events).await?, Status::Ok);

    adapter.stop();
    assert_eq!(next_status(&mut events).await?, Status::Disconnected);
    drop(ws);

    // The reconnect delay is 5s; nothing may dial in after an explicit stop.
    let redial = timeout(Duration::from_millis(5750), listener.accept()).await;
    assert!(redial.is_err(), "adapter reconnected after stop()");
    Ok(())
}

#[tokio::test]
async fn unreachable_server_reports_failure_and_retries_nothing_else() -> Result<()> {
    // Bind-then-drop to obtain a port with no listener behind it.
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    drop(listener);

    let (adapter, mut events) = Adapter::new();
    adapter.start(ConnectionConfig::new("127.0.0.1").with_port(port.to_string()));

    assert_eq!(next_status(&mut events).await?, Status::Connecting);
    match next_status(&mut events).await? {
        Status::ConnectionFailure { .. } => {}
        other => bail!("expected ConnectionFailure, got {other:?}"),
    }

    adapter.stop();
    Ok(())
}

#[tokio::test]
async fn catalog_fetches_slots_then_looks() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();

    let server = tokio::spawn(async move {
        let bodies = [
            r#"{"result":[{"index":1},{"index":2,"label":"Main"}]}"#,
            r#"{"result":[{"uid":"uid-1","name":"Night"}]}"#,
        ];
        let mut request_lines = Vec::new();

        for body in bodies {
            let (mut stream, _) = timeout(WAIT, listener.accept()).await??;
            let mut buf = vec![0u8; 4096];
            let n = timeout(WAIT, stream.read(&mut buf)).await??;
            let head = String::from_utf8_lossy(&buf[..n]).to_string();
            request_lines.push(head.lines().next().unwrap_or_default().to_string());

            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            stream.write_all(response.as_bytes()).await?;
        }
        Ok::<_, anyhow::Error>(request_lines)
    });

    let client = CatalogClient::new(&format!("http://127.0.0.1:{port}"))?;
    let slots = client.fetch_slots("C0DE").await?;
    let looks = client.fetch_looks("C0DE").await?;

    assert_eq!(slots.len(), 2);
    assert_eq!(slots[0].display_label(), "Slot 1");
    assert_eq!(slots[1].display_label(), "Main");
    assert_eq!(looks.len(), 1);
    assert_eq!(looks[0].uid, "uid-1");

    let request_lines = timeout(WAIT, server).await???;
    assert_eq!(request_lines[0], "GET /devices/slots?auth=C0DE HTTP/1.1");
    assert_eq!(request_lines[1], "GET /library/grades?auth=C0DE HTTP/1.1");
    Ok(())
}
