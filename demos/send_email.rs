//! # Example: send_email
//!
//! A flaky "send_email" handler behind the priority queue, plus the standalone
//! retry wrapper around an unreliable SMTP handshake.
//!
//! The handler fails twice with a network error, then succeeds. With
//! `max_retries = 2` and `retry_delay = 1s` the task completes after ~3s
//! (1s before the first retry, 2s before the second).
//!
//! ## Run
//! ```bash
//! RUST_LOG=info cargo run --example send_email --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use taskpool::{
    Config, HandlerFn, LogWriter, Payload, Priority, Retry, Scheduler, Subscribe, SubmitOptions,
    TaskContext, TaskError, TaskStatus,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Deserialize)]
struct Email {
    to: String,
    subject: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let handshakes = AtomicU32::new(0);
    let banner = Retry::new()
        .named("smtp-handshake")
        .max_attempts(3)
        .delay(Duration::from_millis(200))
        .run(|| async {
            if handshakes.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(TaskError::network("connection refused"))
            } else {
                Ok("220 smtp.example.com ESMTP")
            }
        })
        .await?;
    println!("handshake: {banner}");

    let cfg = Config {
        workers: 2,
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let scheduler = Scheduler::builder(cfg).with_subscribers(subs).build();

    let sends = Arc::new(AtomicU32::new(0));
    let counter = Arc::clone(&sends);
    scheduler.register(
        "send_email",
        HandlerFn::arc(move |ctx: TaskContext| {
            let counter = Arc::clone(&counter);
            async move {
                let email: Email = ctx
                    .payload
                    .kwargs_as()
                    .map_err(|e| TaskError::fatal(e.to_string()))?;
                if counter.fetch_add(1, Ordering::SeqCst) < 2 {
                    return Err(TaskError::network("connection reset by peer"));
                }
                Ok(json!({ "delivered_to": email.to, "subject": email.subject }))
            }
        }),
    )?;
    scheduler.start().await;

    let id = scheduler
        .submit(
            "send_email",
            Payload::new()
                .kwarg("to", "ops@example.com")
                .kwarg("subject", "Weekly report"),
            SubmitOptions::default()
                .with_priority(Priority::High)
                .with_max_retries(2)
                .with_retry_delay(Duration::from_secs(1)),
        )
        .await?;

    let snap = loop {
        let snap = scheduler.get(id).await.ok_or("task vanished")?;
        if snap.status.is_terminal() {
            break snap;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    };
    println!(
        "task {id}: {} after {} attempts -> {}",
        snap.status,
        snap.attempts,
        serde_json::to_string(&snap.result)?
    );
    assert_eq!(snap.status, TaskStatus::Completed);
    println!("stats: {}", serde_json::to_string(&scheduler.stats().await)?);

    scheduler.shutdown().await?;
    Ok(())
}
