//! Interactive and one-shot chat on the terminal.

use std::io::Write;
use std::sync::Arc;

use anyhow::{Context, Result};
use gridchat_client::{
    Answer, AskOutcome, Assistant, BackendApi, ClientConfig, HealthMonitor, HttpBackend,
    Session, WriteOutcome, WriteReport,
};
use gridchat_protocol::HealthReport;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Run one ask, cancelling it on Ctrl-C.
async fn ask_cancellable(
    assistant: &Assistant,
    session: &mut Session,
    question: &str,
) -> Result<AskOutcome> {
    let ask = assistant.ask(session, question);
    tokio::pin!(ask);
    loop {
        tokio::select! {
            outcome = &mut ask => return Ok(outcome?),
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                assistant.cancel();
            }
        }
    }
}

pub async fn ask_once(assistant: &Assistant, question: &str) -> Result<()> {
    let mut session = assistant.load_session();
    let outcome = ask_cancellable(assistant, &mut session, question).await?;
    print_outcome(&outcome);
    Ok(())
}

pub async fn run(assistant: Assistant) -> Result<()> {
    let config = assistant.config().clone();
    let monitor = start_monitor(&config)?;
    let assistant = assistant.with_monitor(monitor.pause_handle());
    let mut session = assistant.load_session();

    eprintln!(
        "gridchat: {} previous messages, write mode {}. Type /quit to leave.",
        session.len(),
        if config.write_mode { "on" } else { "off" }
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("Failed to read input")? else {
            break;
        };
        let line = line.trim();
        match line {
            "" => continue,
            "/quit" | "/exit" => break,
            "/clear" => {
                session.clear();
                assistant.save_session(&session)?;
                eprintln!("Conversation cleared");
            }
            "/reset" => {
                session.reset(assistant.system_prompt());
                assistant.save_session(&session)?;
                eprintln!("Conversation reset");
            }
            "/status" => print_status(monitor.latest()),
            question => match ask_cancellable(&assistant, &mut session, question).await {
                Ok(outcome) => print_outcome(&outcome),
                Err(e) => eprintln!("error: {e:#}"),
            },
        }
    }

    monitor.stop();
    Ok(())
}

fn start_monitor(config: &ClientConfig) -> Result<HealthMonitor> {
    let backend: Arc<dyn BackendApi> = Arc::new(HttpBackend::new(&config.backend_url)?);
    let monitor = HealthMonitor::new(backend, config.health_interval());
    monitor.start();
    Ok(monitor)
}

fn print_status(report: Option<HealthReport>) {
    match report {
        None => eprintln!("bridge: not probed yet"),
        Some(report) if report.is_healthy() => eprintln!(
            "bridge: healthy ({})",
            report.workbook.as_deref().unwrap_or("unnamed workbook")
        ),
        Some(report) => eprintln!(
            "bridge: unhealthy ({})",
            report.error.as_deref().unwrap_or("unknown error")
        ),
    }
}

fn print_outcome(outcome: &AskOutcome) {
    match outcome {
        AskOutcome::Answered(answer) => print_answer(answer),
        AskOutcome::Cancelled => eprintln!("(cancelled)"),
        AskOutcome::Superseded => eprintln!("(reply dropped: a newer question is pending)"),
    }
}

fn print_answer(answer: &Answer) {
    if let Some(notice) = &answer.notice {
        eprintln!("note: {notice}");
    }
    println!("{}", answer.reply);
    match &answer.write {
        None => {}
        Some(WriteOutcome::Applied(report)) => print_report(report),
        Some(WriteOutcome::Failed(e)) => eprintln!("write failed: {e}"),
    }
}

fn print_report(report: &WriteReport) {
    eprintln!(
        "Applied {} of {} operations",
        report.succeeded,
        report.outcomes.len()
    );
    for outcome in report.failures() {
        eprintln!(
            "  failed: {}",
            outcome.result.error.as_deref().unwrap_or("unknown error")
        );
    }
}
