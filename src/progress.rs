//! Build-run progress reporting.
//!
//! A build run pushes human-readable status lines into a [`ProgressReporter`]
//! as it goes. The CLI writes them to **stderr** so stdout stays parseable;
//! the HTTP server streams them back to whoever triggered the update.
//!
//! Reporting is best effort. A reporter must never fail the run: write errors
//! are logged and swallowed.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use tokio::sync::mpsc::UnboundedSender;

/// Receives status lines from the build pipeline.
pub trait ProgressReporter: Send + Sync {
    /// Emit one message. Called synchronously, as the run progresses.
    fn report(&self, message: &str);
}

/// How a progress line is rendered.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum LineStyle {
    Plain,
    Html,
}

/// Render `message` as one timestamped line, `HH:MM:SS > message\n`.
pub fn format_line(at: DateTime<Local>, message: &str, style: LineStyle) -> String {
    let ts = at.format("%H:%M:%S");
    match style {
        LineStyle::Plain => format!("{} > {}\n", ts, message),
        LineStyle::Html => format!("{} &gt; {}\n", ts, escape_html(message)),
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(c),
        }
    }
    out
}

/// Page head sent before the first line of an HTML progress stream.
pub const STREAM_HEAD: &str = r##"<!DOCTYPE html>
<title>helpsearch update</title>
<style>
  html {font-family: monospace; white-space: pre-wrap; margin: 0 50px 80px;}
  body {margin: 0}
  h1 {margin: 0}
</style>
<h1>helpsearch update</h1>
<script>
  var auto_scroll = true
  setInterval(function(){
    auto_scroll && window.scrollTo(0,document.body.scrollHeight)
    document.body.style.backgroundColor = auto_scroll ? "white" : "#e8e8e8";
  }, 50)
</script>
<body onclick="auto_scroll = !auto_scroll">"##;

/// Timestamped plain lines on stderr, used by `helpsearch update`.
pub struct StderrProgress;

impl ProgressReporter for StderrProgress {
    fn report(&self, message: &str) {
        let line = format_line(Local::now(), message, LineStyle::Plain);
        let mut err = std::io::stderr().lock();
        if let Err(e) = err.write_all(line.as_bytes()).and_then(|_| err.flush()) {
            tracing::warn!(error = %e, "failed to write progress to stderr");
        }
    }
}

/// Feeds a streaming HTTP response through an unbounded channel.
///
/// Once the receiving side is gone (client disconnected) the first failed
/// send is logged and every later line is dropped silently.
pub struct StreamProgress {
    tx: UnboundedSender<String>,
    style: LineStyle,
    disconnected: AtomicBool,
}

impl StreamProgress {
    pub fn new(tx: UnboundedSender<String>, style: LineStyle) -> Self {
        Self {
            tx,
            style,
            disconnected: AtomicBool::new(false),
        }
    }
}

impl ProgressReporter for StreamProgress {
    fn report(&self, message: &str) {
        tracing::info!("{}", message);
        if self.disconnected.load(Ordering::Relaxed) {
            return;
        }
        let line = format_line(Local::now(), message, self.style);
        if self.tx.send(line).is_err() && !self.disconnected.swap(true, Ordering::Relaxed) {
            tracing::warn!("progress consumer disconnected, continuing update without it");
        }
    }
}

/// No-op reporter when progress is not wanted.
pub struct NoProgress;

impl ProgressReporter for NoProgress {
    fn report(&self, _message: &str) {}
}
