// Drive the built binary through stdin/stdout.

use std::io::Write;
use std::process::{Command, Output, Stdio};

use pretty_assertions::assert_eq;

fn run(args: &[&str], input: &[u8]) -> Output {
    let mut child = Command::new(env!("CARGO_BIN_EXE_html-converter"))
        .args(args)
        .env_remove("RUST_LOG")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("spawn html-converter");

    let mut stdin = child.stdin.take().expect("stdin is piped");
    // Rejected flags exit before reading input.
    let _ = stdin.write_all(input);
    drop(stdin);

    child.wait_with_output().expect("wait for html-converter")
}

fn stdout(output: &Output) -> String {
    String::from_utf8(output.stdout.clone()).expect("utf-8 stdout")
}

#[test]
fn test_converts_stdin_to_stdout() {
    let output = run(
        &[],
        b"<h2>Title</h2><div class=\"x\">hello <b>world</b></div><pre><code>line1\nline2\n</code></pre>",
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "## Title\n\n<div class=\"x\">hello <b>world</b></div>\n\n```\nline1\nline2\n```"
    );
    assert!(output.stderr.is_empty());
}

#[test]
fn test_empty_stdin_gives_empty_stdout() {
    let output = run(&[], b"");
    assert!(output.status.success());
    assert_eq!(stdout(&output), "");
}

#[test]
fn test_flags_override_defaults() {
    let output = run(
        &["--heading-style", "setext", "--preserve", "section"],
        b"<h1>Top</h1><div><b>flattened</b></div><section>kept</section>",
    );
    assert!(output.status.success());
    assert_eq!(
        stdout(&output),
        "Top\n===\n\n**flattened**\n\n<section>kept</section>"
    );
}

#[test]
fn test_invalid_option_fails_without_output() {
    let output = run(&["--bullet-list-marker", "#"], b"<p>x</p>");
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid conversion options"), "{stderr}");
}

#[test]
fn test_deeply_nested_div_is_preserved() {
    let depth = 10_000;
    let html = format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth));
    let output = run(&[], html.as_bytes());
    assert!(output.status.success());
    assert!(stdout(&output) == html, "nested div was not preserved");
}
