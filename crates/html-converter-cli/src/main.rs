use std::io::{self, Write};
use std::panic;
use std::thread;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use html_converter::{CodeBlockStyle, ConversionOptions, Converter, Filter, HeadingStyle, Rule};
use log::debug;

/// Read HTML from stdin and write Markdown to stdout.
///
/// Without options: ATX headings, fenced code blocks, and `div` elements
/// kept as raw HTML.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Heading style
    #[arg(long, value_enum, default_value_t = HeadingArg::Atx)]
    heading_style: HeadingArg,

    /// Code block style
    #[arg(long, value_enum, default_value_t = CodeBlockArg::Fenced)]
    code_block_style: CodeBlockArg,

    /// Bullet list marker (`*`, `-` or `+`)
    #[arg(long, value_name = "CHAR", default_value_t = '*')]
    bullet_list_marker: char,

    /// Element kept as raw HTML instead of converted (repeatable)
    #[arg(long = "preserve", value_name = "TAG", default_values_t = [String::from("div")])]
    preserve: Vec<String>,
}

/// Conversion recurses once per nesting level of the input.
const CONVERT_STACK_SIZE: usize = 256 * 1024 * 1024;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum HeadingArg {
    Atx,
    Setext,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum CodeBlockArg {
    Fenced,
    Indented,
}

impl Cli {
    fn options(&self) -> ConversionOptions {
        ConversionOptions {
            heading_style: match self.heading_style {
                HeadingArg::Atx => HeadingStyle::Atx,
                HeadingArg::Setext => HeadingStyle::Setext,
            },
            code_block_style: match self.code_block_style {
                CodeBlockArg::Fenced => CodeBlockStyle::Fenced,
                CodeBlockArg::Indented => CodeBlockStyle::Indented,
            },
            bullet_list_marker: self.bullet_list_marker,
            ..ConversionOptions::standard()
        }
    }

    fn converter(&self) -> Result<Converter> {
        let mut converter =
            Converter::with_options(self.options()).context("invalid conversion options")?;
        for tag in &self.preserve {
            converter.add_rule(&format!("keep-{tag}"), Rule::outer_html(Filter::tag(tag)));
        }
        Ok(converter)
    }
}

fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    debug!("{cli:?}");
    let converter = cli.converter()?;

    let markdown = thread::Builder::new()
        .name("convert".to_string())
        .stack_size(CONVERT_STACK_SIZE)
        .spawn(move || converter.convert_reader(io::stdin().lock()))
        .context("failed to start conversion thread")?
        .join()
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
        .context("failed to convert standard input")?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(markdown.as_bytes())
        .context("failed to write standard output")?;
    stdout.flush().context("failed to flush standard output")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn test_defaults_match_standard_converter() {
        let cli = Cli::parse_from(["html-converter"]);
        assert_eq!(cli.options(), ConversionOptions::standard());
        assert_eq!(cli.preserve, ["div"]);
        assert_eq!(
            cli.converter().unwrap().rules().custom_keys().collect::<Vec<_>>(),
            ["keep-div"]
        );
    }

    #[test]
    fn test_flags_map_onto_options() {
        let cli = Cli::parse_from([
            "html-converter",
            "--heading-style",
            "setext",
            "--code-block-style",
            "indented",
            "--bullet-list-marker",
            "-",
            "--preserve",
            "section",
            "--preserve",
            "aside",
        ]);
        let options = cli.options();
        assert_eq!(options.heading_style, HeadingStyle::Setext);
        assert_eq!(options.code_block_style, CodeBlockStyle::Indented);
        assert_eq!(options.bullet_list_marker, '-');
        assert_eq!(cli.preserve, ["section", "aside"]);
    }

    #[test]
    fn test_invalid_marker_is_an_error() {
        let cli = Cli::parse_from(["html-converter", "--bullet-list-marker", "#"]);
        let err = cli.converter().err().unwrap();
        assert_eq!(err.to_string(), "invalid conversion options");
    }
}
