use std::{
    io::{BufWriter, Write},
    path::PathBuf,
};

use anyhow::{bail, Context};
use blogmd::{MarkdownOptions, Parser, ParserOptions, DEFAULT_MAX_LINE_LENGTH};
use clap::{command, value_parser, Arg, ArgAction};
use log::{debug, info};

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let matches = command!()
        .args(&[
            Arg::new("file")
                .help("Markdown file to parse")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
            Arg::new("format")
                .help("What to print: rendered body, whole document or metadata only")
                .long("format")
                .short('f')
                .value_parser(["html", "json", "meta"])
                .default_value("html"),
            Arg::new("max_line_length")
                .help("Longest front matter line accepted, in bytes")
                .long("max-line-length")
                .env("BLOGMD_MAX_LINE_LENGTH")
                .value_parser(value_parser!(usize))
                .default_value(DEFAULT_MAX_LINE_LENGTH.to_string()),
            Arg::new("hard_breaks")
                .help("Render soft line breaks as <br />")
                .long("hard-breaks")
                .env("BLOGMD_HARD_BREAKS")
                .action(ArgAction::SetTrue),
            Arg::new("no_tables")
                .help("Disable table syntax")
                .long("no-tables")
                .env("BLOGMD_NO_TABLES")
                .action(ArgAction::SetTrue),
            Arg::new("no_strikethrough")
                .help("Disable ~~strikethrough~~ syntax")
                .long("no-strikethrough")
                .env("BLOGMD_NO_STRIKETHROUGH")
                .action(ArgAction::SetTrue),
        ])
        .get_matches();

    let file: &PathBuf = matches
        .get_one("file")
        .context("file argument is required")?;
    if !file.is_file() {
        bail!("{file:?} must be a file.");
    }
    let format = matches
        .get_one::<String>("format")
        .map(String::as_str)
        .unwrap_or("html");
    let max_line_length = *matches
        .get_one::<usize>("max_line_length")
        .context("max-line-length has a default")?;
    if max_line_length == 0 {
        bail!("max-line-length must be positive.");
    }

    let options = ParserOptions {
        max_line_length,
        markdown: MarkdownOptions {
            strikethrough: !matches.get_flag("no_strikethrough"),
            tables: !matches.get_flag("no_tables"),
            hard_breaks: matches.get_flag("hard_breaks"),
        },
    };
    debug!("{options:?}");
    let parser = Parser::new(options);

    let content = std::fs::read(file).with_context(|| format!("while reading {file:?}"))?;
    info!("parsing {file:?} ({} bytes)", content.len());

    let stdout = std::io::stdout();
    let mut writer = BufWriter::new(stdout.lock());
    match format {
        "meta" => {
            let metadata = parser.parse_metadata(&content);
            serde_json::to_writer_pretty(&mut writer, &metadata)?;
            writeln!(writer)?;
        }
        "json" => {
            let document = parser
                .parse_markdown(&content)
                .with_context(|| format!("while parsing {file:?}"))?;
            serde_json::to_writer_pretty(&mut writer, &document)?;
            writeln!(writer)?;
        }
        _ => {
            let document = parser
                .parse_markdown(&content)
                .with_context(|| format!("while parsing {file:?}"))?;
            if document.metadata.date_is_fallback {
                debug!("{file:?} has no date, using current time");
            }
            writer.write_all(document.body.as_bytes())?;
        }
    }
    writer.flush()?;

    Ok(())
}
