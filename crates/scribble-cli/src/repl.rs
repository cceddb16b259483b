//! Interactive session.
//!
//! Each input line is one run in the current language. `:lang <tag>`
//! switches language and `:quit` exits.

use std::sync::Arc;

use scribble_core::{Dispatcher, ExecutionRequest, Language, LanguageTag, PlaygroundConfig};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::colors;
use crate::playground::{self, PlaygroundArgs};
use crate::run;
use crate::terminal::TerminalSink;

/// What one input line asks for.
#[derive(Debug, PartialEq, Eq)]
enum Input<'a> {
    Empty,
    Quit,
    Switch(LanguageTag),
    Help,
    Code(&'a str),
}

fn parse_input(line: &str) -> Input<'_> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }
    match trimmed.split_once(char::is_whitespace) {
        Some((":lang", tag)) => Input::Switch(run::user_tag(tag)),
        _ => match trimmed {
            ":quit" | ":q" | ":exit" => Input::Quit,
            ":help" | ":lang" => Input::Help,
            _ => Input::Code(line),
        },
    }
}

/// Run the interactive loop until `:quit` or end of input.
pub async fn execute(language: &str, args: &PlaygroundArgs) -> anyhow::Result<()> {
    let config = playground::load_config(args)?;
    let dispatcher = playground::mount(&config, args.in_process, Arc::new(TerminalSink));
    let mut language = run::user_tag(language);

    println!(
        "{}scribble{} {} (type :help for commands)",
        colors::BOLD,
        colors::RESET,
        env!("CARGO_PKG_VERSION")
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{}{}>{} ", colors::CYAN, language, colors::RESET);
        colors::flush_stdout();

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_input(&line) {
            Input::Empty => {}
            Input::Quit => break,
            Input::Help => print_help(),
            Input::Switch(tag) => {
                if tag.language().is_none() {
                    println!("{}unknown language '{}'{}", colors::RED, tag, colors::RESET);
                } else {
                    language = tag;
                }
            }
            Input::Code(code) => run_line(&dispatcher, &config, &language, code).await,
        }
    }

    dispatcher.session().shutdown().await?;
    Ok(())
}

async fn run_line(dispatcher: &Dispatcher, config: &PlaygroundConfig, language: &LanguageTag, code: &str) {
    if *language == LanguageTag::Known(Language::Python) && !dispatcher.session().is_ready() {
        if let Ok(worker) = dispatcher.session().acquire() {
            println!("{}waiting for the interpreter...{}", colors::DIM, colors::RESET);
            if let Err(e) = worker.wait_ready(config.ready_timeout()).await {
                println!("{}{}{}", colors::RED, e.with_hint(), colors::RESET);
                return;
            }
        }
    }

    dispatcher
        .run(ExecutionRequest::new(language.clone(), code))
        .finished()
        .await;
}

fn print_help() {
    println!(":lang <tag>   switch language (python, javascript, react)");
    println!(":quit         leave the session");
}
