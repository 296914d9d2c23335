//! Command dispatch

use std::io;
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_complete::generate;
use tracing::{debug, instrument};

use crate::application::services::{BuildOptions, IndexService, Opened};
use crate::cli::args::{Cli, Commands, ConfigCommands};
use crate::cli::error::{CliError, CliResult};
use crate::cli::{output, render};
use crate::config::{global_config_path, Settings, LOCAL_CONFIG_FILE};
use crate::domain::{BuildReport, ScoredTrie};
use crate::infrastructure::di::ServiceContainer;

pub fn execute_command(cli: &Cli) -> CliResult<()> {
    let Some(command) = &cli.command else {
        Cli::command()
            .print_help()
            .map_err(|e| CliError::Usage(e.to_string()))?;
        return Ok(());
    };

    // Completions and templates need no settings.
    match command {
        Commands::Completion { shell } => return _completion(*shell),
        Commands::Config {
            command: ConfigCommands::Template,
        } => {
            output::info(&Settings::template());
            return Ok(());
        }
        _ => {}
    }

    let settings = Settings::load(cli.config.as_deref())?;
    debug!("effective settings: {:?}", settings);
    let container = ServiceContainer::new(settings);
    let service = container.index_service();

    match command {
        Commands::Build {
            input,
            output,
            min_score,
            force,
        } => {
            let mut options = BuildOptions::from_settings(service.settings());
            if let Some(input) = input {
                options.input_dir = input.clone();
            }
            if let Some(output) = output {
                options.snapshot = output.clone();
            }
            if let Some(min_score) = min_score {
                options.min_score = *min_score;
            }
            options.force = *force;
            _build(&service, &options)
        }
        Commands::Stats { snapshot, top } => _stats(&service, snapshot.as_deref(), *top),
        Commands::Query {
            words,
            snapshot,
            limit,
        } => _query(&service, words, snapshot.as_deref(), *limit),
        Commands::Tree {
            prefix,
            snapshot,
            depth,
            limit,
        } => _tree(&service, prefix.as_deref(), snapshot.as_deref(), *depth, *limit),
        Commands::Run => _run(&service),
        Commands::Config { command } => _config(&container.settings, cli.config.as_deref(), command),
        Commands::Completion { .. } => Ok(()),
    }
}

fn _completion(shell: clap_complete::Shell) -> CliResult<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

#[instrument(skip(service))]
fn _build(service: &IndexService, options: &BuildOptions) -> CliResult<()> {
    let outcome = service.build_and_save(options)?;
    print_report(&outcome.report);
    output::action("root score", &outcome.root_score);
    output::success(&format!("snapshot written to {}", outcome.snapshot.display()));
    Ok(())
}

fn load(service: &IndexService, snapshot: Option<&Path>) -> CliResult<ScoredTrie> {
    let path: PathBuf = snapshot
        .map(Path::to_path_buf)
        .unwrap_or_else(|| service.settings().snapshot.clone());
    Ok(service.load(&path)?)
}

#[instrument(skip(service))]
fn _stats(service: &IndexService, snapshot: Option<&Path>, top: Option<usize>) -> CliResult<()> {
    let trie = load(service, snapshot)?;
    print_stats(&trie, top.unwrap_or(service.settings().top_k));
    Ok(())
}

#[instrument(skip(service))]
fn _query(
    service: &IndexService,
    words: &[String],
    snapshot: Option<&Path>,
    limit: Option<usize>,
) -> CliResult<()> {
    let trie = load(service, snapshot)?;
    let words = if words.is_empty() {
        service.settings().probe_words.as_slice()
    } else {
        words
    };
    print_probes(&trie, words, limit.unwrap_or(service.settings().top_k));
    Ok(())
}

#[instrument(skip(service))]
fn _tree(
    service: &IndexService,
    prefix: Option<&str>,
    snapshot: Option<&Path>,
    depth: usize,
    limit: Option<usize>,
) -> CliResult<()> {
    let trie = load(service, snapshot)?;
    let prefix = prefix.unwrap_or("");
    let Some(node) = trie.lookup(prefix) else {
        return Err(CliError::InvalidArgs(format!("prefix not in tree: {prefix}")));
    };
    let label = if prefix.is_empty() { "<root>" } else { prefix };
    let limit = limit.or(Some(service.settings().top_k));
    output::info(&render::to_tree_string(label, node, depth, limit));
    Ok(())
}

/// Build when the snapshot is missing, otherwise load it; then report and
/// probe the configured words.
#[instrument(skip(service))]
fn _run(service: &IndexService) -> CliResult<()> {
    let opened = service.open_or_build()?;
    match &opened {
        Opened::Loaded(_) => {
            output::action("loaded", &service.settings().snapshot.display());
        }
        Opened::Built(outcome) => {
            print_report(&outcome.report);
            output::action("built", &outcome.snapshot.display());
        }
    }

    let settings = service.settings();
    let trie = opened.trie();
    print_stats(trie, settings.top_k);
    print_probes(trie, &settings.probe_words, settings.top_k);
    Ok(())
}

fn _config(settings: &Settings, local: Option<&Path>, command: &ConfigCommands) -> CliResult<()> {
    match command {
        ConfigCommands::Show => output::info(&settings.to_toml()?),
        ConfigCommands::Template => output::info(&Settings::template()),
        ConfigCommands::Path => {
            match global_config_path() {
                Some(path) => output::action("global", &path.display()),
                None => output::warning("cannot determine global config directory"),
            }
            let local = local.unwrap_or_else(|| Path::new(LOCAL_CONFIG_FILE));
            output::action("local", &local.display());
        }
    }
    Ok(())
}

fn print_report(report: &BuildReport) {
    output::header("Build");
    output::detail(&format!("sources:   {}", report.sources));
    output::detail(&format!("records:   {}", report.records));
    output::detail(&format!("accepted:  {}", report.accepted));
    output::detail(&format!("filtered:  {}", report.filtered));
    output::detail(&format!("malformed: {}", report.malformed));
}

fn print_stats(trie: &ScoredTrie, top: usize) {
    let stats = trie.stats();
    output::header("Tree");
    output::detail(&format!("nodes:          {}", stats.total_nodes));
    output::detail(&format!("terminals:      {}", stats.terminal_nodes));
    output::detail(&format!("max depth:      {}", stats.max_depth));
    output::detail(&format!("unique symbols: {}", stats.unique_symbols));
    output::detail(&format!("root score:     {}", stats.root_score));

    output::header(&format!("Top {top} first symbols"));
    for (symbol, score) in trie.top_level(top) {
        output::detail(&format!("{symbol}\t{score}"));
    }
}

fn print_probes(trie: &ScoredTrie, words: &[String], limit: usize) {
    output::header("Continuations");
    for word in words {
        match trie.lookup(word) {
            Some(node) => {
                let next = node
                    .ordered_children_scored(Some(limit))
                    .into_iter()
                    .map(|(symbol, score)| format!("{symbol}:{score}"))
                    .collect::<Vec<_>>()
                    .join(" ");
                output::detail(&format!("{word} ({}) -> {next}", node.score()));
            }
            None => output::missing(&format!("{word} not in tree")),
        }
    }
}
