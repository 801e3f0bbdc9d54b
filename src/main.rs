// Main entry point for the RustyReports CLI
// Renders stored reports, resolves ad-hoc templates, and provides an
// interactive shell over the embedded datasource

use anyhow::{anyhow, Context, Result};
use clap::{Parser as ClapParser, Subcommand};
use rustyreports::{
    resolve, HtmlReportRenderer, MemoryDataSource, ParameterMap, RenderRequest, Report,
    Resolution, Scalar,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// RustyReports - template-driven reports over a SQL datasource
#[derive(ClapParser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a stored report to HTML
    Render {
        /// Report definition (JSON)
        #[arg(short, long)]
        report: PathBuf,

        /// Render request (JSON) carrying params and printing options
        #[arg(long)]
        request: Option<PathBuf>,

        /// SQL script to seed the embedded datasource with
        #[arg(short, long)]
        seed: Option<PathBuf>,

        /// Parameter as name=value, overriding the request's params
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Scalar)>,

        /// Write the document here instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Resolve the directives of a template and print the result
    Resolve {
        /// Template file
        #[arg(short, long)]
        template: PathBuf,

        #[arg(short, long)]
        seed: Option<PathBuf>,

        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, Scalar)>,
    },

    /// Interactive shell over the embedded datasource
    Shell {
        #[arg(short, long)]
        seed: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "rustyreports=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Render {
            report,
            request,
            seed,
            params,
            output,
        } => run_render(&report, request.as_deref(), seed.as_deref(), params, output.as_deref()),
        Command::Resolve {
            template,
            seed,
            params,
        } => run_resolve(&template, seed.as_deref(), params),
        Command::Shell { seed } => run_shell(seed.as_deref()),
    };

    if let Err(e) = &result {
        warn!(error = %e, "command failed");
    }
    result
}

/// Parse `name=value`. Values that read as JSON scalars keep their type,
/// anything else is taken as a string.
fn parse_param(raw: &str) -> Result<(String, Scalar)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("parameter name is empty in '{}'", raw));
    }
    let value = serde_json::from_str::<Scalar>(value).unwrap_or_else(|_| Scalar::from(value));
    Ok((name.to_string(), value))
}

fn load_datasource(seed: Option<&Path>) -> Result<MemoryDataSource> {
    match seed {
        Some(path) => {
            let script = std::fs::read_to_string(path)
                .with_context(|| format!("reading seed script {}", path.display()))?;
            MemoryDataSource::from_script(&script)
        }
        None => Ok(MemoryDataSource::new()),
    }
}

fn run_render(
    report: &Path,
    request: Option<&Path>,
    seed: Option<&Path>,
    overrides: Vec<(String, Scalar)>,
    output: Option<&Path>,
) -> Result<()> {
    let report = Report::from_json_file(report)?;
    let mut request = match request {
        Some(path) => RenderRequest::from_json_file(path)?,
        None => RenderRequest::default(),
    };
    request.check_target(&report)?;
    request.params.extend(overrides);

    let datasource = load_datasource(seed)?;
    let document = HtmlReportRenderer::default().render(
        &report,
        &request.params,
        &request.printing_options,
        &datasource,
    )?;

    match output {
        Some(path) => std::fs::write(path, &document)
            .with_context(|| format!("writing {}", path.display()))?,
        None => io::stdout().write_all(&document)?,
    }
    Ok(())
}

fn run_resolve(template: &Path, seed: Option<&Path>, params: Vec<(String, Scalar)>) -> Result<()> {
    let template = std::fs::read_to_string(template)
        .with_context(|| format!("reading template {}", template.display()))?;
    let datasource = load_datasource(seed)?;
    let params: ParameterMap = params.into_iter().collect();

    let resolution = resolve(&template, &params, &datasource)?;
    print_resolution(&resolution)
}

fn print_resolution(resolution: &Resolution) -> Result<()> {
    println!("{}", resolution.template);
    if !resolution.datasets.is_empty() {
        println!("{}", serde_json::to_string_pretty(&resolution.datasets)?);
    }
    Ok(())
}

fn run_shell(seed: Option<&Path>) -> Result<()> {
    let datasource = load_datasource(seed)?;
    let mut params = ParameterMap::new();

    println!("╔════════════════════════════════════════════╗");
    println!("║       RustyReports Interactive Shell       ║");
    println!("╚════════════════════════════════════════════╝");
    println!();
    println!("Type SQL commands or '.help' for help");
    println!("Type '.exit' to quit");
    println!();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        print!("rustyreports> ");
        stdout.flush()?;

        let mut input = String::new();
        if stdin.read_line(&mut input)? == 0 {
            break;
        }
        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        if input.starts_with('.') {
            let (command, rest) = input.split_once(' ').unwrap_or((input, ""));
            let outcome = match command {
                ".exit" | ".quit" => {
                    println!("Goodbye!");
                    break;
                }
                ".help" => {
                    print_help();
                    Ok(())
                }
                ".param" => parse_param(rest).map(|(name, value)| {
                    params.insert(name, value);
                }),
                ".params" => {
                    let mut names: Vec<_> = params.iter().collect();
                    names.sort_by(|a, b| a.0.cmp(b.0));
                    for (name, value) in names {
                        println!("  {} = {}", name, serde_json::to_string(value)?);
                    }
                    Ok(())
                }
                ".resolve" => resolve(rest, &params, &datasource)
                    .map_err(anyhow::Error::from)
                    .and_then(|resolution| print_resolution(&resolution)),
                _ => {
                    println!("Unknown command: {}", command);
                    println!("Type '.help' for help");
                    Ok(())
                }
            };
            if let Err(e) = outcome {
                eprintln!("Error: {}", e);
            }
            continue;
        }

        match datasource.execute(input) {
            Ok(result) => println!("{}", result.format()),
            Err(e) => eprintln!("Error: {}", e),
        }
    }

    Ok(())
}

fn print_help() {
    println!("Special Commands:");
    println!("  .help                 Show this help message");
    println!("  .param name=value     Set a template parameter");
    println!("  .params               List the parameters set so far");
    println!("  .resolve <template>   Resolve [P[...]] and [Q[...]] directives");
    println!("  .exit, .quit          Exit the shell");
    println!();
    println!("Supported SQL Commands:");
    println!("  CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT NOT NULL, age INTEGER)");
    println!("  INSERT INTO users VALUES (1, 'Alice', 30), (2, 'Bob', 25)");
    println!("  SELECT * FROM users WHERE id = 1");
    println!("  SELECT COUNT(*) AS total FROM users");
    println!();
    println!("Directives:");
    println!("  [P[name]]  replaced by the parameter's value");
    println!("  [Q[sql]]   one row: its first value; otherwise a dataset key (data_N)");
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_param() {
        assert_eq!(parse_param("year=2024").unwrap(), ("year".to_string(), Scalar::from(2024i64)));
        assert_eq!(parse_param("draft=true").unwrap().1, Scalar::from(true));
        assert_eq!(parse_param("who=Ann").unwrap().1, Scalar::from("Ann"));
        assert_eq!(parse_param("q=a=b").unwrap().1, Scalar::from("a=b"));
        assert_eq!(parse_param("code=007").unwrap().1, Scalar::from("007"));
        assert!(parse_param("novalue").is_err());
        assert!(parse_param("=1").is_err());
    }
}
