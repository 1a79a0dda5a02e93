// crates/orchcli/src/main.rs

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use futures::StreamExt;
use orchadapters::{CREW_FRAMEWORK, GRAPH_FRAMEWORK};
use orchcore::{
    parse_document, AgentSpec, EdgeSpec, NodeSpec, RunStatusRecord, TaskSpec, WorkflowDefinition,
    TERMINAL_NODE,
};
use orchruntime::{OrchestratorRegistry, OrchestratorRuntime, RuntimeConfig, ValidationOutcome};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "orch")]
#[command(about = "Workflow orchestrator CLI", long_about = None)]
struct Cli {
    /// Show debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a workflow definition file
    Validate {
        /// Path to a YAML or JSON workflow file
        file: PathBuf,

        /// Framework to validate against (defaults to the file's `framework` key)
        #[arg(long)]
        framework: Option<String>,
    },

    /// List registered frameworks
    Frameworks,

    /// Validate, start and stream a workflow
    Run {
        /// Path to a YAML or JSON workflow file
        #[arg(short, long)]
        file: PathBuf,

        #[arg(long)]
        framework: Option<String>,
    },

    /// Write an example workflow definition
    Init {
        /// Output file path
        #[arg(short, long, default_value = "workflow.yaml")]
        output: PathBuf,

        #[arg(long, default_value = CREW_FRAMEWORK)]
        framework: String,
    },
}

fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn build_runtime() -> OrchestratorRuntime {
    let mut registry = OrchestratorRegistry::new();
    orchadapters::register_all(&mut registry);
    OrchestratorRuntime::with_config(Arc::new(registry), RuntimeConfig::from_env())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let runtime = build_runtime();

    match cli.command {
        Commands::Validate { file, framework } => {
            validate_file(&runtime, &file, framework.as_deref())?;
        }

        Commands::Frameworks => {
            list_frameworks(&runtime);
        }

        Commands::Run { file, framework } => {
            run_file(&runtime, &file, framework.as_deref()).await?;
        }

        Commands::Init { output, framework } => {
            write_example(&output, &framework)?;
            println!("Created example workflow: {}", output.display());
            println!();
            println!("Validate it with:");
            println!("  orch validate {}", output.display());
        }
    }

    Ok(())
}

fn check_file(
    runtime: &OrchestratorRuntime,
    file: &Path,
    framework: Option<&str>,
) -> Result<ValidationOutcome> {
    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    Ok(runtime.validate_text(&text, framework))
}

fn validate_file(
    runtime: &OrchestratorRuntime,
    file: &Path,
    framework: Option<&str>,
) -> Result<()> {
    println!("Validating workflow: {}", file.display());

    let outcome = check_file(runtime, file, framework)?;
    let framework = outcome.framework.as_deref().unwrap_or("unknown");

    if outcome.valid {
        println!("Workflow is valid for {}", framework);
        if let Some(workflow) = &outcome.workflow {
            println!("   Name: {}", workflow.name);
            match framework {
                GRAPH_FRAMEWORK => {
                    println!("   Nodes: {}", workflow.nodes().len());
                    println!("   Edges: {}", workflow.edges().len());
                }
                _ => {
                    println!("   Agents: {}", workflow.agents().len());
                    println!("   Tasks: {}", workflow.tasks().len());
                }
            }
        }
        return Ok(());
    }

    let errors = outcome.errors.unwrap_or_default();
    println!("Workflow is invalid for {}:", framework);
    for error in &errors {
        println!("  - {}", error);
    }
    bail!("{} validation error(s)", errors.len())
}

fn list_frameworks(runtime: &OrchestratorRuntime) {
    println!("Available frameworks:");
    println!();

    let registry = runtime.registry();
    for name in registry.supported_frameworks() {
        let marker = if name == runtime.default_framework() {
            " (default)"
        } else {
            ""
        };
        println!("  • {}{}", name, marker);
        if let Some(metadata) = registry.get_metadata(&name) {
            println!("    {}", metadata.description);
            println!("    collections: {}", metadata.collections.join(", "));
        }
    }
}

/// Stream one run of the file and report its final status
async fn run_file(
    runtime: &OrchestratorRuntime,
    file: &Path,
    framework: Option<&str>,
) -> Result<RunStatusRecord> {
    println!("Loading workflow from: {}", file.display());

    let text = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let document = parse_document(&text)?;

    let mut updates = runtime.stream(&document, framework).await?;
    let mut run_id = None;
    while let Some(update) = updates.next().await {
        if run_id.is_none() {
            println!("Started run {}", update.run_id);
        }
        run_id = Some(update.run_id);
        println!("  {} {:.0}%", update.status, update.progress);
    }

    let Some(run_id) = run_id else {
        bail!("Run produced no progress updates");
    };

    let status = runtime.status(&run_id.to_string(), None).await?;
    println!();
    println!("Run {} is {}", status.run_id, status.status);

    Ok(status)
}

fn example_workflow(framework: &str) -> Result<WorkflowDefinition> {
    let workflow = match framework.to_lowercase().as_str() {
        CREW_FRAMEWORK => WorkflowDefinition::agent_task(
            "Example Research Crew",
            vec![
                AgentSpec::new(
                    "researcher",
                    "Senior Researcher",
                    "Find reliable sources on the topic",
                    "Methodical analyst with a library science background",
                    "gpt-4",
                )
                .with_tool("web_search"),
                AgentSpec::new(
                    "writer",
                    "Technical Writer",
                    "Turn research notes into a short article",
                    "Writes clear documentation",
                    "gpt-4",
                ),
            ],
            vec![
                TaskSpec::new(
                    "research",
                    "Collect five sources on the topic",
                    "A bullet list of links with one-line summaries",
                    "researcher",
                ),
                TaskSpec::new(
                    "write",
                    "Write an article from the research",
                    "A markdown article",
                    "writer",
                )
                .with_context("research"),
            ],
        ),
        GRAPH_FRAMEWORK => WorkflowDefinition::graph(
            "Example Support Graph",
            vec![
                NodeSpec::new("classify", "llm").with_config("model", "gpt-4"),
                NodeSpec::new("lookup", "tool").with_config("tool", "kb_search"),
                NodeSpec::new("answer", "llm").with_config("model", "gpt-4"),
            ],
            vec![
                EdgeSpec::new("classify", "lookup"),
                EdgeSpec::new("lookup", "answer"),
                EdgeSpec::new("answer", TERMINAL_NODE),
            ],
        ),
        other => bail!(
            "No example for framework '{}'; choose {} or {}",
            other,
            CREW_FRAMEWORK,
            GRAPH_FRAMEWORK
        ),
    };

    Ok(workflow
        .with_description("Generated by orch init")
        .with_framework(framework.to_lowercase()))
}

fn write_example(output: &Path, framework: &str) -> Result<()> {
    let workflow = example_workflow(framework)?;
    let yaml = serde_yaml::to_string(&workflow)?;
    std::fs::write(output, yaml).with_context(|| format!("Failed to write {}", output.display()))?;
    Ok(())
}
