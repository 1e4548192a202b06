mod settings;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use weft_config::{UNTITLED, WorkflowDef};
use weft_engine::{ChannelNotifier, ExecutionClient, ExecutionEvent, run_batch};
use weft_http::HttpClient;
use weft_store::{HttpStore, WorkflowStore};
use weft_workflow::codec::{self, ExportOptions};
use weft_workflow::{GraphModel, RunScope};

use crate::settings::Settings;

/// Weft - build and run generation graphs against a remote backend
#[derive(Parser)]
#[command(name = "weft")]
#[command(version, about, long_about = None)]
struct Cli {
  /// Path to the data directory (default: ~/.weft)
  #[arg(long, global = true)]
  data_dir: Option<PathBuf>,

  /// Backend base URL, overrides settings.json
  #[arg(long, global = true)]
  base_url: Option<String>,

  #[command(subcommand)]
  command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
  /// Write the starter workflow to a file
  New { file: PathBuf },

  /// Run a workflow file and write the results back into it
  Run {
    file: PathBuf,

    /// Re-run this node and everything downstream of it
    #[arg(long)]
    from: Option<String>,

    /// Let the backend reuse cached node results
    #[arg(long)]
    use_cache: bool,

    /// Write the updated workflow here instead of over the input
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Send a cancel signal for an execution
  Cancel { execution_id: String },

  /// Export a workflow file as a portable document
  Export {
    file: PathBuf,

    /// Keep results, statuses and inline media
    #[arg(long)]
    include_media: bool,

    /// Output path (default: workflow_full.json / workflow_light.json)
    #[arg(short, long)]
    output: Option<PathBuf>,
  },

  /// Validate a document and report what it contains
  Import { file: PathBuf },

  /// Save a workflow file to the backend catalog
  Save { file: PathBuf },

  /// List saved workflows
  List,

  /// Print a saved workflow
  Get { workflow_id: String },

  /// Print the template workflows
  Templates,

  /// Have the backend validate and save a workflow file
  ServerImport { file: PathBuf },

  /// Run a saved workflow once per input in a JSON array file
  Batch {
    workflow_id: String,
    inputs: PathBuf,
  },

  /// Clear the backend's execution cache
  ClearCache,
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  tracing_subscriber::fmt()
    .with_env_filter(EnvFilter::try_from_env("WEFT_LOG").unwrap_or_else(|_| EnvFilter::new("info")))
    .with_writer(std::io::stderr)
    .init();

  let data_dir = match cli.data_dir.clone() {
    Some(dir) => dir,
    None => dirs::home_dir()
      .context("could not determine home directory")?
      .join(".weft"),
  };
  let mut settings = Settings::load(&data_dir)?;
  if let Some(base_url) = cli.base_url.clone() {
    settings.base_url = base_url;
  }
  debug!(
    data_dir = %data_dir.display(),
    base_url = %settings.base_url,
    use_cache = settings.use_cache,
    "settings_loaded"
  );

  let Some(command) = cli.command else {
    println!("weft - use --help to see available commands");
    return Ok(());
  };

  let rt = tokio::runtime::Runtime::new()?;
  rt.block_on(async { dispatch(command, settings).await })
}

async fn dispatch(command: Commands, settings: Settings) -> Result<()> {
  match command {
    Commands::New { file } => {
      let sample = WorkflowDef::sample();
      write_json(&file, &sample).await?;
      eprintln!("Wrote starter workflow to {}", file.display());
    }
    Commands::Run {
      file,
      from,
      use_cache,
      output,
    } => {
      let output = output.unwrap_or_else(|| file.clone());
      run_workflow(&file, from, use_cache || settings.use_cache, &output, &settings).await?;
    }
    Commands::Cancel { execution_id } => {
      let client = ExecutionClient::new(http(&settings)?);
      let sent = client
        .controller()
        .cancel_id(&execution_id)
        .await
        .context("cancel request failed")?;
      if sent {
        eprintln!("Cancel signal sent for {}", execution_id);
      } else {
        eprintln!("Execution {} not found or already finished", execution_id);
      }
    }
    Commands::Export {
      file,
      include_media,
      output,
    } => {
      let model = load_model(&file).await?;
      let options = ExportOptions {
        include_media,
        media_threshold: settings.media_threshold,
      };
      let json = codec::export_json(&model, options).context("failed to export workflow")?;
      let output = output.unwrap_or_else(|| PathBuf::from(options.file_name()));
      tokio::fs::write(&output, json)
        .await
        .with_context(|| format!("failed to write export: {}", output.display()))?;
      eprintln!("Exported to {}", output.display());
    }
    Commands::Import { file } => {
      let model = load_model(&file).await?;
      eprintln!(
        "Valid document: {} nodes, {} edges",
        model.nodes().len(),
        model.edges().len()
      );
      for violation in model.port_violations() {
        eprintln!("warning: {:?}", violation);
      }
    }
    Commands::Save { file } => {
      let model = load_model(&file).await?;
      let id = store(&settings)?
        .save(&codec::portable(&model))
        .await
        .context("failed to save workflow")?;
      eprintln!("Saved workflow {}", id);
    }
    Commands::List => {
      let workflows = store(&settings)?
        .list()
        .await
        .context("failed to list workflows")?;
      for workflow in workflows {
        println!(
          "{}\t{}\t{}",
          workflow.id,
          workflow.updated_at.to_rfc3339(),
          workflow.name
        );
      }
    }
    Commands::Get { workflow_id } => {
      let workflow = store(&settings)?
        .get(&workflow_id)
        .await
        .with_context(|| format!("failed to get workflow {}", workflow_id))?;
      println!("{}", serde_json::to_string_pretty(&workflow)?);
    }
    Commands::Templates => {
      let templates = store(&settings)?
        .templates()
        .await
        .context("failed to fetch templates")?;
      println!("{}", serde_json::to_string_pretty(&templates)?);
    }
    Commands::ServerImport { file } => {
      let model = load_model(&file).await?;
      let id = store(&settings)?
        .import(&codec::portable(&model))
        .await
        .context("backend rejected the workflow")?;
      eprintln!("Imported workflow {}", id);
    }
    Commands::Batch {
      workflow_id,
      inputs: inputs_file,
    } => {
      let raw = tokio::fs::read_to_string(&inputs_file)
        .await
        .with_context(|| format!("failed to read inputs file: {}", inputs_file.display()))?;
      let serde_json::Value::Array(inputs) = serde_json::from_str::<serde_json::Value>(&raw)
        .with_context(|| format!("failed to parse inputs file: {}", inputs_file.display()))?
      else {
        bail!("inputs file must contain a JSON array");
      };
      let results = run_batch(&http(&settings)?, &workflow_id, &inputs)
        .await
        .context("batch execution failed")?;
      println!("{}", serde_json::to_string_pretty(&results)?);
    }
    Commands::ClearCache => {
      let reply = store(&settings)?
        .clear_cache()
        .await
        .context("failed to clear cache")?;
      eprintln!("{}", reply.message);
    }
  }

  Ok(())
}

fn http(settings: &Settings) -> Result<HttpClient> {
  HttpClient::new(&settings.base_url)
    .with_context(|| format!("invalid base url: {}", settings.base_url))
}

fn store(settings: &Settings) -> Result<HttpStore> {
  Ok(HttpStore::new(http(settings)?))
}

async fn load_model(file: &Path) -> Result<GraphModel> {
  let raw = tokio::fs::read_to_string(file)
    .await
    .with_context(|| format!("failed to read workflow file: {}", file.display()))?;
  let document = codec::parse_document(&raw)
    .with_context(|| format!("failed to parse workflow file: {}", file.display()))?;

  let mut model = match &document.id {
    Some(id) => GraphModel::new(id.clone(), UNTITLED),
    None => GraphModel::default(),
  };
  codec::apply(&mut model, document);
  Ok(model)
}

async fn write_json<T: serde::Serialize>(file: &Path, value: &T) -> Result<()> {
  let json = serde_json::to_string_pretty(value)?;
  tokio::fs::write(file, json)
    .await
    .with_context(|| format!("failed to write {}", file.display()))
}

async fn run_workflow(
  file: &Path,
  from: Option<String>,
  use_cache: bool,
  output: &Path,
  settings: &Settings,
) -> Result<()> {
  let mut model = load_model(file).await?;
  eprintln!("Loaded workflow: {}", model.name());

  let scope = match &from {
    Some(start) => {
      if model.node(start).is_none() {
        bail!("node not found: {}", start);
      }
      model.plan_partial_run(start)
    }
    None => RunScope::All,
  };

  let (notifier, mut events) = ChannelNotifier::channel();
  let client = ExecutionClient::new(http(settings)?)
    .with_cache(use_cache)
    .with_notifier(Arc::new(notifier));

  let printer = tokio::spawn(async move {
    while let Some(event) = events.recv().await {
      print_event(&event);
    }
  });

  // Ctrl-C asks the backend to stop; the run keeps reading until it does.
  let cancel = CancellationToken::new();
  let interrupt = {
    let cancel = cancel.clone();
    tokio::spawn(async move {
      if watch_interrupts(tokio::signal::ctrl_c, cancel).await {
        eprintln!("Interrupted");
        std::process::exit(130);
      }
    })
  };

  let result = client.run_scoped(&mut model, scope, cancel).await;
  interrupt.abort();
  drop(client);
  let _ = printer.await;

  // Partial state is still worth keeping when the transport failed.
  write_json(output, &codec::portable(&model)).await?;
  let summary = result.context("workflow execution failed")?;

  eprintln!(
    "Execution {} finished ({:?}): {} completed, {} failed",
    summary.execution_id, summary.outcome, summary.completed, summary.failed
  );
  println!("{}", serde_json::to_string_pretty(&summary)?);
  Ok(())
}

/// First interrupt cancels the run, a second one gives up on it. Returns
/// true when the caller should exit without waiting for the stream.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
  F: FnMut() -> Fut,
  Fut: Future<Output = std::io::Result<()>>,
{
  if next_interrupt().await.is_err() {
    return false;
  }
  eprintln!("Cancelling... press Ctrl-C again to quit");
  cancel.cancel();
  next_interrupt().await.is_ok()
}

fn print_event(event: &ExecutionEvent) {
  match event {
    ExecutionEvent::RunStarted {
      execution_id,
      node_ids,
    } => match node_ids {
      Some(ids) => eprintln!("Execution {} started for {}", execution_id, ids.join(", ")),
      None => eprintln!("Execution {} started", execution_id),
    },
    ExecutionEvent::NodeStarted { node_id, .. } => eprintln!("  {} running", node_id),
    ExecutionEvent::NodeCompleted {
      node_id, cached, ..
    } => {
      if *cached {
        eprintln!("  {} completed (cached)", node_id);
      } else {
        eprintln!("  {} completed", node_id);
      }
    }
    ExecutionEvent::NodeFailed {
      node_id, result, ..
    } => eprintln!("  {} failed: {}", node_id, result),
    ExecutionEvent::RunFinished { .. } => {}
  }
}
