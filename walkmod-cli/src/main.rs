mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{ConfigMerger, MergedConfig};
use fs_err as fs;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use walkmod_core::adapters::FsWritePort;
use walkmod_core::pipeline::{
    EditRun, InspectOutcome, ToolError, run_edit, run_inspect, write_edit_artifacts,
};
use walkmod_core::settings::{EditSettings, InspectSettings};
use walkmod_types::ops::{
    AddChain, AddConfigurationParameter, AddIncludesOrExcludes, AddModules, AddPlugin, AddProvider,
    AddTransformation, FilterEdit, RemoveChains, RemoveIncludesOrExcludes, RemoveModules,
    RemovePlugin, RemoveProviders, RemoveTransformations, ResourceUpdate, SetReader, SetWriter,
};
use walkmod_types::{
    BeanCategory, ChainConfig, DEFAULT_PATH, DocumentFormat, EditRequest, FilterKind, PluginConfig,
    ProviderConfig, TransformationConfig,
};

#[derive(Debug, Parser)]
#[command(
    name = "walkmod",
    version,
    about = "Idempotent edits of walkmod XML/YAML/JSON configuration."
)]
struct Cli {
    /// Directory holding the configuration document (default: current directory).
    #[arg(long, global = true, default_value = ".")]
    project_dir: Utf8PathBuf,

    /// Document format (xml, yaml, json). Detected from the files present when omitted.
    #[arg(long, global = true)]
    format: Option<DocumentFormat>,

    /// Propagate the edit into every module instead of the aggregator.
    #[arg(long, global = true, default_value_t = false)]
    recursive: bool,

    /// Print the patch instead of writing documents.
    #[arg(long, global = true, default_value_t = false)]
    dry_run: bool,

    /// Keep a copy of every document before it is overwritten.
    #[arg(long, global = true, default_value_t = false)]
    backup: bool,

    /// Write patch.diff and edit.json to this directory.
    #[arg(long, global = true)]
    out_dir: Option<Utf8PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Add a chain (no-op if a chain with that name exists).
    AddChain(AddChainArgs),
    /// Remove chains by name.
    RmChain(NamesArgs),
    /// Add a transformation to a chain, creating the chain if needed.
    AddTransformation(AddTransformationArgs),
    /// Remove transformations by type.
    RmTransformation(RmTransformationArgs),
    /// Set the type, path or params of a chain's reader.
    SetReader(ResourceArgs),
    /// Set the type, path or params of a chain's writer.
    SetWriter(ResourceArgs),
    /// Add include wildcards to a chain's reader and/or writer.
    AddIncludes(FilterArgs),
    /// Add exclude wildcards to a chain's reader and/or writer.
    AddExcludes(FilterArgs),
    /// Remove include wildcards.
    RmIncludes(FilterArgs),
    /// Remove exclude wildcards.
    RmExcludes(FilterArgs),
    /// Add a plugin ('id' or 'groupId:artifactId:version').
    AddPlugin(PluginArgs),
    /// Remove a plugin ('id' or 'groupId:artifactId:version').
    RmPlugin(PluginArgs),
    /// Add a configuration provider ('id' or 'groupId:artifactId:id').
    AddProvider(AddProviderArgs),
    /// Remove configuration providers.
    RmProvider(NamesArgs),
    /// Add module directories.
    AddModule(NamesArgs),
    /// Remove module directories.
    RmModule(NamesArgs),
    /// Set a parameter on every matching reader, writer, walker or transformation.
    AddParam(AddParamArgs),
    /// Run an edit request read from a JSON file.
    ApplyRequest(ApplyRequestArgs),
    /// Print the assembled configuration without modifying anything.
    Inspect(InspectArgs),
}

#[derive(Debug, Args)]
struct NamesArgs {
    #[arg(required = true)]
    names: Vec<String>,
}

#[derive(Debug, Args)]
struct AddChainArgs {
    name: String,

    /// Reader/writer path of the new chain.
    #[arg(long)]
    path: Option<String>,

    /// Insert ahead of this chain instead of appending.
    #[arg(long)]
    before: Option<String>,
}

#[derive(Debug, Args)]
struct AddTransformationArgs {
    /// Transformation type, e.g. 'walkmod:commons:imports-cleaner'.
    #[arg(value_name = "TYPE")]
    type_name: String,

    /// Target chain (default: the flat list, or the 'default' chain).
    #[arg(long)]
    chain: Option<String>,

    /// Reader/writer path of a chain created by this edit.
    #[arg(long)]
    path: Option<String>,

    /// Transformation name.
    #[arg(long)]
    name: Option<String>,

    /// Insertion index within the chain.
    #[arg(long)]
    order: Option<usize>,

    /// Place a created chain ahead of this one.
    #[arg(long)]
    before: Option<String>,

    /// Transformation parameter (repeatable).
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Mark the transformation as mergeable.
    #[arg(long, default_value_t = false)]
    mergeable: bool,

    /// Merge policy of a mergeable transformation.
    #[arg(long)]
    merge_policy: Option<String>,
}

#[derive(Debug, Args)]
struct RmTransformationArgs {
    #[arg(required = true, value_name = "TYPE")]
    types: Vec<String>,

    /// Restrict removal to one chain.
    #[arg(long)]
    chain: Option<String>,
}

#[derive(Debug, Args)]
struct ResourceArgs {
    #[arg(long)]
    chain: Option<String>,

    #[arg(long = "type", value_name = "TYPE")]
    type_name: Option<String>,

    #[arg(long)]
    path: Option<String>,

    /// Parameter (repeatable); replaces the existing parameters.
    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

#[derive(Debug, Args)]
struct FilterArgs {
    #[arg(required = true)]
    wildcards: Vec<String>,

    #[arg(long)]
    chain: Option<String>,

    /// Only the reader (both sides when neither flag is given).
    #[arg(long, default_value_t = false)]
    reader: bool,

    /// Only the writer.
    #[arg(long, default_value_t = false)]
    writer: bool,
}

#[derive(Debug, Args)]
struct PluginArgs {
    id: String,
}

#[derive(Debug, Args)]
struct AddProviderArgs {
    id: String,

    #[arg(long = "param", value_name = "KEY=VALUE")]
    params: Vec<String>,
}

#[derive(Debug, Args)]
struct AddParamArgs {
    key: String,

    /// Parsed as a number or boolean when possible, a string otherwise.
    value: String,

    /// Only beans of this type.
    #[arg(long = "type", value_name = "TYPE")]
    type_name: Option<String>,

    /// Only beans with this name.
    #[arg(long)]
    name: Option<String>,

    /// Only one kind of bean (reader, writer, walker, transformation).
    #[arg(long)]
    category: Option<BeanCategory>,

    /// Only beans inside this chain.
    #[arg(long)]
    chain: Option<String>,
}

#[derive(Debug, Args)]
struct ApplyRequestArgs {
    /// JSON file holding one edit request.
    file: Utf8PathBuf,
}

#[derive(Debug, Args)]
struct InspectArgs {
    /// Print JSON instead of a summary.
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Report a missing document as empty instead of failing.
    #[arg(long, default_value_t = false)]
    allow_missing: bool,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match real_main(cli) {
        Ok(()) => ExitCode::from(0),
        Err(e) => {
            error!("{}", e);
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main(cli: Cli) -> Result<(), ToolError> {
    let file_config = config::load_or_default(&cli.project_dir)
        .context("load .walkmod.toml config")
        .map_err(ToolError::Usage)?;
    let merged = ConfigMerger::new(file_config).merge_edit_args(
        cli.format,
        cli.recursive,
        cli.dry_run,
        cli.backup,
    );
    debug!(
        "merged config: format={:?}, recursive={}, dry_run={}, backups={:?}",
        merged.format, merged.recursive, merged.dry_run, merged.backups
    );

    let request = match cli.cmd {
        Command::Inspect(args) => return cmd_inspect(&cli.project_dir, &merged, args),
        other => build_request(other)?,
    };
    cmd_edit(&cli.project_dir, cli.out_dir.as_deref(), &merged, &request)
}

/// Translate a subcommand into the edit request it stands for.
fn build_request(cmd: Command) -> Result<EditRequest, ToolError> {
    let request = match cmd {
        Command::AddChain(args) => EditRequest::AddChain(AddChain {
            chain: ChainConfig::with_path(args.name, args.path.as_deref().unwrap_or(DEFAULT_PATH)),
            before: args.before,
        }),
        Command::RmChain(args) => EditRequest::RemoveChains(RemoveChains { names: args.names }),
        Command::AddTransformation(args) => {
            let mut transformation = TransformationConfig::of_type(args.type_name);
            transformation.name = args.name;
            transformation.parameters = params(&args.params)?;
            transformation.is_mergeable = args.mergeable;
            transformation.merge_policy = args.merge_policy;
            EditRequest::AddTransformation(AddTransformation {
                chain: args.chain,
                path: args.path,
                transformation,
                order: args.order,
                before: args.before,
            })
        }
        Command::RmTransformation(args) => {
            EditRequest::RemoveTransformations(RemoveTransformations {
                chain: args.chain,
                types: args.types,
            })
        }
        Command::SetReader(args) => EditRequest::SetReader(SetReader {
            update: resource_update(args)?,
        }),
        Command::SetWriter(args) => EditRequest::SetWriter(SetWriter {
            update: resource_update(args)?,
        }),
        Command::AddIncludes(args) => EditRequest::AddIncludesOrExcludes(AddIncludesOrExcludes {
            filter: filter_edit(args, FilterKind::Includes),
        }),
        Command::AddExcludes(args) => EditRequest::AddIncludesOrExcludes(AddIncludesOrExcludes {
            filter: filter_edit(args, FilterKind::Excludes),
        }),
        Command::RmIncludes(args) => {
            EditRequest::RemoveIncludesOrExcludes(RemoveIncludesOrExcludes {
                filter: filter_edit(args, FilterKind::Includes),
            })
        }
        Command::RmExcludes(args) => {
            EditRequest::RemoveIncludesOrExcludes(RemoveIncludesOrExcludes {
                filter: filter_edit(args, FilterKind::Excludes),
            })
        }
        Command::AddPlugin(args) => EditRequest::AddPlugin(AddPlugin {
            plugin: plugin(&args.id)?,
        }),
        Command::RmPlugin(args) => EditRequest::RemovePlugin(RemovePlugin {
            plugin: plugin(&args.id)?,
        }),
        Command::AddProvider(args) => {
            let mut provider = ProviderConfig::parse(&args.id).map_err(identifier)?;
            provider.parameters = params(&args.params)?;
            EditRequest::AddProvider(AddProvider { provider })
        }
        Command::RmProvider(args) => EditRequest::RemoveProviders(RemoveProviders {
            providers: args.names,
        }),
        Command::AddModule(args) => EditRequest::AddModules(AddModules {
            modules: args.names,
        }),
        Command::RmModule(args) => EditRequest::RemoveModules(RemoveModules {
            modules: args.names,
        }),
        Command::AddParam(args) => {
            EditRequest::AddConfigurationParameter(AddConfigurationParameter {
                param: args.key,
                value: config::parse_value(&args.value),
                type_name: args.type_name,
                name: args.name,
                category: args.category,
                chain: args.chain,
            })
        }
        Command::ApplyRequest(args) => read_request(&args.file)?,
        Command::Inspect(_) => {
            return Err(ToolError::Internal(anyhow::anyhow!(
                "inspect is not an edit request"
            )));
        }
    };
    Ok(request)
}

fn params(raw: &[String]) -> Result<walkmod_types::Params, ToolError> {
    config::parse_cli_params(raw).map_err(ToolError::Usage)
}

fn plugin(id: &str) -> Result<PluginConfig, ToolError> {
    PluginConfig::parse(id).map_err(identifier)
}

fn identifier(e: walkmod_types::IdentifierError) -> ToolError {
    ToolError::Edit(e.into())
}

fn resource_update(args: ResourceArgs) -> Result<ResourceUpdate, ToolError> {
    Ok(ResourceUpdate {
        chain: args.chain,
        type_name: args.type_name,
        path: args.path,
        params: params(&args.params)?,
    })
}

fn filter_edit(args: FilterArgs, kind: FilterKind) -> FilterEdit {
    FilterEdit {
        chain: args.chain,
        wildcards: args.wildcards,
        kind,
        reader: args.reader,
        writer: args.writer,
    }
}

fn read_request(path: &Utf8Path) -> Result<EditRequest, ToolError> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read request {}", path))
        .map_err(ToolError::Usage)?;
    serde_json::from_str(&contents)
        .with_context(|| format!("parse request {}", path))
        .map_err(ToolError::Usage)
}

fn cmd_edit(
    project_dir: &Utf8Path,
    out_dir: Option<&Utf8Path>,
    merged: &MergedConfig,
    request: &EditRequest,
) -> Result<(), ToolError> {
    let settings = EditSettings {
        project_dir: project_dir.to_path_buf(),
        format: merged.format,
        recursive: merged.recursive,
        dry_run: merged.dry_run,
        backup_enabled: merged.backups.enabled,
        backup_suffix: merged.backups.suffix.clone(),
    };
    let run = run_edit(&settings, request)?;

    if let Some(out_dir) = out_dir {
        write_edit_artifacts(&run, out_dir, &FsWritePort)?;
        info!("wrote edit artifacts to {}", out_dir);
    }
    print_edit(&run);
    Ok(())
}

fn print_edit(run: &EditRun) {
    if !run.outcome.changed() {
        println!("{}: no changes", run.action);
        return;
    }
    if run.dry_run {
        print!("{}", run.patch);
        return;
    }
    for change in &run.outcome.changes {
        let verb = if change.created { "created" } else { "updated" };
        println!("{verb} {}", change.path);
    }
}

fn cmd_inspect(
    project_dir: &Utf8Path,
    merged: &MergedConfig,
    args: InspectArgs,
) -> Result<(), ToolError> {
    let settings = InspectSettings {
        project_dir: project_dir.to_path_buf(),
        format: merged.format,
        recursive: merged.recursive,
        error_if_missing: !args.allow_missing,
    };
    let outcome = run_inspect(&settings)?;

    if args.json {
        let json = serde_json::to_string_pretty(&outcome).context("serialize inspect outcome")?;
        println!("{json}");
    } else {
        print_inspect(&outcome);
    }
    Ok(())
}

fn print_inspect(outcome: &InspectOutcome) {
    for doc in &outcome.documents {
        let missing = if doc.missing { " (missing)" } else { "" };
        println!("{} [{}]{missing}", doc.path, doc.format);

        let config = &doc.configuration;
        for plugin in &config.plugins {
            println!("  plugin {}", plugin.coordinates());
        }
        for provider in &config.providers {
            println!("  provider {}", provider.type_name);
        }
        for chain in &config.chains {
            println!("  chain {} ({})", chain.name, chain.reader_path());
            for t in chain.transformations() {
                match &t.name {
                    Some(name) => println!("    {} [{name}]", t.type_name),
                    None => println!("    {}", t.type_name),
                }
            }
        }
        for module in &config.modules {
            println!("  module {module}");
        }
    }
}
