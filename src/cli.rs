// Command-line front end.
//
// `merge` executes a JSON manifest describing which stages are pulled from
// which source title and under what destination name, then writes the
// merged game config last. `info` and `check` are inspection helpers for
// loose asset files.
//
// Exit codes, one per broad failure class so scripts can tell a
// configuration problem from data corruption:
//   0  success
//   1  usage or manifest error
//   2  required input missing
//   3  corrupt or inconsistent asset data (including object-table errors)
//   4  read/write I/O failure

use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use serde::Deserialize;

use crate::error::Error;
use crate::format::act::Act;
use crate::format::background::StageBackground;
use crate::format::gameconfig::{GameConfig, Revision, StageCategory, Variable};
use crate::format::stageconfig::StageConfig;
use crate::io::{create_dir_all, read_asset, write_atomic};
use crate::merge::assembly::{StageRequest, assemble_stage};
use crate::merge::context::{Context, game_config_path};
use crate::merge::objects::{ObjectTableBuilder, merge_variables};

// ---------------------------------------------------------------------------
// Clap CLI definition
// ---------------------------------------------------------------------------

/// Binary asset merge/patch tool for hybrid Retro-engine data trees.
#[derive(Parser, Debug)]
#[command(
    name = "rsdkmerge",
    version,
    about = "Merges per-title binary asset sets into one hybrid data tree",
    arg_required_else_help = true
)]
struct Cli {
    #[command(subcommand)]
    command: Cmd,

    /// Quiet mode (suppress non-error output).
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Output the merge summary as JSON to stderr.
    #[arg(long = "json", global = true)]
    json_output: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Merge source data trees into a hybrid destination tree.
    Merge(MergeArgs),
    /// Print a summary of a game config file.
    Info(InfoArgs),
    /// Verify that an asset survives a decode/encode round trip.
    Check(CheckArgs),
}

#[derive(clap::Args, Debug)]
struct MergeArgs {
    /// Merge manifest (JSON).
    #[arg(short, long, value_hint = ValueHint::FilePath)]
    manifest: PathBuf,

    /// Directory containing the extracted source data trees.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    source: PathBuf,

    /// Destination data root.
    #[arg(short, long, value_hint = ValueHint::DirPath)]
    output: PathBuf,
}

#[derive(clap::Args, Debug)]
struct InfoArgs {
    /// Game config revision.
    #[arg(long, value_enum, default_value = "v4")]
    revision: RevisionArg,

    /// Path to a GameConfig.bin file.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,
}

#[derive(clap::Args, Debug)]
struct CheckArgs {
    /// Asset kind to decode.
    #[arg(long, value_enum)]
    kind: AssetKindArg,

    /// Game config revision (ignored for other kinds).
    #[arg(long, value_enum, default_value = "v4")]
    revision: RevisionArg,

    /// Path to the asset file.
    #[arg(value_hint = ValueHint::FilePath)]
    file: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum RevisionArg {
    V3,
    V4,
}

impl From<RevisionArg> for Revision {
    fn from(arg: RevisionArg) -> Self {
        match arg {
            RevisionArg::V3 => Revision::Rev3,
            RevisionArg::V4 => Revision::Rev4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum AssetKindArg {
    GameConfig,
    StageConfig,
    Act,
    Background,
}

// ---------------------------------------------------------------------------
// Merge manifest
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct Manifest {
    /// Destination title name.
    name: String,

    /// Destination description text.
    #[serde(default)]
    description: String,

    /// Append this source's own description after a blank line.
    #[serde(default)]
    description_from: Option<String>,

    sources: Vec<SourceSpec>,

    /// Source ids in object-table precedence order (first wins).
    objects_from: Vec<String>,

    /// Alias name -> canonical name bindings applied after insertion.
    #[serde(default)]
    aliases: BTreeMap<String, String>,

    /// Variable overrides applied after the cross-source merge.
    #[serde(default)]
    variables: BTreeMap<String, i32>,

    /// Source whose master palette the destination inherits.
    palette_from: String,

    /// Source whose player list the destination inherits.
    players_from: String,

    /// Players appended after the inherited list.
    #[serde(default)]
    extra_players: Vec<String>,

    /// Source whose sound-effect list the destination inherits.
    sound_effects_from: String,

    /// Revision the merged config is written as.
    #[serde(default)]
    output_revision: Option<RevisionSpec>,

    stages: Vec<StageSpec>,
}

#[derive(Debug, Deserialize)]
struct SourceSpec {
    id: String,
    /// Data root relative to the --source directory.
    root: String,
    revision: RevisionSpec,
    /// Source relative path -> destination relative path renames.
    #[serde(default)]
    replacements: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum RevisionSpec {
    V3,
    V4,
}

impl From<RevisionSpec> for Revision {
    fn from(spec: RevisionSpec) -> Self {
        match spec {
            RevisionSpec::V3 => Revision::Rev3,
            RevisionSpec::V4 => Revision::Rev4,
        }
    }
}

#[derive(Debug, Deserialize)]
struct StageSpec {
    source: String,
    category: CategorySpec,
    title: String,
    act: u32,
    #[serde(default)]
    visual_act: Option<u32>,
    src: String,
    dst: String,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
enum CategorySpec {
    Presentation,
    Regular,
    Bonus,
    Special,
}

impl From<CategorySpec> for StageCategory {
    fn from(spec: CategorySpec) -> Self {
        match spec {
            CategorySpec::Presentation => StageCategory::Presentation,
            CategorySpec::Regular => StageCategory::Regular,
            CategorySpec::Bonus => StageCategory::Bonus,
            CategorySpec::Special => StageCategory::Special,
        }
    }
}

// ---------------------------------------------------------------------------
// Exit-code mapping
// ---------------------------------------------------------------------------

fn exit_code_for(err: &Error) -> i32 {
    match err {
        Error::SourceNotFound { .. } | Error::StageNotFound { .. } => 2,
        Error::TruncatedInput { .. }
        | Error::MalformedAsset { .. }
        | Error::UnknownAlias { .. }
        | Error::UnmappedObject { .. } => 3,
        Error::ReadFailure { .. } | Error::WriteFailure { .. } => 4,
    }
}

fn report(err: &Error) -> i32 {
    eprintln!("rsdkmerge: {err}");
    exit_code_for(err)
}

// ---------------------------------------------------------------------------
// merge
// ---------------------------------------------------------------------------

struct LoadedSource {
    id: String,
    root: PathBuf,
    config: GameConfig,
    replacements: HashMap<String, String>,
}

fn cmd_merge(args: &MergeArgs, quiet: bool, json_output: bool) -> i32 {
    let manifest_bytes = match read_asset(&args.manifest) {
        Ok(bytes) => bytes,
        Err(e) => return report(&e),
    };
    let manifest: Manifest = match serde_json::from_slice(&manifest_bytes) {
        Ok(m) => m,
        Err(e) => {
            eprintln!("rsdkmerge: manifest {}: {e}", args.manifest.display());
            return 1;
        }
    };

    // Decode every source's game config up front.
    let mut sources: Vec<LoadedSource> = Vec::with_capacity(manifest.sources.len());
    for spec in &manifest.sources {
        let root = args.source.join(&spec.root);
        let config_path = game_config_path(&root);
        let bytes = match read_asset(&config_path) {
            Ok(bytes) => bytes,
            Err(e) => return report(&e),
        };
        let revision = Revision::from(spec.revision);
        let config = match revision.decode(&bytes) {
            Ok(config) => config,
            Err(e) => return report(&e.at(&config_path)),
        };
        log::debug!(
            "loaded {} ({}): {} objects, {} variables",
            spec.id,
            revision.label(),
            config.objects.len(),
            config.variables.len(),
        );
        sources.push(LoadedSource {
            id: spec.id.clone(),
            root,
            config,
            replacements: spec.replacements.clone().into_iter().collect(),
        });
    }

    let find_source = |id: &str| sources.iter().find(|s| s.id == id);
    for id in manifest
        .objects_from
        .iter()
        .chain([
            &manifest.palette_from,
            &manifest.players_from,
            &manifest.sound_effects_from,
        ])
        .chain(manifest.description_from.iter())
        .chain(manifest.stages.iter().map(|s| &s.source))
    {
        if find_source(id).is_none() {
            eprintln!("rsdkmerge: manifest references unknown source id {id:?}");
            return 1;
        }
    }

    // Unified object table: first-seen-wins across the precedence order,
    // then the alias bindings.
    let mut builder = ObjectTableBuilder::new();
    for id in &manifest.objects_from {
        builder.add_source(&find_source(id).unwrap().config.objects);
    }
    for (alias, canonical) in &manifest.aliases {
        if let Err(e) = builder.alias(alias, canonical) {
            return report(&e);
        }
    }
    let table = builder.finish();
    if table.len() > u8::MAX as usize {
        eprintln!(
            "rsdkmerge: unified object table holds {} names; the format caps identifiers at 255",
            table.len()
        );
        return 3;
    }

    // Compose the destination config.
    let mut description = manifest.description.clone();
    if let Some(id) = &manifest.description_from {
        let source_desc = &find_source(id).unwrap().config.description;
        if description.is_empty() {
            description = source_desc.clone();
        } else {
            description = format!("{description}\n\n{source_desc}");
        }
    }

    let overrides: Vec<Variable> = manifest
        .variables
        .iter()
        .map(|(name, &value)| Variable {
            name: name.clone(),
            value,
        })
        .collect();
    let mut variable_sets: Vec<&[Variable]> = sources
        .iter()
        .map(|s| s.config.variables.as_slice())
        .collect();
    variable_sets.push(&overrides);

    let mut players = find_source(&manifest.players_from)
        .unwrap()
        .config
        .players
        .clone();
    players.extend(manifest.extra_players.iter().cloned());

    let mut dst_config = GameConfig {
        name: manifest.name.clone(),
        description,
        palette: find_source(&manifest.palette_from)
            .unwrap()
            .config
            .palette
            .clone(),
        objects: table.objects().to_vec(),
        variables: merge_variables(&variable_sets),
        sound_effects: find_source(&manifest.sound_effects_from)
            .unwrap()
            .config
            .sound_effects
            .clone(),
        players,
        ..Default::default()
    };

    // Assemble every stage, then write the merged config last.
    let mut stages_done = 0usize;
    for spec in &manifest.stages {
        let source = find_source(&spec.source).unwrap();
        let ctx = Context::new(
            source.root.clone(),
            args.output.clone(),
            &source.config,
            table.ids(),
            source.replacements.clone(),
        );
        let request = StageRequest {
            category: StageCategory::from(spec.category),
            title: spec.title.clone(),
            act_number: spec.act,
            visual_act: spec.visual_act,
            src_folder: spec.src.clone(),
            dst_folder: spec.dst.clone(),
        };
        if let Err(e) = assemble_stage(&ctx, &mut dst_config, &request) {
            eprintln!(
                "rsdkmerge: stage {:?} act {} from {}: {e}",
                spec.title, spec.act, spec.source
            );
            return exit_code_for(&e);
        }
        stages_done += 1;
    }

    let output_revision = Revision::from(manifest.output_revision.unwrap_or(RevisionSpec::V4));
    let config_bytes = output_revision.encode(&dst_config);
    let config_path = game_config_path(&args.output);
    if let Some(parent) = config_path.parent()
        && let Err(e) = create_dir_all(parent)
    {
        return report(&e);
    }
    if let Err(e) = write_atomic(&config_path, &config_bytes) {
        return report(&e);
    }

    if json_output || !quiet {
        #[cfg(feature = "digest")]
        let digest = Some(crate::io::sha256_hex(&config_bytes));
        #[cfg(not(feature = "digest"))]
        let digest: Option<String> = None;

        if json_output {
            let summary = serde_json::json!({
                "stages": stages_done,
                "sources": sources.len(),
                "objects": dst_config.objects.len(),
                "variables": dst_config.variables.len(),
                "game_config_bytes": config_bytes.len(),
                "game_config_sha256": digest,
            });
            eprintln!("{summary}");
        } else {
            eprintln!(
                "rsdkmerge: merged {stages_done} stages from {} sources into {}",
                sources.len(),
                args.output.display()
            );
            match &digest {
                Some(digest) => eprintln!(
                    "rsdkmerge: {}: {} objects, {} bytes, sha256 {digest}",
                    config_path.display(),
                    dst_config.objects.len(),
                    config_bytes.len(),
                ),
                None => eprintln!(
                    "rsdkmerge: {}: {} objects, {} bytes",
                    config_path.display(),
                    dst_config.objects.len(),
                    config_bytes.len(),
                ),
            }
        }
    }

    0
}

// ---------------------------------------------------------------------------
// info
// ---------------------------------------------------------------------------

fn cmd_info(args: &InfoArgs) -> i32 {
    let bytes = match read_asset(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => return report(&e),
    };
    let revision = Revision::from(args.revision);
    let config = match revision.decode(&bytes) {
        Ok(config) => config,
        Err(e) => return report(&e.at(&args.file)),
    };

    println!("{} ({})", config.name, revision.label());
    if !config.description.is_empty() {
        println!(
            "  {}",
            config.description.lines().next().unwrap_or_default()
        );
    }
    println!(
        "  objects: {}, variables: {}, sound effects: {}, players: {}",
        config.objects.len(),
        config.variables.len(),
        config.sound_effects.len(),
        config.players.len(),
    );
    for category in StageCategory::ALL {
        let stages = config.stages(category);
        println!("  {} stages: {}", category.label(), stages.len());
        for stage in stages {
            println!("    [{}] {:<12} {}", stage.act, stage.path, stage.name);
        }
    }

    0
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

fn cmd_check(args: &CheckArgs, quiet: bool) -> i32 {
    let bytes = match read_asset(&args.file) {
        Ok(bytes) => bytes,
        Err(e) => return report(&e),
    };

    let reencoded = match args.kind {
        AssetKindArg::GameConfig => {
            let revision = Revision::from(args.revision);
            match revision.decode(&bytes) {
                Ok(config) => revision.encode(&config),
                Err(e) => return report(&e.at(&args.file)),
            }
        }
        AssetKindArg::StageConfig => match StageConfig::decode(&bytes) {
            Ok(config) => config.encode(),
            Err(e) => return report(&e.at(&args.file)),
        },
        AssetKindArg::Act => match Act::decode(&bytes) {
            Ok(act) => act.encode(),
            Err(e) => return report(&e.at(&args.file)),
        },
        AssetKindArg::Background => match StageBackground::decode(&bytes) {
            Ok(bg) => bg.encode(),
            Err(e) => return report(&e.at(&args.file)),
        },
    };

    if reencoded != bytes {
        eprintln!(
            "rsdkmerge: {}: re-encoded output differs from input ({} vs {} bytes)",
            args.file.display(),
            reencoded.len(),
            bytes.len(),
        );
        return 3;
    }

    if !quiet {
        eprintln!(
            "rsdkmerge: {}: round trip ok ({} bytes)",
            args.file.display(),
            bytes.len()
        );
    }
    0
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Main CLI entry point. Parses arguments via clap, dispatches commands.
pub fn run() -> ! {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let exit_code = match &cli.command {
        Cmd::Merge(args) => cmd_merge(args, cli.quiet, cli.json_output),
        Cmd::Info(args) => cmd_info(args),
        Cmd::Check(args) => cmd_check(args, cli.quiet),
    };

    process::exit(exit_code);
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
