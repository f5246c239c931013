mod config;

use anyhow::Context;
use camino::{Utf8Path, Utf8PathBuf};
use clap::{Args, Parser, Subcommand};
use config::{CliOverrides, ConfigMerger, MergedConfig};
use fs_err as fs;
use plistkit_core::adapters::{FsWritePort, ProcessRunner};
use plistkit_core::convert::{Converter, ExternalConverter, NativeConverter};
use plistkit_core::executor::LocalExecutor;
use plistkit_core::ib::{IbCompileRequest, compile_each};
use plistkit_core::info_plist::{InfoPlistSpec, Platform, ToolchainInfo};
use plistkit_core::pipeline::{run_merge, run_substitute};
use plistkit_core::settings::ConverterMode;
use plistkit_core::{BuildRule, PipelineError, PipelineResult, PlistFormat, SubstitutionSet};
use plistkit_types::schema::PLISTKIT_RULES_V1;
use std::process::ExitCode;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

#[derive(Debug, Parser)]
#[command(
    name = "plistkit",
    version,
    about = "Build helper for Apple plist and Interface Builder resources."
)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Args)]
struct GlobalArgs {
    /// Config file (default: ./plistkit.toml when present).
    #[arg(long, global = true)]
    config: Option<Utf8PathBuf>,

    /// Developer directory of the pinned Xcode used by the hermetic toolchain.
    #[arg(long, global = true, env = "PLISTKIT_DEVELOPER_DIR")]
    developer_dir: Option<Utf8PathBuf>,

    /// Run tools against --developer-dir instead of the system Xcode.
    #[arg(
        long,
        global = true,
        env = "PLISTKIT_HERMETIC",
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    hermetic: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Merge plist templates in order (later templates win).
    Merge(MergeArgs),
    /// Replace ${KEY} tokens in a merged plist.
    Substitute(SubstituteArgs),
    /// Convert a plist to another encoding.
    Convert(ConvertArgs),
    /// Compile .xib/.storyboard sources, one tool invocation per source.
    CompileIb(CompileIbArgs),
    /// Generate an Info.plist (merge, then substitute).
    InfoPlist(InfoPlistCmd),
    /// Print the rules an info-plist invocation declares, without running them.
    Rules(RulesArgs),
}

#[derive(Debug, Parser)]
struct MergeArgs {
    /// Output format (xml1, binary1, json).
    #[arg(short = 'f', value_name = "FORMAT")]
    format: PlistFormat,

    #[arg(short = 'o', value_name = "OUTPUT")]
    output: Utf8PathBuf,

    /// Templates, in merge order.
    #[arg(required = true)]
    templates: Vec<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct SubstituteArgs {
    #[arg(short = 'f', value_name = "FORMAT")]
    format: PlistFormat,

    #[arg(short = 'o', value_name = "OUTPUT")]
    output: Utf8PathBuf,

    /// Merged template to substitute into.
    #[arg(short = 't', value_name = "TEMPLATE")]
    template: Utf8PathBuf,

    /// KEY=VALUE; the last occurrence of a key wins.
    #[arg(short = 's', value_name = "KEY=VALUE")]
    substitutions: Vec<String>,
}

#[derive(Debug, Parser)]
struct ConvertArgs {
    /// Target format (default from config, else binary1).
    #[arg(long)]
    format: Option<PlistFormat>,

    #[arg(short = 'o', long)]
    output: Utf8PathBuf,

    /// Convert in-process instead of running plutil.
    #[arg(long, default_value_t = false)]
    native: bool,

    source: Utf8PathBuf,
}

#[derive(Debug, Parser)]
struct CompileIbArgs {
    #[arg(long)]
    output_dir: Utf8PathBuf,

    /// Extension of compiled outputs (nib, storyboardc).
    #[arg(long, default_value = "nib")]
    output_extension: String,

    /// Rule name recorded in the report.
    #[arg(long, default_value = "compile_ib")]
    name: String,

    /// Write the batch report as JSON.
    #[arg(long)]
    report: Option<Utf8PathBuf>,

    #[arg(required = true)]
    sources: Vec<Utf8PathBuf>,

    /// Flags passed to the compiler ahead of --input/--output.
    #[arg(last = true)]
    flags: Vec<String>,
}

#[derive(Debug, Parser)]
struct InfoPlistArgs {
    /// Base name of the generated files.
    #[arg(long)]
    name: String,

    #[arg(long)]
    executable_name: String,

    /// Defaults to the executable name.
    #[arg(long)]
    product_name: Option<String>,

    #[arg(long)]
    deployment_target: String,

    #[arg(long, default_value_t = Platform::Ios)]
    platform: Platform,

    /// Output format (default from config, else binary1).
    #[arg(long)]
    format: Option<PlistFormat>,

    /// Directory for the merged and final plists.
    #[arg(long, default_value = ".")]
    gen_dir: Utf8PathBuf,

    /// Extra KEY=VALUE substitutions, applied after the standard keys.
    #[arg(short = 's', long = "substitution", value_name = "KEY=VALUE")]
    substitutions: Vec<String>,

    /// Ask sw_vers and xcodebuild for the build machine facts.
    #[arg(long, default_value_t = false)]
    probe: bool,

    #[arg(long, default_value = "")]
    os_build: String,

    #[arg(long, default_value = "")]
    xcode_build: String,

    /// Xcode version as reported by xcodebuild (e.g. 15.2).
    #[arg(long)]
    xcode_version: Option<String>,

    #[arg(required = true)]
    templates: Vec<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct InfoPlistCmd {
    #[command(flatten)]
    info: InfoPlistArgs,

    /// Write the graph run report as JSON, also when a rule fails.
    #[arg(long)]
    report: Option<Utf8PathBuf>,
}

#[derive(Debug, Parser)]
struct RulesArgs {
    #[command(flatten)]
    info: InfoPlistArgs,

    /// Print paths relative to this directory.
    #[arg(long)]
    relative_to: Option<Utf8PathBuf>,
}

fn main() -> ExitCode {
    match real_main() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn real_main() -> PipelineResult<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.cmd {
        Command::Merge(args) => cmd_merge(args),
        Command::Substitute(args) => cmd_substitute(&cli.global, args),
        Command::Convert(args) => cmd_convert(&cli.global, args),
        Command::CompileIb(args) => cmd_compile_ib(&cli.global, args),
        Command::InfoPlist(args) => cmd_info_plist(&cli.global, args),
        Command::Rules(args) => cmd_rules(&cli.global, args),
    }
}

fn load_merged(global: &GlobalArgs, overrides: CliOverrides) -> anyhow::Result<MergedConfig> {
    let cwd = Utf8PathBuf::from(".");
    let file_config = config::load_or_default(global.config.as_deref(), &cwd)
        .context("load plistkit.toml config")?;
    let overrides = CliOverrides {
        hermetic: global.hermetic,
        developer_dir: global.developer_dir.clone(),
        ..overrides
    };
    let merged = ConfigMerger::new(file_config).merge(&overrides)?;
    debug!(
        "merged config: toolchain={:?}, format={}, converter={:?}, substitutions={}",
        merged.toolchain,
        merged.format,
        merged.converter,
        merged.substitutions.len()
    );
    Ok(merged)
}

fn cmd_merge(args: MergeArgs) -> PipelineResult<()> {
    run_merge(&args.templates, args.format, &args.output, &FsWritePort)?;
    Ok(())
}

fn cmd_substitute(global: &GlobalArgs, args: SubstituteArgs) -> PipelineResult<()> {
    let merged = load_merged(
        global,
        CliOverrides {
            substitutions: SubstitutionSet::parse_all(&args.substitutions)?,
            ..CliOverrides::default()
        },
    )?;
    run_substitute(
        &args.template,
        args.format,
        &merged.substitutions,
        &args.output,
        &FsWritePort,
    )?;
    Ok(())
}

fn cmd_convert(global: &GlobalArgs, args: ConvertArgs) -> PipelineResult<()> {
    let merged = load_merged(
        global,
        CliOverrides {
            format: args.format,
            native: args.native,
            ..CliOverrides::default()
        },
    )?;

    let runner = ProcessRunner;
    let converter: Box<dyn Converter + '_> = match merged.converter {
        ConverterMode::External => Box::new(ExternalConverter::new(&runner, &merged.toolchain)),
        ConverterMode::Native => Box::new(NativeConverter::new(&FsWritePort)),
    };
    converter.convert(&args.source, &args.output, merged.format)
}

fn cmd_compile_ib(global: &GlobalArgs, args: CompileIbArgs) -> PipelineResult<()> {
    let merged = load_merged(global, CliOverrides::default())?;
    let request = IbCompileRequest {
        sources: args.sources,
        output_dir: args.output_dir,
        output_extension: args.output_extension,
        extra_flags: args.flags,
    };

    let report = compile_each(&ProcessRunner, &merged.toolchain, &args.name, &request)?;
    if let Some(path) = &args.report {
        write_json(path, &report)?;
    }

    if !report.is_success() {
        return Err(PipelineError::BatchFailed {
            rule: args.name,
            failed: report.summary.failed,
            total: report.summary.total,
        });
    }
    info!(sources = report.summary.total, "compiled interface builder sources");
    Ok(())
}

fn info_plist_spec(
    global: &GlobalArgs,
    args: InfoPlistArgs,
) -> PipelineResult<(InfoPlistSpec, MergedConfig)> {
    let merged = load_merged(
        global,
        CliOverrides {
            format: args.format,
            substitutions: SubstitutionSet::parse_all(&args.substitutions)?,
            ..CliOverrides::default()
        },
    )?;

    let toolchain = if args.probe {
        ToolchainInfo::probe(&ProcessRunner, &merged.toolchain)?
    } else {
        ToolchainInfo {
            build_machine_os_build: args.os_build,
            xcode_build: args.xcode_build,
            xcode_version: args
                .xcode_version
                .as_deref()
                .map(plistkit_core::info_plist::format_xcode_version)
                .unwrap_or_default(),
        }
    };

    let spec = InfoPlistSpec {
        name: args.name,
        templates: args.templates,
        executable_name: args.executable_name,
        product_name: args.product_name,
        platform: args.platform,
        deployment_target: args.deployment_target,
        toolchain,
        extra_substitutions: merged.substitutions.clone(),
        format: merged.format,
        gen_dir: args.gen_dir,
    };
    Ok((spec, merged))
}

fn cmd_info_plist(global: &GlobalArgs, args: InfoPlistCmd) -> PipelineResult<()> {
    let (spec, merged) = info_plist_spec(global, args.info)?;
    let graph = spec.into_graph(&merged.toolchain)?;
    let run = graph.execute(&LocalExecutor::new(&ProcessRunner, &FsWritePort));
    if let Some(path) = &args.report {
        write_json(path, &run.report)?;
    }
    let report = run.into_result()?;
    info!(
        rules = report.summary.succeeded,
        output = %spec.output_path(),
        "generated info.plist"
    );
    println!("{}", spec.output_path());
    Ok(())
}

fn cmd_rules(global: &GlobalArgs, args: RulesArgs) -> PipelineResult<()> {
    let (spec, merged) = info_plist_spec(global, args.info)?;
    let spec = match &args.relative_to {
        Some(base) => spec.rebased(base),
        None => spec,
    };
    let graph = spec.into_graph(&merged.toolchain)?;
    let rules: Vec<BuildRule> = graph.ordered()?.into_iter().cloned().collect();

    let doc = serde_json::json!({
        "schema": PLISTKIT_RULES_V1,
        "rules": rules,
    });
    let text = serde_json::to_string_pretty(&doc).context("serialize rules")?;
    println!("{text}");
    Ok(())
}

fn write_json<T: serde::Serialize>(path: &Utf8Path, v: &T) -> anyhow::Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent))?;
    }
    let s = serde_json::to_string_pretty(v).context("serialize json")?;
    fs::write(path, s).with_context(|| format!("write {}", path))?;
    Ok(())
}
