// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

/// Common argument: TOML configuration file
fn config_arg() -> Arg {
    Arg::new("config")
        .short('c')
        .long("config")
        .value_name("FILE")
        .help("TOML configuration file")
}

/// Common argument: downstream project commit
fn project_commit_arg() -> Arg {
    Arg::new("project_commit")
        .long("project-commit")
        .value_name("SHA")
        .help("Downstream project commit (defaults to the tip of the default branch)")
}

/// Common argument: seed reference
fn seed_ref_arg() -> Arg {
    Arg::new("seed_ref")
        .long("seed-ref")
        .value_name("REF")
        .help("Seed repository tag or commit")
}

fn output_arg() -> Arg {
    Arg::new("output")
        .short('o')
        .long("output")
        .value_name("FILE")
        .help("Write to a file instead of stdout")
}

fn build_cli() -> Command {
    Command::new("seedlock")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Seedlock Contributors")
        .about("Build reproducible Python dependency locks from an upstream seed environment")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Log at debug level (RUST_LOG takes precedence)"),
        )
        .subcommand(
            Command::new("build")
                .about("Build seed environment lock files for every runtime version and profile")
                .arg(config_arg())
                .arg(project_commit_arg())
                .arg(seed_ref_arg())
                .arg(
                    Arg::new("python_versions")
                        .long("python-versions")
                        .value_name("X.Y")
                        .num_args(1..)
                        .help("Runtime versions to build, e.g. 3.11 3.12"),
                )
                .arg(
                    Arg::new("hardware_profile")
                        .long("hardware-profile")
                        .value_parser(["tpu", "gpu"])
                        .num_args(1..)
                        .help("Hardware profiles to build"),
                )
                .arg(
                    Arg::new("output_dir")
                        .short('o')
                        .long("output-dir")
                        .value_name("DIR")
                        .help("Archive root for the generated files"),
                )
                .arg(
                    Arg::new("workspace")
                        .long("workspace")
                        .value_name("DIR")
                        .help("Persistent workspace directory (a temporary one when omitted)"),
                )
                .arg(
                    Arg::new("resolver")
                        .long("resolver")
                        .value_name("PROGRAM")
                        .help("Resolver executable"),
                ),
        )
        .subcommand(
            Command::new("resolve-ref")
                .about("Resolve a tag or commit to the commit it names")
                .arg(Arg::new("reference").required(true).help("Tag name or 40-character commit hash"))
                .arg(
                    Arg::new("repo")
                        .long("repo")
                        .value_name("ORG/REPO")
                        .help("Repository (defaults to the seed repository)"),
                )
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("fetch-seed")
                .about("Download the seed lock list for one runtime version")
                .arg(Arg::new("python_version").required(true).help("Runtime version, e.g. 3.12"))
                .arg(seed_ref_arg())
                .arg(output_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("patch-requirements")
                .about("Fetch the project requirements and apply the patch rules")
                .arg(project_commit_arg())
                .arg(output_arg())
                .arg(config_arg()),
        )
        .subcommand(
            Command::new("lower-bound")
                .about("Rewrite a manifest's dependencies as lower bounds of a lock file")
                .arg(Arg::new("lock_file").required(true).help("Exported lock file"))
                .arg(Arg::new("pyproject").required(true).help("pyproject.toml to rewrite in place")),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completions")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell to generate completions for"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    let manifest_dir = match env::var("CARGO_MANIFEST_DIR") {
        Ok(dir) => PathBuf::from(dir),
        Err(e) => {
            println!("cargo:warning=CARGO_MANIFEST_DIR not set: {}", e);
            return;
        }
    };
    let man_dir = manifest_dir.join("man");

    if let Err(e) = fs::create_dir_all(&man_dir) {
        println!("cargo:warning=Failed to create man directory: {}", e);
        return;
    }

    let man = Man::new(build_cli());
    let mut buffer = Vec::new();

    if let Err(e) = man.render(&mut buffer) {
        println!("cargo:warning=Failed to render man page: {}", e);
        return;
    }

    let man_path = man_dir.join("seedlock.1");
    if let Err(e) = fs::write(&man_path, buffer) {
        println!("cargo:warning=Failed to write man page: {}", e);
    }
}
