use anyhow::Result;
use clap::{App, AppSettings, Arg, SubCommand};
use kiln::build::{build_site, event_bus};
use kiln::config::Config;
use kiln::init::init_site;
use kiln::plugin::Registry;
use std::path::{Path, PathBuf};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("kiln")
        .version(env!("CARGO_PKG_VERSION"))
        .about(env!("CARGO_PKG_DESCRIPTION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site into its output directory")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .value_name("DIR")
                        .help("A directory inside the project (defaults to the current directory)"),
                ),
        )
        .subcommand(
            SubCommand::with_name("init")
                .about("Creates a default project file, content directories, and theme")
                .arg(
                    Arg::with_name("directory")
                        .value_name("DIR")
                        .help("Where to create the site (defaults to the current directory)"),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("build", Some(matches)) => build(&directory(matches.value_of("project"))?),
        ("init", Some(matches)) => init(&directory(matches.value_of("directory"))?),
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn directory(arg: Option<&str>) -> Result<PathBuf> {
    match arg {
        Some(dir) => Ok(PathBuf::from(dir)),
        None => Ok(std::env::current_dir()?),
    }
}

fn build(dir: &Path) -> Result<()> {
    let config = Config::from_directory(dir)?;
    let bus = event_bus(&config, &Registry::default())?;
    let summary = build_site(&config, &bus)?;
    println!(
        "Built {} post(s) and {} page(s) into `{}`",
        summary.posts,
        summary.pages,
        summary.output_directory.display()
    );
    Ok(())
}

fn init(dir: &Path) -> Result<()> {
    let (config, created) = init_site(dir)?;
    for path in &created {
        println!("created {}", path.display());
    }
    println!(
        "Add posts under `{}` and run `kiln build`",
        config.content_directory.join("posts").display()
    );
    Ok(())
}
