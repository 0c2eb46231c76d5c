use clap::{App, AppSettings, Arg, ArgMatches, SubCommand};
use revved::build::build_site;
use revved::config::Config;
use revved::typography;
use std::error::Error;
use std::path::{Path, PathBuf};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let matches = App::new("revved")
        .about("Builds the Revved blog")
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Builds the site into the output directory")
                .arg(
                    Arg::with_name("PROJECT_DIR")
                        .help("The project directory, or any directory beneath it")
                        .index(1),
                )
                .arg(
                    Arg::with_name("output")
                        .short("o")
                        .long("output")
                        .takes_value(true)
                        .value_name("OUTPUT")
                        .help("The output directory (defaults to `<project>/_output`)"),
                ),
        )
        .get_matches();

    if let ("build", Some(matches)) = matches.subcommand() {
        if let Err(err) = build(matches) {
            log::error!("{}", err);
            let mut source = err.source();
            while let Some(cause) = source {
                log::error!("  caused by: {}", cause);
                source = cause.source();
            }
            std::process::exit(1);
        }
    }
}

fn build(matches: &ArgMatches) -> Result<(), Box<dyn Error>> {
    let project_dir = Path::new(matches.value_of("PROJECT_DIR").unwrap_or("."));
    let output = match matches.value_of("output") {
        Some(output) => PathBuf::from(output),
        None => project_dir.join("_output"),
    };

    let config = Config::from_directory(project_dir, &output)?;
    let typography = typography::init(config.typography.clone())?;
    build_site(&config, typography)?;
    Ok(())
}
