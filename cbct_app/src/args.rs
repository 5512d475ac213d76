//! Argument parsing
//! Uses library `clap`

use std::path::PathBuf;

use cbct_lib::{config::TransformSource, Result, ViewerConfig};
use clap::{Arg, ArgMatches, Command, ValueHint};

const TRANSFORM_SOURCES: &[&str] = &["file", "identity", "prompt"];

pub fn get_command<'a>() -> Command<'a> {
    Command::new("cbct_app")
        .version("0.1.0")
        .about("CBCT volume and mesh viewer")
        .arg(
            Arg::new("config")
                .help("Directory with default.toml and user.toml")
                .long("config")
                .short('c')
                .value_name("DIR")
                .default_value("config")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("volume")
                .help("Directory with the DICOM series")
                .long("volume")
                .value_name("DIR")
                .value_hint(ValueHint::DirPath),
        )
        .arg(
            Arg::new("mesh")
                .help("OBJ file with the mesh")
                .long("mesh")
                .value_name("FILE")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("transform")
                .help("Text file with the 4x4 mesh transform")
                .long("transform")
                .short('t')
                .value_name("FILE")
                .value_hint(ValueHint::FilePath),
        )
        .arg(
            Arg::new("transform-source")
                .help("Where the mesh transform comes from")
                .long("transform-source")
                .value_name("SOURCE")
                .possible_values(TRANSFORM_SOURCES),
        )
}

/// Load the configuration and apply the flags over it
pub fn config_from_args(args: &ArgMatches) -> Result<ViewerConfig> {
    let dir = args.value_of("config").unwrap_or("config");
    let mut config = ViewerConfig::load_from(dir)?;

    if let Some(volume) = args.value_of("volume") {
        config.inputs.volume_dir = PathBuf::from(volume);
    }
    if let Some(mesh) = args.value_of("mesh") {
        config.inputs.mesh_file = PathBuf::from(mesh);
    }
    if let Some(transform) = args.value_of("transform") {
        config.inputs.transform_file = PathBuf::from(transform);
    }
    match args.value_of("transform-source") {
        Some("file") => config.transform_source = TransformSource::File,
        Some("identity") => config.transform_source = TransformSource::Identity,
        Some("prompt") => config.transform_source = TransformSource::Prompt,
        _ => (),
    }

    Ok(config)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn flags_override_config() {
        let args = get_command().get_matches_from([
            "cbct_app",
            "--config",
            "surely/not/a/dir",
            "--mesh",
            "jaw.obj",
            "--transform-source",
            "prompt",
        ]);
        let config = config_from_args(&args).unwrap();
        assert_eq!(config.inputs.mesh_file, PathBuf::from("jaw.obj"));
        assert_eq!(config.transform_source, TransformSource::Prompt);
        assert_eq!(
            config.inputs.volume_dir,
            PathBuf::from("Test_data/CBCT_dicoms")
        );
    }

    #[test]
    fn unknown_source_is_rejected() {
        let res = get_command().try_get_matches_from(["cbct_app", "--transform-source", "guess"]);
        assert!(res.is_err());
    }
}
