use clap::builder::PossibleValue;
use clap::{Arg, ArgAction, Command, crate_authors, crate_description, crate_name, crate_version};
use injector_admission::patch_builder::{
    DEFAULT_BINARY_NAME, DEFAULT_INIT_CONTAINER_IMAGE, DEFAULT_INIT_CONTAINER_NAME,
    DEFAULT_MOUNT_PATH, DEFAULT_VOLUME_NAME,
};

pub fn build_cli() -> Command {
    let mut args = vec![
        Arg::new("log-level")
            .long("log-level")
            .value_name("LOG_LEVEL")
            .env("VOLTRON_LOG_LEVEL")
            .default_value("info")
            .value_parser([
                PossibleValue::new("trace"),
                PossibleValue::new("debug"),
                PossibleValue::new("info"),
                PossibleValue::new("warn"),
                PossibleValue::new("error"),
            ])
            .help("Log level"),
        Arg::new("log-fmt")
            .long("log-fmt")
            .value_name("LOG_FMT")
            .env("VOLTRON_LOG_FMT")
            .default_value("text")
            .value_parser([PossibleValue::new("text"), PossibleValue::new("json")])
            .help("Log output format"),
        Arg::new("log-no-color")
            .long("log-no-color")
            .env("NO_COLOR")
            .action(ArgAction::SetTrue)
            .help("Disable colored output for logs"),
        Arg::new("address")
            .long("addr")
            .value_name("BIND_ADDRESS")
            .default_value("0.0.0.0")
            .env("VOLTRON_BIND_ADDRESS")
            .help("Bind against ADDRESS"),
        Arg::new("port")
            .long("port")
            .value_name("PORT")
            .default_value("8080")
            .env("VOLTRON_PORT")
            .help("Listen on PORT"),
        Arg::new("cert-file")
            .long("cert-file")
            .value_name("CERT_FILE")
            .default_value("")
            .env("VOLTRON_CERT_FILE")
            .help("Path to an X.509 certificate file for HTTPS"),
        Arg::new("key-file")
            .long("key-file")
            .value_name("KEY_FILE")
            .default_value("")
            .env("VOLTRON_KEY_FILE")
            .help("Path to an X.509 private key file for HTTPS"),
        Arg::new("volume-name")
            .long("volume-name")
            .value_name("VOLUME_NAME")
            .default_value(DEFAULT_VOLUME_NAME)
            .env("VOLTRON_VOLUME_NAME")
            .help("Name of the in-memory volume shared with the injected init container"),
        Arg::new("init-container-name")
            .long("init-container-name")
            .value_name("INIT_CONTAINER_NAME")
            .default_value(DEFAULT_INIT_CONTAINER_NAME)
            .env("VOLTRON_INIT_CONTAINER_NAME")
            .help("Name of the injected init container"),
        Arg::new("init-container-image")
            .long("init-container-image")
            .value_name("INIT_CONTAINER_IMAGE")
            .default_value(DEFAULT_INIT_CONTAINER_IMAGE)
            .env("VOLTRON_INIT_CONTAINER_IMAGE")
            .help("Image of the injected init container"),
        Arg::new("mount-path")
            .long("mount-path")
            .value_name("MOUNT_PATH")
            .default_value(DEFAULT_MOUNT_PATH)
            .env("VOLTRON_MOUNT_PATH")
            .help("Directory the shared volume is mounted at"),
        Arg::new("binary-name")
            .long("binary-name")
            .value_name("BINARY_NAME")
            .default_value(DEFAULT_BINARY_NAME)
            .env("VOLTRON_BINARY_NAME")
            .help("Binary, inside of MOUNT_PATH, the first container is started with"),
    ];
    args.sort_by(|a, b| a.get_id().cmp(b.get_id()));

    Command::new(crate_name!())
        .author(crate_authors!())
        .version(crate_version!())
        .about(crate_description!())
        .args(args)
}
