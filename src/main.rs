use clap::{Arg, Command};
use inquiry_relay::codes::{BUDGETS, INQUIRY_TYPES, PROJECT_TYPES};
use inquiry_relay::transport::{DryRunTransport, MailTransport, SendmailTransport};
use inquiry_relay::{Config, FormKind, IntakeHandler, Outcome, Server};
use log::LevelFilter;
use std::collections::BTreeMap;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let matches = Command::new("inquiry-relay")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Contact and commission form intake with owner notification and auto-reply")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path")
                .default_value("/etc/inquiry-relay.yaml"),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .value_name("FILE")
                .help("Generate a default configuration file")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("test-config")
                .long("test-config")
                .help("Test configuration validity")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("test-submission")
                .long("test-submission")
                .value_name("FILE")
                .help("Run a JSON field map through the pipeline without sending mail")
                .action(clap::ArgAction::Set),
        )
        .arg(
            Arg::new("form")
                .long("form")
                .value_name("KIND")
                .help("Form kind for --test-submission (contact or order)")
                .default_value("contact"),
        )
        .arg(
            Arg::new("listen")
                .short('l')
                .long("listen")
                .value_name("ADDR")
                .help("Override the configured listen address"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable verbose logging")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    let log_level = if matches.get_flag("verbose") {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    if let Some(generate_path) = matches.get_one::<String>("generate-config") {
        generate_default_config(generate_path);
        return;
    }

    let config_path = matches
        .get_one::<String>("config")
        .map(String::as_str)
        .unwrap_or("/etc/inquiry-relay.yaml");

    let mut config = match load_config(config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error loading configuration: {e}");
            process::exit(1);
        }
    };

    if matches.get_flag("test-config") {
        test_config(&config);
        return;
    }

    if let Some(submission_file) = matches.get_one::<String>("test-submission") {
        let kind = match matches
            .get_one::<String>("form")
            .map(String::as_str)
            .unwrap_or("contact")
            .parse::<FormKind>()
        {
            Ok(kind) => kind,
            Err(e) => {
                eprintln!("❌ {e}");
                process::exit(1);
            }
        };
        test_submission(config, kind, submission_file).await;
        return;
    }

    if let Some(listen) = matches.get_one::<String>("listen") {
        config.listen_address = listen.clone();
    }

    let problems = config.validate();
    if !problems.is_empty() {
        for problem in &problems {
            log::error!("Configuration problem: {problem}");
        }
        process::exit(1);
    }

    let transport: Arc<dyn MailTransport> = if config.transport.dry_run {
        log::warn!("Dry-run transport enabled, no mail will leave this host");
        Arc::new(DryRunTransport::new())
    } else {
        Arc::new(SendmailTransport::new(
            &config.transport.sendmail_path,
            &config.site.envelope_sender,
        ))
    };

    log::info!("Starting inquiry-relay...");

    let listen_address = config.listen_address.clone();
    let server = Server::new(IntakeHandler::new(config, transport));
    if let Err(e) = server.run(&listen_address).await {
        log::error!("Server error: {e}");
        process::exit(1);
    }
}

fn load_config(path: &str) -> anyhow::Result<Config> {
    if std::path::Path::new(path).exists() {
        Config::from_file(path)
    } else {
        log::warn!("Configuration file '{path}' not found, using default configuration");
        Ok(Config::default())
    }
}

fn generate_default_config(path: &str) {
    let config = Config::default();
    match config.to_file(path) {
        Ok(()) => {
            println!("Default configuration written to: {path}");
            println!("Please edit the configuration file to suit your needs.");
        }
        Err(e) => {
            eprintln!("Error writing configuration file: {e}");
            process::exit(1);
        }
    }
}

fn test_config(config: &Config) {
    println!("🔍 Testing configuration...");
    println!();
    println!("Listen address: {}", config.listen_address);
    println!("Owner address: {}", config.site.owner_address);
    for kind in FormKind::ALL {
        let form = config.form(kind);
        println!(
            "  {kind}: {} -> {} | {}",
            form.endpoint, form.thanks_location, form.form_location
        );
    }
    println!(
        "Transport: {} (timeout {}s{})",
        config.transport.sendmail_path,
        config.transport.timeout_seconds,
        if config.transport.dry_run { ", dry run" } else { "" }
    );
    for table in [&INQUIRY_TYPES, &PROJECT_TYPES, &BUDGETS] {
        println!(
            "Code table {} ({}): {}",
            table.name,
            table.version,
            table.codes().collect::<Vec<_>>().join(", ")
        );
    }
    println!();

    let problems = config.validate();
    if problems.is_empty() {
        println!("✅ Configuration is valid");
    } else {
        println!("❌ Configuration validation failed:");
        for problem in &problems {
            println!("  - {problem}");
        }
        process::exit(1);
    }
}

async fn test_submission(config: Config, kind: FormKind, submission_file: &str) {
    println!("🧪 Testing {kind} submission: {submission_file}");
    println!();

    let content = match std::fs::read_to_string(submission_file) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("❌ Error reading submission file: {e}");
            process::exit(1);
        }
    };

    let fields: BTreeMap<String, String> = match serde_json::from_str(&content) {
        Ok(fields) => fields,
        Err(e) => {
            eprintln!("❌ Submission file must be a JSON object of strings: {e}");
            process::exit(1);
        }
    };
    let raw: Vec<(String, String)> = fields.into_iter().collect();

    let transport = Arc::new(DryRunTransport::new());
    let handler = IntakeHandler::new(config, transport.clone());
    let resolution = handler.handle(kind, "POST", &raw).await;

    for message in transport.attempts() {
        println!("── To: {} | Subject: {}", message.to, message.subject);
        if let Some(reply_to) = &message.reply_to {
            println!("   Reply-To: {reply_to}");
        }
        println!("{}", message.body);
    }

    let symbol = match resolution.outcome {
        Outcome::Success | Outcome::PartialSuccess => "✅",
        Outcome::Rejected | Outcome::Failed => "❌",
    };
    println!(
        "{symbol} Result: {:?} -> {}",
        resolution.outcome,
        resolution.redirect.href()
    );
}
