use clap::{Arg, ArgAction, Command};
use krishi_translate::{MockMode, MockTranslator, TranslationConfig, Translator};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = Command::new("krishi-translate")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Translate short texts through the provider fallback chain")
        .arg(
            Arg::new("text")
                .help("Text(s) to translate; several texts are sent as one batch")
                .required(true)
                .num_args(1..),
        )
        .arg(
            Arg::new("target")
                .long("target")
                .short('t')
                .help("Target language name or code (e.g. hindi, bn, ory_Orya)")
                .required(true),
        )
        .arg(
            Arg::new("source")
                .long("source")
                .short('s')
                .help("Source language name or code")
                .default_value("english"),
        )
        .arg(
            Arg::new("mock")
                .long("mock")
                .short('m')
                .help("Use the mock provider instead of the configured chain")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Log every provider attempt")
                .action(ArgAction::SetTrue),
        )
        .get_matches();

    dotenvy::dotenv().ok();

    let verbose = matches.get_flag("verbose");
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let texts: Vec<String> = matches
        .get_many::<String>("text")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();
    let target = matches
        .get_one::<String>("target")
        .ok_or("missing --target")?;
    let source = matches
        .get_one::<String>("source")
        .ok_or("missing --source")?;

    let translator = if matches.get_flag("mock") {
        Translator::new(vec![Arc::new(MockTranslator::new(MockMode::Suffix))])
    } else {
        TranslationConfig::from_env()?.build()?
    };

    if verbose {
        eprintln!("🌍 {} → {}", source, target);
        eprintln!("🔗 Providers: {}", translator.provider_names().join(" → "));
    }

    let output = if texts.len() == 1 {
        let outcome = translator.translate(&texts[0], source, target).await;
        serde_json::to_string_pretty(&outcome)?
    } else {
        let outcomes = translator.translate_batch(&texts, source, target).await?;
        serde_json::to_string_pretty(&outcomes)?
    };
    println!("{}", output);

    Ok(())
}
