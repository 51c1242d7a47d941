use std::fs;
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Map, Value};
use solage_contracts::catalog::{Catalog, MessagingAngle, Network, ProductCategory, Tone};
use solage_contracts::chat::{parse_intent, STUDIO_HELP_COMMANDS};
use solage_contracts::errors::WizardError;
use solage_contracts::events::EventWriter;
use solage_contracts::models::Capability;
use solage_contracts::selection::{Selection, VisualMode};
use solage_contracts::summary::{write_summary, CampaignSummary};
use solage_engine::orchestrator::GenerationResult;
use solage_engine::wizard::new_session_id;
use solage_engine::{
    CameraManager, FileCamera, Orchestrator, ResultView, StudioConfig, Wizard, WizardStep,
};

#[derive(Debug, Parser)]
#[command(name = "solage-rs", version, about = "Solage social campaign studio")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Interactive wizard driven by slash commands.
    Studio(StudioArgs),
    /// One-shot generation from flags.
    Run(RunArgs),
    /// List catalog products.
    Catalog(CatalogArgs),
}

#[derive(Debug, Clone, Parser)]
struct SessionArgs {
    #[arg(long)]
    out: PathBuf,
    #[arg(long)]
    events: Option<PathBuf>,
    #[arg(long)]
    text_model: Option<String>,
    #[arg(long)]
    image_model: Option<String>,
    /// Use the offline transport instead of Gemini.
    #[arg(long)]
    dryrun: bool,
    /// Image file read as the camera frame.
    #[arg(long)]
    photo: Option<PathBuf>,
}

#[derive(Debug, Parser)]
struct StudioArgs {
    #[command(flatten)]
    session: SessionArgs,
}

#[derive(Debug, Parser)]
struct RunArgs {
    #[command(flatten)]
    session: SessionArgs,
    #[arg(long)]
    product: String,
    #[arg(long)]
    angle: String,
    #[arg(long)]
    network: String,
    #[arg(long)]
    tone: String,
    #[arg(long, default_value = "generated-background")]
    visual: String,
    /// Research trends before generating.
    #[arg(long)]
    trends: bool,
}

#[derive(Debug, Parser)]
struct CatalogArgs {
    #[arg(long, default_value = "")]
    query: String,
    #[arg(long, default_value = "all")]
    category: String,
}

fn main() {
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("solage-rs error: {err:#}");
            std::process::exit(1);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Studio(args) => {
            run_studio(args)?;
            Ok(0)
        }
        Command::Run(args) => run_campaign(args),
        Command::Catalog(args) => run_catalog(args),
    }
}

struct Session {
    wizard: Wizard,
    session_id: String,
    out: PathBuf,
}

fn open_session(args: &SessionArgs) -> Result<Session> {
    let mut config = StudioConfig::from_env();
    if args.dryrun {
        config = config.with_dryrun_models();
    }
    if let Some(model) = args.text_model.clone() {
        config.text_model = Some(model);
    }
    if let Some(model) = args.image_model.clone() {
        config.image_model = Some(model);
    }

    fs::create_dir_all(&args.out)
        .with_context(|| format!("failed creating {}", args.out.display()))?;
    let events_path = args
        .events
        .clone()
        .unwrap_or_else(|| args.out.join("events.jsonl"));
    let session_id = new_session_id();
    let events = EventWriter::new(events_path, session_id.clone());
    let orchestrator = Orchestrator::from_config(&config, events.clone())?;
    for selection in [orchestrator.text_model(), orchestrator.image_model()] {
        if let Some(reason) = selection.fallback_reason.as_deref() {
            if selection.requested.is_some() {
                println!("{reason} Using {}.", selection.model.name);
            }
        }
    }
    let camera = args
        .photo
        .clone()
        .map(|path| CameraManager::new(Box::new(FileCamera::new(path))));

    Ok(Session {
        wizard: Wizard::new(Catalog::default(), orchestrator, camera, events),
        session_id,
        out: args.out.clone(),
    })
}

fn run_studio(args: StudioArgs) -> Result<()> {
    let mut session = open_session(&args.session)?;
    let stdin = io::stdin();
    let mut line = String::new();
    let mut category: Option<ProductCategory> = None;

    println!("Solage studio started. Type /help for commands, /connect to begin.");

    loop {
        print!("[{}] > ", session.wizard.step().id());
        io::stdout().flush()?;

        line.clear();
        let read = match stdin.read_line(&mut line) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(err.into()),
        };
        if read == 0 {
            break;
        }

        let input = line.trim_end_matches(['\n', '\r']);
        let intent = parse_intent(input);
        let wizard = &mut session.wizard;
        let before = wizard.step();

        let outcome: Result<(), WizardError> = match intent.action.as_str() {
            "noop" => continue,
            "help" => {
                println!("Commands: {}", STUDIO_HELP_COMMANDS.join(" "));
                Ok(())
            }
            "status" => {
                print_status(wizard);
                Ok(())
            }
            "connect" => wizard.connect().map(|_| ()),
            "start" => wizard.start().map(|_| ()),
            "back" => wizard.back().map(|_| ()),
            "search" => {
                let query = intent.arg("query").unwrap_or_default();
                print_products(wizard.catalog(), query, category);
                Ok(())
            }
            "set_category" => {
                match ProductCategory::parse_filter(intent.arg("id").unwrap_or("all")) {
                    Ok(filter) => {
                        category = filter;
                        print_products(wizard.catalog(), "", category);
                    }
                    Err(err) => println!("{err}"),
                }
                Ok(())
            }
            "choose_product" => wizard
                .choose_product(intent.arg("id").unwrap_or_default())
                .map(|_| ()),
            "choose_angle" => parse_option("angle", intent.arg("id"), MessagingAngle::parse)
                .and_then(|angle| wizard.choose_angle(angle))
                .map(|_| ()),
            "choose_network" => parse_option("network", intent.arg("id"), Network::parse)
                .and_then(|network| wizard.choose_network(network))
                .map(|_| ()),
            "choose_tone" => parse_option("tone", intent.arg("id"), Tone::parse)
                .and_then(|tone| wizard.choose_tone(tone))
                .map(|_| ()),
            "choose_visual" => parse_option("visual mode", intent.arg("id"), VisualMode::parse)
                .and_then(|mode| wizard.choose_visual_mode(mode))
                .map(|_| ()),
            "open_camera" => wizard.open_camera().map(|()| {
                println!("Camera open. /capture to take the photo, /cancel to close it.");
            }),
            "capture_photo" => wizard.capture_photo().map(|(width, height)| {
                println!("Photo captured ({width}x{height}).");
            }),
            "cancel_camera" => wizard.cancel_camera().map(|()| println!("Camera closed.")),
            "research_trends" => {
                println!("Searching current trends...");
                wizard.research_trends().map(|report| {
                    println!("{}", report.text);
                    for source in &report.sources {
                        println!("  - {} <{}>", source.title, source.uri);
                    }
                })
            }
            "generate" => {
                println!("Generating campaign...");
                wizard.generate().map(|_| ())
            }
            "regenerate" => {
                println!("Regenerating campaign...");
                wizard.regenerate().map(|_| ())
            }
            "reset" => {
                wizard.reset();
                category = None;
                println!("New campaign. /connect to begin.");
                Ok(())
            }
            "set_text_model" | "set_image_model" => {
                let capability = if intent.action == "set_text_model" {
                    Capability::Text
                } else {
                    Capability::Image
                };
                match wizard
                    .orchestrator_mut()
                    .set_model(capability, intent.arg("model"))
                {
                    Ok(selection) => {
                        if let Some(reason) = selection.fallback_reason.as_deref() {
                            println!("{reason}");
                        }
                        println!("{} model set to {}", capability.id(), selection.model.name);
                    }
                    Err(err) => println!("{err}"),
                }
                Ok(())
            }
            "export" => {
                let dir = intent
                    .arg("path")
                    .map(PathBuf::from)
                    .unwrap_or_else(|| session.out.join("export"));
                match export_campaign(&session.wizard, &session.session_id, &dir) {
                    Ok(written) => println!("Exported {} files to {}", written.len(), dir.display()),
                    Err(err) => println!("Export failed: {err:#}"),
                }
                Ok(())
            }
            _ => {
                println!(
                    "Unknown command: /{}",
                    intent.arg("command").unwrap_or_default()
                );
                Ok(())
            }
        };

        let wizard = &session.wizard;
        match outcome {
            Ok(()) => {
                if matches!(intent.action.as_str(), "generate" | "regenerate") {
                    print_result(wizard);
                } else if wizard.step() != before {
                    print_step(wizard);
                }
            }
            Err(err) => println!("{err}"),
        }
    }

    Ok(())
}

fn run_campaign(args: RunArgs) -> Result<i32> {
    let angle = MessagingAngle::parse(&args.angle)
        .ok_or_else(|| anyhow!("unknown angle '{}'", args.angle))?;
    let network = Network::parse(&args.network)
        .ok_or_else(|| anyhow!("unknown network '{}'", args.network))?;
    let tone =
        Tone::parse(&args.tone).ok_or_else(|| anyhow!("unknown tone '{}'", args.tone))?;
    let visual = VisualMode::parse(&args.visual)
        .ok_or_else(|| anyhow!("unknown visual mode '{}'", args.visual))?;
    if visual == VisualMode::UserPhoto && args.session.photo.is_none() {
        bail!("--visual user-photo requires --photo");
    }

    let mut session = open_session(&args.session)?;
    let wizard = &mut session.wizard;
    wizard.connect()?;
    wizard.start()?;
    wizard.choose_product(&args.product)?;
    if args.trends {
        match wizard.research_trends() {
            Ok(report) => println!("Trends:\n{}", report.text),
            Err(err) => eprintln!("Trend research skipped: {err}"),
        }
    }
    wizard.choose_angle(angle)?;
    wizard.choose_network(network)?;
    wizard.choose_tone(tone)?;
    match visual {
        VisualMode::UserPhoto => {
            wizard.open_camera()?;
            wizard.capture_photo()?;
        }
        VisualMode::GeneratedBackground => {
            wizard.choose_visual_mode(visual)?;
        }
    }

    let ready = matches!(wizard.generate()?, ResultView::Ready);
    print_result(&session.wizard);
    if !ready {
        return Ok(1);
    }
    let written = export_campaign(&session.wizard, &session.session_id, &session.out)?;
    println!("Wrote {} files to {}", written.len(), session.out.display());
    Ok(0)
}

fn run_catalog(args: CatalogArgs) -> Result<i32> {
    let category = ProductCategory::parse_filter(&args.category).map_err(|err| anyhow!(err))?;
    print_products(&Catalog::default(), &args.query, category);
    Ok(0)
}

fn parse_option<T>(
    kind: &'static str,
    raw: Option<&str>,
    parse: impl Fn(&str) -> Option<T>,
) -> Result<T, WizardError> {
    let raw = raw.unwrap_or_default();
    parse(raw).ok_or_else(|| WizardError::UnknownOption {
        kind,
        value: raw.to_string(),
    })
}

fn print_products(catalog: &Catalog, query: &str, category: Option<ProductCategory>) {
    let products = catalog.search(query, category);
    if products.is_empty() {
        println!("No product matches.");
        return;
    }
    for product in products {
        println!(
            "  {} {:<8} {} ({}, {})",
            product.icon,
            product.id,
            product.name,
            product.category.label(),
            product.formatted_price()
        );
    }
}

fn print_step(wizard: &Wizard) {
    match wizard.step() {
        WizardStep::Idle => println!("/connect to open the studio."),
        WizardStep::Landing => println!("Connected. /start to create a campaign."),
        WizardStep::ProductChoice => {
            println!("Choose a product with /product <id> (type text to search):");
            print_products(wizard.catalog(), "", None);
        }
        WizardStep::AngleChoice => {
            println!("Choose a messaging angle with /angle <id> (/trends for current trends):");
            if let Some(product) = wizard.selection().product() {
                for angle in MessagingAngle::ALL {
                    println!(
                        "  {:<12} {}: {}",
                        angle.id(),
                        angle.label(),
                        product.angle_text(angle)
                    );
                }
            }
        }
        WizardStep::NetworkChoice => {
            println!("Choose a network with /network <id>:");
            for network in Network::ALL {
                println!("  {} {:<6} {}", network.icon(), network.id(), network.name());
            }
        }
        WizardStep::ToneChoice => {
            println!("Choose a tone with /tone <id>:");
            for option in wizard.tone_options() {
                let marker = if option.recommended { " (recommended)" } else { "" };
                println!(
                    "  {:<7} {}: {}{marker}",
                    option.tone.id(),
                    option.tone.name(),
                    option.tone.description()
                );
            }
        }
        WizardStep::VisualAndPricing => {
            if let Some(pricing) = wizard.pricing() {
                println!("Price: {}  Link: {}", pricing.price, pricing.affiliate_link);
            }
            println!("Pick /visual generated-background or /camera for a selfie, then /generate.");
        }
        WizardStep::Generating => print_result(wizard),
    }
}

fn print_result(wizard: &Wizard) {
    match wizard.view() {
        None | Some(ResultView::Loading) => println!("Generating..."),
        Some(ResultView::Error(err)) => {
            println!("{} ({err})", err.user_message());
            if let Some(previous) = wizard.result() {
                println!("Previous result kept:");
                print_generation(previous);
            }
            println!("/regenerate to retry or /new for a new campaign.");
        }
        Some(ResultView::Ready) => {
            if let Some(result) = wizard.result() {
                print_generation(result);
            }
            println!("/regenerate, /export [dir] or /new.");
        }
    }
}

fn print_generation(result: &GenerationResult) {
    println!("--- caption ---\n{}", result.caption);
    if !result.comments.is_empty() {
        println!("--- comments ---");
        for (idx, comment) in result.comments.iter().enumerate() {
            println!("{}. {comment}", idx + 1);
        }
    }
    match result.final_artifact.as_ref() {
        Some(artifact) => {
            let layers: Vec<&str> = artifact.layers.iter().map(|layer| layer.id()).collect();
            println!(
                "Visual: {}x{} ({})",
                artifact.image.width(),
                artifact.image.height(),
                layers.join(" + ")
            );
        }
        None => println!("Visual unavailable."),
    }
    for issue in &result.issues {
        println!("Note: {}", issue.user_message());
    }
}

fn print_status(wizard: &Wizard) {
    let selection = wizard.selection();
    let orchestrator = wizard.orchestrator();
    println!("Step: {} ({})", wizard.step().id(), wizard.step().index());
    println!(
        "Product: {}",
        selection
            .product()
            .map(|product| product.name.as_str())
            .unwrap_or("-")
    );
    println!(
        "Angle: {}  Network: {}  Tone: {}  Visual: {}",
        selection.messaging_angle().map(MessagingAngle::id).unwrap_or("-"),
        selection.network().map(Network::id).unwrap_or("-"),
        selection.tone().map(Tone::id).unwrap_or("-"),
        selection.visual_mode().map(VisualMode::id).unwrap_or("-"),
    );
    println!(
        "Photo: {}  Camera: {}  Trends: {}",
        if selection.captured_photo().is_some() { "yes" } else { "no" },
        if wizard.is_streaming() { "streaming" } else { "off" },
        if wizard.trends().is_some() { "yes" } else { "no" },
    );
    println!(
        "Models: text={} image={} trends={}",
        orchestrator.text_model().model.name,
        orchestrator.image_model().model.name,
        orchestrator.trends_model().model.name
    );
}

fn campaign_summary(
    session_id: &str,
    selection: &Selection,
    result: &GenerationResult,
) -> Result<CampaignSummary> {
    let brief = selection
        .brief()
        .map_err(|err| anyhow!("selection is incomplete: {err}"))?;
    Ok(CampaignSummary {
        session_id: session_id.to_string(),
        product_id: brief.product.id.clone(),
        product_name: brief.product.name.clone(),
        angle: brief.angle.id().to_string(),
        network: brief.network.id().to_string(),
        tone: brief.tone.id().to_string(),
        visual_mode: brief.visual_mode().id().to_string(),
        text_model: result.text_model.clone(),
        image_model: result.image_model.clone(),
        caption: result.caption.clone(),
        comments: result.comments.clone(),
        artifact_layers: result
            .final_artifact
            .as_ref()
            .map(|artifact| {
                artifact
                    .layers
                    .iter()
                    .map(|layer| layer.id().to_string())
                    .collect()
            })
            .unwrap_or_default(),
        issues: result.issues.iter().map(|issue| issue.to_string()).collect(),
    })
}

/// Writes caption, comments, visuals and `summary.json` into `dir`.
fn export_campaign(wizard: &Wizard, session_id: &str, dir: &Path) -> Result<Vec<PathBuf>> {
    let Some(result) = wizard.result() else {
        bail!("nothing to export yet");
    };
    fs::create_dir_all(dir).with_context(|| format!("failed creating {}", dir.display()))?;
    let mut written = Vec::new();

    let caption_path = dir.join("caption.txt");
    fs::write(&caption_path, format!("{}\n", result.caption))?;
    written.push(caption_path);

    let comments_path = dir.join("comments.txt");
    let mut comments = result.comments.join("\n");
    if !comments.is_empty() {
        comments.push('\n');
    }
    fs::write(&comments_path, comments)?;
    written.push(comments_path);

    if let Some(artifact) = result.final_artifact.as_ref() {
        let path = dir.join("artifact.png");
        artifact.save(&path)?;
        written.push(path);
    }
    if let Some(background) = result.background_image.as_ref() {
        let path = dir.join("background.png");
        background
            .save(&path)
            .with_context(|| format!("failed writing {}", path.display()))?;
        written.push(path);
    }

    let summary_path = dir.join("summary.json");
    let summary = campaign_summary(session_id, wizard.selection(), result)?;
    let mut extra = Map::new();
    if let Some(pricing) = wizard.pricing() {
        extra.insert(
            "pricing".to_string(),
            json!({ "price": pricing.price, "affiliate_link": pricing.affiliate_link }),
        );
    }
    if let Some(report) = wizard.trends() {
        extra.insert("trends".to_string(), Value::String(report.text.clone()));
    }
    write_summary(&summary_path, &summary, Some(&extra))?;
    written.push(summary_path);

    Ok(written)
}
